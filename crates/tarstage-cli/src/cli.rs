//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tarstage")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract archive contents
    Extract(ExtractArgs),
    /// Extract archives repeatedly and report timings
    Bench(BenchArgs),
    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args)]
pub struct ExtractArgs {
    /// Path to the archive file (.tar, .tar.gz, .tgz)
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Output directory (default: current directory)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Stage small files in a background write buffer of this size
    #[arg(short, long, value_parser = parse_byte_size)]
    pub buffer_size: Option<u64>,

    /// Only buffer files up to this size (default: anything that fits)
    #[arg(long, value_parser = parse_byte_size)]
    pub small_file_threshold: Option<u64>,

    /// Top-level directory to strip besides "package/"
    #[arg(long, value_name = "NAME")]
    pub pack_name: Option<String>,

    /// Seconds to wait for buffer space before giving up
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,
}

#[derive(clap::Args)]
pub struct BenchArgs {
    /// Archives to extract, one after another
    #[arg(value_name = "ARCHIVE", required = true)]
    pub archives: Vec<PathBuf>,

    /// Number of extractions per archive
    #[arg(short, long, default_value = "2", value_parser = clap::value_parser!(u32).range(1..))]
    pub runs: u32,

    /// Size of the shared write buffer
    #[arg(short, long, default_value = "10M", value_parser = parse_byte_size)]
    pub buffer_size: u64,

    /// Only buffer files up to this size
    #[arg(long, value_parser = parse_byte_size)]
    pub small_file_threshold: Option<u64>,

    /// Keep the extracted trees instead of deleting them
    #[arg(long)]
    pub keep: bool,
}

/// Parse byte size with optional suffix (K, M, G, T)
#[allow(clippy::option_if_let_else)]
fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty byte size".to_string());
    }

    let (num_str, multiplier) = if let Some(stripped) = s.strip_suffix('T') {
        (stripped, 1024_u64.pow(4))
    } else if let Some(stripped) = s.strip_suffix('G') {
        (stripped, 1024_u64.pow(3))
    } else if let Some(stripped) = s.strip_suffix('M') {
        (stripped, 1024_u64.pow(2))
    } else if let Some(stripped) = s.strip_suffix('K') {
        (stripped, 1024)
    } else {
        (s, 1)
    };

    num_str
        .parse::<u64>()
        .map_err(|_| format!("invalid byte size: {s}"))
        .and_then(|n| {
            n.checked_mul(multiplier)
                .ok_or_else(|| format!("byte size overflow: {s}"))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_extract_args() {
        let cli = Cli::try_parse_from([
            "tarstage",
            "extract",
            "pkg.tgz",
            "out",
            "--buffer-size",
            "10M",
            "--small-file-threshold",
            "512K",
        ])
        .unwrap();

        let Commands::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(args.archive, PathBuf::from("pkg.tgz"));
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(args.buffer_size, Some(10 * 1024 * 1024));
        assert_eq!(args.small_file_threshold, Some(512 * 1024));
        assert_eq!(args.timeout, 60);
    }

    #[test]
    fn test_bench_defaults() {
        let cli = Cli::try_parse_from(["tarstage", "bench", "a.tgz", "b.tar"]).unwrap();

        let Commands::Bench(args) = cli.command else {
            panic!("expected bench");
        };
        assert_eq!(args.archives.len(), 2);
        assert_eq!(args.runs, 2);
        assert_eq!(args.buffer_size, 10 * 1024 * 1024);
        assert!(!args.keep);
    }

    #[test]
    fn test_bench_requires_archive() {
        assert!(Cli::try_parse_from(["tarstage", "bench"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["tarstage", "-q", "-v", "extract", "a.tar"]).is_err());
    }

    #[test]
    fn test_parse_byte_size() {
        assert_eq!(parse_byte_size("100").unwrap(), 100);
        assert_eq!(parse_byte_size("1K").unwrap(), 1024);
        assert_eq!(parse_byte_size("2M").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_byte_size("3G").unwrap(), 3 * 1024 * 1024 * 1024);
        assert_eq!(parse_byte_size("1T").unwrap(), 1024_u64.pow(4));
        assert!(parse_byte_size("invalid").is_err());
        assert!(parse_byte_size("").is_err());
    }

    #[test]
    fn test_parse_byte_size_overflow() {
        // One unit past u64::MAX for each suffix
        assert!(parse_byte_size("18014398509481984K").is_err());
        assert!(parse_byte_size("17592186044416M").is_err());
        assert!(parse_byte_size("17179869184G").is_err());
        assert_eq!(
            parse_byte_size("18014398509481983K").unwrap(),
            u64::MAX - 1023
        );
    }
}
