//! Bench command implementation.
//!
//! Extracts each archive `--runs` times into fresh subdirectories of one
//! temporary directory, sharing a single write buffer across every run, then
//! measures how long the buffer takes to drain.

use crate::cli::BenchArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;
use tarstage_core::BoundedWriteBuffer;
use tarstage_core::ExtractOptions;
use tarstage_core::ExtractionStats;
use tarstage_core::extract_archive;
use tempfile::TempDir;

/// Timings for every run of one archive.
#[derive(Debug)]
pub struct ArchiveBench {
    pub archive: PathBuf,
    pub runs: Vec<ExtractionStats>,
}

impl ArchiveBench {
    /// Sum of the per-run extraction times.
    pub fn total(&self) -> Duration {
        self.runs.iter().map(|run| run.elapsed).sum()
    }

    /// Mean extraction time per run.
    pub fn average(&self) -> Duration {
        u32::try_from(self.runs.len())
            .ok()
            .filter(|&n| n > 0)
            .map_or(Duration::ZERO, |n| self.total() / n)
    }
}

/// Outcome of a whole bench invocation.
#[derive(Debug)]
pub struct BenchReport {
    pub buffer_size: u64,
    pub archives: Vec<ArchiveBench>,
    /// Time `wait_complete` took after the last run.
    pub drain: Duration,
    /// Directory holding the extracted trees, if `--keep` was given.
    pub kept_dir: Option<PathBuf>,
}

pub fn execute(args: &BenchArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let temp = TempDir::with_prefix("tarstage-bench-")
        .context("failed to create benchmark directory")?;

    let buffer = BoundedWriteBuffer::new(args.buffer_size);
    buffer.start().context("failed to start write buffer")?;

    let options = ExtractOptions::default().with_small_file_threshold(args.small_file_threshold);

    let mut archives = Vec::with_capacity(args.archives.len());
    for archive in &args.archives {
        let mut runs = Vec::new();
        for run in 0..args.runs {
            let output_root = temp.path().join(run_dir_name(archive, run));
            formatter.format_progress(&format!(
                "File: {} / Pass: {run}",
                archive.display()
            ));

            let stats = add_archive_context(
                extract_archive(archive, &output_root, &options, Some(&buffer)),
                archive,
            )?;
            tracing::debug!(
                archive = %archive.display(),
                run,
                elapsed_ms = stats.elapsed.as_millis(),
                "bench run complete"
            );
            runs.push(stats);
        }
        archives.push(ArchiveBench {
            archive: archive.clone(),
            runs,
        });
    }

    formatter.format_progress("Waiting for file writes to finish...");
    let drain_start = Instant::now();
    let drained = buffer.wait_complete();
    let drain = drain_start.elapsed();
    buffer.stop();
    drained.context("buffered writes failed")?;

    let kept_dir = if args.keep {
        Some(temp.keep())
    } else {
        None
    };

    formatter.format_bench_result(&BenchReport {
        buffer_size: args.buffer_size,
        archives,
        drain,
        kept_dir,
    })
}

/// Subdirectory name for one run, e.g. `left-pad_1_3_0_tgz__0`.
fn run_dir_name(archive: &Path, run: u32) -> String {
    let name = archive
        .file_name()
        .map_or_else(|| "archive".into(), |n| n.to_string_lossy());
    format!("{}__{run}", name.replace('.', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(millis: u64) -> ExtractionStats {
        ExtractionStats {
            elapsed: Duration::from_millis(millis),
            ..ExtractionStats::default()
        }
    }

    #[test]
    fn test_run_dir_name() {
        assert_eq!(
            run_dir_name(Path::new("/data/left-pad-1.3.0.tgz"), 0),
            "left-pad-1_3_0_tgz__0"
        );
        assert_eq!(run_dir_name(Path::new("a.tar"), 3), "a_tar__3");
    }

    #[test]
    fn test_archive_bench_average() {
        let bench = ArchiveBench {
            archive: PathBuf::from("a.tgz"),
            runs: vec![stats(100), stats(300)],
        };
        assert_eq!(bench.total(), Duration::from_millis(400));
        assert_eq!(bench.average(), Duration::from_millis(200));
    }

    #[test]
    fn test_archive_bench_average_without_runs() {
        let bench = ArchiveBench {
            archive: PathBuf::from("a.tgz"),
            runs: Vec::new(),
        };
        assert_eq!(bench.average(), Duration::ZERO);
    }
}
