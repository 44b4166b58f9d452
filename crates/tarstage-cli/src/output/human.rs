//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use crate::commands::bench::BenchReport;
use anyhow::Result;
use console::Term;
use console::style;
use std::time::Duration;
use tarstage_core::ExtractionStats;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    fn format_number(n: usize) -> String {
        let s = n.to_string();
        let mut result = String::new();
        let mut count = 0;

        for c in s.chars().rev() {
            if count == 3 {
                result.push(',');
                count = 0;
            }
            result.push(c);
            count += 1;
        }

        result.chars().rev().collect()
    }
}

impl HumanFormatter {
    fn write_header(&self, message: &str) {
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("✓").green().bold()));
        } else {
            let _ = self.term.write_line(message);
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_extraction_result(
        &self,
        stats: &ExtractionStats,
        drain: Option<Duration>,
    ) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.write_header("Extraction complete");

        let _ = self.term.write_line(&format!(
            "  Files extracted: {}",
            Self::format_number(stats.files_created)
        ));
        let _ = self.term.write_line(&format!(
            "  Directories: {}",
            Self::format_number(stats.directories_created)
        ));
        let _ = self.term.write_line(&format!(
            "  Total size: {}",
            Self::format_size(stats.bytes_extracted)
        ));

        if self.verbose {
            let _ = self.term.write_line(&format!(
                "  Buffered files: {} (direct: {})",
                stats.files_buffered,
                stats.files_direct()
            ));
            if stats.entries_skipped > 0 {
                let _ = self
                    .term
                    .write_line(&format!("  Skipped entries: {}", stats.entries_skipped));
            }
            let _ = self
                .term
                .write_line(&format!("  Output: {}", stats.output_root.display()));
            let _ = self
                .term
                .write_line(&format!("  Duration: {:?}", stats.elapsed));
            if let Some(drain) = drain {
                let _ = self.term.write_line(&format!("  Drain: {drain:?}"));
            }
        }

        Ok(())
    }

    fn format_bench_result(&self, report: &BenchReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        for archive in &report.archives {
            let name = archive.archive.display();
            for (pass, run) in archive.runs.iter().enumerate() {
                let _ = self.term.write_line(&format!(
                    "  To unpack '{name}' pass {pass} took {:?} - {} files & {} dirs created",
                    run.elapsed,
                    Self::format_number(run.files_created),
                    Self::format_number(run.directories_created)
                ));
            }
            let _ = self.term.write_line(&format!(
                "To unpack '{name}' {} times took {:?} - avg {:?} per run",
                archive.runs.len(),
                archive.total(),
                archive.average()
            ));
        }

        self.write_header(&format!(
            "Buffer ({}) drained in {:?}",
            Self::format_size(report.buffer_size),
            report.drain
        ));

        if let Some(dir) = &report.kept_dir {
            let _ = self
                .term
                .write_line(&format!("  Files here: {}", dir.display()));
        }

        Ok(())
    }

    fn format_progress(&self, message: &str) {
        if self.quiet {
            return;
        }
        let _ = self.term.write_line(message);
    }

    fn format_error(&self, _operation: &str, error: &anyhow::Error) {
        // Always show errors, even in quiet mode
        let term = Term::stderr();
        if self.use_colors {
            let _ = term.write_line(&format!("{} {error:?}", style("ERROR:").red().bold()));
        } else {
            let _ = term.write_line(&format!("ERROR: {error:?}"));
        }
    }
}
