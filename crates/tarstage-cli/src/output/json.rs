//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use super::formatter::millis;
use crate::commands::bench::BenchReport;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::time::Duration;
use tarstage_core::ExtractionStats;

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

#[derive(Serialize)]
struct ExtractionOutput {
    output_root: String,
    files_extracted: usize,
    files_buffered: usize,
    directories_created: usize,
    entries_skipped: usize,
    bytes_extracted: u64,
    duration_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    drain_ms: Option<f64>,
}

impl ExtractionOutput {
    fn new(stats: &ExtractionStats, drain: Option<Duration>) -> Self {
        Self {
            output_root: stats.output_root.display().to_string(),
            files_extracted: stats.files_created,
            files_buffered: stats.files_buffered,
            directories_created: stats.directories_created,
            entries_skipped: stats.entries_skipped,
            bytes_extracted: stats.bytes_extracted,
            duration_ms: millis(stats.elapsed),
            drain_ms: drain.map(millis),
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_extraction_result(
        &self,
        stats: &ExtractionStats,
        drain: Option<Duration>,
    ) -> Result<()> {
        let output = JsonOutput::success("extract", ExtractionOutput::new(stats, drain));
        Self::output(&output)
    }

    fn format_bench_result(&self, report: &BenchReport) -> Result<()> {
        #[derive(Serialize)]
        struct ArchiveOutput {
            archive: String,
            runs: Vec<ExtractionOutput>,
            total_ms: f64,
            average_ms: f64,
        }

        #[derive(Serialize)]
        struct BenchOutput {
            buffer_size: u64,
            archives: Vec<ArchiveOutput>,
            drain_ms: f64,
            #[serde(skip_serializing_if = "Option::is_none")]
            kept_dir: Option<String>,
        }

        let data = BenchOutput {
            buffer_size: report.buffer_size,
            archives: report
                .archives
                .iter()
                .map(|archive| ArchiveOutput {
                    archive: archive.archive.display().to_string(),
                    runs: archive
                        .runs
                        .iter()
                        .map(|run| ExtractionOutput::new(run, None))
                        .collect(),
                    total_ms: millis(archive.total()),
                    average_ms: millis(archive.average()),
                })
                .collect(),
            drain_ms: millis(report.drain),
            kept_dir: report.kept_dir.as_ref().map(|d| d.display().to_string()),
        };

        Self::output(&JsonOutput::success("bench", data))
    }

    fn format_progress(&self, _message: &str) {}

    fn format_error(&self, operation: &str, error: &anyhow::Error) {
        let output = JsonOutput::<()>::error(operation, format!("{error:#}"));
        let _ = Self::output(&output);
    }
}
