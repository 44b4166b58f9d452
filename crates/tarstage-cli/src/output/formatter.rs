//! Output formatter trait for CLI results.

use crate::commands::bench::BenchReport;
use anyhow::Result;
use serde::Serialize;
use std::time::Duration;
use tarstage_core::ExtractionStats;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format extraction result; `drain` is the time spent waiting for
    /// buffered writes after the last entry was read.
    fn format_extraction_result(
        &self,
        stats: &ExtractionStats,
        drain: Option<Duration>,
    ) -> Result<()>;

    /// Format benchmark result
    fn format_bench_result(&self, report: &BenchReport) -> Result<()>;

    /// Report progress of a long-running operation
    fn format_progress(&self, message: &str);

    /// Format a failed operation
    fn format_error(&self, operation: &str, error: &anyhow::Error);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(operation: impl Into<String>, error: impl Into<String>) -> JsonOutput<()> {
        JsonOutput {
            operation: operation.into(),
            status: Status::Error,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Milliseconds with microsecond precision.
pub fn millis(duration: Duration) -> f64 {
    duration.as_micros() as f64 / 1000.0
}
