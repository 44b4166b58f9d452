//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Context;
use anyhow::Result;
use std::env;
use std::time::Duration;
use std::time::Instant;
use tarstage_core::BoundedWriteBuffer;
use tarstage_core::ExtractOptions;
use tarstage_core::NoopProgress;
use tarstage_core::extract_archive_with_progress;

pub fn execute(args: &ExtractArgs, formatter: &dyn OutputFormatter, quiet: bool) -> Result<()> {
    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("failed to get current directory")?,
    };

    let options = ExtractOptions::default()
        .with_pack_name(args.pack_name.clone())
        .with_small_file_threshold(args.small_file_threshold)
        .with_enqueue_timeout(Duration::from_secs(args.timeout));

    let buffer = args.buffer_size.map(BoundedWriteBuffer::new);
    if let Some(buffer) = &buffer {
        buffer.start().context("failed to start write buffer")?;
    }

    // Spinner only on an interactive terminal without --quiet/--json
    let result = if !quiet && CliProgress::should_show() {
        let mut progress = CliProgress::new("Extracting");
        extract_archive_with_progress(
            &args.archive,
            &output_dir,
            &options,
            buffer.as_ref(),
            &mut progress,
        )
    } else {
        extract_archive_with_progress(
            &args.archive,
            &output_dir,
            &options,
            buffer.as_ref(),
            &mut NoopProgress,
        )
    };
    let stats = add_archive_context(result, &args.archive)?;

    let drain = match &buffer {
        Some(buffer) => {
            let started = Instant::now();
            let drained = buffer.wait_complete();
            buffer.stop();
            add_archive_context(drained, &args.archive)?;
            Some(started.elapsed())
        }
        None => None,
    };

    formatter.format_extraction_result(&stats, drain)
}
