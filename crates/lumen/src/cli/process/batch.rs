//! Batch processing: directory traversal with progress and streaming output.

use std::io::Write;
use std::time::{Duration, Instant};

use futures_util::stream::{self, StreamExt};
use lumen_core::pipeline::DiscoveredFile;
use lumen_core::{OutputFormat as CoreOutputFormat, OutputWriter, ProcessingResult};

use super::{process_one, ProcessArgs, ProcessContext};

/// Counters for the end-of-run summary.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct BatchSummary {
    pub succeeded: u64,
    pub failed: u64,
    pub cache_hits: u64,
    pub input_bytes: u64,
    pub output_bytes: u64,
}

impl BatchSummary {
    pub fn record(&mut self, result: &ProcessingResult) {
        if result.success {
            self.succeeded += 1;
            self.input_bytes += result.input_size;
            self.output_bytes += result.output_size;
            if result.cache_hit() {
                self.cache_hits += 1;
            }
        } else {
            self.failed += 1;
        }
    }

    /// Overall space saved, in percent of the successful inputs.
    pub fn saved_percent(&self) -> f64 {
        lumen_core::types::compression_rate(self.input_bytes, self.output_bytes)
    }
}

/// Process a directory of images with progress tracking.
///
/// JSONL records stream to the writer as each file finishes; JSON output is
/// collected and written as one array at the end.
pub async fn process_batch<W: Write>(
    ctx: &ProcessContext,
    args: &ProcessArgs,
    files: &[DiscoveredFile],
    writer: &mut OutputWriter<W>,
) -> anyhow::Result<BatchSummary> {
    let progress = create_progress_bar(files.len() as u64);
    let start_time = Instant::now();
    let mut summary = BatchSummary::default();
    let mut collected = Vec::new();

    let mut results = stream::iter(files)
        .map(|file| process_one(ctx, &args.input, file))
        .buffer_unordered(args.parallel.max(1));

    while let Some(mut result) = results.next().await {
        summary.record(&result);
        // Encoded bytes are on disk by now
        result.output = None;

        match ctx.output_format {
            CoreOutputFormat::JsonLines => writer.write(&result)?,
            CoreOutputFormat::Json => collected.push(result),
        }

        progress.inc(1);
        let elapsed = start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            let rate = (summary.succeeded + summary.failed) as f64 / elapsed;
            progress.set_message(format!("{:.1} img/sec", rate));
        }
    }

    if !collected.is_empty() {
        writer.write_all(&collected)?;
    }

    progress.finish_and_clear();
    print_summary(&summary, start_time.elapsed());
    Ok(summary)
}

/// Create a progress bar for batch processing.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .map(|style| style.progress_chars("##-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after batch processing.
fn print_summary(summary: &BatchSummary, elapsed: Duration) {
    let total = summary.succeeded + summary.failed;
    let secs = elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        summary.succeeded as f64 / secs
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", summary.succeeded);
    if summary.failed > 0 {
        eprintln!("    Failed:       {:>8}", summary.failed);
    }
    if summary.cache_hits > 0 {
        eprintln!("    Cache hits:   {:>8}", summary.cache_hits);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", total);
    eprintln!("    Duration:     {:>7.1}s", secs);
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!(
        "    Size:         {:>7.1} MB -> {:.1} MB ({:.1}% saved)",
        summary.input_bytes as f64 / 1_000_000.0,
        summary.output_bytes as f64 / 1_000_000.0,
        summary.saved_percent()
    );
    eprintln!("  ====================================");
}
