//! Engine setup: config overrides and request options.

use std::path::PathBuf;

use lumen_core::{Config, ImageProcessingEngine, OutputFormat as CoreOutputFormat, ProcessingOptions};

use super::{ProcessArgs, ProcessContext};

/// Validate input, apply CLI overrides, and build the engine.
pub fn setup_engine(args: &ProcessArgs, mut config: Config) -> anyhow::Result<ProcessContext> {
    if !args.input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            args.input
        );
    }
    if args.parallel == 0 {
        anyhow::bail!("--parallel must be at least 1");
    }

    let options = request_options(args, &config);
    options.validate()?;

    if let Some(workers) = args.workers {
        config.engine.max_workers = workers.max(1);
    }
    if args.parallel > config.engine.max_workers {
        tracing::debug!(
            "--parallel {} exceeds {} workers; extra requests will queue",
            args.parallel,
            config.engine.max_workers
        );
    }

    let output_format = resolve_format(args, &config);
    let output_dir = match &args.output_dir {
        Some(dir) => PathBuf::from(shellexpand::tilde(&dir.to_string_lossy()).as_ref()),
        None => config.output_dir(),
    };

    let engine = ImageProcessingEngine::new(&config);

    Ok(ProcessContext {
        engine,
        options,
        output_format,
        output_dir,
        pretty: config.output.pretty,
        config,
    })
}

/// Per-request options from flags, falling back to the configured quality.
pub fn request_options(args: &ProcessArgs, config: &Config) -> ProcessingOptions {
    ProcessingOptions {
        quality: args.quality.unwrap_or(config.processing.default_quality),
        max_width: args.max_width,
        max_height: args.max_height,
    }
}

/// `--format` wins over `output.format` in the config file.
pub fn resolve_format(args: &ProcessArgs, config: &Config) -> CoreOutputFormat {
    match args.format {
        Some(format) => format.into(),
        None => CoreOutputFormat::parse(&config.output.format).unwrap_or(CoreOutputFormat::Json),
    }
}
