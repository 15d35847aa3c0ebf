//! The `lumen palette` command for color palette extraction.

use clap::Args;
use lumen_core::{ColorAnalyzer, Config, ImageInput, ImageProcessingEngine};
use std::path::PathBuf;

/// Arguments for the `palette` command.
#[derive(Args, Debug)]
pub struct PaletteArgs {
    /// Image file to analyze
    #[arg(required = true)]
    pub input: PathBuf,

    /// Approximate number of pixels to sample (defaults to palette.sample_count)
    #[arg(short, long)]
    pub samples: Option<usize>,
}

/// Execute the palette command.
pub async fn execute(args: PaletteArgs, config: Config) -> anyhow::Result<()> {
    if !args.input.is_file() {
        anyhow::bail!(
            "Input is not a file: {:?}\n\n  Hint: palette works on one image at a time.",
            args.input
        );
    }

    let analyzer = analyzer_for(&args, &config);
    let bytes = tokio::fs::read(&args.input).await?;
    let input = ImageInput::new(bytes).with_name(args.input.to_string_lossy());

    let engine = ImageProcessingEngine::new(&config);
    let palette = engine.extract_palette(input, &analyzer).await?;
    tracing::debug!(
        "Extracted palette from {:?} ({} samples target)",
        args.input,
        analyzer.sample_count()
    );

    println!("{}", serde_json::to_string_pretty(&palette)?);
    Ok(())
}

fn analyzer_for(args: &PaletteArgs, config: &Config) -> ColorAnalyzer {
    match args.samples {
        Some(samples) => ColorAnalyzer::new(samples),
        None => ColorAnalyzer::from_config(&config.palette),
    }
}
