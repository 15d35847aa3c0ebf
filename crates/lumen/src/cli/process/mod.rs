//! The `lumen process` command for recompressing images.

mod batch;
mod setup;
pub mod types;

pub use types::OutputFormat;

use clap::Args;
use lumen_core::pipeline::DiscoveredFile;
use lumen_core::{
    Config, FileDiscovery, ImageProcessingEngine, OutputFormat as CoreOutputFormat, OutputWriter,
    PipelineError, ProcessingOptions, ProcessingResult,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use batch::process_batch;
use setup::setup_engine;

/// Arguments for the `process` command.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Image file or directory to process
    #[arg(required = true)]
    pub input: PathBuf,

    /// JPEG quality 1-100 (0 selects the default)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub quality: Option<u8>,

    /// Maximum output width in pixels
    #[arg(long)]
    pub max_width: Option<u32>,

    /// Maximum output height in pixels
    #[arg(long)]
    pub max_height: Option<u32>,

    /// Directory for encoded JPEGs (defaults to output.dir from config)
    #[arg(short = 'd', long)]
    pub output_dir: Option<PathBuf>,

    /// Result records file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Result record format (defaults to output.format from config)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Number of files read and submitted concurrently
    #[arg(short, long, default_value = "4")]
    pub parallel: usize,

    /// Override engine.max_workers
    #[arg(long)]
    pub workers: Option<usize>,

    /// Print engine statistics to stderr when done
    #[arg(long)]
    pub stats: bool,
}

/// Manual Default impl for constructing ProcessArgs outside of clap.
///
/// Values match the clap `#[arg(default_value = ...)]` annotations above.
impl Default for ProcessArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            quality: None,
            max_width: None,
            max_height: None,
            output_dir: None,
            output: None,
            format: None,
            parallel: 4,
            workers: None,
            stats: false,
        }
    }
}

/// Processing context assembled by setup_engine().
pub(crate) struct ProcessContext {
    pub engine: ImageProcessingEngine,
    pub options: ProcessingOptions,
    pub output_format: CoreOutputFormat,
    pub output_dir: PathBuf,
    pub pretty: bool,
    pub config: Config,
}

/// Execute the process command.
pub async fn execute(args: ProcessArgs, config: Config) -> anyhow::Result<()> {
    let ctx = setup_engine(&args, config)?;

    let files = FileDiscovery::new(&ctx.config.processing).discover(&args.input);
    if files.is_empty() {
        tracing::warn!("No supported image files found at {:?}", args.input);
        return Ok(());
    }
    tracing::info!("Found {} image(s) to process", files.len());

    let single = args.input.is_file();
    let mut writer = OutputWriter::new(
        open_sink(args.output.as_deref())?,
        ctx.output_format,
        ctx.pretty || single,
    );

    let failed = if single {
        let result = process_one(&ctx, &args.input, &files[0]).await;
        writer.write(&result)?;
        u64::from(!result.success)
    } else {
        process_batch(&ctx, &args, &files, &mut writer).await?.failed
    };

    writer.flush()?;
    if let Some(output_path) = &args.output {
        tracing::info!("Output written to {:?}", output_path);
    }

    if args.stats {
        eprintln!("{}", serde_json::to_string_pretty(&ctx.engine.stats())?);
    }

    if single && failed > 0 {
        anyhow::bail!("Failed to process {:?}", args.input);
    }
    Ok(())
}

/// Transform one file and save its output next to the others.
pub(crate) async fn process_one(
    ctx: &ProcessContext,
    input_root: &Path,
    file: &DiscoveredFile,
) -> ProcessingResult {
    let mut result = ctx.engine.process_file(&file.path, &ctx.options).await;
    result.insert_metadata("source", file.path.display().to_string());

    match result.output.clone() {
        Some(bytes) => {
            let dest = output_path_for(input_root, &file.path, &ctx.output_dir);
            match write_output(&dest, &bytes).await {
                Ok(()) => result.insert_metadata("output_path", dest.display().to_string()),
                Err(e) => {
                    tracing::error!("Failed to write {:?}: {}", dest, e);
                    result.fail(&PipelineError::Io {
                        source_name: dest.display().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
        None => {
            tracing::error!(
                "Failed: {:?} - {}",
                file.path,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    result
}

/// `<output_dir>/<dir relative to input_root>/<stem>.jpg`.
pub(crate) fn output_path_for(input_root: &Path, file: &Path, output_dir: &Path) -> PathBuf {
    let mut path = output_dir.to_path_buf();
    if let Some(relative) = file
        .parent()
        .and_then(|parent| parent.strip_prefix(input_root).ok())
    {
        path.push(relative);
    }

    let mut name = file
        .file_stem()
        .map(|stem| stem.to_os_string())
        .unwrap_or_else(|| "output".into());
    name.push(".jpg");
    path.push(name);
    path
}

async fn write_output(dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(dest, bytes).await
}

fn open_sink(output: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout()),
    })
}
