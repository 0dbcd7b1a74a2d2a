use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use intensifies::models::{mime_for_file_name, DataUri, IntensifyConfig};
use intensifies::services::{
    GifRecompressor, GifsicleRecompressor, IntensifyPipeline, PaletteReducer,
};

#[derive(Parser)]
#[command(name = "intensifies")]
#[command(about = "Turn an image into a shaking \"intensifies\" GIF")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an image file to an animated GIF
    Render {
        /// Input image (PNG, JPEG, GIF, WebP, ...)
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for the output GIF
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Byte budget for the output
        #[arg(long)]
        max_bytes: Option<usize>,

        /// Number of frames (8-12)
        #[arg(short, long)]
        frames: Option<usize>,

        /// Use an external gifsicle binary for lossy re-compression
        #[arg(long)]
        gifsicle: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as YAML
    Config {
        /// YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Render {
            input,
            output_dir,
            config,
            max_bytes,
            frames,
            gifsicle,
            json,
        }) => {
            run_render_command(
                &input,
                &output_dir,
                config_path(config).as_deref(),
                max_bytes,
                frames,
                gifsicle,
                json,
            )
            .await
        }
        Some(Commands::Config { config }) => run_config_command(config_path(config).as_deref()),
        None => {
            run_status_command();
            Ok(())
        }
    }
}

/// `--config` wins over `INTENSIFIES_CONFIG`
fn config_path(flag: Option<PathBuf>) -> Option<PathBuf> {
    flag.or_else(|| std::env::var("INTENSIFIES_CONFIG").ok().map(PathBuf::from))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intensifies=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

/// Render one image file to `<output_dir>/<name>_intensifies.gif`
async fn run_render_command(
    input: &Path,
    output_dir: &Path,
    config_path: Option<&Path>,
    max_bytes: Option<usize>,
    frames: Option<usize>,
    gifsicle: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    init_tracing();

    let mut config = IntensifyConfig::load_or_default(config_path);
    if let Some(max_bytes) = max_bytes {
        config.max_file_size_bytes = max_bytes;
    }
    if let Some(frames) = frames {
        config.frame_count = frames;
    }
    config.validate()?;

    let recompressor: Arc<dyn GifRecompressor> = match gifsicle {
        Some(program) => Arc::new(GifsicleRecompressor::new(program)),
        None => Arc::new(PaletteReducer::new()),
    };
    let pipeline = IntensifyPipeline::with_recompressor(config, recompressor);

    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow::anyhow!("Input path has no file name: {}", input.display()))?;
    let bytes = tokio::fs::read(input).await?;
    let uri = DataUri::encode(mime_for_file_name(&file_name), &bytes);

    let result = pipeline
        .generate(&uri, &file_name)
        .await
        .map_err(|e| anyhow::anyhow!("Generation failed: {e}"))?;

    tokio::fs::create_dir_all(output_dir).await?;
    let output = output_dir.join(&result.file_name);
    tokio::fs::write(&output, &result.gif_bytes).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Rendered {} ({} bytes, {} frames, lossy {})",
            output.display(),
            result.gif_bytes.len(),
            result.frame_count,
            result.lossy_level
        );
    }

    Ok(())
}

fn run_config_command(config_path: Option<&Path>) -> anyhow::Result<()> {
    init_tracing();

    let config = IntensifyConfig::load_or_default(config_path);
    print!("{}", config.to_yaml()?);
    Ok(())
}

/// Display version and usage information
fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let config_file = std::env::var("INTENSIFIES_CONFIG").ok();
    let defaults = IntensifyConfig::default();

    println!("intensifies v{VERSION}");
    println!("Shaking GIFs from still images\n");

    println!("Environment Variables:");
    println!(
        "  INTENSIFIES_CONFIG = {}",
        config_file.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  RUST_LOG           = {}",
        std::env::var("RUST_LOG")
            .ok()
            .as_deref()
            .unwrap_or("intensifies=warn (default)")
    );

    println!("\nDefaults:");
    println!("  Size:    {}x{} px", defaults.size, defaults.size);
    println!(
        "  Frames:  {} @ {} ms",
        defaults.frame_count, defaults.frame_delay_ms
    );
    println!("  Budget:  {} bytes", defaults.max_file_size_bytes);

    println!("\nCommands:");
    println!("  intensifies render   Render an image to an intensified GIF");
    println!("  intensifies config   Print the effective configuration");
    println!("\nRun 'intensifies --help' for more details.");
}
