use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod evaluation;
mod filter;
mod filters;
mod metrics;
mod noise;
mod preprocessing;
mod server;

use evaluation::{EvaluationSettings, DEFAULT_SAMPLE_DENSITIES, DEFAULT_SEED};
use filter::WindowSize;
use filters::switching::{self, MedianStrategy};
use filters::FilterRegistry;
use preprocessing::{pipeline::DEFAULT_SIDE, Pipeline};

#[derive(Parser, Debug)]
#[command(name = "impulse-denoise")]
#[command(about = "Compare mean, median and switching median filters on salt-and-pepper noise")]
#[command(version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sweep noise densities over an image and report PSNR/MSE per filter
    Evaluate(EvaluateArgs),
    /// Restore a single grayscale image with one filter
    Restore(RestoreArgs),
    /// Run the HTTP service
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Reference image (clean)
    pub input: PathBuf,

    /// Noise densities to sweep, each within 0.0..=1.0
    #[arg(long, value_delimiter = ',', default_values_t = evaluation::DEFAULT_DENSITIES)]
    pub densities: Vec<f64>,

    /// Filter window side length (odd)
    #[arg(long, env = "DENOISE_WINDOW_SIZE", default_value_t = 3)]
    pub window_size: u32,

    /// Seed for noise injection
    #[arg(long, env = "DENOISE_SEED", default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Filters to compare (default: all)
    #[arg(long, value_delimiter = ',')]
    pub methods: Vec<String>,

    /// Width the reference image is resized to
    #[arg(long, default_value_t = DEFAULT_SIDE)]
    pub width: u32,

    /// Height the reference image is resized to
    #[arg(long, default_value_t = DEFAULT_SIDE)]
    pub height: u32,

    /// Keep the native resolution instead of resizing
    #[arg(long, conflicts_with_all = ["width", "height"])]
    pub no_resize: bool,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Directory to write sample noisy/restored PNGs into
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Densities written as sample images when --output-dir is set
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_SAMPLE_DENSITIES)]
    pub sample_densities: Vec<f64>,
}

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Noisy input image
    pub input: PathBuf,

    /// Where to write the restored PNG
    pub output: PathBuf,

    /// Filter to apply (mean, median, switching)
    #[arg(long, default_value = "switching")]
    pub method: String,

    /// Filter window side length (odd)
    #[arg(long, env = "DENOISE_WINDOW_SIZE", default_value_t = 3)]
    pub window_size: u32,

    /// Median evaluation strategy for the switching filter
    #[arg(long, value_enum)]
    pub strategy: Option<MedianStrategy>,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Host address to bind to
    #[arg(long, env = "DENOISE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "DENOISE_PORT", default_value = "9393")]
    pub port: u16,

    /// Maximum upload size in bytes (default: 20MB)
    #[arg(long, env = "DENOISE_MAX_FILE_SIZE", default_value = "20971520")]
    pub max_file_size: usize,

    /// Window size used when a request does not give one
    #[arg(long, env = "DENOISE_WINDOW_SIZE", default_value_t = 3)]
    pub default_window_size: u32,

    /// Seed used when an evaluation request does not give one
    #[arg(long, env = "DENOISE_SEED", default_value_t = DEFAULT_SEED)]
    pub default_seed: u64,

    /// Side length uploads are resized to before evaluation
    #[arg(long, env = "DENOISE_EVALUATION_SIDE", default_value_t = DEFAULT_SIDE)]
    pub evaluation_side: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Evaluate(args) => run_evaluate(args),
        Command::Restore(args) => run_restore(args),
        Command::Serve(args) => {
            let config = config::Config::try_from(args)?;

            tracing::info!("Starting impulse-denoise v{}", env!("CARGO_PKG_VERSION"));
            tracing::info!("Binding to {}:{}", config.host, config.port);

            server::run(config).await
        }
    }
}

fn run_evaluate(args: EvaluateArgs) -> anyhow::Result<()> {
    let settings = EvaluationSettings {
        densities: args.densities,
        window: WindowSize::new(args.window_size)?,
        seed: args.seed,
        methods: args.methods,
    };

    let pipeline = if args.no_resize {
        Pipeline::native()
    } else {
        Pipeline::resized(args.width, args.height)
    };
    let loaded = pipeline.load(&args.input)?;
    tracing::info!(
        "Loaded {} as {}x{} grayscale in {}ms",
        args.input.display(),
        loaded.image.width(),
        loaded.image.height(),
        loaded.total_time_ms
    );

    let registry = FilterRegistry::new();
    let report = evaluation::evaluate(&loaded.image, &registry, &settings)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_table());
    }

    if let Some(dir) = args.output_dir {
        evaluation::write_samples(
            &loaded.image,
            &registry,
            &settings,
            &args.sample_densities,
            &dir,
        )?;
    }

    Ok(())
}

fn run_restore(args: RestoreArgs) -> anyhow::Result<()> {
    let window = WindowSize::new(args.window_size)?;
    let registry = FilterRegistry::new();
    let filter = switching::with_strategy(registry.require(&args.method)?, args.strategy)?;

    let loaded = Pipeline::native().load(&args.input)?;
    let restored = filter.apply(&loaded.image, window)?;

    restored
        .save_with_format(&args.output, image::ImageFormat::Png)
        .map_err(|e| {
            error::DenoiseError::ImageEncode(format!("{}: {}", args.output.display(), e))
        })?;

    tracing::info!(
        "Restored {} with {} ({}) -> {}",
        args.input.display(),
        filter.name(),
        window,
        args.output.display()
    );

    Ok(())
}
