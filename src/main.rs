use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use oof_preprocess::catalog::{self, ImageCatalog};
use oof_preprocess::config::Config;
use oof_preprocess::preprocessing::steps::grayscale;
use oof_preprocess::transforms::{PrettyOofTransform, TransformRegistry};
use oof_preprocess::{server, Pipeline};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "oof-preprocess")]
#[command(about = "Binarized edge/foreground masks for raster images")]
#[command(version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one image through a transform (the mask pipeline by default)
    Process(ProcessArgs),
    /// List the images found in a directory
    List {
        /// Directory to scan
        dir: PathBuf,
    },
    /// Apply a transform to every image in a directory, one after another
    Batch(BatchArgs),
    /// Serve transforms over HTTP
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Input image
    pub input: PathBuf,

    /// Directory to write pretty_oof_preprocess.png into
    #[arg(long, env = "OOF_SAVE_DIR")]
    pub save_dir: Option<PathBuf>,

    /// Write the transform output to this file instead
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Transform to apply
    #[arg(long, short, default_value = PrettyOofTransform::NAME)]
    pub transform: String,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Directory of input images
    pub dir: PathBuf,

    /// Directory receiving one PNG per input
    #[arg(long)]
    pub output_dir: PathBuf,

    /// Transform to apply
    #[arg(long, short, default_value = PrettyOofTransform::NAME)]
    pub transform: String,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Host address to bind to
    #[arg(long, env = "OOF_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "OOF_PORT", default_value = "9393")]
    pub port: u16,

    /// Maximum upload size in bytes (default: 50MB)
    #[arg(long, env = "OOF_MAX_FILE_SIZE", default_value = "52428800")]
    pub max_file_size: usize,

    /// Transform used when a request does not name one
    #[arg(long, env = "OOF_DEFAULT_TRANSFORM", default_value = PrettyOofTransform::NAME)]
    pub default_transform: String,
}

impl From<ServeArgs> for Config {
    fn from(args: ServeArgs) -> Self {
        Self {
            host: args.host,
            port: args.port,
            max_file_size: args.max_file_size,
            default_transform: args.default_transform,
        }
    }
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
        Command::Process(args) => process(args),
        Command::List { dir } => list(dir),
        Command::Batch(args) => batch(args),
        Command::Serve(args) => {
            let config = Config::from(args);
            tracing::info!("Starting oof-preprocess v{}", env!("CARGO_PKG_VERSION"));
            tracing::info!("Binding to {}", config.addr());
            server::run(config).await
        }
    }
}

fn process(args: ProcessArgs) -> anyhow::Result<()> {
    let image = catalog::load_oriented(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    if args.transform == PrettyOofTransform::NAME {
        // Channel reduction is the caller's job; the pipeline wants one plane
        let gray = grayscale::reduce_channels(image);
        let result = Pipeline::new().process(&gray, args.save_dir.as_deref())?;

        if let Some(output) = &args.output {
            result
                .mask
                .save(output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
        }

        if args.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!(
                "{}x{} mask in {}ms",
                result.mask.width(),
                result.mask.height(),
                result.total_time_ms
            );
            if let Some(path) = &result.saved_to {
                println!("saved {}", path.display());
            }
        }
        for warning in &result.warnings {
            eprintln!("warning: {}", warning);
        }
        return Ok(());
    }

    let registry = TransformRegistry::with_builtins();
    let transform = registry.resolve(&args.transform)?;
    let output = transform.apply(image)?;

    let target = args
        .output
        .or_else(|| args.save_dir.map(|dir| dir.join(format!("{}.png", args.transform))))
        .context("--output or --save-dir is required for this transform")?;
    output
        .save(&target)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "transform": args.transform,
                "width": output.width(),
                "height": output.height(),
                "saved_to": target,
            })
        );
    } else {
        println!("saved {}", target.display());
    }
    Ok(())
}

fn list(dir: PathBuf) -> anyhow::Result<()> {
    let catalog = ImageCatalog::scan(&dir)?;
    if catalog.is_empty() {
        println!("No images found in {}", dir.display());
        return Ok(());
    }
    for (i, path) in catalog.entries().iter().enumerate() {
        println!("{:>4}  {}", i + 1, path.display());
    }
    Ok(())
}

fn batch(args: BatchArgs) -> anyhow::Result<()> {
    let registry = TransformRegistry::with_builtins();
    let transform = registry.resolve(&args.transform)?;
    let mut catalog = ImageCatalog::scan(&args.dir)?;

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    let mut done = 0usize;
    let mut failed = 0usize;

    while let Some(path) = catalog.current().map(PathBuf::from) {
        tracing::info!("{}: {}", catalog.progress(), path.display());

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("image-{}", catalog.index()));
        let target = args.output_dir.join(format!("{}.png", stem));

        let outcome = catalog::load_oriented(&path)
            .and_then(|image| transform.apply(image))
            .and_then(|output| {
                output.save(&target).map_err(|e| {
                    oof_preprocess::PreprocessError::SaveFailed {
                        path: target.clone(),
                        reason: e.to_string(),
                    }
                })
            });

        match outcome {
            Ok(()) => done += 1,
            Err(err) => {
                tracing::warn!("Skipping {}: {}", path.display(), err);
                failed += 1;
            }
        }

        if catalog.index() + 1 >= catalog.len() {
            break;
        }
        catalog.next();
    }

    println!("{} processed, {} failed", done, failed);
    Ok(())
}
