//! WorldPreview CLI - Render a top-down preview of a generated world
//!
//! Renders a seeded synthetic terrain through the tiled preview engine and
//! writes the result as a PNG.

mod error;
mod layers;
mod terrain;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;
use worldpreview::config::PreviewConfig;
use worldpreview::geometry::TileLayout;
use worldpreview::raster::VisualLayer;
use worldpreview::{PreviewEngine, RenderJob};

use crate::error::CliError;
use crate::layers::{ContourLayer, ElevationLayer};
use crate::terrain::{HeightSample, TerrainSource};

/// Resolution of the progress bar.
const PROGRESS_STEPS: u64 = 1000;

#[derive(Parser, Debug)]
#[command(name = "worldpreview")]
#[command(about = "Render a top-down preview of a generated world", long_about = None)]
struct Args {
    /// Output width in pixels
    #[arg(long, default_value = "512")]
    width: u32,

    /// Output height in pixels
    #[arg(long, default_value = "512")]
    height: u32,

    /// World pixels per output pixel
    #[arg(long, default_value = "1")]
    scale: u32,

    /// Terrain seed
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Worker threads (default: available parallelism)
    #[arg(long)]
    threads: Option<usize>,

    /// INI file with a [preview] section
    #[arg(long)]
    config: Option<PathBuf>,

    /// Square tile size in world pixels (overrides the config file)
    #[arg(long)]
    tile_size: Option<u32>,

    /// Skip the contour line layer
    #[arg(long)]
    hide_contours: bool,

    /// Don't show a progress bar
    #[arg(long)]
    quiet: bool,

    /// Output PNG path
    #[arg(short, long, default_value = "preview.png")]
    output: PathBuf,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging() {
        e.exit();
    }

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || on_signal.cancel()) {
        CliError::Signal(e.to_string()).exit();
    }

    if let Err(e) = run(&args, &shutdown) {
        e.exit();
    }
}

fn init_logging() -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| CliError::LoggingInit(e.to_string()))
}

/// Build the engine from `args`, render one preview and save it.
fn run(args: &Args, shutdown: &CancellationToken) -> Result<(), CliError> {
    let config = resolve_config(args)?;

    let source = Arc::new(TerrainSource::new(args.seed));
    let contours = Arc::new(ContourLayer::default());
    contours.set_visible(!args.hide_contours);
    let layers: Vec<Arc<dyn VisualLayer<HeightSample>>> =
        vec![Arc::new(ElevationLayer), contours];

    let engine = PreviewEngine::new(source, layers, config)?;
    info!(
        workers = engine.worker_count(),
        seed = args.seed,
        width = args.width,
        height = args.height,
        scale = args.scale,
        "Rendering terrain preview"
    );

    let bar = progress_bar(args.quiet);
    let sink = bar.clone();
    let job = RenderJob::new(args.width, args.height)
        .with_scale(args.scale)
        .with_cancellation(shutdown.child_token())
        .with_progress(move |fraction: f32| {
            sink.set_position((fraction * PROGRESS_STEPS as f32).round() as u64)
        });

    let result = engine.render(&job);
    engine.close();

    let image = match result {
        Ok(image) => {
            bar.finish();
            image
        }
        Err(e) => {
            bar.abandon();
            return Err(e.into());
        }
    };

    image
        .save(&args.output)
        .map_err(|error| CliError::ImageWrite {
            path: args.output.clone(),
            error,
        })?;

    println!(
        "Wrote {}×{} preview to {}",
        image.width(),
        image.height(),
        args.output.display()
    );
    Ok(())
}

/// Config file first, then command line overrides.
fn resolve_config(args: &Args) -> Result<PreviewConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => PreviewConfig::load_from(path)?,
        None => PreviewConfig::default(),
    };

    if let Some(threads) = args.threads {
        if threads == 0 {
            return Err(CliError::InvalidArgs("--threads must be at least 1".to_string()));
        }
        config = config.with_worker_threads(threads);
    }

    if let Some(size) = args.tile_size {
        if size == 0 {
            return Err(CliError::InvalidArgs("--tile-size must be at least 1".to_string()));
        }
        let height = config.tile_layout.height();
        config = config.with_tile_layout(TileLayout::new(size, size).with_height(height));
    }

    Ok(config)
}

fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(PROGRESS_STEPS);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {percent:>3}% {msg}")
    {
        bar.set_style(style);
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("worldpreview").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_default_args() {
        let args = parse(&[]);
        assert_eq!((args.width, args.height, args.scale), (512, 512, 1));
        assert_eq!(args.output, PathBuf::from("preview.png"));
        assert!(!args.hide_contours);
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[preview]\nthreads = 2\ntile_width = 48\ntile_height = 96").unwrap();
        file.flush().unwrap();
        let path = file.path().to_str().unwrap();

        let args = parse(&["--config", path, "--threads", "3", "--tile-size", "16"]);
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.worker_count(), 3);
        assert_eq!(config.tile_layout, TileLayout::new(16, 16).with_height(96));
    }

    #[test]
    fn test_zero_threads_rejected() {
        let args = parse(&["--threads", "0"]);
        assert!(matches!(resolve_config(&args), Err(CliError::InvalidArgs(_))));
    }

    #[test]
    fn test_run_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.png");
        let args = parse(&[
            "--width",
            "48",
            "--height",
            "40",
            "--tile-size",
            "16",
            "--threads",
            "2",
            "--quiet",
            "--output",
            output.to_str().unwrap(),
        ]);

        run(&args, &CancellationToken::new()).unwrap();

        let image = image::open(&output).unwrap();
        assert_eq!((image.width(), image.height()), (48, 40));
    }

    #[test]
    fn test_run_cancelled_by_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("never.png");
        let args = parse(&["--quiet", "--output", output.to_str().unwrap()]);
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let err = run(&args, &shutdown).unwrap_err();
        assert_eq!(err.exit_code(), error::EXIT_CANCELLED);
        assert!(!output.exists());
    }
}
