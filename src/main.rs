use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use panorama::viewer::PanoramaViewer;
use panorama::{Config, EventBus, Toolbox};

#[derive(Parser, Debug)]
#[command(version, about = "Cycle through 360° panoramas with fade transitions")]
struct Args {
    /// Directory containing the panoramas
    image_dir: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overlay opacity change per second
    #[arg(long)]
    fade_speed: Option<f32>,

    /// Index of the first panorama to show
    #[arg(long)]
    start_index: Option<usize>,

    /// Show the panoramas in random order
    #[arg(long)]
    shuffle: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(dir) = self.image_dir {
            config.image_dir = Some(dir);
        }
        if let Some(speed) = self.fade_speed {
            config.fade_speed = speed;
        }
        if let Some(index) = self.start_index {
            config.start_index = index;
        }
        config.shuffle |= self.shuffle;

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = args.into_config().context("failed to build configuration")?;
    let images = config.image_set().context("failed to collect panoramas")?;
    info!(count = images.len(), fade_speed = config.fade_speed, "configured");

    let mut toolbox = Toolbox::new();
    let bus = toolbox
        .get_or_default::<EventBus>()
        .context("event bus missing from toolbox")?;

    let mut viewer = PanoramaViewer::new(&config, images, bus).context("failed to open viewer")?;
    viewer.run()?;
    Ok(())
}
