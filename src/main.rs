use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod color;
mod config;
mod enhance;
mod error;
mod io;
mod runner;
mod upscale;

#[derive(Parser, Debug)]
#[command(name = "texture-restore")]
#[command(about = "Enhance and restore exhibit texture photographs")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Print the run report as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Median denoise followed by contrast, color, sharpness and brightness boosts
    Basic {
        /// Image to enhance
        input: PathBuf,
        /// Destination JPEG
        output: PathBuf,
    },

    /// Non-local-means denoise, CLAHE, sharpening and saturation boost
    /// (falls back to `basic` when unavailable)
    Advanced {
        /// Image to enhance
        input: PathBuf,
        /// Destination JPEG
        output: PathBuf,
    },

    /// Aggressive "as-new" restoration with strong color and lightness boosts
    Restore {
        /// Image to restore
        input: PathBuf,
        /// Destination JPEG
        output: PathBuf,
    },

    /// Real-ESRGAN super-resolution
    Upscale {
        /// Image to upscale
        input: PathBuf,
        /// Destination JPEG
        output: PathBuf,

        /// Upscale factor
        #[arg(long, default_value = "2", value_parser = clap::builder::PossibleValuesParser::new(["2", "4"]))]
        scale: String,

        /// Path to the model weights (defaults to the user cache directory)
        #[arg(long, env = "TEXTURE_RESTORE_MODEL_PATH")]
        model_path: Option<PathBuf>,

        /// Where to fetch the model weights from when they are missing
        #[arg(long, env = "TEXTURE_RESTORE_MODEL_URL", default_value = upscale::DEFAULT_MODEL_URL)]
        model_url: String,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = config::Config::try_from(args)?;

    tracing::info!("texture-restore v{}", env!("CARGO_PKG_VERSION"));

    let report = match runner::run(&config) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(code = e.code(), "{}", e);
            std::process::exit(1);
        }
    };

    if config.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
