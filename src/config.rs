use crate::enhance::Preset;
use crate::error::RestoreError;
use crate::{Args, Command};
use std::path::PathBuf;

/// JPEG quality used for every output
pub const JPEG_QUALITY: u8 = 95;

/// Which pipeline a run executes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// One of the filter pipelines
    Enhance(Preset),
    /// Super-resolution by an integer factor
    Upscale { scale: u32, model: ModelConfig },
}

/// Where the super-resolution weights live and where to fetch them from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub path: Option<PathBuf>,
    pub url: String,
}

/// Run configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub input: PathBuf,
    pub output: PathBuf,
    pub json: bool,
}

impl TryFrom<Args> for Config {
    type Error = RestoreError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let (mode, input, output) = match args.command {
            Command::Basic { input, output } => (Mode::Enhance(Preset::Basic), input, output),
            Command::Advanced { input, output } => {
                (Mode::Enhance(Preset::Advanced), input, output)
            }
            Command::Restore { input, output } => {
                (Mode::Enhance(Preset::Aggressive), input, output)
            }
            Command::Upscale {
                input,
                output,
                scale,
                model_path,
                model_url,
            } => {
                let scale = parse_scale(&scale)?;
                let model = ModelConfig {
                    path: model_path,
                    url: model_url,
                };
                (Mode::Upscale { scale, model }, input, output)
            }
        };

        Ok(Self {
            mode,
            input,
            output,
            json: args.json,
        })
    }
}

fn parse_scale(s: &str) -> Result<u32, RestoreError> {
    match s.trim() {
        "2" => Ok(2),
        "4" => Ok(4),
        other => Err(RestoreError::InvalidParameter(format!(
            "upscale factor must be 2 or 4, got {}",
            other
        ))),
    }
}
