use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RestoreError {
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Failed to decode image {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("Capability unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to download model: {0}")]
    ModelDownload(String),

    #[error("Failed to load model: {0}")]
    #[cfg_attr(not(feature = "ai-upscale"), allow(dead_code))]
    ModelLoad(String),

    #[error("Processing failed in step '{step}': {reason}")]
    Processing { step: &'static str, reason: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to encode output: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RestoreError {
    /// Errors a caller may answer by switching to a simpler pipeline
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Decode { .. })
    }

    /// Short machine-readable code, used in JSON reports
    pub fn code(&self) -> &'static str {
        match self {
            Self::InputNotFound(_) => "INPUT_NOT_FOUND",
            Self::Decode { .. } => "DECODE_ERROR",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::ModelDownload(_) => "MODEL_DOWNLOAD_ERROR",
            Self::ModelLoad(_) => "MODEL_LOAD_ERROR",
            Self::Processing { .. } => "PROCESSING_ERROR",
            Self::InvalidParameter(_) => "INVALID_PARAMETER",
            Self::Encode(_) => "ENCODE_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }
}
