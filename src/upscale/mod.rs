//! AI super-resolution
//!
//! The network sits behind [`SuperResolution`]; [`Upscaler`] handles
//! tiling and rescaling so any backend works on images of any size.

pub mod backend;
pub mod model;
#[cfg(feature = "ai-upscale")]
pub mod onnx;
pub mod tiling;

pub use backend::SuperResolution;
pub use model::{default_model_path, ensure_model_downloaded, DEFAULT_MODEL_URL};
pub use tiling::Upscaler;

use crate::error::RestoreError;
use std::path::Path;

/// Whether this build can run super-resolution at all
pub fn is_available() -> bool {
    cfg!(feature = "ai-upscale")
}

/// Load the configured backend from downloaded weights
#[cfg(feature = "ai-upscale")]
pub fn load_backend(model_path: &Path) -> Result<Box<dyn SuperResolution>, RestoreError> {
    Ok(Box::new(onnx::OnnxUpscaler::load(model_path)?))
}

#[cfg(not(feature = "ai-upscale"))]
pub fn load_backend(_model_path: &Path) -> Result<Box<dyn SuperResolution>, RestoreError> {
    Err(RestoreError::Unavailable(
        "AI upscaling is not compiled in (build with --features ai-upscale)".to_string(),
    ))
}
