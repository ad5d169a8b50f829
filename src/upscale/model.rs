use crate::error::RestoreError;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Real-ESRGAN x4plus exported to ONNX
pub const DEFAULT_MODEL_URL: &str =
    "https://huggingface.co/qualcomm/Real-ESRGAN-x4plus/resolve/main/Real-ESRGAN-x4plus.onnx";

/// Filename of the cached weights
const MODEL_FILENAME: &str = "realesrgan-x4plus.onnx";

/// Smallest plausible weights file; anything below is an error page or a partial file
const MIN_MODEL_BYTES: u64 = 20_000_000;

/// Where the weights are cached when no path is configured
pub fn default_model_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("texture-restore")
        .join(MODEL_FILENAME)
}

/// Ensure model is downloaded and return its path
pub fn ensure_model_downloaded(url: &str, model_path: &Path) -> Result<PathBuf, RestoreError> {
    match std::fs::metadata(model_path) {
        Ok(meta) if meta.len() >= MIN_MODEL_BYTES => {
            tracing::info!("Using cached model from {:?}", model_path);
            return Ok(model_path.to_path_buf());
        }
        Ok(meta) => tracing::warn!(
            "Cached model {:?} is only {} bytes, downloading again",
            model_path,
            meta.len()
        ),
        Err(_) => {}
    }

    if let Some(dir) = model_path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| {
            RestoreError::ModelDownload(format!("Failed to create cache directory: {}", e))
        })?;
    }

    tracing::info!("Downloading model from {} (this may take a moment)...", url);
    let bytes = download_file(url, model_path, MIN_MODEL_BYTES)?;
    tracing::info!(
        "Downloaded {:.2} MB to {:?}",
        bytes as f64 / (1024.0 * 1024.0),
        model_path
    );

    Ok(model_path.to_path_buf())
}

/// Download a file from URL to path using ureq
///
/// The body is streamed into a temp file next to the destination, which is
/// only renamed into place once the transfer completed with at least
/// `min_bytes` bytes.
fn download_file(url: &str, path: &Path, min_bytes: u64) -> Result<u64, RestoreError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| RestoreError::ModelDownload(format!("Request to {} failed: {}", url, e)))?;

    if let Some(length) = response.body().content_length() {
        if length < min_bytes {
            return Err(RestoreError::ModelDownload(format!(
                "{} returned {} bytes, expected a model file of at least {} bytes",
                url, length, min_bytes
            )));
        }
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp_file = tempfile::Builder::new()
        .prefix(".model")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|e| RestoreError::ModelDownload(format!("Failed to create model file: {}", e)))?;

    let written = {
        let mut reader = response.into_body().into_reader();
        let mut writer = BufWriter::new(temp_file.as_file());
        let written = std::io::copy(&mut reader, &mut writer).map_err(|e| {
            RestoreError::ModelDownload(format!("Failed to read response body: {}", e))
        })?;
        writer.flush().map_err(|e| {
            RestoreError::ModelDownload(format!("Failed to write model file: {}", e))
        })?;
        written
    };

    if written < min_bytes {
        return Err(RestoreError::ModelDownload(format!(
            "{} returned {} bytes, expected a model file of at least {} bytes",
            url, written, min_bytes
        )));
    }

    temp_file
        .persist(path)
        .map_err(|e| RestoreError::ModelDownload(format!("Failed to save model file: {}", e)))?;

    Ok(written)
}
