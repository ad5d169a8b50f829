//! Image decoding and atomic JPEG output

use crate::error::RestoreError;
use image::{DynamicImage, ImageReader, RgbImage};
use jpeg_encoder::{ColorType, Encoder};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Decode an image file, detecting the format from its contents
pub fn load_image(path: &Path) -> Result<DynamicImage, RestoreError> {
    if !path.exists() {
        return Err(RestoreError::InputNotFound(path.to_path_buf()));
    }

    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| RestoreError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Encode to JPEG in memory with optimized Huffman tables
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, RestoreError> {
    encode_with(image, quality, true)
}

fn encode_with(image: &RgbImage, quality: u8, optimized: bool) -> Result<Vec<u8>, RestoreError> {
    let (width, height) = image.dimensions();
    let too_large = || {
        RestoreError::Encode(format!(
            "{}x{} exceeds the JPEG limit of 65535 pixels per side",
            width, height
        ))
    };
    let width = u16::try_from(width).map_err(|_| too_large())?;
    let height = u16::try_from(height).map_err(|_| too_large())?;

    let mut buffer = Vec::new();
    let mut encoder = Encoder::new(&mut buffer, quality);
    encoder.set_optimized_huffman_tables(optimized);
    encoder
        .encode(image.as_raw(), width, height, ColorType::Rgb)
        .map_err(|e| RestoreError::Encode(e.to_string()))?;
    Ok(buffer)
}

/// Write the image as JPEG, returning the number of bytes written
///
/// The file is written next to the destination and renamed into place,
/// so a failure never leaves a partial output behind.
pub fn save_jpeg(image: &RgbImage, path: &Path, quality: u8) -> Result<u64, RestoreError> {
    let encoded = encode_jpeg(image, quality)?;
    write_atomic(path, &encoded)?;
    Ok(encoded.len() as u64)
}

/// Write bytes to a temp file in the destination directory, then persist it
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RestoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let temp_file = tempfile::Builder::new()
        .prefix(".texture-restore")
        .suffix(".part")
        .tempfile_in(dir)?;

    {
        let mut writer = BufWriter::new(temp_file.as_file());
        writer.write_all(bytes)?;
        writer.flush()?;
    }

    temp_file
        .persist(path)
        .map_err(|e| RestoreError::Io(e.error))?;

    Ok(())
}
