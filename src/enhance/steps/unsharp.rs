use crate::error::RestoreError;
use image::RgbImage;
use imageproc::filter::gaussian_blur_f32;

/// Blur radius (Gaussian sigma) of the mask
const RADIUS: f32 = 2.0;
/// Sharpening strength in percent
const PERCENT: f32 = 150.0;
/// Minimum per-channel difference before a pixel is sharpened
const THRESHOLD: u8 = 2;

/// Unsharp mask: amplify the difference between the image and a blurred copy
pub fn apply(image: RgbImage) -> Result<RgbImage, RestoreError> {
    unsharp_mask(image, RADIUS, PERCENT, THRESHOLD)
}

fn unsharp_mask(
    mut image: RgbImage,
    radius: f32,
    percent: f32,
    threshold: u8,
) -> Result<RgbImage, RestoreError> {
    if radius <= 0.0 {
        return Err(RestoreError::InvalidParameter(format!(
            "unsharp radius must be positive, got {}",
            radius
        )));
    }
    if image.width() == 0 || image.height() == 0 {
        return Ok(image);
    }

    let blurred = gaussian_blur_f32(&image, radius);
    let amount = percent / 100.0;

    for (pixel, blur) in image.pixels_mut().zip(blurred.pixels()) {
        for c in 0..3 {
            let orig = pixel.0[c] as f32;
            let diff = orig - blur.0[c] as f32;
            if diff.abs() >= threshold as f32 {
                pixel.0[c] = (orig + diff * amount).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    Ok(image)
}
