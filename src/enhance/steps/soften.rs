use crate::error::RestoreError;
use image::RgbImage;
use imageproc::filter::separable_filter_equal;

/// Gaussian kernel width
const KERNEL_SIZE: usize = 5;
/// Weight of the input in the blend; the blurred copy gets the rest
const ORIGINAL_WEIGHT: f32 = 0.7;

/// Soften larger damage by blending the image with a blurred copy of itself
pub fn apply(image: RgbImage) -> Result<RgbImage, RestoreError> {
    let kernel = gaussian_kernel(KERNEL_SIZE);
    let blurred: RgbImage = separable_filter_equal(&image, &kernel);
    Ok(blend(image, &blurred, ORIGINAL_WEIGHT))
}

/// Normalized 1D Gaussian with sigma derived from the kernel size
fn gaussian_kernel(size: usize) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (size / 2) as f32;
    let raw: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f32 = raw.iter().sum();
    raw.into_iter().map(|v| v / total).collect()
}

fn blend(mut image: RgbImage, other: &RgbImage, weight: f32) -> RgbImage {
    for (pixel, other) in image.pixels_mut().zip(other.pixels()) {
        for c in 0..3 {
            let v = pixel.0[c] as f32 * weight + other.0[c] as f32 * (1.0 - weight);
            pixel.0[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    image
}
