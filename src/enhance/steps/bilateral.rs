use crate::error::RestoreError;
use image::{Rgb, RgbImage};

/// Filter window diameter in pixels
const DIAMETER: u32 = 9;
/// Sigma of the color-similarity weight
const SIGMA_COLOR: f32 = 75.0;
/// Sigma of the spatial weight
const SIGMA_SPACE: f32 = 75.0;

/// Edge-preserving bilateral smoothing
/// Suppresses fine cracks and speckle while keeping painted outlines sharp
pub fn apply(image: RgbImage) -> Result<RgbImage, RestoreError> {
    Ok(bilateral(&image, DIAMETER, SIGMA_COLOR, SIGMA_SPACE))
}

fn bilateral(image: &RgbImage, diameter: u32, sigma_color: f32, sigma_space: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let radius = (diameter / 2) as i32;

    // Circular window of offsets with their spatial weights
    let space_coeff = -0.5 / (sigma_space * sigma_space);
    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r2 = (dx * dx + dy * dy) as f32;
            if r2.sqrt() <= radius as f32 {
                offsets.push((dx, dy, (r2 * space_coeff).exp()));
            }
        }
    }

    // Color weight indexed by the L1 distance over the three channels
    let color_coeff = -0.5 / (sigma_color * sigma_color);
    let color_weights: Vec<f32> = (0..=255 * 3)
        .map(|d| ((d * d) as f32 * color_coeff).exp())
        .collect();

    let max_x = width as i32 - 1;
    let max_y = height as i32 - 1;

    RgbImage::from_fn(width, height, |x, y| {
        let center = image.get_pixel(x, y).0;
        let mut sum = [0.0f32; 3];
        let mut weight_sum = 0.0f32;

        for &(dx, dy, space_weight) in &offsets {
            let nx = (x as i32 + dx).clamp(0, max_x) as u32;
            let ny = (y as i32 + dy).clamp(0, max_y) as u32;
            let p = image.get_pixel(nx, ny).0;

            let distance: usize = (0..3)
                .map(|c| (p[c] as i32 - center[c] as i32).unsigned_abs() as usize)
                .sum();
            let w = space_weight * color_weights[distance];

            for c in 0..3 {
                sum[c] += p[c] as f32 * w;
            }
            weight_sum += w;
        }

        Rgb(sum.map(|s| (s / weight_sum).round().clamp(0.0, 255.0) as u8))
    })
}
