use crate::color::luma;
use crate::error::RestoreError;
use image::{Rgb, RgbImage};

// Point enhancers blend the image against a degenerate copy:
// out = degenerate + factor * (image - degenerate).
// A factor of 1.0 leaves the image unchanged.

/// Scale contrast around the mean luma
pub fn contrast(image: RgbImage, factor: f32) -> Result<RgbImage, RestoreError> {
    check_factor("contrast", factor)?;
    let mean = mean_luma(&image);
    Ok(blend_with(image, factor, |_, _, _| [mean; 3]))
}

/// Scale color saturation away from the grayscale version
pub fn color(image: RgbImage, factor: f32) -> Result<RgbImage, RestoreError> {
    check_factor("color", factor)?;
    Ok(blend_with(image, factor, |_, _, px| [luma(px); 3]))
}

/// Scale brightness (blend toward black)
pub fn brightness(image: RgbImage, factor: f32) -> Result<RgbImage, RestoreError> {
    check_factor("brightness", factor)?;
    Ok(blend_with(image, factor, |_, _, _| [0; 3]))
}

/// Scale sharpness away from a smoothed copy
pub fn sharpness(image: RgbImage, factor: f32) -> Result<RgbImage, RestoreError> {
    check_factor("sharpness", factor)?;
    let smoothed = smooth(&image);
    Ok(blend_with(image, factor, |x, y, _| smoothed.get_pixel(x, y).0))
}

fn check_factor(name: &str, factor: f32) -> Result<(), RestoreError> {
    if factor.is_finite() && factor >= 0.0 {
        Ok(())
    } else {
        Err(RestoreError::InvalidParameter(format!(
            "{} factor must be a non-negative number, got {}",
            name, factor
        )))
    }
}

fn blend_with<F>(mut image: RgbImage, factor: f32, degenerate: F) -> RgbImage
where
    F: Fn(u32, u32, [u8; 3]) -> [u8; 3],
{
    if factor == 1.0 {
        return image;
    }

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let d = degenerate(x, y, pixel.0);
        for c in 0..3 {
            let base = d[c] as f32;
            let v = base + factor * (pixel.0[c] as f32 - base);
            pixel.0[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    image
}

fn mean_luma(image: &RgbImage) -> u8 {
    let count = image.width() as u64 * image.height() as u64;
    if count == 0 {
        return 0;
    }
    let sum: u64 = image.pixels().map(|p| luma(p.0) as u64).sum();
    ((sum as f64 / count as f64) + 0.5) as u8
}

/// 3x3 smoothing with center weight 5, all neighbors 1; border pixels are kept
fn smooth(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return image.clone();
    }

    RgbImage::from_fn(width, height, |x, y| {
        if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
            return *image.get_pixel(x, y);
        }
        let mut sum = [0u32; 3];
        for dy in 0..3 {
            for dx in 0..3 {
                let weight = if dx == 1 && dy == 1 { 5 } else { 1 };
                let p = image.get_pixel(x + dx - 1, y + dy - 1).0;
                for c in 0..3 {
                    sum[c] += p[c] as u32 * weight;
                }
            }
        }
        Rgb(sum.map(|s| ((s as f32 / 13.0) + 0.5) as u8))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 10 + 40) as u8, (y * 10 + 60) as u8, 120])
        })
    }

    #[test]
    fn test_factor_one_is_identity() {
        let img = gradient(12, 8);
        assert_eq!(contrast(img.clone(), 1.0).unwrap(), img);
        assert_eq!(color(img.clone(), 1.0).unwrap(), img);
        assert_eq!(brightness(img.clone(), 1.0).unwrap(), img);
        assert_eq!(sharpness(img.clone(), 1.0).unwrap(), img);
    }

    #[test]
    fn test_brightness_scales_channels() {
        let img = RgbImage::from_pixel(4, 4, Rgb([100, 200, 20]));
        let out = brightness(img, 1.3).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [130, 255, 26]);
    }

    #[test]
    fn test_contrast_spreads_values_around_mean() {
        let img = RgbImage::from_fn(2, 1, |x, _| if x == 0 { Rgb([80; 3]) } else { Rgb([160; 3]) });
        let out = contrast(img, 1.4).unwrap();
        // mean luma is 120
        assert_eq!(out.get_pixel(0, 0).0, [64; 3]);
        assert_eq!(out.get_pixel(1, 0).0, [176; 3]);
    }

    #[test]
    fn test_color_zero_gives_grayscale() {
        let img = RgbImage::from_pixel(3, 3, Rgb([255, 0, 0]));
        let out = color(img, 0.0).unwrap();
        assert_eq!(out.get_pixel(1, 1).0, [76, 76, 76]);
    }

    #[test]
    fn test_color_boost_increases_channel_spread() {
        let img = RgbImage::from_pixel(3, 3, Rgb([150, 110, 90]));
        let out = color(img, 3.5).unwrap();
        let p = out.get_pixel(0, 0).0;
        assert!(p[0] as i32 - p[2] as i32 > 60, "got {:?}", p);
    }

    #[test]
    fn test_sharpness_keeps_flat_image() {
        let img = RgbImage::from_pixel(6, 6, Rgb([70, 80, 90]));
        let out = sharpness(img.clone(), 1.3).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn test_negative_factor_is_rejected() {
        let err = contrast(gradient(2, 2), -1.0).unwrap_err();
        assert!(matches!(err, RestoreError::InvalidParameter(_)));
    }
}
