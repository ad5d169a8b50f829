use crate::color::{hsv_to_rgb, rgb_to_hsv};
use crate::error::RestoreError;
use image::{Rgb, RgbImage};

/// Saturation multiplier applied in HSV space
const SATURATION_GAIN: f32 = 1.15;

/// Boost the HSV saturation channel, clamped to the valid range
pub fn apply(image: RgbImage) -> Result<RgbImage, RestoreError> {
    Ok(scale_saturation(image, SATURATION_GAIN))
}

fn scale_saturation(mut image: RgbImage, gain: f32) -> RgbImage {
    for pixel in image.pixels_mut() {
        let (h, s, v) = rgb_to_hsv(pixel.0);
        *pixel = Rgb(hsv_to_rgb(h, (s * gain).min(1.0), v));
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturation_boost_keeps_value_and_hue() {
        let img = RgbImage::from_pixel(2, 2, Rgb([200, 120, 100]));
        let out = apply(img).unwrap();
        let p = out.get_pixel(0, 0).0;

        assert_eq!(p[0], 200, "value (max channel) should not change");
        assert!(p[2] < 100, "min channel should drop, got {:?}", p);
        assert!(p[1] < 120 && p[1] > p[2]);
    }

    #[test]
    fn test_saturation_is_clamped() {
        let img = RgbImage::from_pixel(1, 1, Rgb([255, 0, 10]));
        let out = scale_saturation(img, 3.0);
        assert_eq!(out.get_pixel(0, 0).0[1], 0);
    }

    #[test]
    fn test_gray_stays_gray() {
        let img = RgbImage::from_pixel(3, 3, Rgb([128, 128, 128]));
        assert_eq!(apply(img.clone()).unwrap(), img);
    }
}
