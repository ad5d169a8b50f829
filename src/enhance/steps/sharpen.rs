use crate::error::RestoreError;
use image::RgbImage;
use imageproc::filter::filter3x3;

/// Strong 3x3 sharpening kernel: center weight 9, all eight neighbors -1
const KERNEL: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 9.0, -1.0, -1.0, -1.0, -1.0];

/// Apply the sharpening convolution to every channel
pub fn apply(image: RgbImage) -> Result<RgbImage, RestoreError> {
    let sharpened: RgbImage = filter3x3(&image, &KERNEL);
    Ok(sharpened)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_sharpen_enhances_edges() {
        // Left half dark, right half light
        let img = RgbImage::from_fn(20, 10, |x, _| {
            if x < 10 {
                Rgb([50, 60, 70])
            } else {
                Rgb([200, 190, 180])
            }
        });

        let result = apply(img).unwrap();

        let edge_left = result.get_pixel(9, 5).0[0];
        let edge_right = result.get_pixel(10, 5).0[0];

        let original_diff = 200i32 - 50;
        let result_diff = (edge_right as i32 - edge_left as i32).abs();

        assert!(
            result_diff >= original_diff,
            "Edge should be enhanced: {} >= {}",
            result_diff,
            original_diff
        );
    }

    #[test]
    fn test_sharpen_keeps_flat_regions() {
        let img = RgbImage::from_pixel(8, 8, Rgb([90, 120, 150]));
        let result = apply(img.clone()).unwrap();
        assert_eq!(result.get_pixel(4, 4), img.get_pixel(4, 4));
    }
}
