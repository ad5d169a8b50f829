//! Color space conversions used by the restoration steps
//!
//! Lab values use the common 8-bit encoding: L scaled to 0..=255,
//! a and b offset by 128. D65 white point, sRGB transfer curve.

use crate::error::RestoreError;
use image::{GrayImage, Rgb, RgbImage};
use palette::white_point::D65;
use palette::{Hsv, IntoColor, Lab, LinSrgb, Srgb};

/// Planar 8-bit Lab image
#[derive(Debug, Clone, PartialEq)]
pub struct LabImage {
    width: u32,
    height: u32,
    pub l: Vec<u8>,
    pub a: Vec<u8>,
    pub b: Vec<u8>,
}

impl LabImage {
    pub fn from_rgb(rgb: &RgbImage) -> Self {
        let (width, height) = rgb.dimensions();
        let len = (width * height) as usize;
        let mut l = Vec::with_capacity(len);
        let mut a = Vec::with_capacity(len);
        let mut b = Vec::with_capacity(len);

        for pixel in rgb.pixels() {
            let [pl, pa, pb] = rgb_to_lab8(pixel.0);
            l.push(pl);
            a.push(pa);
            b.push(pb);
        }

        Self {
            width,
            height,
            l,
            a,
            b,
        }
    }

    pub fn to_rgb(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let i = (y * self.width + x) as usize;
            Rgb(lab8_to_rgb([self.l[i], self.a[i], self.b[i]]))
        })
    }

    /// Lightness plane as a grayscale image
    pub fn lightness(&self) -> Result<GrayImage, RestoreError> {
        GrayImage::from_raw(self.width, self.height, self.l.clone()).ok_or_else(|| {
            RestoreError::Processing {
                step: "lab",
                reason: format!(
                    "lightness plane holds {} values for a {}x{} image",
                    self.l.len(),
                    self.width,
                    self.height
                ),
            }
        })
    }

    /// Replace the lightness plane
    pub fn set_lightness(&mut self, plane: GrayImage) -> Result<(), RestoreError> {
        if plane.dimensions() != (self.width, self.height) {
            return Err(RestoreError::Processing {
                step: "lab",
                reason: format!(
                    "lightness plane is {:?}, image is {}x{}",
                    plane.dimensions(),
                    self.width,
                    self.height
                ),
            });
        }
        self.l = plane.into_raw();
        Ok(())
    }
}

/// Convert one sRGB pixel to 8-bit encoded Lab
pub fn rgb_to_lab8([r, g, b]: [u8; 3]) -> [u8; 3] {
    let lin: LinSrgb<f32> = Srgb::new(r, g, b).into_format::<f32>().into_linear();
    let lab: Lab<D65, f32> = lin.into_color();

    [
        (lab.l * 255.0 / 100.0).round().clamp(0.0, 255.0) as u8,
        (lab.a + 128.0).round().clamp(0.0, 255.0) as u8,
        (lab.b + 128.0).round().clamp(0.0, 255.0) as u8,
    ]
}

/// Convert one 8-bit encoded Lab pixel back to sRGB, clipping out-of-gamut values
pub fn lab8_to_rgb([l, a, b]: [u8; 3]) -> [u8; 3] {
    let lab = Lab::<D65, f32>::new(
        l as f32 * 100.0 / 255.0,
        a as f32 - 128.0,
        b as f32 - 128.0,
    );
    let lin: LinSrgb<f32> = lab.into_color();
    let lin = LinSrgb::new(
        lin.red.clamp(0.0, 1.0),
        lin.green.clamp(0.0, 1.0),
        lin.blue.clamp(0.0, 1.0),
    );
    let srgb: Srgb<f32> = Srgb::from_linear(lin);
    let srgb: Srgb<u8> = srgb.into_format();
    [srgb.red, srgb.green, srgb.blue]
}

/// Convert one RGB pixel to HSV; hue in degrees, saturation and value in 0..=1
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> (f32, f32, f32) {
    let hsv: Hsv = Srgb::new(r, g, b).into_format::<f32>().into_color();
    (
        hsv.hue.into_positive_degrees(),
        hsv.saturation,
        hsv.value,
    )
}

/// Convert HSV (hue in degrees) back to RGB
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let rgb: Srgb = Hsv::new(h, s.clamp(0.0, 1.0), v.clamp(0.0, 1.0)).into_color();
    let rgb: Srgb<u8> = rgb.into_format();
    [rgb.red, rgb.green, rgb.blue]
}

/// ITU-R 601 luma with 8-bit rounding
pub fn luma([r, g, b]: [u8; 3]) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}
