use crate::color::LabImage;
use crate::error::RestoreError;
use image::RgbImage;

/// Added to the 8-bit lightness channel
const LIGHTNESS_OFFSET: u8 = 35;
/// Multiplier for both 8-bit encoded chroma channels
const CHROMA_GAIN: f32 = 1.5;

/// Lift lightness and amplify the chroma channels in Lab space
///
/// The gain is applied to the offset-encoded a/b values, which both
/// amplifies chroma and warms the whole image toward red and yellow.
pub fn apply(image: RgbImage) -> Result<RgbImage, RestoreError> {
    let mut lab = LabImage::from_rgb(&image);

    for l in lab.l.iter_mut() {
        *l = l.saturating_add(LIGHTNESS_OFFSET);
    }
    for v in lab.a.iter_mut().chain(lab.b.iter_mut()) {
        *v = (*v as f32 * CHROMA_GAIN).clamp(0.0, 255.0) as u8;
    }

    Ok(lab.to_rgb())
}
