use crate::error::RestoreError;
use image::RgbImage;

/// Trait that all super-resolution backends must implement
///
/// A backend maps one RGB tile to a tile `native_scale` times larger in
/// each dimension. Tiling, padding and rescaling to other factors are
/// handled by [`super::Upscaler`].
pub trait SuperResolution {
    /// Returns the backend identifier (e.g., "realesrgan-onnx")
    fn name(&self) -> &'static str;

    /// The fixed factor the model upscales by
    fn native_scale(&self) -> u32;

    /// Width and height the model requires, when it only accepts one size
    fn fixed_input(&self) -> Option<(u32, u32)> {
        None
    }

    /// Upscale a single tile
    fn infer(&mut self, tile: &RgbImage) -> Result<RgbImage, RestoreError>;
}

impl<T: SuperResolution + ?Sized> SuperResolution for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn native_scale(&self) -> u32 {
        (**self).native_scale()
    }

    fn fixed_input(&self) -> Option<(u32, u32)> {
        (**self).fixed_input()
    }

    fn infer(&mut self, tile: &RgbImage) -> Result<RgbImage, RestoreError> {
        (**self).infer(tile)
    }
}
