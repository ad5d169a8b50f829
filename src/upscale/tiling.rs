use super::backend::SuperResolution;
use crate::error::RestoreError;
use image::imageops::{self, FilterType};
use image::RgbImage;

/// Tile edge length fed to the model
pub const DEFAULT_TILE: u32 = 400;
/// Context pixels added around each tile and cropped away afterwards
pub const DEFAULT_TILE_PAD: u32 = 10;

/// Runs a super-resolution model over an image of any size
pub struct Upscaler<M> {
    model: M,
    tile: u32,
    tile_pad: u32,
}

impl<M: SuperResolution> Upscaler<M> {
    pub fn new(model: M) -> Self {
        Self::with_tiling(model, DEFAULT_TILE, DEFAULT_TILE_PAD)
    }

    pub fn with_tiling(model: M, tile: u32, tile_pad: u32) -> Self {
        Self {
            model,
            tile: tile.max(1),
            tile_pad,
        }
    }

    /// Upscale by `scale` (2 or 4)
    ///
    /// The model always runs at its native factor; other factors are
    /// reached by resampling its output with Lanczos3.
    pub fn upscale(&mut self, image: &RgbImage, scale: u32) -> Result<RgbImage, RestoreError> {
        if scale != 2 && scale != 4 {
            return Err(RestoreError::InvalidParameter(format!(
                "upscale factor must be 2 or 4, got {}",
                scale
            )));
        }

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(RestoreError::InvalidParameter(
                "cannot upscale an empty image".to_string(),
            ));
        }

        let native = self.model.native_scale();
        tracing::info!(
            "Upscaling {}x{} with {} (native x{}, requested x{})",
            width,
            height,
            self.model.name(),
            native,
            scale
        );

        let output = self.tile_process(image)?;
        if native == scale {
            return Ok(output);
        }

        Ok(imageops::resize(
            &output,
            width * scale,
            height * scale,
            FilterType::Lanczos3,
        ))
    }

    /// Tile edge lengths; a model with a fixed input size dictates them
    fn tile_size(&self) -> Result<(u32, u32), RestoreError> {
        let Some((fixed_w, fixed_h)) = self.model.fixed_input() else {
            return Ok((self.tile, self.tile));
        };

        let border = 2 * self.tile_pad;
        if fixed_w <= border || fixed_h <= border {
            return Err(RestoreError::InvalidParameter(format!(
                "model input {}x{} leaves no room for {}px tile padding",
                fixed_w, fixed_h, self.tile_pad
            )));
        }
        Ok((fixed_w - border, fixed_h - border))
    }

    /// Run the model tile by tile, stitching the un-padded centers
    fn tile_process(&mut self, image: &RgbImage) -> Result<RgbImage, RestoreError> {
        let (width, height) = image.dimensions();
        let native = self.model.native_scale();
        let fixed = self.model.fixed_input();
        let (tile_w, tile_h) = self.tile_size()?;
        let mut output = RgbImage::new(width * native, height * native);

        let tiles_x = width.div_ceil(tile_w);
        let tiles_y = height.div_ceil(tile_h);
        let total = tiles_x * tiles_y;

        for ty in 0..tiles_y {
            for tx in 0..tiles_x {
                let x0 = tx * tile_w;
                let y0 = ty * tile_h;
                let x1 = (x0 + tile_w).min(width);
                let y1 = (y0 + tile_h).min(height);

                let px0 = x0.saturating_sub(self.tile_pad);
                let py0 = y0.saturating_sub(self.tile_pad);
                let px1 = (x1 + self.tile_pad).min(width);
                let py1 = (y1 + self.tile_pad).min(height);

                let mut input =
                    imageops::crop_imm(image, px0, py0, px1 - px0, py1 - py0).to_image();
                if let Some((fixed_w, fixed_h)) = fixed {
                    input = extend_edges(&input, fixed_w, fixed_h);
                }
                let (in_w, in_h) = input.dimensions();

                let upscaled = self.model.infer(&input)?;

                let expected = (in_w * native, in_h * native);
                if upscaled.dimensions() != expected {
                    return Err(RestoreError::Processing {
                        step: "upscale",
                        reason: format!(
                            "model returned {:?} for a tile expected to become {:?}",
                            upscaled.dimensions(),
                            expected
                        ),
                    });
                }

                let center = imageops::crop_imm(
                    &upscaled,
                    (x0 - px0) * native,
                    (y0 - py0) * native,
                    (x1 - x0) * native,
                    (y1 - y0) * native,
                )
                .to_image();
                imageops::replace(
                    &mut output,
                    &center,
                    (x0 * native) as i64,
                    (y0 * native) as i64,
                );

                tracing::debug!("Tile {}/{} done", ty * tiles_x + tx + 1, total);
            }
        }

        Ok(output)
    }
}

/// Grow a tile to `width` x `height` by repeating its last column and row
fn extend_edges(tile: &RgbImage, width: u32, height: u32) -> RgbImage {
    let (w, h) = tile.dimensions();
    if (w, h) == (width, height) {
        return tile.clone();
    }
    RgbImage::from_fn(width, height, |x, y| *tile.get_pixel(x.min(w - 1), y.min(h - 1)))
}
