use super::backend::SuperResolution;
use crate::error::RestoreError;
use image::RgbImage;
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::TensorRef;
use std::path::Path;

/// Real-ESRGAN x4plus always upscales by four
const NATIVE_SCALE: u32 = 4;

/// Real-ESRGAN running in ONNX Runtime
pub struct OnnxUpscaler {
    session: Session,
    input_name: String,
    /// Spatial size baked into the export, if any
    fixed_input: Option<(u32, u32)>,
}

impl OnnxUpscaler {
    /// Load the network from an `.onnx` file
    pub fn load(model_path: &Path) -> Result<Self, RestoreError> {
        if !model_path.exists() {
            return Err(RestoreError::ModelLoad(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| RestoreError::ModelLoad(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| RestoreError::ModelLoad(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| RestoreError::ModelLoad(e.to_string()))?;

        let input = session.inputs.first();
        let input_name = input.map_or_else(|| "input".to_string(), |i| i.name.clone());
        let fixed_input = input
            .and_then(|i| i.input_type.tensor_shape())
            .and_then(|shape| fixed_spatial_size(shape));

        tracing::info!(
            "Loaded super-resolution model from {:?} (input '{}', {})",
            model_path,
            input_name,
            match fixed_input {
                Some((w, h)) => format!("fixed {}x{}", w, h),
                None => "dynamic size".to_string(),
            }
        );

        Ok(Self {
            session,
            input_name,
            fixed_input,
        })
    }
}

impl SuperResolution for OnnxUpscaler {
    fn name(&self) -> &'static str {
        "realesrgan-onnx"
    }

    fn native_scale(&self) -> u32 {
        NATIVE_SCALE
    }

    fn fixed_input(&self) -> Option<(u32, u32)> {
        self.fixed_input
    }

    fn infer(&mut self, tile: &RgbImage) -> Result<RgbImage, RestoreError> {
        let input = to_tensor(tile);
        let input_ref = TensorRef::from_array_view(&input).map_err(|e| RestoreError::Processing {
            step: "upscale",
            reason: e.to_string(),
        })?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input_ref])
            .map_err(|e| RestoreError::Processing {
                step: "upscale",
                reason: e.to_string(),
            })?;

        from_outputs(&outputs)
    }
}

/// Width and height of an NCHW input whose spatial dimensions are not symbolic
fn fixed_spatial_size(dims: &[i64]) -> Option<(u32, u32)> {
    match dims {
        [_, _, h, w] if *h > 0 && *w > 0 => {
            Some((u32::try_from(*w).ok()?, u32::try_from(*h).ok()?))
        }
        _ => None,
    }
}

/// NCHW, RGB order, values in 0..=1
fn to_tensor(tile: &RgbImage) -> Array4<f32> {
    let (width, height) = tile.dimensions();
    let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

    for (x, y, pixel) in tile.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = f32::from(pixel.0[c]) / 255.0;
        }
    }

    tensor
}

fn from_outputs(outputs: &SessionOutputs<'_>) -> Result<RgbImage, RestoreError> {
    let failed = |reason: String| RestoreError::Processing {
        step: "upscale",
        reason,
    };

    let (_, output) = outputs
        .iter()
        .next()
        .ok_or_else(|| failed("model produced no output".to_string()))?;

    let (shape, data) = output
        .try_extract_tensor::<f32>()
        .map_err(|e| failed(e.to_string()))?;

    if shape.len() != 4 || shape[1] != 3 {
        return Err(failed(format!("unexpected output shape {:?}", &shape[..])));
    }

    let height = usize::try_from(shape[2]).map_err(|_| failed("invalid output height".into()))?;
    let width = usize::try_from(shape[3]).map_err(|_| failed("invalid output width".into()))?;
    let plane = width * height;

    let to_u8 = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    let mut pixels = Vec::with_capacity(plane * 3);
    for idx in 0..plane {
        pixels.push(to_u8(data[idx]));
        pixels.push(to_u8(data[plane + idx]));
        pixels.push(to_u8(data[2 * plane + idx]));
    }

    RgbImage::from_raw(width as u32, height as u32, pixels)
        .ok_or_else(|| failed("output buffer does not match its shape".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_tensor_layout_is_nchw_rgb() {
        let mut tile = RgbImage::new(3, 2);
        tile.put_pixel(2, 1, Rgb([255, 0, 51]));

        let tensor = to_tensor(&tile);

        assert_eq!(tensor.shape(), &[1, 3, 2, 3]);
        assert_eq!(tensor[[0, 0, 1, 2]], 1.0);
        assert_eq!(tensor[[0, 1, 1, 2]], 0.0);
        assert!((tensor[[0, 2, 1, 2]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_fixed_spatial_size_reads_nchw_shape() {
        assert_eq!(fixed_spatial_size(&[1, 3, 128, 96]), Some((96, 128)));
        assert_eq!(fixed_spatial_size(&[1, 3, -1, -1]), None);
        assert_eq!(fixed_spatial_size(&[-1, 3, 128, -1]), None);
        assert_eq!(fixed_spatial_size(&[1, 3, 128]), None);
    }

    #[test]
    fn test_missing_model_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = OnnxUpscaler::load(&dir.path().join("absent.onnx"));
        assert!(matches!(result, Err(RestoreError::ModelLoad(_))));
    }
}
