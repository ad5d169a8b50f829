use crate::error::RestoreError;
use image::{DynamicImage, RgbImage};
use serde::Serialize;
use std::time::Instant;

use super::steps;

/// Enhancement pipeline names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// Mild cleanup
    /// Steps: median, contrast, color, sharpness, brightness
    #[default]
    Basic,
    /// Denoise and local contrast (requires the `advanced` feature)
    /// Steps: nl-means, clahe, sharpen, saturation
    Advanced,
    /// "As-new" restoration, trading fidelity for visual impact
    /// Steps: bilateral, soften, lab boost, color, brightness, contrast, unsharp
    Aggressive,
}

impl Preset {
    /// Get the preset name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
            Self::Aggressive => "aggressive",
        }
    }

    /// Whether this build can run the preset
    pub fn is_available(&self) -> bool {
        match self {
            Self::Advanced => cfg!(feature = "advanced"),
            Self::Basic | Self::Aggressive => true,
        }
    }
}

/// Timing information for a single step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of a pipeline run including timing stats
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub image: RgbImage,
    /// Preset used
    pub preset: String,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

/// Pipeline that applies the fixed step sequence of a preset
pub struct Pipeline {
    preset: Preset,
}

impl Pipeline {
    pub fn new(preset: Preset) -> Self {
        Self { preset }
    }

    /// Process an image according to the configured preset
    ///
    /// Returns [`RestoreError::Unavailable`] without touching the image when
    /// the preset is not compiled into this build.
    pub fn process(&self, image: DynamicImage) -> Result<PipelineResult, RestoreError> {
        if !self.preset.is_available() {
            return Err(RestoreError::Unavailable(format!(
                "the '{}' pipeline is not compiled in (build with --features {})",
                self.preset.as_str(),
                self.preset.as_str()
            )));
        }

        let mut timings = Vec::new();

        // Every preset works on 8-bit RGB
        let img = self.run_step("rgb", image, &mut timings, |img| Ok(img.into_rgb8()))?;

        let img = match self.preset {
            Preset::Basic => self.basic(img, &mut timings)?,
            Preset::Advanced => self.advanced(img, &mut timings)?,
            Preset::Aggressive => self.aggressive(img, &mut timings)?,
        };

        Ok(PipelineResult {
            image: img,
            preset: self.preset.as_str().to_string(),
            steps: timings,
        })
    }

    fn basic(&self, img: RgbImage, t: &mut Vec<StepTiming>) -> Result<RgbImage, RestoreError> {
        let img = self.run_step("median", img, t, steps::denoise::apply)?;
        let img = self.run_step("contrast", img, t, |i| steps::adjust::contrast(i, 1.2))?;
        let img = self.run_step("color", img, t, |i| steps::adjust::color(i, 1.15))?;
        let img = self.run_step("sharpness", img, t, |i| steps::adjust::sharpness(i, 1.3))?;
        self.run_step("brightness", img, t, |i| steps::adjust::brightness(i, 1.05))
    }

    #[cfg(feature = "advanced")]
    fn advanced(&self, img: RgbImage, t: &mut Vec<StepTiming>) -> Result<RgbImage, RestoreError> {
        let img = self.run_step("nl_means", img, t, steps::nlmeans::apply)?;
        let img = self.run_step("clahe", img, t, steps::clahe::apply)?;
        let img = self.run_step("sharpen", img, t, steps::sharpen::apply)?;
        self.run_step("saturation", img, t, steps::saturation::apply)
    }

    #[cfg(not(feature = "advanced"))]
    fn advanced(&self, _img: RgbImage, _t: &mut Vec<StepTiming>) -> Result<RgbImage, RestoreError> {
        Err(RestoreError::Unavailable(
            "the 'advanced' pipeline is not compiled in".to_string(),
        ))
    }

    fn aggressive(&self, img: RgbImage, t: &mut Vec<StepTiming>) -> Result<RgbImage, RestoreError> {
        let img = self.run_step("bilateral", img, t, steps::bilateral::apply)?;
        let img = self.run_step("soften", img, t, steps::soften::apply)?;
        let img = self.run_step("lab_boost", img, t, steps::lab_boost::apply)?;
        let img = self.run_step("color", img, t, |i| steps::adjust::color(i, 3.5))?;
        let img = self.run_step("brightness", img, t, |i| steps::adjust::brightness(i, 1.3))?;
        let img = self.run_step("contrast", img, t, |i| steps::adjust::contrast(i, 1.4))?;
        self.run_step("unsharp", img, t, steps::unsharp::apply)
    }

    fn run_step<I, F>(
        &self,
        name: &str,
        img: I,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> Result<RgbImage, RestoreError>
    where
        F: FnOnce(I) -> Result<RgbImage, RestoreError>,
    {
        let step_start = Instant::now();
        let result = step_fn(img)?;
        let time_ms = step_start.elapsed().as_millis() as u64;
        tracing::debug!(step = name, time_ms, "step finished");
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms,
        });
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn texture(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            let noise = ((x * 31 + y * 17) % 23) as u8;
            Rgb([90 + noise, 70 + (x % 40) as u8, 50 + (y % 30) as u8])
        }))
    }

    fn step_names(result: &PipelineResult) -> Vec<&str> {
        result.steps.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_preset_names() {
        assert_eq!(Preset::default(), Preset::Basic);
        assert_eq!(Preset::Aggressive.as_str(), "aggressive");
        assert!(Preset::Basic.is_available());
        assert!(Preset::Aggressive.is_available());
    }

    #[test]
    fn test_basic_runs_steps_in_order() {
        let result = Pipeline::new(Preset::Basic).process(texture(40, 30)).unwrap();
        assert_eq!(
            step_names(&result),
            ["rgb", "median", "contrast", "color", "sharpness", "brightness"]
        );
        assert_eq!(result.image.dimensions(), (40, 30));
        assert_eq!(result.preset, "basic");
    }

    #[test]
    fn test_step_timings_serialize_as_name_and_time() {
        let result = Pipeline::new(Preset::Basic).process(texture(16, 16)).unwrap();
        let json = serde_json::to_value(&result.steps).unwrap();

        let first = json[0].as_object().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first["name"], "rgb");
        assert!(first["time_ms"].is_u64());
    }

    #[test]
    fn test_basic_is_deterministic() {
        let a = Pipeline::new(Preset::Basic).process(texture(32, 24)).unwrap();
        let b = Pipeline::new(Preset::Basic).process(texture(32, 24)).unwrap();
        assert_eq!(a.image, b.image);
    }

    #[test]
    fn test_aggressive_preserves_dimensions_and_brightens() {
        let input = texture(36, 28);
        let mean_in = mean(&input.to_rgb8());
        let result = Pipeline::new(Preset::Aggressive).process(input).unwrap();

        assert_eq!(result.image.dimensions(), (36, 28));
        assert_eq!(result.steps.len(), 8);
        assert!(mean(&result.image) > mean_in);
    }

    #[test]
    fn test_grayscale_input_is_normalized_to_rgb() {
        let gray = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(10, 10, image::Luma([90])));
        let result = Pipeline::new(Preset::Basic).process(gray).unwrap();
        assert_eq!(result.image.dimensions(), (10, 10));
    }

    #[cfg(feature = "advanced")]
    #[test]
    fn test_advanced_runs_when_compiled_in() {
        assert!(Preset::Advanced.is_available());
        let result = Pipeline::new(Preset::Advanced).process(texture(30, 20)).unwrap();
        assert_eq!(
            step_names(&result),
            ["rgb", "nl_means", "clahe", "sharpen", "saturation"]
        );
        assert_eq!(result.image.dimensions(), (30, 20));
    }

    #[cfg(not(feature = "advanced"))]
    #[test]
    fn test_advanced_reports_unavailable() {
        assert!(!Preset::Advanced.is_available());
        let err = Pipeline::new(Preset::Advanced)
            .process(texture(8, 8))
            .unwrap_err();
        assert!(matches!(err, RestoreError::Unavailable(_)));
        assert!(err.is_recoverable());
    }

    fn mean(img: &RgbImage) -> f64 {
        let sum: u64 = img.pixels().flat_map(|p| p.0).map(|v| v as u64).sum();
        sum as f64 / (img.width() * img.height() * 3) as f64
    }
}
