use crate::config::{Config, Mode, ModelConfig, JPEG_QUALITY};
use crate::enhance::{Pipeline, Preset, StepTiming};
use crate::error::RestoreError;
use crate::io;
use crate::upscale::{self, Upscaler};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Summary of one run, printed with `--json`
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Pipeline that produced the output
    pub pipeline: String,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Output dimensions
    pub width: u32,
    pub height: u32,
    pub output_bytes: u64,
    pub total_time_ms: u64,
    pub steps: Vec<StepTiming>,
    /// Set when `advanced` was replaced by `basic`
    pub fallback: bool,
}

/// Execute the configured pipeline from input file to output file
pub fn run(config: &Config) -> Result<RunReport, RestoreError> {
    // Checked up front so a missing input never triggers a model download
    if !config.input.exists() {
        return Err(RestoreError::InputNotFound(config.input.clone()));
    }

    match &config.mode {
        Mode::Enhance(preset) => enhance(config, *preset),
        Mode::Upscale { scale, model } => super_resolve(config, *scale, model),
    }
}

fn enhance(config: &Config, preset: Preset) -> Result<RunReport, RestoreError> {
    match enhance_with(config, preset) {
        Err(e) if preset == Preset::Advanced && e.is_recoverable() => {
            tracing::warn!(
                code = e.code(),
                "Advanced enhancement failed ({}), falling back to basic",
                e
            );
            let mut report = enhance_with(config, Preset::Basic)?;
            report.fallback = true;
            Ok(report)
        }
        result => result,
    }
}

fn enhance_with(config: &Config, preset: Preset) -> Result<RunReport, RestoreError> {
    let start = Instant::now();
    tracing::info!("Enhancing {:?} with the {} pipeline", config.input, preset.as_str());

    let image = io::load_image(&config.input)?;
    let result = Pipeline::new(preset).process(image)?;
    let (width, height) = result.image.dimensions();

    let output_bytes = io::save_jpeg(&result.image, &config.output, JPEG_QUALITY)?;
    tracing::info!(
        "Saved {:?} ({}x{}, {} bytes) in {}ms",
        config.output,
        width,
        height,
        output_bytes,
        start.elapsed().as_millis()
    );

    Ok(RunReport {
        pipeline: result.preset,
        input: config.input.clone(),
        output: config.output.clone(),
        width,
        height,
        output_bytes,
        total_time_ms: start.elapsed().as_millis() as u64,
        steps: result.steps,
        fallback: false,
    })
}

fn super_resolve(
    config: &Config,
    scale: u32,
    model: &ModelConfig,
) -> Result<RunReport, RestoreError> {
    if !upscale::is_available() {
        return Err(RestoreError::Unavailable(
            "AI upscaling is not compiled in (build with --features ai-upscale)".to_string(),
        ));
    }

    let start = Instant::now();
    let mut steps = Vec::new();

    let model_path = model.path.clone().unwrap_or_else(upscale::default_model_path);
    let backend = timed("load_model", &mut steps, || {
        let path = upscale::ensure_model_downloaded(&model.url, &model_path)?;
        upscale::load_backend(&path)
    })?;

    let image = timed("decode", &mut steps, || {
        Ok(io::load_image(&config.input)?.into_rgb8())
    })?;
    let (in_width, in_height) = image.dimensions();

    let mut upscaler = Upscaler::new(backend);
    let output = timed("upscale", &mut steps, || upscaler.upscale(&image, scale))?;
    let (width, height) = output.dimensions();

    let output_bytes = timed("encode", &mut steps, || {
        io::save_jpeg(&output, &config.output, JPEG_QUALITY)
    })?;

    tracing::info!(
        "Upscaled {}x{} ({:.2} MB) to {}x{} ({:.2} MB)",
        in_width,
        in_height,
        megabytes(file_len(&config.input)),
        width,
        height,
        megabytes(output_bytes)
    );

    Ok(RunReport {
        pipeline: format!("upscale-x{}", scale),
        input: config.input.clone(),
        output: config.output.clone(),
        width,
        height,
        output_bytes,
        total_time_ms: start.elapsed().as_millis() as u64,
        steps,
        fallback: false,
    })
}

fn timed<T, F>(name: &str, steps: &mut Vec<StepTiming>, f: F) -> Result<T, RestoreError>
where
    F: FnOnce() -> Result<T, RestoreError>,
{
    let step_start = Instant::now();
    let value = f()?;
    let time_ms = step_start.elapsed().as_millis() as u64;
    tracing::debug!(step = name, time_ms, "step finished");
    steps.push(StepTiming {
        name: name.to_string(),
        time_ms,
    });
    Ok(value)
}

fn file_len(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn fixture(dir: &Path) -> PathBuf {
        let img = RgbImage::from_fn(48, 32, |x, y| {
            let grain = ((x * 13 + y * 29) % 17) as u8;
            Rgb([120 + grain, 90 + (x % 20) as u8, 60 + (y % 25) as u8])
        });
        let path = dir.join("texture.jpg");
        io::save_jpeg(&img, &path, 90).unwrap();
        path
    }

    fn config(mode: Mode, input: PathBuf, output: PathBuf) -> Config {
        Config {
            mode,
            input,
            output,
            json: false,
        }
    }

    #[test]
    fn test_basic_run_writes_report_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.jpg");
        let cfg = config(
            Mode::Enhance(Preset::Basic),
            fixture(dir.path()),
            output.clone(),
        );

        let report = run(&cfg).unwrap();

        assert_eq!(report.pipeline, "basic");
        assert_eq!((report.width, report.height), (48, 32));
        assert_eq!(report.output_bytes, std::fs::metadata(&output).unwrap().len());
        assert!(!report.fallback);
        assert_eq!(image::open(&output).unwrap().into_rgb8().dimensions(), (48, 32));
    }

    #[test]
    fn test_missing_input_fails_before_processing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.jpg");
        let cfg = config(
            Mode::Enhance(Preset::Aggressive),
            dir.path().join("absent.jpg"),
            output.clone(),
        );

        let err = run(&cfg).unwrap_err();

        assert!(matches!(err, RestoreError::InputNotFound(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_restore_preserves_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(
            Mode::Enhance(Preset::Aggressive),
            fixture(dir.path()),
            dir.path().join("restored.jpg"),
        );

        let report = run(&cfg).unwrap();
        assert_eq!(report.pipeline, "aggressive");
        assert_eq!((report.width, report.height), (48, 32));
    }

    #[test]
    fn test_advanced_falls_back_only_when_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(
            Mode::Enhance(Preset::Advanced),
            fixture(dir.path()),
            dir.path().join("advanced.jpg"),
        );

        let report = run(&cfg).unwrap();

        assert_eq!(report.fallback, !cfg!(feature = "advanced"));
        let expected = if cfg!(feature = "advanced") {
            "advanced"
        } else {
            "basic"
        };
        assert_eq!(report.pipeline, expected);
        assert_eq!((report.width, report.height), (48, 32));
    }

    #[test]
    fn test_extensionless_input_does_not_trigger_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scan");
        std::fs::copy(fixture(dir.path()), &input).unwrap();
        let cfg = config(
            Mode::Enhance(Preset::Advanced),
            input,
            dir.path().join("advanced.jpg"),
        );

        let report = run(&cfg).unwrap();

        assert_eq!(report.fallback, !cfg!(feature = "advanced"));
        assert_eq!((report.width, report.height), (48, 32));
    }

    #[test]
    fn test_undecodable_advanced_input_is_still_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.jpg");
        std::fs::write(&input, b"not an image").unwrap();
        let output = dir.path().join("out.jpg");
        let cfg = config(Mode::Enhance(Preset::Advanced), input, output.clone());

        let err = run(&cfg).unwrap_err();

        assert!(matches!(err, RestoreError::Decode { .. }));
        assert!(!output.exists());
    }

    #[cfg(not(feature = "ai-upscale"))]
    #[test]
    fn test_upscale_unavailable_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("big.jpg");
        let model_path = dir.path().join("model.onnx");
        let cfg = config(
            Mode::Upscale {
                scale: 2,
                model: ModelConfig {
                    path: Some(model_path.clone()),
                    url: "http://127.0.0.1:9/model.onnx".to_string(),
                },
            },
            fixture(dir.path()),
            output.clone(),
        );

        let err = run(&cfg).unwrap_err();

        assert!(matches!(err, RestoreError::Unavailable(_)));
        assert!(!output.exists());
        assert!(!model_path.exists());
    }
}
