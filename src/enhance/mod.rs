//! Image enhancement pipelines
//!
//! Three fixed sequences of filters over an RGB buffer: a mild cleanup,
//! a denoise/local-contrast pass, and an aggressive "as-new" restoration.

pub mod pipeline;
pub mod steps;

pub use pipeline::{Pipeline, Preset, StepTiming};
