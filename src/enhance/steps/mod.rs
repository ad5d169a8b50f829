//! Individual restoration steps

pub mod adjust;
pub mod bilateral;
pub mod denoise;
pub mod lab_boost;
pub mod soften;
pub mod unsharp;

#[cfg(feature = "advanced")]
pub mod clahe;
#[cfg(feature = "advanced")]
pub mod nlmeans;
#[cfg(feature = "advanced")]
pub mod saturation;
#[cfg(feature = "advanced")]
pub mod sharpen;
