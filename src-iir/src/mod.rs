#![doc = include_str!("../README.md")]

/// Biquad filters and Q/bandwidth conversions
pub mod biquad;
/// Parametric equalizers built from weighted biquads
pub mod peq;

pub use biquad::*;
pub use peq::*;

/// Errors raised when a filter cannot be built
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IirError {
    /// The center frequency is not in `(0, srate / 2)`
    #[error("frequency {freq} Hz is outside (0, {srate}/2)")]
    InvalidFrequency {
        /// Requested frequency in Hz
        freq: f64,
        /// Sample rate in Hz
        srate: f64,
    },
}
