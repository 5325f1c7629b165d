//! Post-processing of probe time series and mode solver roots.

pub mod fft;
pub mod modes;
pub mod spectrum;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("time series is empty")]
    Empty,

    #[error("time series has {len} samples, but at least {required} are needed")]
    TooShort { len: usize, required: usize },

    #[error("sampling interval must be positive, but is {interval}")]
    NonPositiveInterval { interval: f64 },

    #[error("spectrum bins are {bin_width} wide, but a resolution of {required} was requested")]
    InsufficientResolution { bin_width: f64, required: f64 },
}
