//! Sources and their time dependence.
//!
//! All frequencies here are native (`1 / length`, see [`UnitSystem`]).
//! Engineering inputs in Hz or wavelength ranges are converted by [`Band`] and
//! [`continuous_from_hz`] before they reach a [`Source`].

use std::{
    f64::consts::TAU,
    fmt::Debug,
};

use nalgebra::{
    Point3,
    Vector3,
};

use crate::{
    boundary::Axis,
    solver::FieldComponent,
    units::UnitSystem,
};

#[derive(Debug, thiserror::Error)]
pub enum ExcitationError {
    #[error("{parameter} must be positive, but is {value}")]
    NonPositive { parameter: &'static str, value: f64 },

    #[error("wavelength range [{min}, {max}] is empty")]
    EmptyWavelengthRange { min: f64, max: f64 },

    #[error("center wavelength {center} is outside of [{min}, {max}]")]
    CenterOutsideRange { center: f64, min: f64, max: f64 },

    #[error("guided mode band must start at 1")]
    ZeroBand,
}

fn ensure_positive(parameter: &'static str, value: f64) -> Result<(), ExcitationError> {
    if value > 0.0 {
        Ok(())
    }
    else {
        Err(ExcitationError::NonPositive { parameter, value })
    }
}

pub trait SourceFunction: Debug + Send + Sync + 'static {
    fn evaluate(&self, time: f64) -> f64;
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Waveform {
    /// Gaussian envelope on a cosine carrier.
    ///
    /// `width` is the frequency width. The envelope has a temporal standard
    /// deviation of `1 / width` and peaks `cutoff` deviations after the start.
    GaussianPulse {
        frequency: f64,
        width: f64,
        #[cfg_attr(feature = "serde", serde(default = "default_cutoff"))]
        cutoff: f64,
    },

    ContinuousWave {
        frequency: f64,
        #[cfg_attr(feature = "serde", serde(default))]
        start_time: f64,
    },
}

#[cfg(feature = "serde")]
fn default_cutoff() -> f64 {
    Waveform::DEFAULT_CUTOFF
}

impl Waveform {
    pub const DEFAULT_CUTOFF: f64 = 5.0;

    pub fn gaussian_pulse(frequency: f64, width: f64) -> Result<Self, ExcitationError> {
        ensure_positive("frequency", frequency)?;
        ensure_positive("pulse width", width)?;
        Ok(Self::GaussianPulse {
            frequency,
            width,
            cutoff: Self::DEFAULT_CUTOFF,
        })
    }

    pub fn continuous(frequency: f64) -> Result<Self, ExcitationError> {
        ensure_positive("frequency", frequency)?;
        Ok(Self::ContinuousWave {
            frequency,
            start_time: 0.0,
        })
    }

    pub fn frequency(&self) -> f64 {
        match self {
            Self::GaussianPulse { frequency, .. } => *frequency,
            Self::ContinuousWave { frequency, .. } => *frequency,
        }
    }

    /// Time of the pulse maximum.
    fn peak_time(width: f64, cutoff: f64) -> f64 {
        cutoff / width
    }

    /// Time after which the source is off for good. `None` for sources that
    /// never end.
    pub fn end_time(&self) -> Option<f64> {
        match self {
            Self::GaussianPulse { width, cutoff, .. } => {
                Some(2.0 * Self::peak_time(*width, *cutoff))
            }
            Self::ContinuousWave { .. } => None,
        }
    }
}

impl SourceFunction for Waveform {
    fn evaluate(&self, time: f64) -> f64 {
        match self {
            Self::GaussianPulse {
                frequency,
                width,
                cutoff,
            } => {
                let t0 = Self::peak_time(*width, *cutoff);
                if time < 0.0 || time > 2.0 * t0 {
                    return 0.0;
                }
                let s = (time - t0) * width;
                (-0.5 * s * s).exp() * (TAU * frequency * time).cos()
            }
            Self::ContinuousWave {
                frequency,
                start_time,
            } => {
                if time < *start_time {
                    0.0
                }
                else {
                    (TAU * frequency * (time - start_time)).cos()
                }
            }
        }
    }
}

/// Spectral band of a pulse, in the units it was specified in.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Band {
    /// Center wavelength and wavelength range, in native lengths. The pulse
    /// width is the frequency span of the range times `multiplier`.
    Wavelengths {
        center: f64,
        min: f64,
        max: f64,
        #[cfg_attr(feature = "serde", serde(default = "default_multiplier"))]
        multiplier: f64,
    },

    /// Center frequency in Hz and the pulse width as a fraction of it.
    Hertz {
        center: f64,
        fractional_bandwidth: f64,
    },
}

#[cfg(feature = "serde")]
fn default_multiplier() -> f64 {
    1.0
}

impl Band {
    pub fn wavelengths(center: f64, min: f64, max: f64) -> Self {
        Self::Wavelengths {
            center,
            min,
            max,
            multiplier: 1.0,
        }
    }

    pub fn with_multiplier(self, multiplier: f64) -> Self {
        match self {
            Self::Wavelengths {
                center, min, max, ..
            } => {
                Self::Wavelengths {
                    center,
                    min,
                    max,
                    multiplier,
                }
            }
            hertz => hertz,
        }
    }

    /// Native center frequency and pulse width.
    pub fn to_native(&self, units: &UnitSystem) -> Result<(f64, f64), ExcitationError> {
        match *self {
            Self::Wavelengths {
                center,
                min,
                max,
                multiplier,
            } => {
                ensure_positive("center wavelength", center)?;
                ensure_positive("min wavelength", min)?;
                ensure_positive("bandwidth multiplier", multiplier)?;
                if max <= min {
                    return Err(ExcitationError::EmptyWavelengthRange { min, max });
                }
                if center < min || center > max {
                    return Err(ExcitationError::CenterOutsideRange { center, min, max });
                }
                let frequency = UnitSystem::wavelength_to_native_frequency(center);
                let width = (UnitSystem::wavelength_to_native_frequency(min)
                    - UnitSystem::wavelength_to_native_frequency(max))
                    * multiplier;
                Ok((frequency, width))
            }
            Self::Hertz {
                center,
                fractional_bandwidth,
            } => {
                ensure_positive("center frequency", center)?;
                ensure_positive("fractional bandwidth", fractional_bandwidth)?;
                let frequency = units.to_native_frequency(center);
                Ok((frequency, frequency * fractional_bandwidth))
            }
        }
    }

    pub fn to_pulse(&self, units: &UnitSystem) -> Result<Waveform, ExcitationError> {
        let (frequency, width) = self.to_native(units)?;
        Waveform::gaussian_pulse(frequency, width)
    }
}

pub fn continuous_from_hz(units: &UnitSystem, frequency_hz: f64) -> Result<Waveform, ExcitationError> {
    ensure_positive("frequency", frequency_hz)?;
    Waveform::continuous(units.to_native_frequency(frequency_hz))
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ExcitationMode {
    /// Current source driving one field component.
    Component(FieldComponent),

    /// Launches the `band`-th guided mode (counting from 1) propagating
    /// along `direction`.
    GuidedMode { band: usize, direction: Axis },
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Source {
    pub waveform: Waveform,
    pub center: Point3<f64>,
    /// Extent of the source region. Zero extents make a point or line source.
    #[cfg_attr(feature = "serde", serde(default = "zero_size"))]
    pub size: Vector3<f64>,
    pub mode: ExcitationMode,
    #[cfg_attr(feature = "serde", serde(default = "default_amplitude"))]
    pub amplitude: f64,
}

#[cfg(feature = "serde")]
fn default_amplitude() -> f64 {
    1.0
}

#[cfg(feature = "serde")]
fn zero_size() -> Vector3<f64> {
    Vector3::zeros()
}

impl Source {
    pub fn new(
        waveform: Waveform,
        center: Point3<f64>,
        size: Vector3<f64>,
        mode: ExcitationMode,
    ) -> Result<Self, ExcitationError> {
        if let ExcitationMode::GuidedMode { band: 0, .. } = mode {
            return Err(ExcitationError::ZeroBand);
        }
        Ok(Self {
            waveform,
            center,
            size,
            mode,
            amplitude: 1.0,
        })
    }

    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn value(&self, time: f64) -> f64 {
        self.amplitude * self.waveform.evaluate(time)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        excitation::{
            Band,
            ExcitationError,
            SourceFunction,
            Waveform,
            continuous_from_hz,
        },
        units::UnitSystem,
    };

    #[test]
    fn photonic_pulse_from_wavelength_range() {
        let band = Band::wavelengths(1.55, 1.4, 1.7).with_multiplier(2.0);
        let (frequency, width) = band.to_native(&UnitSystem::MICROMETER).unwrap();
        assert!((frequency - 1.0 / 1.55).abs() < 1e-12);
        let expected = 2.0 * (1.0 / 1.4 - 1.0 / 1.7);
        assert!((width - expected).abs() < 1e-12);
    }

    #[test]
    fn default_multiplier_is_one() {
        let (_, width) = Band::wavelengths(1.55, 1.4, 1.7)
            .to_native(&UnitSystem::MICROMETER)
            .unwrap();
        assert!((width - (1.0 / 1.4 - 1.0 / 1.7)).abs() < 1e-12);
    }

    #[test]
    fn microwave_pulse_from_hz() {
        let band = Band::Hertz {
            center: 2.45e9,
            fractional_bandwidth: 0.2,
        };
        let (frequency, width) = band.to_native(&UnitSystem::CENTIMETER).unwrap();
        assert!((frequency - 2.45e9 / 3e10).abs() < 1e-15);
        assert!((width - 0.2 * frequency).abs() < 1e-15);
    }

    #[test]
    fn inverted_wavelength_range_is_rejected() {
        let band = Band::wavelengths(1.55, 1.7, 1.4);
        assert!(matches!(
            band.to_native(&UnitSystem::MICROMETER),
            Err(ExcitationError::EmptyWavelengthRange { .. })
        ));
    }

    #[test]
    fn center_outside_of_wavelength_range_is_rejected() {
        let band = Band::wavelengths(1.7, 1.5, 1.6);
        assert!(matches!(
            band.to_native(&UnitSystem::MICROMETER),
            Err(ExcitationError::CenterOutsideRange { center, .. }) if center == 1.7
        ));
        assert!(
            Band::wavelengths(1.5, 1.5, 1.6)
                .to_native(&UnitSystem::MICROMETER)
                .is_ok()
        );
    }

    #[test]
    fn pulse_peaks_at_cutoff_and_ends() {
        let pulse = Waveform::gaussian_pulse(1.0, 0.5).unwrap();
        // peak at cutoff / width = 10, which is an integer number of periods
        assert!((pulse.evaluate(10.0) - 1.0).abs() < 1e-12);
        assert_eq!(pulse.end_time(), Some(20.0));
        assert_eq!(pulse.evaluate(20.5), 0.0);
        assert!(pulse.evaluate(1.0).abs() < 1e-4);
    }

    #[test]
    fn continuous_wave_never_ends() {
        let wave = continuous_from_hz(&UnitSystem::CENTIMETER, 2.45e9).unwrap();
        assert_eq!(wave.end_time(), None);
        assert!((wave.evaluate(0.0) - 1.0).abs() < 1e-12);
        assert!(continuous_from_hz(&UnitSystem::CENTIMETER, 0.0).is_err());
    }
}
