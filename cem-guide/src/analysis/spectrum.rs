use crate::analysis::{
    AnalysisError,
    fft::dft,
};

/// Amplitude spectrum of a real time series.
///
/// Only the first `N/2` bins are kept, the rest mirrors them.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spectrum {
    pub frequencies: Vec<f64>,
    pub amplitudes: Vec<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpectralPeak {
    pub frequency: f64,
    pub amplitude: f64,
    pub bin: usize,
}

impl Spectrum {
    pub const MIN_SAMPLES: usize = 4;

    /// `interval` is the time between samples. Bin `i` has the frequency
    /// `i / (N interval) * scale`, so `scale` converts native frequencies to
    /// other units.
    pub fn from_samples(samples: &[f64], interval: f64, scale: f64) -> Result<Self, AnalysisError> {
        if samples.is_empty() {
            return Err(AnalysisError::Empty);
        }
        if samples.len() < Self::MIN_SAMPLES {
            return Err(AnalysisError::TooShort {
                len: samples.len(),
                required: Self::MIN_SAMPLES,
            });
        }
        if interval.is_nan() || interval <= 0.0 {
            return Err(AnalysisError::NonPositiveInterval { interval });
        }

        let n = samples.len();
        let transformed = dft(samples);
        let bins = n / 2;
        let frequencies = (0..bins)
            .map(|i| i as f64 / (n as f64 * interval) * scale)
            .collect();
        let amplitudes = transformed[..bins]
            .iter()
            .map(|value| value.norm())
            .collect();

        tracing::trace!(samples = n, bins, interval, "computed spectrum");

        Ok(Self {
            frequencies,
            amplitudes,
        })
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn bin_width(&self) -> f64 {
        self.frequencies.get(1).copied().unwrap_or_default()
    }

    /// Strongest non-DC bin.
    pub fn peak(&self) -> Option<SpectralPeak> {
        self.amplitudes
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(bin, amplitude)| self.peak_at(bin, *amplitude))
    }

    /// All local maxima, strongest first.
    pub fn peaks(&self) -> Vec<SpectralPeak> {
        let mut peaks = self
            .amplitudes
            .windows(3)
            .enumerate()
            .filter(|(_, window)| window[1] > window[0] && window[1] >= window[2])
            .map(|(i, window)| self.peak_at(i + 1, window[1]))
            .collect::<Vec<_>>();
        peaks.sort_by(|a, b| b.amplitude.total_cmp(&a.amplitude));
        peaks
    }

    /// Amplitude of the bin nearest to `frequency`.
    pub fn amplitude_at(&self, frequency: f64) -> Option<f64> {
        let bin_width = self.bin_width();
        if bin_width <= 0.0 || frequency < 0.0 {
            return None;
        }
        let bin = (frequency / bin_width).round() as usize;
        self.amplitudes.get(bin).copied()
    }

    /// Fails if the bins are wider than `required`, i.e. the run was too
    /// short to resolve features of that size.
    pub fn require_bin_width(&self, required: f64) -> Result<(), AnalysisError> {
        let bin_width = self.bin_width();
        if bin_width > required {
            Err(AnalysisError::InsufficientResolution {
                bin_width,
                required,
            })
        }
        else {
            Ok(())
        }
    }

    fn peak_at(&self, bin: usize, amplitude: f64) -> SpectralPeak {
        SpectralPeak {
            frequency: self.frequencies[bin],
            amplitude,
            bin,
        }
    }
}
