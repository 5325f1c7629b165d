//! Effective indices of guided modes.

use crate::mode::{
    ModeProfile,
    ModeQuery,
    ModeSolver,
    Polarization,
};

#[derive(Debug, thiserror::Error)]
pub enum ModeError<E> {
    #[error("invalid mode analysis parameters: {reason}")]
    InvalidParameters { reason: &'static str },

    #[error("mode solver failed for band {band}")]
    Solver {
        band: usize,
        #[source]
        source: E,
    },

    #[error("band {band} has effective index {effective_index} outside of the guiding range")]
    OutOfBounds { band: usize, effective_index: f64 },

    #[error("band {band} has effective index {current}, larger than the previous band's {previous}")]
    NotMonotonic {
        band: usize,
        previous: f64,
        current: f64,
    },
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeResult {
    pub band: usize,
    /// Propagation constant, in units of `2π / length`.
    pub k: f64,
    pub effective_index: f64,
    pub field_samples: Option<ModeProfile>,
}

/// Finds the guided modes of a structure at one frequency.
///
/// The search is bracketed by the light lines of the cladding and the core,
/// so every guided mode has an effective index strictly between the two.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeAnalysis {
    pub frequency: f64,
    pub core_index: f64,
    pub cladding_index: f64,
    pub bands: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub polarization: Polarization,
    #[cfg_attr(feature = "serde", serde(default = "default_tolerance"))]
    pub tolerance: f64,
}

fn default_tolerance() -> f64 {
    ModeAnalysis::DEFAULT_TOLERANCE
}

impl ModeAnalysis {
    pub const DEFAULT_TOLERANCE: f64 = 1e-5;

    pub fn new(frequency: f64, core_index: f64, cladding_index: f64, bands: usize) -> Self {
        Self {
            frequency,
            core_index,
            cladding_index,
            bands,
            polarization: Polarization::default(),
            tolerance: Self::DEFAULT_TOLERANCE,
        }
    }

    pub fn with_polarization(mut self, polarization: Polarization) -> Self {
        self.polarization = polarization;
        self
    }

    fn validate<E>(&self) -> Result<(), ModeError<E>> {
        let reason = if self.frequency.is_nan() || self.frequency <= 0.0 {
            "frequency must be positive"
        }
        else if self.bands == 0 {
            "at least one band must be requested"
        }
        else if self.cladding_index.is_nan() || self.cladding_index <= 0.0 {
            "cladding index must be positive"
        }
        else if self.core_index.is_nan() || self.core_index <= self.cladding_index {
            "core index must be larger than cladding index"
        }
        else if self.tolerance.is_nan() || self.tolerance <= 0.0 {
            "tolerance must be positive"
        }
        else {
            return Ok(());
        };
        Err(ModeError::InvalidParameters { reason })
    }

    /// Queries the solver once per band, in ascending band order.
    pub fn run<S>(&self, solver: &S) -> Result<Vec<ModeResult>, ModeError<S::Error>>
    where
        S: ModeSolver,
    {
        self.validate()?;

        let k_min = self.cladding_index * self.frequency;
        let k_max = self.core_index * self.frequency;
        let k_guess = 0.5 * (self.cladding_index + self.core_index) * self.frequency;

        tracing::info!(
            frequency = self.frequency,
            bands = self.bands,
            polarization = ?self.polarization,
            k_min,
            k_max,
            "running mode analysis"
        );

        let mut results: Vec<ModeResult> = Vec::with_capacity(self.bands);
        for band in 1..=self.bands {
            let query = ModeQuery {
                frequency: self.frequency,
                band,
                polarization: self.polarization,
                k_guess,
                k_min,
                k_max,
                tolerance: self.tolerance,
            };
            let k = solver
                .find_k(&query)
                .map_err(|source| ModeError::Solver { band, source })?;
            let effective_index = k / self.frequency;

            if effective_index <= self.cladding_index || effective_index >= self.core_index {
                return Err(ModeError::OutOfBounds {
                    band,
                    effective_index,
                });
            }
            if let Some(previous) = results.last()
                && effective_index > previous.effective_index
            {
                return Err(ModeError::NotMonotonic {
                    band,
                    previous: previous.effective_index,
                    current: effective_index,
                });
            }

            tracing::debug!(band, k, effective_index, "mode");

            results.push(ModeResult {
                band,
                k,
                effective_index,
                field_samples: solver.mode_profile(&query, k),
            });
        }

        Ok(results)
    }
}
