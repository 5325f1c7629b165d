//! Interface to modal eigensolvers.
//!
//! A mode solver finds the propagation constant `k` of a guided mode at a
//! given frequency by a bounded root search.

pub mod slab;

/// Symmetry class of the modes to search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Polarization {
    /// Modes of both classes, ordered by `k`.
    #[default]
    NoParity,
    Te,
    Tm,
}

/// Everything a solver needs to find one mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModeQuery {
    pub frequency: f64,
    /// 1-based, band 1 has the largest `k`.
    pub band: usize,
    pub polarization: Polarization,
    pub k_guess: f64,
    pub k_min: f64,
    pub k_max: f64,
    pub tolerance: f64,
}

/// Transverse field distribution of a mode.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeProfile {
    pub positions: Vec<f64>,
    pub values: Vec<f64>,
}

pub trait ModeSolver {
    type Error: std::error::Error + Send + Sync + 'static;

    fn find_k(&self, query: &ModeQuery) -> Result<f64, Self::Error>;

    fn mode_profile(&self, query: &ModeQuery, k: f64) -> Option<ModeProfile> {
        let _ = (query, k);
        None
    }
}
