//! Guided modes of a symmetric dielectric slab.
//!
//! The slab of width `w` and index `n_core` lies in a cladding of index
//! `n_clad`. With `κ = 2π sqrt(n_core² f² - k²)` and
//! `γ = 2π sqrt(k² - n_clad² f²)` a mode of order `m` satisfies
//!
//! ```text
//! κ w / 2 - atan(η γ / κ) - m π / 2 = 0
//! ```
//!
//! where `η = 1` for TE and `η = (n_core / n_clad)²` for TM. The left hand
//! side decreases monotonically in `k`, so bisection finds the root.

use std::f64::consts::{
    FRAC_PI_2,
    PI,
};

use crate::mode::{
    ModeProfile,
    ModeQuery,
    ModeSolver,
    Polarization,
};

#[derive(Debug, thiserror::Error)]
pub enum SlabError {
    #[error("{parameter} must be positive, but is {value}")]
    NonPositive { parameter: &'static str, value: f64 },

    #[error("core index {core} must be larger than cladding index {cladding}")]
    NoIndexContrast { core: f64, cladding: f64 },

    #[error("empty search bracket [{k_min}, {k_max}]")]
    EmptyBracket { k_min: f64, k_max: f64 },

    #[error("band {band} ({polarization:?}) is not guided at this frequency")]
    BelowCutoff {
        band: usize,
        polarization: Polarization,
    },
}

#[derive(Clone, Debug)]
pub struct SlabModeSolver {
    pub width: f64,
    pub core_index: f64,
    pub cladding_index: f64,
    /// Number of points in computed profiles.
    pub profile_samples: usize,
    /// Profiles span `[-profile_extent/2, profile_extent/2]`.
    pub profile_extent: f64,
}

impl SlabModeSolver {
    pub const MAX_ITERATIONS: usize = 200;

    pub fn new(width: f64, core_index: f64, cladding_index: f64) -> Self {
        Self {
            width,
            core_index,
            cladding_index,
            profile_samples: 101,
            profile_extent: 3.0 * width,
        }
    }

    fn validate(&self) -> Result<(), SlabError> {
        for (parameter, value) in [
            ("width", self.width),
            ("core index", self.core_index),
            ("cladding index", self.cladding_index),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(SlabError::NonPositive { parameter, value });
            }
        }
        if self.core_index <= self.cladding_index {
            return Err(SlabError::NoIndexContrast {
                core: self.core_index,
                cladding: self.cladding_index,
            });
        }
        Ok(())
    }

    fn eta(&self, polarization: Polarization) -> f64 {
        match polarization {
            Polarization::Tm => (self.core_index / self.cladding_index).powi(2),
            Polarization::Te | Polarization::NoParity => 1.0,
        }
    }

    /// Transverse wavenumbers `(κ, γ)` inside and outside the core.
    fn wavenumbers(&self, frequency: f64, k: f64) -> (f64, f64) {
        let kappa = 2.0 * PI * (self.core_index.powi(2) * frequency.powi(2) - k * k).max(0.0).sqrt();
        let gamma =
            2.0 * PI * (k * k - self.cladding_index.powi(2) * frequency.powi(2)).max(0.0).sqrt();
        (kappa, gamma)
    }

    fn characteristic(&self, frequency: f64, order: usize, eta: f64, k: f64) -> f64 {
        let (kappa, gamma) = self.wavenumbers(frequency, k);
        0.5 * kappa * self.width - (eta * gamma).atan2(kappa) - order as f64 * FRAC_PI_2
    }

    /// Root for a single polarization and mode order.
    fn find_root(
        &self,
        query: &ModeQuery,
        order: usize,
        polarization: Polarization,
    ) -> Result<f64, SlabError> {
        let frequency = query.frequency;
        let mut lo = query.k_min.max(self.cladding_index * frequency);
        let mut hi = query.k_max.min(self.core_index * frequency);
        if lo >= hi {
            return Err(SlabError::EmptyBracket {
                k_min: query.k_min,
                k_max: query.k_max,
            });
        }

        let eta = self.eta(polarization);
        let f = |k| self.characteristic(frequency, order, eta, k);
        if f(lo) <= 0.0 {
            return Err(SlabError::BelowCutoff {
                band: order + 1,
                polarization,
            });
        }

        // the first split happens at the guess if it's usable
        let mut mid = if query.k_guess > lo && query.k_guess < hi {
            query.k_guess
        }
        else {
            0.5 * (lo + hi)
        };
        for _ in 0..Self::MAX_ITERATIONS {
            if f(mid) > 0.0 {
                lo = mid;
            }
            else {
                hi = mid;
            }
            if hi - lo <= query.tolerance * hi {
                break;
            }
            mid = 0.5 * (lo + hi);
        }

        Ok(0.5 * (lo + hi))
    }

    /// Polarization and order of the mode `query` describes, together with
    /// its root.
    fn solve(&self, query: &ModeQuery) -> Result<(Polarization, usize, f64), SlabError> {
        self.validate()?;
        if query.band == 0 {
            return Err(SlabError::NonPositive {
                parameter: "band",
                value: 0.0,
            });
        }
        if query.frequency.is_nan() || query.frequency <= 0.0 {
            return Err(SlabError::NonPositive {
                parameter: "frequency",
                value: query.frequency,
            });
        }

        match query.polarization {
            Polarization::Te | Polarization::Tm => {
                let order = query.band - 1;
                let k = self.find_root(query, order, query.polarization)?;
                Ok((query.polarization, order, k))
            }
            Polarization::NoParity => {
                let mut roots = vec![];
                for polarization in [Polarization::Te, Polarization::Tm] {
                    for order in 0..query.band {
                        match self.find_root(query, order, polarization) {
                            Ok(k) => roots.push((polarization, order, k)),
                            Err(SlabError::BelowCutoff { .. }) => break,
                            Err(error) => return Err(error),
                        }
                    }
                }
                roots.sort_by(|a, b| b.2.total_cmp(&a.2));
                roots
                    .get(query.band - 1)
                    .copied()
                    .ok_or(SlabError::BelowCutoff {
                        band: query.band,
                        polarization: Polarization::NoParity,
                    })
            }
        }
    }
}

impl ModeSolver for SlabModeSolver {
    type Error = SlabError;

    fn find_k(&self, query: &ModeQuery) -> Result<f64, Self::Error> {
        let (polarization, order, k) = self.solve(query)?;
        tracing::debug!(band = query.band, ?polarization, order, k, "found slab mode");
        Ok(k)
    }

    fn mode_profile(&self, query: &ModeQuery, k: f64) -> Option<ModeProfile> {
        let (_, order, _) = self.solve(query).ok()?;
        let (kappa, gamma) = self.wavenumbers(query.frequency, k);
        let half = 0.5 * self.width;
        let phase = order as f64 * FRAC_PI_2;
        let inside = |x: f64| (kappa * x - phase).cos();

        let samples = self.profile_samples.max(2);
        let positions = (0..samples)
            .map(|i| self.profile_extent * (i as f64 / (samples - 1) as f64 - 0.5))
            .collect::<Vec<_>>();
        let mut values = positions
            .iter()
            .map(|x| {
                if x.abs() <= half {
                    inside(*x)
                }
                else {
                    inside(half.copysign(*x)) * (-gamma * (x.abs() - half)).exp()
                }
            })
            .collect::<Vec<_>>();

        let max = values.iter().fold(0.0, |max: f64, value| max.max(value.abs()));
        if max > 0.0 {
            values.iter_mut().for_each(|value| *value /= max);
        }

        Some(ModeProfile { positions, values })
    }
}

#[cfg(test)]
mod tests {
    use crate::mode::{
        ModeQuery,
        ModeSolver,
        Polarization,
        slab::{
            SlabError,
            SlabModeSolver,
        },
    };

    const FREQUENCY: f64 = 1.0 / 1.55;

    fn solver() -> SlabModeSolver {
        SlabModeSolver::new(0.7, 2.5, 1.44)
    }

    fn query(band: usize, polarization: Polarization) -> ModeQuery {
        ModeQuery {
            frequency: FREQUENCY,
            band,
            polarization,
            k_guess: 2.0 * FREQUENCY,
            k_min: 1.44 * FREQUENCY,
            k_max: 2.5 * FREQUENCY,
            tolerance: 1e-9,
        }
    }

    fn residual(solver: &SlabModeSolver, band: usize, polarization: Polarization, k: f64) -> f64 {
        solver.characteristic(FREQUENCY, band - 1, solver.eta(polarization), k)
    }

    #[test]
    fn finds_two_te_modes() {
        let solver = solver();
        let k1 = solver.find_k(&query(1, Polarization::Te)).unwrap();
        let k2 = solver.find_k(&query(2, Polarization::Te)).unwrap();
        assert!(k1 > k2);
        assert!(residual(&solver, 1, Polarization::Te, k1).abs() < 1e-6);
        assert!(residual(&solver, 2, Polarization::Te, k2).abs() < 1e-6);
        assert!(matches!(
            solver.find_k(&query(3, Polarization::Te)),
            Err(SlabError::BelowCutoff { band: 3, .. })
        ));
    }

    #[test]
    fn tm_modes_are_less_confined() {
        let solver = solver();
        let te = solver.find_k(&query(1, Polarization::Te)).unwrap();
        let tm = solver.find_k(&query(1, Polarization::Tm)).unwrap();
        assert!(tm < te);
    }

    #[test]
    fn no_parity_merges_both_classes() {
        let solver = solver();
        let te = solver.find_k(&query(1, Polarization::Te)).unwrap();
        let tm = solver.find_k(&query(1, Polarization::Tm)).unwrap();
        assert_eq!(solver.find_k(&query(1, Polarization::NoParity)).unwrap(), te);
        assert_eq!(solver.find_k(&query(2, Polarization::NoParity)).unwrap(), tm);
    }

    #[test]
    fn fundamental_profile_is_even_and_confined() {
        let solver = solver();
        let query = query(1, Polarization::Te);
        let k = solver.find_k(&query).unwrap();
        let profile = solver.mode_profile(&query, k).unwrap();
        let n = profile.values.len();
        assert_eq!(n, 101);
        assert!((profile.values[n / 2] - 1.0).abs() < 1e-12);
        for i in 0..n {
            assert!((profile.values[i] - profile.values[n - 1 - i]).abs() < 1e-9);
        }
        assert!(profile.values[0].abs() < 0.2);
    }

    #[test]
    fn rejects_missing_index_contrast() {
        let solver = SlabModeSolver::new(0.7, 1.44, 1.44);
        assert!(matches!(
            solver.find_k(&query(1, Polarization::Te)),
            Err(SlabError::NoIndexContrast { .. })
        ));
    }
}
