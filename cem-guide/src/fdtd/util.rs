use crate::{
    fdtd::Resolution,
    material::{
        Material,
        PhysicalConstants,
    },
};

/// Per-cell coefficients of the leapfrog update.
///
/// `E' = c_a E + c_b (curl H - J)` and `H' = d_a H - d_b (curl E + M)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UpdateCoefficients {
    pub c_a: f64,
    pub c_b: f64,
    pub d_a: f64,
    pub d_b: f64,
}

impl UpdateCoefficients {
    /// `absorber` is the graded conductivity of the absorbing layer at the
    /// cell. It's added to the electric and magnetic conductivities, scaled
    /// with the permittivity and permeability so the layer stays impedance
    /// matched to the medium it's laid over.
    pub fn new(
        resolution: &Resolution,
        physical_constants: &PhysicalConstants,
        material: &Material,
        absorber: f64,
    ) -> Self {
        let epsilon = material.relative_permittivity * physical_constants.vacuum_permittivity;
        let mu = material.relative_permeability * physical_constants.vacuum_permeability;

        let (c_a, c_b) = exponential(
            resolution.temporal,
            epsilon,
            material.electrical_conductivity + absorber * epsilon,
        );
        let (d_a, d_b) = exponential(
            resolution.temporal,
            mu,
            material.magnetic_conductivity + absorber * mu,
        );

        Self { c_a, c_b, d_a, d_b }
    }
}

/// Exponential time differencing for `perm dF/dt = -sigma F + S`.
///
/// Unlike the central difference this stays well behaved for large
/// conductivities, where it decays the field within a single step.
fn exponential(delta_t: f64, perm: f64, sigma: f64) -> (f64, f64) {
    if sigma == 0.0 {
        (1.0, delta_t / perm)
    }
    else {
        let a = (-sigma * delta_t / perm).exp();
        (a, (1.0 - a) / sigma)
    }
}
