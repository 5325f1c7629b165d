//! Reference 2D FDTD backend.
//!
//! Solves the TMz polarization (`Ez`, `Hx`, `Hy`) on a Yee lattice in the
//! `z = 0` plane. The outermost ring of `Ez` is held at zero, which makes the
//! domain edge a perfect electric conductor. Absorbing layers are realized as
//! graded, impedance matched conductivity on top of the media.

pub mod absorber;
mod instance;
pub mod lattice;
mod source;
pub mod strider;
mod util;

use nalgebra::Vector2;

pub use self::{
    absorber::AbsorberGrading,
    instance::{
        FdtdInstance,
        FdtdState,
    },
};
use crate::{
    boundary::Axis,
    domain::{
        DomainError,
        SimulationDomain,
    },
    fdtd::util::UpdateCoefficients,
    material::PhysicalConstants,
    solver::{
        FieldComponent,
        SolverBackend,
    },
    util::format_size,
};

#[derive(Debug, thiserror::Error)]
pub enum FdtdError {
    #[error("invalid domain")]
    Domain(#[from] DomainError),

    #[error("the reference backend only simulates 2D domains, but the domain is {depth} deep")]
    Unsupported3d { depth: f64 },

    #[error("courant number {courant} is outside of the stable range (0, {max})")]
    InvalidCourant { courant: f64, max: f64 },

    #[error("TMz simulation can't drive or observe {component:?}")]
    UnsupportedComponent { component: FieldComponent },

    #[error("guided mode sources can only propagate along x or y, not {direction:?}")]
    UnsupportedDirection { direction: Axis },

    #[error("source {index} doesn't cover any interior lattice cell")]
    EmptySource { index: usize },

    #[error("simulation needs {} of memory, but the limit is {}", format_size(*required), format_size(*limit))]
    MemoryLimit { required: usize, limit: usize },

    #[error("field diverged at tick {tick} (t = {time})")]
    Diverged { tick: usize, time: f64 },
}

/// Spatial and temporal step of the lattice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolution {
    pub spatial: Vector2<f64>,
    pub temporal: f64,
}

impl Resolution {
    /// Stability limit of the Courant number in 2D.
    pub const MAX_COURANT: f64 = std::f64::consts::FRAC_1_SQRT_2;

    pub fn new(
        domain: &SimulationDomain,
        courant: f64,
        physical_constants: &PhysicalConstants,
    ) -> Result<Self, FdtdError> {
        if courant.is_nan() || courant <= 0.0 || courant >= Self::MAX_COURANT {
            return Err(FdtdError::InvalidCourant {
                courant,
                max: Self::MAX_COURANT,
            });
        }

        let lattice = domain.lattice_size().xy().cast::<f64>();
        let spatial = domain.size.xy().component_div(&lattice);
        let temporal = courant * spatial.min() / physical_constants.speed_of_light();

        Ok(Self { spatial, temporal })
    }
}

#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FdtdConfig {
    /// `c dt / dx`
    pub courant: f64,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub physical_constants: PhysicalConstants,
    pub absorber: AbsorberGrading,
    /// Refuse to create instances that need more memory than this.
    pub memory_limit: Option<usize>,
}

impl Default for FdtdConfig {
    fn default() -> Self {
        Self {
            courant: 0.5,
            physical_constants: PhysicalConstants::REDUCED,
            absorber: AbsorberGrading::default(),
            memory_limit: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FdtdBackend {
    pub config: FdtdConfig,
}

impl FdtdBackend {
    pub fn new(config: FdtdConfig) -> Self {
        Self { config }
    }
}

impl SolverBackend for FdtdBackend {
    type Instance = FdtdInstance;
    type Error = FdtdError;

    fn create_instance(&self, domain: &SimulationDomain) -> Result<Self::Instance, Self::Error> {
        domain.validate()?;
        if !domain.is_2d() {
            return Err(FdtdError::Unsupported3d {
                depth: domain.size.z,
            });
        }

        if let (Some(limit), Some(required)) =
            (self.config.memory_limit, self.memory_required(domain))
            && required > limit
        {
            tracing::warn!(
                required = %format_size(required),
                limit = %format_size(limit),
                "fdtd instance exceeds memory limit"
            );
            return Err(FdtdError::MemoryLimit { required, limit });
        }

        FdtdInstance::new(&self.config, domain)
    }

    fn memory_required(&self, domain: &SimulationDomain) -> Option<usize> {
        let per_cell =
            std::mem::size_of::<UpdateCoefficients>() + 3 * std::mem::size_of::<f64>();
        Some(per_cell * domain.num_cells())
    }
}
