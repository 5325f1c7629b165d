//! Interface to time-domain field solvers.
//!
//! The run controller only talks to a solver through [`SolverBackend`] and
//! [`SolverInstance`], so it can be driven by the in-tree FDTD backend as well
//! as by a stub that returns synthetic fields.

pub mod observer;
pub mod runner;

use nalgebra::{
    Point3,
    Vector2,
};

use crate::{
    domain::SimulationDomain,
    solver::observer::FieldFrame,
};

pub trait SolverBackend {
    type Instance: SolverInstance<Error = Self::Error>;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Creates a solver instance for the domain. The domain's media, boundary
    /// and sources are baked into the instance.
    fn create_instance(&self, domain: &SimulationDomain) -> Result<Self::Instance, Self::Error>;

    fn memory_required(&self, domain: &SimulationDomain) -> Option<usize> {
        let _ = domain;
        None
    }
}

pub trait SolverInstance {
    type State: Time;
    type Error: std::error::Error + Send + Sync + 'static;

    fn create_state(&self) -> Self::State;

    /// Simulated time advanced by one [`update`][Self::update].
    fn time_step(&self) -> f64;

    fn update(&self, state: &mut Self::State) -> Result<(), Self::Error>;

    /// Field value at the lattice site nearest to `point`.
    ///
    /// Returns `None` if the point lies outside of the domain.
    fn field_at(
        &self,
        state: &Self::State,
        component: FieldComponent,
        point: &Point3<f64>,
    ) -> Option<f64>;
}

pub trait Time {
    fn time(&self) -> f64;
    fn tick(&self) -> usize;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FieldComponent {
    Ex,
    Ey,
    Ez,
    Hx,
    Hy,
    Hz,
}

impl FieldComponent {
    pub fn is_electric(&self) -> bool {
        matches!(self, Self::Ex | Self::Ey | Self::Ez)
    }
}

/// Read-only access to the fields of a running simulation.
///
/// This is what step functions get to see. It can't be used to modify the
/// solver state.
#[derive(derive_more::Debug)]
pub struct FieldView<'a, I>
where
    I: SolverInstance,
{
    #[debug(skip)]
    instance: &'a I,
    #[debug(skip)]
    state: &'a I::State,
    domain: &'a SimulationDomain,
}

impl<'a, I> FieldView<'a, I>
where
    I: SolverInstance,
{
    pub fn new(instance: &'a I, state: &'a I::State, domain: &'a SimulationDomain) -> Self {
        Self {
            instance,
            state,
            domain,
        }
    }

    pub fn time(&self) -> f64 {
        self.state.time()
    }

    pub fn tick(&self) -> usize {
        self.state.tick()
    }

    pub fn domain(&self) -> &SimulationDomain {
        self.domain
    }

    pub fn at(&self, component: FieldComponent, point: &Point3<f64>) -> Option<f64> {
        self.instance.field_at(self.state, component, point)
    }

    /// Samples the `z = 0` plane of the whole domain into a frame of
    /// `size` pixels. Row 0 is the top of the domain (largest y).
    pub fn sample_plane(&self, component: FieldComponent, size: Vector2<u32>) -> FieldFrame {
        let origin = self.domain.origin();
        let extent = self.domain.size;

        let mut values = Vec::with_capacity(size.x as usize * size.y as usize);
        for row in 0..size.y {
            let v = (f64::from(row) + 0.5) / f64::from(size.y);
            let y = origin.y + extent.y * (1.0 - v);
            for column in 0..size.x {
                let u = (f64::from(column) + 0.5) / f64::from(size.x);
                let x = origin.x + extent.x * u;
                let value = self
                    .at(component, &Point3::new(x, y, 0.0))
                    .unwrap_or_default();
                values.push(value as f32);
            }
        }

        FieldFrame {
            size,
            time: self.time(),
            values,
        }
    }
}
