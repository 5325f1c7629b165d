use nalgebra::{
    Point2,
    Point3,
    Vector2,
};

use crate::{
    domain::SimulationDomain,
    fdtd::{
        FdtdConfig,
        FdtdError,
        Resolution,
        lattice::Lattice,
        source::{
            PlacedSource,
            SourceTarget,
            place,
        },
        strider::Strider,
        util::UpdateCoefficients,
    },
    solver::{
        FieldComponent,
        SolverInstance,
        Time,
    },
    util::nearest_cell,
};

#[derive(Clone, Debug)]
pub struct FdtdInstance {
    strider: Strider,
    resolution: Resolution,
    origin: Point2<f64>,
    extent: Vector2<f64>,
    update_coefficients: Lattice<UpdateCoefficients>,
    sources: Vec<PlacedSource>,
}

impl FdtdInstance {
    pub(super) fn new(config: &FdtdConfig, domain: &SimulationDomain) -> Result<Self, FdtdError> {
        let resolution = Resolution::new(domain, config.courant, &config.physical_constants)?;
        let strider = Strider::new(&domain.lattice_size().xy());
        let origin = domain.origin();

        let update_coefficients = Lattice::from_fn(&strider, |_index, point| {
            let center = domain.cell_center(point.x, point.y);
            let absorber =
                config
                    .absorber
                    .conductivity(&domain.boundary, &center, &origin, &domain.size);
            UpdateCoefficients::new(
                &resolution,
                &config.physical_constants,
                &domain.medium_at(&center).material,
                absorber,
            )
        });

        let sources = domain
            .sources
            .iter()
            .enumerate()
            .map(|(index, source)| place(index, source, domain, &strider, &resolution.spatial))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            size = ?strider.size(),
            ?resolution,
            num_sources = sources.len(),
            "created fdtd instance"
        );

        Ok(Self {
            strider,
            resolution,
            origin: origin.xy(),
            extent: domain.size.xy(),
            update_coefficients,
            sources,
        })
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn strider(&self) -> &Strider {
        &self.strider
    }

    fn update_h(&self, state: &mut FdtdState) {
        let size = self.strider.size();
        let stride_y = self.strider.stride_y();
        let dx = self.resolution.spatial.x;
        let dy = self.resolution.spatial.y;

        for (index, point) in self.strider.iter() {
            let coefficients = &self.update_coefficients[index];

            if point.y + 1 < size.y {
                let curl = (state.ez[index + stride_y] - state.ez[index]) / dy;
                state.hx[index] = coefficients.d_a * state.hx[index] - coefficients.d_b * curl;
            }
            if point.x + 1 < size.x {
                let curl = (state.ez[index + 1] - state.ez[index]) / dx;
                state.hy[index] = coefficients.d_a * state.hy[index] + coefficients.d_b * curl;
            }
        }

        // magnetic currents are evaluated at the same time as the E field
        for placed in &self.sources {
            let value = placed.source.value(state.time);
            let field = match placed.target {
                SourceTarget::Hx => &mut state.hx,
                SourceTarget::Hy => &mut state.hy,
                SourceTarget::Ez => continue,
            };
            for (index, weight) in &placed.cells {
                field[*index] -= self.update_coefficients[*index].d_b * weight * value;
            }
        }
    }

    fn update_e(&self, state: &mut FdtdState) {
        let stride_y = self.strider.stride_y();
        let dx = self.resolution.spatial.x;
        let dy = self.resolution.spatial.y;

        for (index, point) in self.strider.iter() {
            if self.strider.is_edge(&point) {
                continue;
            }
            let coefficients = &self.update_coefficients[index];
            let curl = (state.hy[index] - state.hy[index - 1]) / dx
                - (state.hx[index] - state.hx[index - stride_y]) / dy;
            state.ez[index] = coefficients.c_a * state.ez[index] + coefficients.c_b * curl;
        }

        // electric currents live half a step after the H field
        let time = state.time + 0.5 * self.resolution.temporal;
        for placed in &self.sources {
            if placed.target != SourceTarget::Ez {
                continue;
            }
            let value = placed.source.value(time);
            for (index, weight) in &placed.cells {
                state.ez[*index] -= self.update_coefficients[*index].c_b * weight * value;
            }
        }
    }

    fn lattice_point(&self, point: &Point3<f64>) -> Option<Point2<usize>> {
        let half = 0.5 * self.extent;
        if point.x.abs() > half.x || point.y.abs() > half.y {
            return None;
        }
        let size = self.strider.size();
        Some(Point2::new(
            nearest_cell(point.x, self.origin.x, self.resolution.spatial.x, size.x),
            nearest_cell(point.y, self.origin.y, self.resolution.spatial.y, size.y),
        ))
    }
}

impl SolverInstance for FdtdInstance {
    type State = FdtdState;
    type Error = FdtdError;

    fn create_state(&self) -> Self::State {
        FdtdState::new(&self.strider)
    }

    fn time_step(&self) -> f64 {
        self.resolution.temporal
    }

    fn update(&self, state: &mut Self::State) -> Result<(), Self::Error> {
        self.update_h(state);
        self.update_e(state);

        state.tick += 1;
        state.time = state.tick as f64 * self.resolution.temporal;

        let finite = state
            .ez
            .iter()
            .chain(state.hx.iter())
            .chain(state.hy.iter())
            .all(|value| value.is_finite());
        if !finite {
            tracing::error!(tick = state.tick, time = state.time, "field diverged");
            return Err(FdtdError::Diverged {
                tick: state.tick,
                time: state.time,
            });
        }

        Ok(())
    }

    fn field_at(
        &self,
        state: &Self::State,
        component: FieldComponent,
        point: &Point3<f64>,
    ) -> Option<f64> {
        let index = self.strider.index(&self.lattice_point(point)?)?;
        match component {
            FieldComponent::Ez => Some(state.ez[index]),
            FieldComponent::Hx => Some(state.hx[index]),
            FieldComponent::Hy => Some(state.hy[index]),
            // not part of the TMz polarization
            FieldComponent::Ex | FieldComponent::Ey | FieldComponent::Hz => Some(0.0),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FdtdState {
    ez: Lattice<f64>,
    hx: Lattice<f64>,
    hy: Lattice<f64>,
    tick: usize,
    time: f64,
}

impl FdtdState {
    fn new(strider: &Strider) -> Self {
        Self {
            ez: Lattice::from_default(strider),
            hx: Lattice::from_default(strider),
            hy: Lattice::from_default(strider),
            tick: 0,
            time: 0.0,
        }
    }

    pub fn ez(&self) -> &[f64] {
        self.ez.as_slice()
    }

    /// Total field energy density summed over the lattice, in reduced units.
    pub fn field_energy(&self) -> f64 {
        self.ez
            .iter()
            .chain(self.hx.iter())
            .chain(self.hy.iter())
            .map(|value| value * value)
            .sum()
    }
}

impl Time for FdtdState {
    fn time(&self) -> f64 {
        self.time
    }

    fn tick(&self) -> usize {
        self.tick
    }
}
