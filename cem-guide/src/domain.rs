//! The complete description of one simulation run.

use std::sync::Arc;

use nalgebra::{
    Point3,
    Vector2,
    Vector3,
};

use crate::{
    boundary::{
        AbsorbingBoundary,
        Axis,
        Side,
    },
    excitation::Source,
    geometry::Geometry,
    material::Medium,
};

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("resolution must be positive, but is {resolution}")]
    NonPositiveResolution { resolution: f64 },

    #[error("domain extent along {axis:?} must be positive, but is {extent}")]
    NonPositiveExtent { axis: Axis, extent: f64 },

    #[error("domain extent along z must not be negative, but is {extent}")]
    NegativeDepth { extent: f64 },

    #[error("source {index} at {center:?} lies outside of the domain")]
    SourceOutsideDomain { index: usize, center: Point3<f64> },

    #[error("absorbing layers along {axis:?} ({thickness}) leave no interior in an extent of {extent}")]
    AbsorberTooThick {
        axis: Axis,
        thickness: f64,
        extent: f64,
    },
}

/// Domain centered at the origin.
///
/// A z extent of 0 makes the domain 2D. Points are then only compared in
/// their x and y coordinates.
#[derive(Clone, Debug)]
pub struct SimulationDomain {
    pub size: Vector3<f64>,
    /// Lattice cells per unit length.
    pub resolution: f64,
    pub background: Arc<Medium>,
    pub boundary: AbsorbingBoundary,
    pub geometry: Geometry,
    pub sources: Vec<Source>,
}

impl SimulationDomain {
    pub fn new(size: Vector3<f64>, resolution: f64, background: Arc<Medium>) -> Self {
        Self {
            size,
            resolution,
            background,
            boundary: AbsorbingBoundary::none(),
            geometry: Geometry::new(),
            sources: vec![],
        }
    }

    pub fn with_boundary(mut self, boundary: AbsorbingBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.sources.push(source);
        self
    }

    pub fn is_2d(&self) -> bool {
        self.size.z == 0.0
    }

    /// Minimum corner.
    pub fn origin(&self) -> Point3<f64> {
        Point3::from(-0.5 * self.size)
    }

    pub fn cell_size(&self) -> f64 {
        1.0 / self.resolution
    }

    pub fn contains(&self, point: &Point3<f64>) -> bool {
        let half = 0.5 * self.size;
        let axes = if self.is_2d() { 2 } else { 3 };
        (0..axes).all(|i| point[i].abs() <= half[i])
    }

    /// Number of lattice cells along each axis. At least 1.
    pub fn lattice_size(&self) -> Vector3<usize> {
        self.size
            .map(|extent| ((extent * self.resolution).round() as usize).max(1))
    }

    pub fn num_cells(&self) -> usize {
        self.lattice_size().product()
    }

    /// Position of the center of lattice cell `(x, y)` in the `z = 0` plane.
    pub fn cell_center(&self, x: usize, y: usize) -> Point3<f64> {
        let origin = self.origin();
        let lattice = self.lattice_size();
        let step = self.size.xy().component_div(&lattice.xy().cast::<f64>());
        Point3::new(
            origin.x + (x as f64 + 0.5) * step.x,
            origin.y + (y as f64 + 0.5) * step.y,
            0.0,
        )
    }

    pub fn medium_at(&self, point: &Point3<f64>) -> &Arc<Medium> {
        self.geometry.medium_at(point, &self.background)
    }

    /// Time after which every source is off.
    ///
    /// `None` if any source runs forever. A domain without sources is quiet
    /// from the start.
    pub fn sources_end_time(&self) -> Option<f64> {
        self.sources
            .iter()
            .map(|source| source.waveform.end_time())
            .try_fold(0.0, |end, source_end| Some(f64::max(end, source_end?)))
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.resolution.is_nan() || self.resolution <= 0.0 {
            return Err(DomainError::NonPositiveResolution {
                resolution: self.resolution,
            });
        }
        for axis in [Axis::X, Axis::Y] {
            let extent = self.size[axis.index()];
            if extent.is_nan() || extent <= 0.0 {
                return Err(DomainError::NonPositiveExtent { axis, extent });
            }
        }
        if self.size.z < 0.0 {
            return Err(DomainError::NegativeDepth {
                extent: self.size.z,
            });
        }

        for axis in Axis::ALL {
            let extent = self.size[axis.index()];
            if extent == 0.0 {
                continue;
            }
            let thickness =
                self.boundary.thickness(axis, Side::Low) + self.boundary.thickness(axis, Side::High);
            if thickness >= extent {
                return Err(DomainError::AbsorberTooThick {
                    axis,
                    thickness,
                    extent,
                });
            }
        }

        for (index, source) in self.sources.iter().enumerate() {
            if !self.contains(&source.center) {
                return Err(DomainError::SourceOutsideDomain {
                    index,
                    center: source.center,
                });
            }
        }

        Ok(())
    }

    /// Media of the `z = 0` plane, sampled at the lattice cell centers.
    pub fn rasterize(&self) -> MediumGrid {
        let size = self.lattice_size().xy();
        let mut cells = Vec::with_capacity(size.x * size.y);
        for y in 0..size.y {
            for x in 0..size.x {
                cells.push(self.medium_at(&self.cell_center(x, y)).clone());
            }
        }
        MediumGrid { size, cells }
    }
}

/// Media on a 2D lattice. Row `y = 0` is the bottom of the domain.
#[derive(Clone, Debug)]
pub struct MediumGrid {
    pub size: Vector2<usize>,
    cells: Vec<Arc<Medium>>,
}

impl MediumGrid {
    pub fn get(&self, x: usize, y: usize) -> Option<&Arc<Medium>> {
        (x < self.size.x && y < self.size.y).then(|| &self.cells[y * self.size.x + x])
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &Arc<Medium>)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(index, medium)| (index % self.size.x, index / self.size.x, medium))
    }
}
