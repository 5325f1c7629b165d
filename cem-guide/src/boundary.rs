//! Absorbing boundary layers.
//!
//! An open structure is wrapped in an absorbing layer on all sides, a closed
//! resonator has none, and a semi-open cavity absorbs on exactly one side.

use nalgebra::{
    Point3,
    Vector3,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Side {
    Low,
    High,
}

/// One absorbing layer.
///
/// Without a `direction` the layer covers all axes, without a `side` it covers
/// both ends of its axes.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundaryLayer {
    pub thickness: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub direction: Option<Axis>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub side: Option<Side>,
}

impl BoundaryLayer {
    pub fn covers(&self, axis: Axis, side: Side) -> bool {
        self.direction.is_none_or(|direction| direction == axis)
            && self.side.is_none_or(|s| s == side)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AbsorbingBoundary {
    pub layers: Vec<BoundaryLayer>,
}

impl AbsorbingBoundary {
    /// Number of lattice cells used for a surrounding layer, unless stated
    /// otherwise.
    pub const DEFAULT_CELLS: usize = 10;

    /// Closed resonator: no absorption at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn surrounding(thickness: f64) -> Self {
        Self {
            layers: vec![BoundaryLayer {
                thickness,
                direction: None,
                side: None,
            }],
        }
    }

    /// Surrounding layer that is `cells` lattice cells thick.
    pub fn surrounding_cells(cells: usize, resolution: f64) -> Self {
        Self::surrounding(cells as f64 / resolution)
    }

    pub fn single(thickness: f64, axis: Axis, side: Side) -> Self {
        Self {
            layers: vec![BoundaryLayer {
                thickness,
                direction: Some(axis),
                side: Some(side),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(|layer| layer.thickness <= 0.0)
    }

    /// Thickness of the absorber on one face of the domain.
    pub fn thickness(&self, axis: Axis, side: Side) -> f64 {
        self.layers
            .iter()
            .filter(|layer| layer.covers(axis, side))
            .map(|layer| layer.thickness)
            .fold(0.0, f64::max)
    }

    /// Normalized penetration depth into the absorber for every axis.
    ///
    /// `0` means outside of any layer, `1` is the outer edge of the domain.
    /// `origin` and `size` describe the domain. Axes with zero extent are
    /// skipped.
    pub fn depth_at(
        &self,
        point: &Point3<f64>,
        origin: &Point3<f64>,
        size: &Vector3<f64>,
    ) -> Vector3<f64> {
        let mut depth = Vector3::<f64>::zeros();
        for axis in Axis::ALL {
            let i = axis.index();
            if size[i] <= 0.0 {
                continue;
            }

            let low = self.thickness(axis, Side::Low);
            if low > 0.0 {
                let into = (origin[i] + low - point[i]) / low;
                depth[i] = depth[i].max(into.clamp(0.0, 1.0));
            }

            let high = self.thickness(axis, Side::High);
            if high > 0.0 {
                let into = (point[i] - (origin[i] + size[i] - high)) / high;
                depth[i] = depth[i].max(into.clamp(0.0, 1.0));
            }
        }
        depth
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{
        Point3,
        Vector3,
    };

    use crate::boundary::{
        AbsorbingBoundary,
        Axis,
        Side,
    };

    #[test]
    fn surrounding_layer_is_ten_cells_by_default() {
        let boundary =
            AbsorbingBoundary::surrounding_cells(AbsorbingBoundary::DEFAULT_CELLS, 25.0);
        for axis in Axis::ALL {
            for side in [Side::Low, Side::High] {
                assert!((boundary.thickness(axis, side) - 0.4).abs() < 1e-12);
            }
        }
        assert!(!boundary.is_empty());
    }

    #[test]
    fn closed_resonator_has_no_absorber() {
        let boundary = AbsorbingBoundary::none();
        assert!(boundary.is_empty());
        assert_eq!(boundary.thickness(Axis::X, Side::Low), 0.0);
    }

    #[test]
    fn single_side_only_covers_that_side() {
        let boundary = AbsorbingBoundary::single(1.0, Axis::Y, Side::Low);
        assert_eq!(boundary.thickness(Axis::Y, Side::Low), 1.0);
        assert_eq!(boundary.thickness(Axis::Y, Side::High), 0.0);
        assert_eq!(boundary.thickness(Axis::X, Side::Low), 0.0);
    }

    #[test]
    fn depth_grows_towards_the_edge() {
        let boundary = AbsorbingBoundary::single(1.0, Axis::Y, Side::Low);
        let origin = Point3::new(-15.0, -22.5, 0.0);
        let size = Vector3::new(30.0, 45.0, 0.0);

        let depth = |y: f64| boundary.depth_at(&Point3::new(0.0, y, 0.0), &origin, &size).y;

        assert_eq!(depth(0.0), 0.0);
        assert_eq!(depth(-21.5), 0.0);
        assert!((depth(-22.0) - 0.5).abs() < 1e-12);
        assert_eq!(depth(-22.5), 1.0);
        assert_eq!(depth(22.5), 0.0);
    }
}
