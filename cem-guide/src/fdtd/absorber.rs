use nalgebra::{
    Point3,
    Vector3,
};

use crate::boundary::{
    AbsorbingBoundary,
    Axis,
    Side,
};

/// Polynomial grading of the absorbing layer's conductivity.
///
/// The conductivity rises from 0 at the inner edge of the layer to
/// `sigma_max` at the domain edge as `depth^order`. `sigma_max` is chosen so
/// that a wave at normal incidence, crossing the layer and back, is
/// attenuated to `reflection`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbsorberGrading {
    pub order: f64,
    pub reflection: f64,
}

impl Default for AbsorberGrading {
    fn default() -> Self {
        Self {
            order: 3.0,
            reflection: 1e-6,
        }
    }
}

impl AbsorberGrading {
    pub fn sigma_max(&self, thickness: f64) -> f64 {
        -(self.order + 1.0) * self.reflection.ln() / (2.0 * thickness)
    }

    /// Conductivity (per unit permittivity) of the absorber at `point`.
    /// Contributions of overlapping layers along different axes add up.
    pub fn conductivity(
        &self,
        boundary: &AbsorbingBoundary,
        point: &Point3<f64>,
        origin: &Point3<f64>,
        size: &Vector3<f64>,
    ) -> f64 {
        if boundary.is_empty() {
            return 0.0;
        }

        let depth = boundary.depth_at(point, origin, size);
        Axis::ALL
            .iter()
            .filter(|axis| depth[axis.index()] > 0.0)
            .map(|axis| {
                let i = axis.index();
                let side = if point[i] < origin[i] + 0.5 * size[i] {
                    Side::Low
                }
                else {
                    Side::High
                };
                let thickness = boundary.thickness(*axis, side);
                self.sigma_max(thickness) * depth[i].powf(self.order)
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{
        Point3,
        Vector3,
    };

    use crate::{
        boundary::AbsorbingBoundary,
        fdtd::absorber::AbsorberGrading,
    };

    #[test]
    fn conductivity_is_graded() {
        let grading = AbsorberGrading::default();
        let boundary = AbsorbingBoundary::surrounding(1.0);
        let origin = Point3::new(-5.0, -5.0, 0.0);
        let size = Vector3::new(10.0, 10.0, 0.0);

        let sigma = |x: f64| grading.conductivity(&boundary, &Point3::new(x, 0.0, 0.0), &origin, &size);

        assert_eq!(sigma(0.0), 0.0);
        assert_eq!(sigma(3.9), 0.0);
        let half = sigma(4.5);
        let edge = sigma(5.0);
        assert!(half > 0.0);
        assert!((edge - grading.sigma_max(1.0)).abs() < 1e-9);
        assert!((half / edge - 0.125).abs() < 1e-9);
        assert!((sigma(-4.5) - half).abs() < 1e-9);
    }

    #[test]
    fn no_boundary_no_absorption() {
        let grading = AbsorberGrading::default();
        let sigma = grading.conductivity(
            &AbsorbingBoundary::none(),
            &Point3::new(4.9, 4.9, 0.0),
            &Point3::new(-5.0, -5.0, 0.0),
            &Vector3::new(10.0, 10.0, 0.0),
        );
        assert_eq!(sigma, 0.0);
    }
}
