//! Shapes and their composition into a layered geometry.
//!
//! A [`Geometry`] is an ordered list of [`Shape`]s. Where shapes overlap, the
//! shape inserted last wins. This is how a cladding wedge carves the inside of
//! a core wedge, leaving only an annular arc of core material.

pub mod builder;

use std::{
    f64::consts::TAU,
    sync::Arc,
};

use nalgebra::{
    Point3,
    Vector3,
};

use crate::material::Medium;

pub trait Contains {
    fn contains(&self, point: &Point3<f64>) -> bool;
}

/// Axis-aligned rectangular block.
///
/// Any extent may be [`f64::INFINITY`], which extrudes the block along that
/// axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Block {
    pub center: Point3<f64>,
    pub size: Vector3<f64>,
}

impl Block {
    pub fn new(center: Point3<f64>, size: Vector3<f64>) -> Self {
        Self { center, size }
    }
}

impl Contains for Block {
    fn contains(&self, point: &Point3<f64>) -> bool {
        let d = point - self.center;
        (0..3).all(|i| d[i].abs() <= 0.5 * self.size[i])
    }
}

/// Circular sector around the z axis.
///
/// The sector covers all points within `radius` of `center` whose direction
/// lies within `wedge_angle` (counter-clockwise) of `wedge_start`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wedge {
    pub center: Point3<f64>,
    pub radius: f64,
    pub height: f64,
    pub wedge_angle: f64,
    pub wedge_start: Vector3<f64>,
}

impl Wedge {
    /// Angle of `point` measured counter-clockwise from `wedge_start`, in
    /// `[0, 2π)`.
    fn angle_of(&self, point: &Point3<f64>) -> f64 {
        let d = point - self.center;
        let start_angle = self.wedge_start.y.atan2(self.wedge_start.x);
        (d.y.atan2(d.x) - start_angle).rem_euclid(TAU)
    }
}

impl Contains for Wedge {
    fn contains(&self, point: &Point3<f64>) -> bool {
        let d = point - self.center;
        if d.z.abs() > 0.5 * self.height {
            return false;
        }
        if d.xy().norm() > self.radius {
            return false;
        }
        // the center itself is part of every non-empty sector
        if d.x == 0.0 && d.y == 0.0 {
            return true;
        }
        self.angle_of(point) <= self.wedge_angle
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShapeKind {
    Block(Block),
    Wedge(Wedge),
}

impl Contains for ShapeKind {
    fn contains(&self, point: &Point3<f64>) -> bool {
        match self {
            ShapeKind::Block(block) => block.contains(point),
            ShapeKind::Wedge(wedge) => wedge.contains(point),
        }
    }
}

impl From<Block> for ShapeKind {
    fn from(value: Block) -> Self {
        Self::Block(value)
    }
}

impl From<Wedge> for ShapeKind {
    fn from(value: Wedge) -> Self {
        Self::Wedge(value)
    }
}

#[derive(Clone, Debug)]
pub struct Shape {
    pub kind: ShapeKind,
    pub medium: Arc<Medium>,
}

impl Shape {
    pub fn new(kind: impl Into<ShapeKind>, medium: Arc<Medium>) -> Self {
        Self {
            kind: kind.into(),
            medium,
        }
    }
}

/// Ordered list of shapes. The insertion order is the priority.
#[derive(Clone, Debug, Default)]
pub struct Geometry {
    shapes: Vec<Shape>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a shape. It takes priority over all shapes already present.
    pub fn push(&mut self, shape: Shape) -> usize {
        let insertion_order = self.shapes.len();
        self.shapes.push(shape);
        insertion_order
    }

    pub fn with(mut self, shape: Shape) -> Self {
        self.push(shape);
        self
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// The shape that determines the medium at `point`, if any.
    pub fn shape_at(&self, point: &Point3<f64>) -> Option<&Shape> {
        self.shapes
            .iter()
            .rev()
            .find(|shape| shape.kind.contains(point))
    }

    /// Medium at `point`, falling back to `background` where no shape is.
    pub fn medium_at<'a>(
        &'a self,
        point: &Point3<f64>,
        background: &'a Arc<Medium>,
    ) -> &'a Arc<Medium> {
        self.shape_at(point)
            .map_or(background, |shape| &shape.medium)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        f64::consts::FRAC_PI_2,
        sync::Arc,
    };

    use nalgebra::{
        Point3,
        Vector3,
    };

    use crate::{
        geometry::{
            Block,
            Contains,
            Geometry,
            Shape,
            Wedge,
        },
        material::{
            Material,
            Medium,
        },
    };

    fn medium(name: &str) -> Arc<Medium> {
        Arc::new(Medium::new(name, Material::VACUUM))
    }

    fn quarter(radius: f64) -> Wedge {
        Wedge {
            center: Point3::origin(),
            radius,
            height: f64::INFINITY,
            wedge_angle: FRAC_PI_2,
            wedge_start: Vector3::x(),
        }
    }

    #[test]
    fn wedge_covers_only_its_quadrant() {
        let wedge = quarter(2.0);
        assert!(wedge.contains(&Point3::new(1.0, 1.0, 0.0)));
        assert!(wedge.contains(&Point3::new(1.5, 0.0, 0.0)));
        assert!(wedge.contains(&Point3::new(0.0, 1.5, 0.0)));
        assert!(!wedge.contains(&Point3::new(-1.0, 1.0, 0.0)));
        assert!(!wedge.contains(&Point3::new(1.0, -1.0, 0.0)));
        assert!(!wedge.contains(&Point3::new(1.5, 1.5, 0.0)));
    }

    #[test]
    fn wedge_respects_rotated_start() {
        let wedge = Wedge {
            wedge_start: Vector3::y(),
            ..quarter(2.0)
        };
        assert!(wedge.contains(&Point3::new(-1.0, 1.0, 0.0)));
        assert!(!wedge.contains(&Point3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn infinite_block_is_extruded() {
        let block = Block::new(
            Point3::origin(),
            Vector3::new(0.5, f64::INFINITY, 0.22),
        );
        assert!(block.contains(&Point3::new(0.2, 1e9, 0.0)));
        assert!(!block.contains(&Point3::new(0.3, 0.0, 0.0)));
        assert!(!block.contains(&Point3::new(0.0, 0.0, 0.2)));
    }

    #[test]
    fn later_shapes_take_priority() {
        let core = medium("core");
        let cladding = medium("cladding");
        let background = medium("background");

        let geometry = Geometry::new()
            .with(Shape::new(quarter(2.0), core.clone()))
            .with(Shape::new(quarter(1.5), cladding.clone()));

        // inside the inner sector: cladding wins over core
        let p = Point3::new(0.5, 0.5, 0.0);
        assert!(Arc::ptr_eq(geometry.medium_at(&p, &background), &cladding));

        // the annulus between the radii keeps the core
        let p = Point3::new(1.75, 0.1, 0.0);
        assert!(Arc::ptr_eq(geometry.medium_at(&p, &background), &core));

        // outside everything
        let p = Point3::new(-1.0, -1.0, 0.0);
        assert!(Arc::ptr_eq(geometry.medium_at(&p, &background), &background));
    }

    #[test]
    fn insertion_order_is_returned() {
        let mut geometry = Geometry::new();
        assert_eq!(
            geometry.push(Shape::new(quarter(1.0), medium("a"))),
            0
        );
        assert_eq!(
            geometry.push(Shape::new(quarter(1.0), medium("b"))),
            1
        );
        assert_eq!(geometry.len(), 2);
    }
}
