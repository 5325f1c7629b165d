//! Parametric builders for waveguides, bends and cavities.
//!
//! Every builder validates its parameters before producing any shapes, so an
//! invalid configuration is rejected before a solver ever sees it.

use std::{
    f64::consts::FRAC_PI_2,
    sync::Arc,
};

use nalgebra::{
    Point2,
    Point3,
    Vector2,
    Vector3,
};

use crate::{
    geometry::{
        Block,
        Geometry,
        Shape,
        Wedge,
    },
    material::Medium,
};

#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("{parameter} must be positive, but is {value}")]
    NonPositive { parameter: &'static str, value: f64 },

    #[error("guide width {width} must be smaller than bend radius {radius}")]
    WidthExceedsRadius { width: f64, radius: f64 },

    #[error("gap of {gap} doesn't fit into a wall of length {length}")]
    GapTooWide { gap: f64, length: f64 },

    #[error("{segment} wall segment would have non-positive length {length}")]
    DegenerateSegment { segment: &'static str, length: f64 },

    #[error("wall thickness {thickness} leaves no interior in a cavity extent of {extent}")]
    WallTooThick { thickness: f64, extent: f64 },
}

fn ensure_positive(parameter: &'static str, value: f64) -> Result<(), GeometryError> {
    if value > 0.0 {
        Ok(())
    }
    else {
        Err(GeometryError::NonPositive { parameter, value })
    }
}

/// Anything that can produce a [`Geometry`] from a few physical dimensions.
pub trait GeometryBuilder {
    fn build(&self) -> Result<Geometry, GeometryError>;

    /// Extent of the domain the geometry is laid out for. The z extent is 0
    /// for 2D problems.
    fn extent(&self) -> Vector3<f64>;
}

/// A segment of a wall along one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallSegment {
    pub center: f64,
    pub length: f64,
}

/// Splits the wall `[start, end]` into two segments that leave a gap of width
/// `gap` centered at `gap_center`.
///
/// The segment lengths always add up to `end - start - gap`. For a gap in the
/// middle of the wall both are `(end - start - gap) / 2`.
pub fn split_wall(
    start: f64,
    end: f64,
    gap_center: f64,
    gap: f64,
) -> Result<[WallSegment; 2], GeometryError> {
    let length = end - start;
    ensure_positive("wall length", length)?;
    ensure_positive("gap", gap)?;
    if gap >= length {
        return Err(GeometryError::GapTooWide { gap, length });
    }

    let gap_start = gap_center - 0.5 * gap;
    let gap_end = gap_center + 0.5 * gap;

    let low = gap_start - start;
    let high = end - gap_end;
    if low <= 0.0 {
        return Err(GeometryError::DegenerateSegment {
            segment: "lower",
            length: low,
        });
    }
    if high <= 0.0 {
        return Err(GeometryError::DegenerateSegment {
            segment: "upper",
            length: high,
        });
    }

    Ok([
        WallSegment {
            center: gap_start - 0.5 * low,
            length: low,
        },
        WallSegment {
            center: gap_end + 0.5 * high,
            length: high,
        },
    ])
}

/// A straight guide along the y axis, centered in the domain.
#[derive(Clone, Debug)]
pub struct StraightWaveguide {
    pub width: f64,
    pub height: f64,
    pub core: Arc<Medium>,
    pub domain: Vector2<f64>,
}

impl GeometryBuilder for StraightWaveguide {
    fn build(&self) -> Result<Geometry, GeometryError> {
        ensure_positive("width", self.width)?;
        ensure_positive("height", self.height)?;

        Ok(Geometry::new().with(Shape::new(
            Block::new(
                Point3::origin(),
                Vector3::new(self.width, f64::INFINITY, self.height),
            ),
            self.core.clone(),
        )))
    }

    fn extent(&self) -> Vector3<f64> {
        Vector3::new(self.domain.x, self.domain.y, 0.0)
    }
}

/// A 90° bend: the input arm comes up from the bottom edge of the domain, the
/// output arm leaves through the left edge, and a quarter annulus around the
/// origin connects them.
///
/// The same layout works for a dielectric core in a cladding background and
/// for an air channel cut into metal, the difference is only which medium is
/// `guide` and which is `surround`.
#[derive(Clone, Debug)]
pub struct WaveguideBend {
    pub width: f64,
    pub radius: f64,
    pub height: f64,
    pub guide: Arc<Medium>,
    pub surround: Arc<Medium>,
    pub domain: Vector2<f64>,
}

impl WaveguideBend {
    pub fn inner_radius(&self) -> f64 {
        self.radius - self.width
    }

    /// Offset of the arm center lines from the origin.
    pub fn arm_offset(&self) -> f64 {
        self.radius - 0.5 * self.width
    }
}

impl GeometryBuilder for WaveguideBend {
    fn build(&self) -> Result<Geometry, GeometryError> {
        ensure_positive("width", self.width)?;
        ensure_positive("radius", self.radius)?;
        ensure_positive("height", self.height)?;
        if self.width >= self.radius {
            return Err(GeometryError::WidthExceedsRadius {
                width: self.width,
                radius: self.radius,
            });
        }

        let offset = self.arm_offset();

        let wedge = |radius, medium: &Arc<Medium>| {
            Shape::new(
                Wedge {
                    center: Point3::origin(),
                    radius,
                    height: self.height,
                    wedge_angle: FRAC_PI_2,
                    wedge_start: Vector3::x(),
                },
                medium.clone(),
            )
        };

        let mut geometry = Geometry::new();

        // input arm: from the bottom edge up to the bend
        geometry.push(Shape::new(
            Block::new(
                Point3::new(offset, -0.25 * self.domain.y, 0.0),
                Vector3::new(self.width, 0.5 * self.domain.y, self.height),
            ),
            self.guide.clone(),
        ));

        // output arm: from the bend to the left edge
        geometry.push(Shape::new(
            Block::new(
                Point3::new(-0.25 * self.domain.x, offset, 0.0),
                Vector3::new(0.5 * self.domain.x, self.width, self.height),
            ),
            self.guide.clone(),
        ));

        // outer sector first, the inner one is carved out of it
        geometry.push(wedge(self.radius, &self.guide));
        geometry.push(wedge(self.inner_radius(), &self.surround));

        Ok(geometry)
    }

    fn extent(&self) -> Vector3<f64> {
        Vector3::new(self.domain.x, self.domain.y, 0.0)
    }
}

/// Four walls enclosing a rectangular cavity. The walls lie inside `size`.
#[derive(Clone, Debug)]
pub struct ClosedCavity {
    pub size: Vector2<f64>,
    pub center: Point2<f64>,
    pub wall_thickness: f64,
    pub wall: Arc<Medium>,
}

impl ClosedCavity {
    fn validate(&self) -> Result<(), GeometryError> {
        ensure_positive("cavity width", self.size.x)?;
        ensure_positive("cavity height", self.size.y)?;
        ensure_positive("wall thickness", self.wall_thickness)?;
        let extent = self.size.x.min(self.size.y);
        if 2.0 * self.wall_thickness >= extent {
            return Err(GeometryError::WallTooThick {
                thickness: self.wall_thickness,
                extent,
            });
        }
        Ok(())
    }

    fn wall_block(&self, center: Point2<f64>, size: Vector2<f64>) -> Shape {
        Shape::new(
            Block::new(
                Point3::new(center.x, center.y, 0.0),
                Vector3::new(size.x, size.y, f64::INFINITY),
            ),
            self.wall.clone(),
        )
    }

    fn half(&self) -> Vector2<f64> {
        0.5 * self.size
    }

    fn top(&self) -> Shape {
        let t = self.wall_thickness;
        self.wall_block(
            Point2::new(self.center.x, self.center.y + self.half().y - 0.5 * t),
            Vector2::new(self.size.x, t),
        )
    }

    fn bottom(&self) -> Shape {
        let t = self.wall_thickness;
        self.wall_block(
            Point2::new(self.center.x, self.center.y - self.half().y + 0.5 * t),
            Vector2::new(self.size.x, t),
        )
    }

    fn right(&self) -> Shape {
        let t = self.wall_thickness;
        self.wall_block(
            Point2::new(self.center.x + self.half().x - 0.5 * t, self.center.y),
            Vector2::new(t, self.size.y),
        )
    }

    fn left(&self) -> Shape {
        let t = self.wall_thickness;
        self.wall_block(
            Point2::new(self.center.x - self.half().x + 0.5 * t, self.center.y),
            Vector2::new(t, self.size.y),
        )
    }
}

impl GeometryBuilder for ClosedCavity {
    fn build(&self) -> Result<Geometry, GeometryError> {
        self.validate()?;
        Ok(Geometry::new()
            .with(self.top())
            .with(self.bottom())
            .with(self.right())
            .with(self.left()))
    }

    fn extent(&self) -> Vector3<f64> {
        Vector3::new(self.size.x, self.size.y, 0.0)
    }
}

/// A cavity fed through a gap in its bottom wall by a channel below it.
///
/// The domain holds the cavity on top of the feed channel, so it is
/// `cavity_size.y + feed_length` tall and centered at the origin.
#[derive(Clone, Debug)]
pub struct FedCavity {
    pub cavity_size: Vector2<f64>,
    pub wall_thickness: f64,
    pub feed_width: f64,
    pub feed_length: f64,
    pub wall: Arc<Medium>,
}

impl FedCavity {
    fn cavity(&self) -> ClosedCavity {
        ClosedCavity {
            size: self.cavity_size,
            center: self.cavity_center(),
            wall_thickness: self.wall_thickness,
            wall: self.wall.clone(),
        }
    }

    pub fn cavity_center(&self) -> Point2<f64> {
        Point2::new(0.0, 0.5 * self.feed_length)
    }

    /// Center of the feed channel.
    pub fn feed_center(&self) -> Point2<f64> {
        Point2::new(
            0.0,
            self.cavity_center().y - 0.5 * self.cavity_size.y - 0.5 * self.feed_length,
        )
    }
}

impl GeometryBuilder for FedCavity {
    fn build(&self) -> Result<Geometry, GeometryError> {
        ensure_positive("feed width", self.feed_width)?;
        ensure_positive("feed length", self.feed_length)?;

        let cavity = self.cavity();
        cavity.validate()?;

        let t = self.wall_thickness;
        let center = cavity.center;
        let half = cavity.half();

        let mut geometry = Geometry::new()
            .with(cavity.top())
            .with(cavity.left())
            .with(cavity.right());

        // bottom wall with the feed aperture
        let bottom_y = center.y - half.y + 0.5 * t;
        for segment in split_wall(
            center.x - half.x,
            center.x + half.x,
            center.x,
            self.feed_width,
        )? {
            geometry.push(cavity.wall_block(
                Point2::new(segment.center, bottom_y),
                Vector2::new(segment.length, t),
            ));
        }

        // side walls of the feed channel, flush with the aperture
        let feed = self.feed_center();
        for side in [-1.0, 1.0] {
            geometry.push(cavity.wall_block(
                Point2::new(side * (0.5 * self.feed_width + 0.5 * t), feed.y),
                Vector2::new(t, self.feed_length),
            ));
        }

        Ok(geometry)
    }

    fn extent(&self) -> Vector3<f64> {
        Vector3::new(
            self.cavity_size.x,
            self.cavity_size.y + self.feed_length,
            0.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use nalgebra::{
        Point2,
        Point3,
        Vector2,
        Vector3,
    };

    use crate::{
        geometry::{
            ShapeKind,
            builder::{
                ClosedCavity,
                FedCavity,
                GeometryBuilder,
                GeometryError,
                StraightWaveguide,
                WaveguideBend,
                split_wall,
            },
        },
        material::{
            MaterialCatalog,
            Medium,
        },
    };

    fn media() -> (Arc<Medium>, Arc<Medium>, Arc<Medium>) {
        let catalog = MaterialCatalog::with_presets();
        (
            catalog.get("silicon_low").unwrap(),
            catalog.get("silica").unwrap(),
            catalog.get("metal").unwrap(),
        )
    }

    fn bend(width: f64, radius: f64) -> WaveguideBend {
        let (core, cladding, _) = media();
        WaveguideBend {
            width,
            radius,
            height: 0.22,
            guide: core,
            surround: cladding,
            domain: Vector2::new(15.0, 15.0),
        }
    }

    #[test]
    fn bend_inner_radius_is_positive_when_width_is_below_radius() {
        for (width, radius) in [(0.5, 5.0), (0.1, 0.2), (4.9, 5.0), (8.0, 12.0)] {
            let bend = bend(width, radius);
            let geometry = bend.build().unwrap();
            let ShapeKind::Wedge(inner) = geometry.shapes()[3].kind
            else {
                panic!("expected the inner sector last");
            };
            assert!(inner.radius > 0.0);
            assert_eq!(inner.radius, radius - width);
        }
    }

    #[test]
    fn bend_rejects_width_not_below_radius() {
        for (width, radius) in [(5.0, 5.0), (6.0, 5.0)] {
            assert!(matches!(
                bend(width, radius).build(),
                Err(GeometryError::WidthExceedsRadius { .. })
            ));
        }
    }

    #[test]
    fn bend_is_an_annular_arc() {
        let bend = bend(0.5, 5.0);
        let geometry = bend.build().unwrap();
        let background = bend.surround.clone();

        let at = |x: f64, y: f64| geometry.medium_at(&Point3::new(x, y, 0.0), &background).clone();

        // on the arc, 45° in
        let r = bend.arm_offset();
        let d = r / 2f64.sqrt();
        assert!(Arc::ptr_eq(&at(d, d), &bend.guide));

        // inside the inner sector
        assert!(Arc::ptr_eq(&at(1.0, 1.0), &bend.surround));

        // the arms
        assert!(Arc::ptr_eq(&at(r, -5.0), &bend.guide));
        assert!(Arc::ptr_eq(&at(-5.0, r), &bend.guide));

        // outside of the guide
        assert!(Arc::ptr_eq(&at(-5.0, -5.0), &bend.surround));
    }

    #[test]
    fn straight_waveguide_spans_the_domain() {
        let (core, cladding, _) = media();
        let guide = StraightWaveguide {
            width: 0.5,
            height: 0.22,
            core: core.clone(),
            domain: Vector2::new(3.0, 10.0),
        };
        let geometry = guide.build().unwrap();
        assert_eq!(geometry.len(), 1);
        for y in [-4.9, 0.0, 4.9] {
            let medium = geometry.medium_at(&Point3::new(0.0, y, 0.0), &cladding);
            assert!(Arc::ptr_eq(medium, &core));
        }
        let medium = geometry.medium_at(&Point3::new(0.3, 0.0, 0.0), &cladding);
        assert!(Arc::ptr_eq(medium, &cladding));
        assert_eq!(guide.extent(), Vector3::new(3.0, 10.0, 0.0));
    }

    #[test]
    fn straight_waveguide_rejects_zero_width() {
        let (core, _, _) = media();
        let guide = StraightWaveguide {
            width: 0.0,
            height: 0.22,
            core,
            domain: Vector2::new(3.0, 10.0),
        };
        assert!(matches!(
            guide.build(),
            Err(GeometryError::NonPositive {
                parameter: "width",
                ..
            })
        ));
    }

    #[test]
    fn gapped_wall_segments_cover_the_rest_of_the_wall() {
        for (start, end, gap_center, gap) in [
            (-15.0, 15.0, 0.0, 8.0),
            (-15.0, 15.0, 3.0, 8.0),
            (0.0, 1.0, 0.5, 0.1),
            (-7.3, 11.9, 2.2, 4.4),
        ] {
            let [low, high] = split_wall(start, end, gap_center, gap).unwrap();
            let total = end - start;
            assert!((low.length + high.length - (total - gap)).abs() < 1e-12);

            // segments touch the wall ends and the gap edges
            assert!((low.center - 0.5 * low.length - start).abs() < 1e-12);
            assert!((high.center + 0.5 * high.length - end).abs() < 1e-12);
            assert!((low.center + 0.5 * low.length - (gap_center - 0.5 * gap)).abs() < 1e-12);
            assert!((high.center - 0.5 * high.length - (gap_center + 0.5 * gap)).abs() < 1e-12);
        }
    }

    #[test]
    fn centered_gap_gives_equal_segments() {
        let [low, high] = split_wall(-15.0, 15.0, 0.0, 8.0).unwrap();
        assert_eq!(low.length, 11.0);
        assert_eq!(high.length, 11.0);
        assert_eq!(low.center, -high.center);
    }

    #[test]
    fn invalid_gaps_are_rejected() {
        assert!(matches!(
            split_wall(-1.0, 1.0, 0.0, -0.5),
            Err(GeometryError::NonPositive { .. })
        ));
        assert!(matches!(
            split_wall(-1.0, 1.0, 0.0, 2.0),
            Err(GeometryError::GapTooWide { .. })
        ));
        assert!(matches!(
            split_wall(-1.0, 1.0, 0.9, 0.5),
            Err(GeometryError::DegenerateSegment {
                segment: "upper",
                ..
            })
        ));
        assert!(matches!(
            split_wall(-1.0, 1.0, -0.75, 0.5),
            Err(GeometryError::DegenerateSegment {
                segment: "lower",
                ..
            })
        ));
    }

    #[test]
    fn closed_cavity_walls_are_inside_the_extent() {
        let (_, _, metal) = media();
        let air = Arc::new(Medium::new("air", Default::default()));
        let cavity = ClosedCavity {
            size: Vector2::new(30.0, 30.0),
            center: Point2::origin(),
            wall_thickness: 0.5,
            wall: metal.clone(),
        };
        let geometry = cavity.build().unwrap();
        assert_eq!(geometry.len(), 4);

        let at = |x: f64, y: f64| geometry.medium_at(&Point3::new(x, y, 0.0), &air).clone();
        assert!(Arc::ptr_eq(&at(0.0, 14.9), &metal));
        assert!(Arc::ptr_eq(&at(0.0, -14.9), &metal));
        assert!(Arc::ptr_eq(&at(14.9, 0.0), &metal));
        assert!(Arc::ptr_eq(&at(-14.9, 0.0), &metal));
        assert!(Arc::ptr_eq(&at(0.0, 14.4), &air));
        assert!(Arc::ptr_eq(&at(0.0, 0.0), &air));
    }

    #[test]
    fn closed_cavity_rejects_walls_without_interior() {
        let (_, _, metal) = media();
        let cavity = ClosedCavity {
            size: Vector2::new(2.0, 30.0),
            center: Point2::origin(),
            wall_thickness: 1.0,
            wall: metal,
        };
        assert!(matches!(
            cavity.build(),
            Err(GeometryError::WallTooThick { .. })
        ));
    }

    #[test]
    fn fed_cavity_has_an_aperture_into_the_feed() {
        let (_, _, metal) = media();
        let air = Arc::new(Medium::new("air", Default::default()));
        let oven = FedCavity {
            cavity_size: Vector2::new(30.0, 30.0),
            wall_thickness: 1.0,
            feed_width: 8.0,
            feed_length: 15.0,
            wall: metal.clone(),
        };
        let geometry = oven.build().unwrap();
        // top, left, right, two bottom segments, two feed walls
        assert_eq!(geometry.len(), 7);
        assert_eq!(oven.extent(), Vector3::new(30.0, 45.0, 0.0));

        let at = |x: f64, y: f64| geometry.medium_at(&Point3::new(x, y, 0.0), &air).clone();

        // bottom wall of the cavity sits at y = 7.5 - 15 + 0.5
        let bottom_y = -7.0;
        assert!(Arc::ptr_eq(&at(0.0, bottom_y), &air));
        assert!(Arc::ptr_eq(&at(3.9, bottom_y), &air));
        assert!(Arc::ptr_eq(&at(4.1, bottom_y), &metal));
        assert!(Arc::ptr_eq(&at(-4.1, bottom_y), &metal));
        assert!(Arc::ptr_eq(&at(-14.0, bottom_y), &metal));

        // feed channel walls
        let feed = oven.feed_center();
        assert_eq!(feed.y, -15.0);
        assert!(Arc::ptr_eq(&at(4.5, feed.y), &metal));
        assert!(Arc::ptr_eq(&at(-4.5, feed.y), &metal));
        assert!(Arc::ptr_eq(&at(0.0, feed.y), &air));
        assert!(Arc::ptr_eq(&at(5.1, feed.y), &air));
    }
}
