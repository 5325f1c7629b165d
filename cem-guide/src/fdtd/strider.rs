use nalgebra::{
    Point2,
    Vector2,
    Vector3,
};

/// Maps 2D lattice points to indices into flat buffers. x is the fastest
/// varying coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Strider {
    /// x stride, y stride, total length
    strides: Vector3<usize>,
    size: Vector2<usize>,
}

impl Strider {
    pub fn new(size: &Vector2<usize>) -> Self {
        Self {
            strides: Vector3::new(1, size.x, size.x * size.y),
            size: *size,
        }
    }

    pub fn size(&self) -> &Vector2<usize> {
        &self.size
    }

    pub fn len(&self) -> usize {
        self.strides.z
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offset between two neighbouring cells along y.
    pub fn stride_y(&self) -> usize {
        self.strides.y
    }

    pub fn index_unchecked(&self, point: &Point2<usize>) -> usize {
        point.coords.dot(&self.strides.xy())
    }

    pub fn index(&self, point: &Point2<usize>) -> Option<usize> {
        self.is_inside(point)
            .then(|| self.index_unchecked(point))
    }

    pub fn point(&self, index: usize) -> Option<Point2<usize>> {
        (index < self.len()).then(|| Point2::new(index % self.strides.y, index / self.strides.y))
    }

    pub fn is_inside(&self, point: &Point2<usize>) -> bool {
        point.x < self.size.x && point.y < self.size.y
    }

    /// Whether the point lies on the outermost ring of the lattice.
    pub fn is_edge(&self, point: &Point2<usize>) -> bool {
        point.x == 0 || point.y == 0 || point.x + 1 >= self.size.x || point.y + 1 >= self.size.y
    }

    /// All points in index order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (usize, Point2<usize>)> + use<> {
        let width = self.strides.y;
        (0..self.len()).map(move |index| (index, Point2::new(index % width, index / width)))
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{
        Point2,
        Vector2,
    };

    use crate::fdtd::strider::Strider;

    #[test]
    fn index_and_point_are_inverse() {
        let strider = Strider::new(&Vector2::new(7, 5));
        assert_eq!(strider.len(), 35);
        for (index, point) in strider.iter() {
            assert_eq!(strider.index(&point), Some(index));
            assert_eq!(strider.point(index), Some(point));
        }
        assert_eq!(strider.point(35), None);
        assert_eq!(strider.index(&Point2::new(7, 0)), None);
    }

    #[test]
    fn x_is_contiguous() {
        let strider = Strider::new(&Vector2::new(7, 5));
        let a = strider.index(&Point2::new(3, 2)).unwrap();
        assert_eq!(strider.index(&Point2::new(4, 2)), Some(a + 1));
        assert_eq!(strider.index(&Point2::new(3, 3)), Some(a + strider.stride_y()));
    }

    #[test]
    fn edges() {
        let strider = Strider::new(&Vector2::new(4, 3));
        let edges = strider
            .iter()
            .filter(|(_, point)| strider.is_edge(point))
            .count();
        assert_eq!(edges, 10);
    }
}
