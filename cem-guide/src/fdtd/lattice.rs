use std::ops::{
    Index,
    IndexMut,
};

use nalgebra::Point2;

use crate::fdtd::strider::Strider;

/// One value per lattice cell, laid out as described by a [`Strider`].
#[derive(Clone, Debug)]
pub struct Lattice<T> {
    data: Box<[T]>,
}

impl<T> Lattice<T>
where
    T: Default,
{
    pub fn from_default(strider: &Strider) -> Self {
        Self::from_fn(strider, |_, _| Default::default())
    }
}

impl<T> Lattice<T> {
    pub fn from_fn(strider: &Strider, init: impl FnMut(usize, Point2<usize>) -> T) -> Self {
        let mut init = init;
        Self {
            data: strider
                .iter()
                .map(|(index, point)| init(index, point))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get_point(&self, strider: &Strider, point: &Point2<usize>) -> Option<&T> {
        let index = strider.index(point)?;
        self.data.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T> Index<usize> for Lattice<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for Lattice<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.data[index]
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{
        Point2,
        Vector2,
    };

    use crate::fdtd::{
        lattice::Lattice,
        strider::Strider,
    };

    #[test]
    fn initializes_every_cell_in_index_order() {
        let strider = Strider::new(&Vector2::new(3, 2));
        let lattice = Lattice::from_fn(&strider, |index, point| (index, point));
        assert_eq!(lattice.len(), 6);
        for (index, (stored_index, point)) in lattice.iter().enumerate() {
            assert_eq!(index, *stored_index);
            assert_eq!(strider.index(point), Some(index));
        }
        assert_eq!(
            lattice.get_point(&strider, &Point2::new(2, 1)),
            Some(&(5, Point2::new(2, 1)))
        );
    }
}
