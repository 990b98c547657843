//! Views of one component of one patch

use std::ops::{Index, IndexMut};

/// The shape of a component of a patch, including ghost cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ViewShape<const D: usize> {
    ns: [usize; D],
    num_ghost_cells: usize,
    strides: [usize; D],
}

impl<const D: usize> ViewShape<D> {
    pub(crate) fn new(ns: [usize; D], num_ghost_cells: usize) -> Self {
        let mut strides = [1; D];
        for axis in 1..D {
            strides[axis] = strides[axis - 1] * (ns[axis - 1] + 2 * num_ghost_cells);
        }
        Self {
            ns,
            num_ghost_cells,
            strides,
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.ns
            .iter()
            .map(|n| n + 2 * self.num_ghost_cells)
            .product()
    }

    fn start(&self) -> [isize; D] {
        [0; D]
    }

    fn end(&self) -> [isize; D] {
        self.ns.map(|n| n as isize - 1)
    }

    fn ghost_start(&self) -> [isize; D] {
        [-(self.num_ghost_cells as isize); D]
    }

    fn ghost_end(&self) -> [isize; D] {
        self.ns
            .map(|n| n as isize - 1 + self.num_ghost_cells as isize)
    }

    fn offset(&self, index: [isize; D]) -> usize {
        let g = self.num_ghost_cells as isize;
        index
            .iter()
            .zip(&self.ns)
            .zip(&self.strides)
            .map(|((i, n), stride)| {
                debug_assert!(
                    *i >= -g && *i < *n as isize + g,
                    "Index {i} out of range for {n} cells and {g} ghost cells"
                );
                (i + g) as usize * stride
            })
            .sum()
    }
}

macro_rules! view_accessors {
    () => {
        /// The first interior index
        pub fn start(&self) -> [isize; D] {
            self.shape.start()
        }

        /// The last interior index
        pub fn end(&self) -> [isize; D] {
            self.shape.end()
        }

        /// The first index, including ghost cells
        pub fn ghost_start(&self) -> [isize; D] {
            self.shape.ghost_start()
        }

        /// The last index, including ghost cells
        pub fn ghost_end(&self) -> [isize; D] {
            self.shape.ghost_end()
        }

        /// The number of ghost cells on each side
        pub fn num_ghost_cells(&self) -> usize {
            self.shape.num_ghost_cells
        }
    };
}

/// A view of one component of one patch
///
/// Interior cells have indices from `0` to `n - 1` along each axis; ghost cells have negative
/// indices or indices of at least `n`.
#[derive(Debug, Clone, Copy)]
pub struct ComponentView<'a, const D: usize> {
    shape: ViewShape<D>,
    data: &'a [f64],
}

impl<'a, const D: usize> ComponentView<'a, D> {
    pub(crate) fn new(shape: ViewShape<D>, data: &'a [f64]) -> Self {
        debug_assert_eq!(data.len(), shape.size());
        Self { shape, data }
    }

    view_accessors!();
}

impl<const D: usize> Index<[isize; D]> for ComponentView<'_, D> {
    type Output = f64;
    fn index(&self, index: [isize; D]) -> &f64 {
        &self.data[self.shape.offset(index)]
    }
}

/// A mutable view of one component of one patch
#[derive(Debug)]
pub struct ComponentViewMut<'a, const D: usize> {
    shape: ViewShape<D>,
    data: &'a mut [f64],
}

impl<'a, const D: usize> ComponentViewMut<'a, D> {
    pub(crate) fn new(shape: ViewShape<D>, data: &'a mut [f64]) -> Self {
        debug_assert_eq!(data.len(), shape.size());
        Self { shape, data }
    }

    view_accessors!();
}

impl<const D: usize> Index<[isize; D]> for ComponentViewMut<'_, D> {
    type Output = f64;
    fn index(&self, index: [isize; D]) -> &f64 {
        &self.data[self.shape.offset(index)]
    }
}

impl<const D: usize> IndexMut<[isize; D]> for ComponentViewMut<'_, D> {
    fn index_mut(&mut self, index: [isize; D]) -> &mut f64 {
        &mut self.data[self.shape.offset(index)]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_offsets() {
        let shape = ViewShape::new([3, 2], 1);
        assert_eq!(shape.size(), 20);
        assert_eq!(shape.offset([-1, -1]), 0);
        assert_eq!(shape.offset([0, -1]), 1);
        assert_eq!(shape.offset([-1, 0]), 5);
        assert_eq!(shape.offset([3, 2]), 19);
    }

    #[test]
    fn test_bounds() {
        let data = vec![0.0; 20];
        let view = ComponentView::new(ViewShape::new([3, 2], 1), &data);
        assert_eq!(view.start(), [0, 0]);
        assert_eq!(view.end(), [2, 1]);
        assert_eq!(view.ghost_start(), [-1, -1]);
        assert_eq!(view.ghost_end(), [3, 2]);
    }

    #[test]
    fn test_index_mut() {
        let mut data = vec![0.0; 20];
        let mut view = ComponentViewMut::new(ViewShape::new([3, 2], 1), &mut data);
        view[[1, 0]] = 4.0;
        view[[-1, 2]] = 2.0;
        assert_eq!(view[[1, 0]], 4.0);
        assert_eq!(data[7], 4.0);
        assert_eq!(data[15], 2.0);
    }
}
