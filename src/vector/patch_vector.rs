//! Cell data on the patches of a domain

use super::component_view::ViewShape;
use super::{ComponentView, ComponentViewMut, for_each_index};
use crate::domain::Domain;
use mpi::traits::Communicator;

/// Cell values for every local patch of a domain
///
/// The values are stored patch by patch. Within a patch the components are stored one after the
/// other, and each component stores every cell (including ghost cells) with axis 0 varying
/// fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector<const D: usize> {
    shape: ViewShape<D>,
    ns: [usize; D],
    num_ghost_cells: usize,
    num_components: usize,
    num_local_patches: usize,
    data: Vec<f64>,
}

impl<const D: usize> Vector<D> {
    /// Create a vector of zeros for the local patches of a domain
    pub fn new<C: Communicator>(domain: &Domain<'_, C, D>, num_components: usize) -> Self {
        Self::with_patches(
            domain.ns(),
            domain.num_ghost_cells(),
            num_components,
            domain.num_local_patches(),
        )
    }

    /// Create a vector of zeros with a given number of patches
    pub fn with_patches(
        ns: [usize; D],
        num_ghost_cells: usize,
        num_components: usize,
        num_local_patches: usize,
    ) -> Self {
        let shape = ViewShape::new(ns, num_ghost_cells);
        Self {
            shape,
            ns,
            num_ghost_cells,
            num_components,
            num_local_patches,
            data: vec![0.0; num_local_patches * num_components * shape.size()],
        }
    }

    /// The number of cells along each axis of each patch
    pub fn ns(&self) -> [usize; D] {
        self.ns
    }

    /// The number of ghost cells on each side of each patch
    pub fn num_ghost_cells(&self) -> usize {
        self.num_ghost_cells
    }

    /// The number of components
    pub fn num_components(&self) -> usize {
        self.num_components
    }

    /// The number of patches
    pub fn num_local_patches(&self) -> usize {
        self.num_local_patches
    }

    /// The number of values stored for each patch
    pub fn patch_size(&self) -> usize {
        self.num_components * self.shape.size()
    }

    /// The values of a patch
    pub fn patch(&self, patch_index: usize) -> &[f64] {
        let size = self.patch_size();
        &self.data[patch_index * size..(patch_index + 1) * size]
    }

    /// The values of a patch
    pub fn patch_mut(&mut self, patch_index: usize) -> &mut [f64] {
        let size = self.patch_size();
        &mut self.data[patch_index * size..(patch_index + 1) * size]
    }

    fn component_range(&self, patch_index: usize, component: usize) -> std::ops::Range<usize> {
        assert!(
            component < self.num_components,
            "Component {component} out of range"
        );
        let start = patch_index * self.patch_size() + component * self.shape.size();
        start..start + self.shape.size()
    }

    /// A view of one component of a patch
    pub fn component_view(&self, patch_index: usize, component: usize) -> ComponentView<'_, D> {
        let range = self.component_range(patch_index, component);
        ComponentView::new(self.shape, &self.data[range])
    }

    /// A mutable view of one component of a patch
    pub fn component_view_mut(
        &mut self,
        patch_index: usize,
        component: usize,
    ) -> ComponentViewMut<'_, D> {
        let range = self.component_range(patch_index, component);
        ComponentViewMut::new(self.shape, &mut self.data[range])
    }

    /// Set every interior value
    pub fn set(&mut self, value: f64) {
        for patch_index in 0..self.num_local_patches {
            for c in 0..self.num_components {
                let mut view = self.component_view_mut(patch_index, c);
                for_each_index(view.start(), view.end(), |i| view[i] = value);
            }
        }
    }

    /// Set every value, including ghost cells
    pub fn set_with_ghost(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Copy the values of another vector with the same shape
    pub fn copy_from(&mut self, other: &Self) {
        assert_eq!(self.ns, other.ns);
        assert_eq!(self.num_ghost_cells, other.num_ghost_cells);
        assert_eq!(self.num_components, other.num_components);
        assert_eq!(self.num_local_patches, other.num_local_patches);
        self.data.copy_from_slice(&other.data);
    }

    /// All values
    pub fn data(&self) -> &[f64] {
        &self.data
    }
}
