//! Patch information

use super::{CoarseNbrInfo, FineNbrInfo, NbrInfo, NbrType, NormalNbrInfo};
use crate::topology::Orthant;
use crate::traits::{Face, number_of_boundary_faces};
use std::collections::HashMap;

/// The patch on the next coarser level that covers a patch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentInfo<const D: usize> {
    /// Id of the parent
    pub id: usize,
    /// Rank that owns the parent
    pub rank: usize,
    /// The orthant of the parent that this patch occupies
    ///
    /// This is the null orthant if the parent is a patch of the same size.
    pub orth_on_parent: Orthant<D>,
}

/// A child on the next finer level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChildInfo {
    /// Id of the child
    pub id: usize,
    /// Rank that owns the child
    pub rank: usize,
}

/// The children of a patch on the next finer level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Children {
    /// The patch is on the finest level
    #[default]
    None,
    /// The patch is refined into `2^D` children, ordered by orthant
    Orthants(Vec<ChildInfo>),
    /// The patch is not refined on the finer level, so its single child has the same size
    Coarsened(ChildInfo),
}

impl Children {
    /// The children as a slice
    pub fn as_slice(&self) -> &[ChildInfo] {
        match self {
            Self::None => &[],
            Self::Orthants(children) => children,
            Self::Coarsened(child) => std::slice::from_ref(child),
        }
    }

    /// The ids of the children
    pub fn child_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.as_slice().iter().map(|c| c.id)
    }

    /// The ranks that own the children
    pub fn child_ranks(&self) -> impl Iterator<Item = usize> + '_ {
        self.as_slice().iter().map(|c| c.rank)
    }

    /// The child that occupies an orthant
    ///
    /// For a coarsened patch, the null orthant gives the single child.
    pub fn child_on_orthant<const D: usize>(&self, orthant: Orthant<D>) -> Option<&ChildInfo> {
        match self {
            Self::None => None,
            Self::Orthants(children) if !orthant.is_null() => children.get(orthant.index()),
            Self::Orthants(_) => None,
            Self::Coarsened(child) => orthant.is_null().then_some(child),
        }
    }
}

/// A patch: one block of the structured grid at one refinement level
///
/// Every patch stores one optional neighbor entry for each of its boundary faces. In three
/// dimensions these are the 8 corners, 12 edges and 6 sides; in two dimensions the 4 corners and
/// 4 sides.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchInfo<const D: usize> {
    /// Globally unique id
    pub id: usize,
    /// Index of this patch in the local patches of its domain
    pub local_index: usize,
    /// Index of this patch across all processes of its domain
    pub global_index: usize,
    /// Rank that owns this patch
    pub rank: usize,
    /// Refinement level
    pub refine_level: usize,
    /// The patch on the next coarser level covering this patch
    pub parent: Option<ParentInfo<D>>,
    /// The patches on the next finer level covering this patch
    pub children: Children,
    /// Number of cells along each axis
    pub ns: [usize; D],
    /// Number of ghost cells on each side
    pub num_ghost_cells: usize,
    /// Coordinates of the lower corner
    pub starts: [f64; D],
    /// Cell spacing along each axis
    pub spacings: [f64; D],
    nbr_infos: Vec<Option<NbrInfo>>,
}

impl<const D: usize> PatchInfo<D> {
    /// Create a patch with no neighbors, parent or children
    pub fn new(
        id: usize,
        rank: usize,
        ns: [usize; D],
        num_ghost_cells: usize,
        starts: [f64; D],
        spacings: [f64; D],
    ) -> Self {
        Self {
            id,
            local_index: 0,
            global_index: 0,
            rank,
            refine_level: 0,
            parent: None,
            children: Children::None,
            ns,
            num_ghost_cells,
            starts,
            spacings,
            nbr_infos: vec![None; number_of_boundary_faces(D)],
        }
    }

    /// Set the neighbor information on a face
    pub fn set_nbr_info<F: Face<D>>(&mut self, face: F, info: Option<NbrInfo>) {
        if let Some(NbrInfo::Fine(fine)) = &info {
            assert_eq!(
                fine.ids.len(),
                1 << F::DIM,
                "Expected {} fine neighbors across {face}, found {}",
                1 << F::DIM,
                fine.ids.len()
            );
        }
        self.nbr_infos[face.flat_index()] = info;
    }

    /// The neighbor information on a face
    pub fn nbr_info<F: Face<D>>(&self, face: F) -> Option<&NbrInfo> {
        self.nbr_infos[face.flat_index()].as_ref()
    }

    /// Does this patch have a neighbor across a face?
    pub fn has_nbr<F: Face<D>>(&self, face: F) -> bool {
        self.nbr_info(face).is_some()
    }

    /// Does this patch have a neighbor across any face?
    pub fn has_any_nbr(&self) -> bool {
        self.nbr_infos.iter().any(|i| i.is_some())
    }

    /// The type of neighbor across a face
    pub fn nbr_type<F: Face<D>>(&self, face: F) -> Option<NbrType> {
        self.nbr_info(face).map(|i| i.nbr_type())
    }

    /// The neighbor across a face, if it is at the same level
    pub fn normal_nbr_info<F: Face<D>>(&self, face: F) -> Option<&NormalNbrInfo> {
        match self.nbr_info(face) {
            Some(NbrInfo::Normal(info)) => Some(info),
            _ => None,
        }
    }

    /// The neighbor across a face, if it is coarser
    pub fn coarse_nbr_info<F: Face<D>>(&self, face: F) -> Option<&CoarseNbrInfo> {
        match self.nbr_info(face) {
            Some(NbrInfo::Coarse(info)) => Some(info),
            _ => None,
        }
    }

    /// The neighbors across a face, if they are finer
    pub fn fine_nbr_info<F: Face<D>>(&self, face: F) -> Option<&FineNbrInfo> {
        match self.nbr_info(face) {
            Some(NbrInfo::Fine(info)) => Some(info),
            _ => None,
        }
    }

    /// All neighbor information, indexed by the flat face numbering
    pub fn nbr_infos(&self) -> &[Option<NbrInfo>] {
        &self.nbr_infos
    }

    /// The ids of every neighbor, in face order
    pub fn nbr_ids(&self) -> Vec<usize> {
        self.nbr_infos
            .iter()
            .flatten()
            .flat_map(|i| i.ids().iter().copied())
            .collect()
    }

    /// The ranks of every neighbor, in face order
    pub fn nbr_ranks(&self) -> Vec<usize> {
        self.nbr_infos
            .iter()
            .flatten()
            .flat_map(|i| i.ranks().iter().copied())
            .collect()
    }

    /// Set the local indices of neighbors that are owned by this process
    pub fn set_neighbor_local_indexes(&mut self, id_to_local_index: &HashMap<usize, usize>) {
        for info in self.nbr_infos.iter_mut().flatten() {
            info.set_local_indexes(id_to_local_index);
        }
    }

    /// Set the global indices of all neighbors
    pub fn set_neighbor_global_indexes(&mut self, id_to_global_index: &HashMap<usize, usize>) {
        for info in self.nbr_infos.iter_mut().flatten() {
            info.set_global_indexes(id_to_global_index);
        }
    }

    /// Is the parent of this patch larger than this patch?
    pub fn has_coarse_parent(&self) -> bool {
        self.parent
            .map(|p| !p.orth_on_parent.is_null())
            .unwrap_or(false)
    }

    /// The number of cells in this patch, excluding ghost cells
    pub fn num_cells(&self) -> usize {
        self.ns.iter().product()
    }

    /// The number of cells in this patch, including ghost cells
    pub fn num_cells_with_ghost(&self) -> usize {
        self.ns
            .iter()
            .map(|n| n + 2 * self.num_ghost_cells)
            .product()
    }

    /// The volume covered by this patch
    pub fn volume(&self) -> f64 {
        self.ns
            .iter()
            .zip(&self.spacings)
            .map(|(n, h)| *n as f64 * h)
            .product()
    }

    pub(crate) fn set_nbr_infos(&mut self, nbr_infos: Vec<Option<NbrInfo>>) {
        assert_eq!(nbr_infos.len(), number_of_boundary_faces(D));
        self.nbr_infos = nbr_infos;
    }
}
