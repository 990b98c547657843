//! Patch hierarchies

use super::{Children, Domain, NbrInfo, PatchInfo};
use crate::traits::opposite_flat_index;
use mpi::traits::Communicator;
use std::collections::HashMap;
use thiserror::Error;

/// An inconsistency in a patch hierarchy
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HierarchyError {
    /// Two patches on one level have the same id
    #[error("Level {level} contains patch {id} more than once")]
    DuplicateId {
        /// Level
        level: usize,
        /// Patch id
        id: usize,
    },
    /// A patch has a different shape to the rest of the hierarchy
    #[error("Patch {id} on level {level} has a different number of cells or ghost cells to the hierarchy")]
    WrongPatchShape {
        /// Level
        level: usize,
        /// Patch id
        id: usize,
    },
    /// A neighbor refers to a patch that is not on the same level
    #[error("Patch {id} on level {level} has neighbor {nbr_id}, which is not on level {level}")]
    UnknownNeighbor {
        /// Level
        level: usize,
        /// Patch id
        id: usize,
        /// Neighbor id
        nbr_id: usize,
    },
    /// A neighbor has the wrong owning rank
    #[error("Patch {id} on level {level} expects neighbor {nbr_id} on rank {expected}, but it is on rank {found}")]
    NeighborRankMismatch {
        /// Level
        level: usize,
        /// Patch id
        id: usize,
        /// Neighbor id
        nbr_id: usize,
        /// The rank recorded in the neighbor information
        expected: usize,
        /// The rank that owns the neighbor
        found: usize,
    },
    /// A neighbor does not point back to the patch across the opposite face
    #[error("Patch {id} on level {level} has neighbor {nbr_id}, which does not have patch {id} as a neighbor across the opposite face")]
    AsymmetricNeighbor {
        /// Level
        level: usize,
        /// Patch id
        id: usize,
        /// Neighbor id
        nbr_id: usize,
    },
    /// A patch that is not on the coarsest level has no parent
    #[error("Patch {id} on level {level} has no parent")]
    MissingParent {
        /// Level
        level: usize,
        /// Patch id
        id: usize,
    },
    /// A parent is not on the next coarser level
    #[error("Patch {id} on level {level} has parent {parent_id}, which is not on level {}", .level + 1)]
    UnknownParent {
        /// Level
        level: usize,
        /// Patch id
        id: usize,
        /// Parent id
        parent_id: usize,
    },
    /// A parent has the wrong owning rank
    #[error("Patch {id} on level {level} expects parent {parent_id} on rank {expected}, but it is on rank {found}")]
    ParentRankMismatch {
        /// Level
        level: usize,
        /// Patch id
        id: usize,
        /// Parent id
        parent_id: usize,
        /// The rank recorded in the parent information
        expected: usize,
        /// The rank that owns the parent
        found: usize,
    },
    /// A parent and child do not refer to each other
    #[error("Patch {parent_id} on level {} and patch {id} on level {level} disagree about being parent and child", .level + 1)]
    ChildMismatch {
        /// Level of the child
        level: usize,
        /// Child id
        id: usize,
        /// Parent id
        parent_id: usize,
    },
}

/// Every patch of every refinement level, on all processes
///
/// Level 0 is the finest level and each following level is coarser. This is the form in which a
/// domain generator hands over a mesh: each process picks out its own patches of a level with
/// [`PatchHierarchy::domain`].
#[derive(Debug, Clone, PartialEq)]
pub struct PatchHierarchy<const D: usize> {
    ns: [usize; D],
    num_ghost_cells: usize,
    levels: Vec<Vec<PatchInfo<D>>>,
}

impl<const D: usize> PatchHierarchy<D> {
    /// Create a hierarchy
    pub fn new(ns: [usize; D], num_ghost_cells: usize, levels: Vec<Vec<PatchInfo<D>>>) -> Self {
        Self {
            ns,
            num_ghost_cells,
            levels,
        }
    }

    /// The number of cells along each axis of every patch
    pub fn ns(&self) -> [usize; D] {
        self.ns
    }

    /// The number of ghost cells on each side of every patch
    pub fn num_ghost_cells(&self) -> usize {
        self.num_ghost_cells
    }

    /// The number of levels
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// The patches of a level, on all processes
    pub fn level(&self, level: usize) -> &[PatchInfo<D>] {
        &self.levels[level]
    }

    /// All levels, finest first
    pub fn levels(&self) -> &[Vec<PatchInfo<D>>] {
        &self.levels
    }

    /// The patches of a level that are owned by a rank
    pub fn local_patches(&self, level: usize, rank: usize) -> Vec<PatchInfo<D>> {
        self.levels[level]
            .iter()
            .filter(|p| p.rank == rank)
            .cloned()
            .collect()
    }

    /// Create the domain of a level on this process
    ///
    /// This is a collective operation.
    pub fn domain<'a, C: Communicator>(&self, comm: &'a C, level: usize) -> Domain<'a, C, D> {
        Domain::new(
            comm,
            level,
            self.ns,
            self.num_ghost_cells,
            self.local_patches(level, comm.rank() as usize),
        )
    }

    /// Check that the patches of the hierarchy are consistent with each other
    pub fn validate(&self) -> Result<(), HierarchyError> {
        let lookups = self
            .levels
            .iter()
            .enumerate()
            .map(|(level, patches)| {
                let mut lookup = HashMap::with_capacity(patches.len());
                for p in patches {
                    if p.ns != self.ns || p.num_ghost_cells != self.num_ghost_cells {
                        return Err(HierarchyError::WrongPatchShape { level, id: p.id });
                    }
                    if lookup.insert(p.id, p).is_some() {
                        return Err(HierarchyError::DuplicateId { level, id: p.id });
                    }
                }
                Ok(lookup)
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (level, lookup) in lookups.iter().enumerate() {
            for p in &self.levels[level] {
                self.validate_neighbors(level, p, lookup)?;
                if let Some(coarser) = lookups.get(level + 1) {
                    self.validate_parent(level, p, coarser)?;
                }
                if level > 0 {
                    self.validate_children(level, p, &lookups[level - 1])?;
                }
            }
        }
        Ok(())
    }

    fn validate_neighbors(
        &self,
        level: usize,
        p: &PatchInfo<D>,
        lookup: &HashMap<usize, &PatchInfo<D>>,
    ) -> Result<(), HierarchyError> {
        for (face, info) in p.nbr_infos().iter().enumerate() {
            let Some(info) = info else {
                continue;
            };
            let opposite = opposite_flat_index(D, face);
            for (position, (nbr_id, nbr_rank)) in info.ids().iter().zip(info.ranks()).enumerate() {
                let nbr = lookup
                    .get(nbr_id)
                    .ok_or(HierarchyError::UnknownNeighbor {
                        level,
                        id: p.id,
                        nbr_id: *nbr_id,
                    })?;
                if nbr.rank != *nbr_rank {
                    return Err(HierarchyError::NeighborRankMismatch {
                        level,
                        id: p.id,
                        nbr_id: *nbr_id,
                        expected: *nbr_rank,
                        found: nbr.rank,
                    });
                }
                let symmetric = match (info, &nbr.nbr_infos()[opposite]) {
                    (NbrInfo::Normal(_), Some(NbrInfo::Normal(back))) => back.id == p.id,
                    (NbrInfo::Fine(_), Some(NbrInfo::Coarse(back))) => {
                        back.id == p.id && back.orth_on_coarse == position
                    }
                    (NbrInfo::Coarse(here), Some(NbrInfo::Fine(back))) => {
                        back.ids.get(here.orth_on_coarse) == Some(&p.id)
                    }
                    _ => false,
                };
                if !symmetric {
                    return Err(HierarchyError::AsymmetricNeighbor {
                        level,
                        id: p.id,
                        nbr_id: *nbr_id,
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_parent(
        &self,
        level: usize,
        p: &PatchInfo<D>,
        coarser: &HashMap<usize, &PatchInfo<D>>,
    ) -> Result<(), HierarchyError> {
        let parent_info = p
            .parent
            .ok_or(HierarchyError::MissingParent { level, id: p.id })?;
        let parent = coarser
            .get(&parent_info.id)
            .ok_or(HierarchyError::UnknownParent {
                level,
                id: p.id,
                parent_id: parent_info.id,
            })?;
        if parent.rank != parent_info.rank {
            return Err(HierarchyError::ParentRankMismatch {
                level,
                id: p.id,
                parent_id: parent.id,
                expected: parent_info.rank,
                found: parent.rank,
            });
        }
        match parent.children.child_on_orthant(parent_info.orth_on_parent) {
            Some(child) if child.id == p.id && child.rank == p.rank => Ok(()),
            _ => Err(HierarchyError::ChildMismatch {
                level,
                id: p.id,
                parent_id: parent.id,
            }),
        }
    }

    fn validate_children(
        &self,
        level: usize,
        p: &PatchInfo<D>,
        finer: &HashMap<usize, &PatchInfo<D>>,
    ) -> Result<(), HierarchyError> {
        if let Children::Orthants(children) = &p.children {
            if children.len() != 1 << D {
                return Err(HierarchyError::ChildMismatch {
                    level: level - 1,
                    id: children.first().map(|c| c.id).unwrap_or(p.id),
                    parent_id: p.id,
                });
            }
        }
        for child in p.children.as_slice() {
            let points_back = finer
                .get(&child.id)
                .and_then(|c| c.parent)
                .map(|parent| parent.id == p.id)
                .unwrap_or(false);
            if !points_back {
                return Err(HierarchyError::ChildMismatch {
                    level: level - 1,
                    id: child.id,
                    parent_id: p.id,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::domain::{ChildInfo, ParentInfo};
    use crate::topology::{Corner, Orthant, Side};

    // One coarse patch refined into four fine patches
    fn two_level() -> PatchHierarchy<2> {
        let mut coarse = PatchInfo::new(0, 0, [2, 2], 0, [0.0, 0.0], [0.5, 0.5]);
        coarse.children = Children::Orthants(
            (0..4)
                .map(|i| ChildInfo {
                    id: i + 1,
                    rank: i / 2,
                })
                .collect(),
        );
        let fine = Orthant::<2>::values()
            .filter(|o| !o.is_null())
            .map(|o| {
                let i = o.index();
                let mut p = PatchInfo::new(
                    i + 1,
                    i / 2,
                    [2, 2],
                    0,
                    [0.5 * (i % 2) as f64, 0.5 * (i / 2) as f64],
                    [0.25, 0.25],
                );
                p.refine_level = 1;
                p.parent = Some(ParentInfo {
                    id: 0,
                    rank: 0,
                    orth_on_parent: o,
                });
                for s in o.interior_sides() {
                    let nbr = o.nbr_on_side(s).index();
                    p.set_nbr_info(s, Some(NbrInfo::normal(nbr + 1, nbr / 2)));
                }
                let diagonal = 3 - i;
                p.set_nbr_info(
                    Corner::<2>::from_orthant(o).opposite(),
                    Some(NbrInfo::normal(diagonal + 1, diagonal / 2)),
                );
                p
            })
            .collect();
        PatchHierarchy::new([2, 2], 0, vec![fine, vec![coarse]])
    }

    #[test]
    fn test_valid() {
        let h = two_level();
        assert_eq!(h.num_levels(), 2);
        assert_eq!(h.level(0).len(), 4);
        assert_eq!(h.local_patches(0, 1).len(), 2);
        assert_eq!(h.local_patches(1, 1).len(), 0);
        assert_eq!(h.validate(), Ok(()));
    }

    #[test]
    fn test_duplicate_id() {
        let mut h = two_level();
        h.levels[0][1].id = 1;
        assert!(matches!(
            h.validate(),
            Err(HierarchyError::DuplicateId { level: 0, id: 1 })
        ));
    }

    #[test]
    fn test_missing_parent() {
        let mut h = two_level();
        h.levels[0][2].parent = None;
        assert_eq!(
            h.validate(),
            Err(HierarchyError::MissingParent { level: 0, id: 3 })
        );
    }

    #[test]
    fn test_unknown_parent() {
        let mut h = two_level();
        if let Some(parent) = h.levels[0][0].parent.as_mut() {
            parent.id = 17;
        }
        assert_eq!(
            h.validate(),
            Err(HierarchyError::UnknownParent {
                level: 0,
                id: 1,
                parent_id: 17
            })
        );
    }

    #[test]
    fn test_parent_rank_mismatch() {
        let mut h = two_level();
        if let Some(parent) = h.levels[0][3].parent.as_mut() {
            parent.rank = 1;
        }
        assert!(matches!(
            h.validate(),
            Err(HierarchyError::ParentRankMismatch { id: 4, .. })
        ));
    }

    #[test]
    fn test_wrong_orthant() {
        let mut h = two_level();
        if let Some(parent) = h.levels[0][0].parent.as_mut() {
            parent.orth_on_parent = Orthant::<2>::ne();
        }
        assert!(matches!(
            h.validate(),
            Err(HierarchyError::ChildMismatch { id: 1, .. })
        ));
    }

    #[test]
    fn test_neighbor_rank_mismatch() {
        let mut h = two_level();
        h.levels[0][0].set_nbr_info(Side::<2>::east(), Some(NbrInfo::normal(2, 1)));
        assert!(matches!(
            h.validate(),
            Err(HierarchyError::NeighborRankMismatch {
                id: 1,
                nbr_id: 2,
                expected: 1,
                found: 0,
                ..
            })
        ));
    }

    #[test]
    fn test_asymmetric_neighbor() {
        let mut h = two_level();
        h.levels[0][1].set_nbr_info(Side::<2>::west(), None);
        assert!(matches!(
            h.validate(),
            Err(HierarchyError::AsymmetricNeighbor { id: 1, nbr_id: 2, .. })
        ));
    }

    #[test]
    fn test_unknown_neighbor() {
        let mut h = two_level();
        h.levels[0][0].set_nbr_info(Side::<2>::west(), Some(NbrInfo::normal(0, 0)));
        assert!(matches!(
            h.validate(),
            Err(HierarchyError::UnknownNeighbor { id: 1, nbr_id: 0, .. })
        ));
    }

    #[test]
    fn test_coarse_fine_neighbors() {
        // A coarse patch next to a refined one, all on one level
        let mut coarse = PatchInfo::<2>::new(0, 0, [2, 2], 0, [0.0, 0.0], [0.5, 0.5]);
        coarse.set_nbr_info(Side::<2>::east(), Some(NbrInfo::fine(vec![1, 2], vec![0, 0])));
        let mut fine_south = PatchInfo::<2>::new(1, 0, [2, 2], 0, [1.0, 0.0], [0.25, 0.25]);
        fine_south.set_nbr_info(
            Side::<2>::west(),
            Some(NbrInfo::coarse(0, 0, Orthant::<1>::lower())),
        );
        let mut fine_north = PatchInfo::<2>::new(2, 0, [2, 2], 0, [1.0, 0.5], [0.25, 0.25]);
        fine_north.set_nbr_info(
            Side::<2>::west(),
            Some(NbrInfo::coarse(0, 0, Orthant::<1>::upper())),
        );
        fine_south.set_nbr_info(Side::<2>::north(), Some(NbrInfo::normal(2, 0)));
        fine_north.set_nbr_info(Side::<2>::south(), Some(NbrInfo::normal(1, 0)));

        let h = PatchHierarchy::new([2, 2], 0, vec![vec![coarse, fine_south, fine_north]]);
        assert_eq!(h.validate(), Ok(()));

        let mut swapped = h.clone();
        swapped.levels[0][1].set_nbr_info(
            Side::<2>::west(),
            Some(NbrInfo::coarse(0, 0, Orthant::<1>::upper())),
        );
        assert!(matches!(
            swapped.validate(),
            Err(HierarchyError::AsymmetricNeighbor { .. })
        ));
    }
}
