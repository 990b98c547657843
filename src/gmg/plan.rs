//! Exchange plans

use super::InterLevelCommError;
use crate::domain::PatchInfo;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// The patches to exchange with one other process
///
/// The patches are ordered by id. Both processes taking part in an exchange compute their lists
/// from patch ids alone, so the two lists agree without any extra communication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferList {
    /// The other process
    pub rank: usize,
    /// The local index of each patch in the vector being sent from or received into
    pub local_indexes: Vec<usize>,
    /// The id of the coarser patch that each entry holds data for
    pub ids: Vec<usize>,
}

/// The schedule for moving data between two adjacent levels on one process
///
/// A finer patch has a local parent if its parent is owned by this process, and a ghost parent
/// otherwise. The data of ghost parents is held in a ghost vector, in which the distinct ghost
/// parents are numbered in increasing order of id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangePlan {
    rank: usize,
    patches_with_local_parent: Vec<(usize, usize)>,
    patches_with_ghost_parent: Vec<(usize, usize)>,
    ghost_parent_ids: Vec<usize>,
    vector_schedule: Vec<TransferList>,
    ghost_schedule: Vec<TransferList>,
}

impl ExchangePlan {
    /// Create the plan for the process `rank`
    ///
    /// `coarser_patches` and `finer_patches` are the patches of the two levels that are owned by
    /// `rank`, in local index order.
    pub fn new<const D: usize>(
        rank: usize,
        coarser_patches: &[PatchInfo<D>],
        finer_patches: &[PatchInfo<D>],
    ) -> Result<Self, InterLevelCommError> {
        let id_to_coarser_local_index = coarser_patches
            .iter()
            .enumerate()
            .map(|(local_index, p)| (p.id, local_index))
            .collect::<HashMap<_, _>>();

        let mut patches_with_local_parent = vec![];
        let mut ghost_parents = vec![];
        let mut ghost_parent_ranks = BTreeMap::new();
        for (finer_local_index, p) in finer_patches.iter().enumerate() {
            let parent = p
                .parent
                .ok_or(InterLevelCommError::MissingParent { id: p.id })?;
            if parent.rank == rank {
                let coarser_local_index = id_to_coarser_local_index.get(&parent.id).ok_or(
                    InterLevelCommError::UnknownParent {
                        id: p.id,
                        parent_id: parent.id,
                        rank,
                    },
                )?;
                patches_with_local_parent.push((*coarser_local_index, finer_local_index));
            } else {
                ghost_parents.push((parent.id, finer_local_index));
                ghost_parent_ranks.insert(parent.id, parent.rank);
            }
        }

        // The ghost vector holds the distinct ghost parents in increasing order of id
        let ghost_parent_ids = ghost_parent_ranks.keys().copied().collect::<Vec<_>>();
        let id_to_ghost_index = ghost_parent_ids
            .iter()
            .enumerate()
            .map(|(ghost_index, id)| (*id, ghost_index))
            .collect::<HashMap<_, _>>();
        let patches_with_ghost_parent = ghost_parents
            .iter()
            .map(|(parent_id, finer_local_index)| {
                (id_to_ghost_index[parent_id], *finer_local_index)
            })
            .collect::<Vec<_>>();

        let mut ghost_schedule = BTreeMap::<usize, TransferList>::new();
        for (ghost_index, (id, owner)) in ghost_parent_ranks.iter().enumerate() {
            let list = ghost_schedule.entry(*owner).or_insert_with(|| TransferList {
                rank: *owner,
                local_indexes: vec![],
                ids: vec![],
            });
            list.local_indexes.push(ghost_index);
            list.ids.push(*id);
        }

        // Every process that has a child of a local coarser patch needs a copy of that patch
        let mut coarser_by_id = coarser_patches.iter().enumerate().collect::<Vec<_>>();
        coarser_by_id.sort_by_key(|(_, p)| p.id);
        let mut vector_schedule = BTreeMap::<usize, TransferList>::new();
        for (local_index, p) in coarser_by_id {
            let child_ranks = p
                .children
                .child_ranks()
                .filter(|r| *r != rank)
                .collect::<BTreeSet<_>>();
            for child_rank in child_ranks {
                let list = vector_schedule
                    .entry(child_rank)
                    .or_insert_with(|| TransferList {
                        rank: child_rank,
                        local_indexes: vec![],
                        ids: vec![],
                    });
                list.local_indexes.push(local_index);
                list.ids.push(p.id);
            }
        }

        debug!(
            rank,
            local_parents = patches_with_local_parent.len(),
            ghost_parents = patches_with_ghost_parent.len(),
            ghost_patches = ghost_parent_ids.len(),
            vector_peers = vector_schedule.len(),
            ghost_peers = ghost_schedule.len(),
            "Created inter-level exchange plan"
        );

        Ok(Self {
            rank,
            patches_with_local_parent,
            patches_with_ghost_parent,
            ghost_parent_ids,
            vector_schedule: vector_schedule.into_values().collect(),
            ghost_schedule: ghost_schedule.into_values().collect(),
        })
    }

    /// The process this plan is for
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Pairs of (local index of the parent in the coarser domain, local index of the patch in the
    /// finer domain) for finer patches whose parent is owned by this process
    pub fn patches_with_local_parent(&self) -> &[(usize, usize)] {
        &self.patches_with_local_parent
    }

    /// Pairs of (index of the parent in the ghost vector, local index of the patch in the finer
    /// domain) for finer patches whose parent is owned by another process
    pub fn patches_with_ghost_parent(&self) -> &[(usize, usize)] {
        &self.patches_with_ghost_parent
    }

    /// The number of patches in a ghost vector
    pub fn num_ghost_patches(&self) -> usize {
        self.ghost_parent_ids.len()
    }

    /// The id of the coarser patch held at each index of a ghost vector
    pub fn ghost_parent_ids(&self) -> &[usize] {
        &self.ghost_parent_ids
    }

    /// For each other process, the local coarser patches it holds as ghost parents
    ///
    /// These are sent from the coarser vector when getting ghost patches, and accumulated into it
    /// when sending ghost patches.
    pub fn vector_schedule(&self) -> &[TransferList] {
        &self.vector_schedule
    }

    /// For each other process, the ghost patches it owns
    ///
    /// These are received into the ghost vector when getting ghost patches, and sent from it when
    /// sending ghost patches.
    pub fn ghost_schedule(&self) -> &[TransferList] {
        &self.ghost_schedule
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::domain::{ChildInfo, Children, ParentInfo, PatchHierarchy};
    use crate::shapes::{unit_cube, unit_square};
    use crate::topology::Orthant;

    fn plans<const D: usize>(hierarchy: &PatchHierarchy<D>, num_ranks: usize) -> Vec<ExchangePlan> {
        (0..num_ranks)
            .map(|rank| {
                ExchangePlan::new(
                    rank,
                    &hierarchy.local_patches(1, rank),
                    &hierarchy.local_patches(0, rank),
                )
                .unwrap()
            })
            .collect()
    }

    fn list_for(schedule: &[TransferList], rank: usize) -> Option<&TransferList> {
        schedule.iter().find(|t| t.rank == rank)
    }

    #[test]
    fn test_two_ranks() {
        let h = unit_square(1, [2, 2], 0, 2);
        let p = plans(&h, 2);

        assert_eq!(p[0].patches_with_local_parent(), &[(0, 0), (0, 1)]);
        assert!(p[0].patches_with_ghost_parent().is_empty());
        assert_eq!(p[0].num_ghost_patches(), 0);
        assert_eq!(
            p[0].vector_schedule(),
            &[TransferList {
                rank: 1,
                local_indexes: vec![0],
                ids: vec![0]
            }]
        );
        assert!(p[0].ghost_schedule().is_empty());

        assert!(p[1].patches_with_local_parent().is_empty());
        assert_eq!(p[1].patches_with_ghost_parent(), &[(0, 0), (0, 1)]);
        assert_eq!(p[1].num_ghost_patches(), 1);
        assert_eq!(p[1].ghost_parent_ids(), &[0]);
        assert!(p[1].vector_schedule().is_empty());
        assert_eq!(
            p[1].ghost_schedule(),
            &[TransferList {
                rank: 0,
                local_indexes: vec![0],
                ids: vec![0]
            }]
        );
    }

    #[test]
    fn test_single_rank() {
        let h = unit_square(4, [2, 2], 1, 1);
        let p = plans(&h, 1);
        assert_eq!(p[0].patches_with_local_parent().len(), 64);
        assert_eq!(p[0].num_ghost_patches(), 0);
        assert!(p[0].vector_schedule().is_empty());
        assert!(p[0].ghost_schedule().is_empty());
    }

    fn check_schedules_agree(p: &[ExchangePlan]) {
        for a in p {
            for b in p {
                if a.rank() == b.rank() {
                    continue;
                }
                let sent = list_for(a.vector_schedule(), b.rank()).map(|t| t.ids.clone());
                let received = list_for(b.ghost_schedule(), a.rank()).map(|t| t.ids.clone());
                assert_eq!(sent, received);
                if let Some(ids) = sent {
                    for w in ids.windows(2) {
                        assert!(w[0] < w[1]);
                    }
                }
            }
        }
    }

    #[test]
    fn test_schedules_agree_2d() {
        for num_ranks in 2..6 {
            let h = unit_square(3, [4, 4], 1, num_ranks);
            check_schedules_agree(&plans(&h, num_ranks));
        }
    }

    #[test]
    fn test_schedules_agree_3d() {
        for num_ranks in [2, 3, 7] {
            let h = unit_cube(2, [2, 2, 2], 1, num_ranks);
            check_schedules_agree(&plans(&h, num_ranks));
        }
    }

    #[test]
    fn test_ghost_parents_cover_fine_patches() {
        let h = unit_cube(2, [2, 2, 2], 0, 3);
        let p = plans(&h, 3);
        let total = p
            .iter()
            .map(|plan| plan.patches_with_local_parent().len() + plan.patches_with_ghost_parent().len())
            .sum::<usize>();
        assert_eq!(total, h.level(0).len());
        for (rank, plan) in p.iter().enumerate() {
            let finer = h.local_patches(0, rank);
            for (ghost_index, finer_index) in plan.patches_with_ghost_parent() {
                let parent = finer[*finer_index].parent.unwrap();
                assert_ne!(parent.rank, rank);
                assert_eq!(plan.ghost_parent_ids()[*ghost_index], parent.id);
            }
        }
    }

    #[test]
    fn test_coarsened_parent() {
        // Two patches that are not refined between the levels, so each has a single child of
        // the same size addressed by the null orthant
        let mut remote_parent = PatchInfo::<2>::new(0, 0, [2, 2], 0, [0.0, 0.0], [0.5, 0.5]);
        remote_parent.children = Children::Coarsened(ChildInfo { id: 10, rank: 1 });
        let mut local_parent = PatchInfo::<2>::new(1, 0, [2, 2], 0, [1.0, 0.0], [0.5, 0.5]);
        local_parent.children = Children::Coarsened(ChildInfo { id: 11, rank: 0 });

        let mut remote_child = PatchInfo::<2>::new(10, 1, [2, 2], 0, [0.0, 0.0], [0.5, 0.5]);
        remote_child.parent = Some(ParentInfo {
            id: 0,
            rank: 0,
            orth_on_parent: Orthant::null(),
        });
        let mut local_child = PatchInfo::<2>::new(11, 0, [2, 2], 0, [1.0, 0.0], [0.5, 0.5]);
        local_child.parent = Some(ParentInfo {
            id: 1,
            rank: 0,
            orth_on_parent: Orthant::null(),
        });
        assert_eq!(
            remote_parent
                .children
                .child_on_orthant(Orthant::<2>::null())
                .map(|c| c.id),
            Some(10)
        );

        let owner = ExchangePlan::new(0, &[remote_parent, local_parent], &[local_child]).unwrap();
        let other = ExchangePlan::new(1, &[], &[remote_child]).unwrap();

        assert_eq!(owner.patches_with_local_parent(), &[(1, 0)]);
        assert!(owner.patches_with_ghost_parent().is_empty());
        assert_eq!(
            owner.vector_schedule(),
            &[TransferList {
                rank: 1,
                local_indexes: vec![0],
                ids: vec![0]
            }]
        );
        assert!(owner.ghost_schedule().is_empty());

        assert!(other.patches_with_local_parent().is_empty());
        assert_eq!(other.patches_with_ghost_parent(), &[(0, 0)]);
        assert_eq!(other.ghost_parent_ids(), &[0]);
        assert_eq!(
            other.ghost_schedule(),
            &[TransferList {
                rank: 0,
                local_indexes: vec![0],
                ids: vec![0]
            }]
        );
        check_schedules_agree(&[owner, other]);
    }

    #[test]
    fn test_missing_parent() {
        let patch = PatchInfo::<2>::new(5, 0, [2, 2], 0, [0.0, 0.0], [0.5, 0.5]);
        assert_eq!(
            ExchangePlan::new(0, &[], &[patch]),
            Err(InterLevelCommError::MissingParent { id: 5 })
        );
    }

    #[test]
    fn test_unknown_parent() {
        let mut patch = PatchInfo::<2>::new(5, 0, [2, 2], 0, [0.0, 0.0], [0.5, 0.5]);
        patch.parent = Some(ParentInfo {
            id: 1,
            rank: 0,
            orth_on_parent: Orthant::<2>::sw(),
        });
        assert_eq!(
            ExchangePlan::new(0, &[], &[patch]),
            Err(InterLevelCommError::UnknownParent {
                id: 5,
                parent_id: 1,
                rank: 0
            })
        );
    }
}
