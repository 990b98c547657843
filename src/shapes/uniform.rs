//! Uniformly refined hierarchies

use crate::domain::{ChildInfo, Children, NbrInfo, ParentInfo, PatchHierarchy, PatchInfo};
use crate::topology::Orthant;
use crate::traits::{face_in_direction, number_of_boundary_faces};
use crate::vector::for_each_index;
use itertools::Itertools;
use std::collections::HashMap;

/// Create a two level hierarchy on the unit square
///
/// The coarse level is an `n` by `n` grid of patches and the fine level refines every coarse
/// patch into four. Patches are numbered in Morton order, coarse patches first, and each level is
/// split into `num_ranks` contiguous blocks of patches, one per process.
pub fn unit_square(
    n: usize,
    ns: [usize; 2],
    num_ghost_cells: usize,
    num_ranks: usize,
) -> PatchHierarchy<2> {
    uniform(n, ns, num_ghost_cells, num_ranks)
}

/// Create a two level hierarchy on the unit cube
///
/// The coarse level is an `n` by `n` by `n` grid of patches and the fine level refines every
/// coarse patch into eight. Patches are numbered in Morton order, coarse patches first, and each
/// level is split into `num_ranks` contiguous blocks of patches, one per process.
pub fn unit_cube(
    n: usize,
    ns: [usize; 3],
    num_ghost_cells: usize,
    num_ranks: usize,
) -> PatchHierarchy<3> {
    uniform(n, ns, num_ghost_cells, num_ranks)
}

// The cells of an n^D lattice in Morton order
fn morton_order<const D: usize>(n: usize) -> Vec<[usize; D]> {
    let bits = usize::BITS - n.leading_zeros();
    let mut cells = vec![];
    for_each_index([0; D], [n as isize - 1; D], |c| cells.push(c.map(|i| i as usize)));
    cells
        .into_iter()
        .sorted_by_key(|c| {
            let mut key = 0u128;
            for b in 0..bits {
                for (axis, i) in c.iter().enumerate() {
                    key |= (((i >> b) & 1) as u128) << (b as usize * D + axis);
                }
            }
            key
        })
        .collect()
}

// The id and rank of each patch of a level, by lattice position
struct Level<const D: usize> {
    n: usize,
    patches: HashMap<[usize; D], (usize, usize)>,
}

impl<const D: usize> Level<D> {
    fn get(&self, cell: [usize; D], offset: [isize; D]) -> Option<(usize, usize)> {
        let mut nbr = [0; D];
        for axis in 0..D {
            let i = cell[axis] as isize + offset[axis];
            if i < 0 || i >= self.n as isize {
                return None;
            }
            nbr[axis] = i as usize;
        }
        self.patches.get(&nbr).copied()
    }

    fn nbr_infos(&self, cell: [usize; D]) -> Vec<Option<NbrInfo>> {
        let mut nbr_infos = vec![None; number_of_boundary_faces(D)];
        for_each_index([-1; D], [1; D], |offset| {
            if let (Some(face), Some((id, rank))) = (face_in_direction(offset), self.get(cell, offset)) {
                nbr_infos[face] = Some(NbrInfo::normal(id, rank));
            }
        });
        nbr_infos
    }
}

fn uniform<const D: usize>(
    n: usize,
    ns: [usize; D],
    num_ghost_cells: usize,
    num_ranks: usize,
) -> PatchHierarchy<D> {
    assert!(n > 0, "A hierarchy needs at least one coarse patch");
    assert!(num_ranks > 0, "A hierarchy needs at least one process");

    let num_children = 1 << D;
    let coarse_cells = morton_order::<D>(n);
    let num_coarse = coarse_cells.len();
    let num_fine = num_coarse * num_children;
    let rank_of = |position: usize, count: usize| position * num_ranks / count;

    let coarse = Level {
        n,
        patches: coarse_cells
            .iter()
            .enumerate()
            .map(|(position, c)| (*c, (position, rank_of(position, num_coarse))))
            .collect(),
    };
    let mut fine = Level {
        n: 2 * n,
        patches: HashMap::with_capacity(num_fine),
    };
    for (parent_position, c) in coarse_cells.iter().enumerate() {
        for o in 0..num_children {
            let position = parent_position * num_children + o;
            let f = std::array::from_fn(|axis| 2 * c[axis] + ((o >> axis) & 1));
            fine.patches
                .insert(f, (num_coarse + position, rank_of(position, num_fine)));
        }
    }

    let coarse_spacings = std::array::from_fn(|axis| 1.0 / (n * ns[axis]) as f64);
    let fine_spacings = coarse_spacings.map(|h: f64| h / 2.0);

    let mut coarse_patches = Vec::with_capacity(num_coarse);
    let mut fine_patches = Vec::with_capacity(num_fine);
    for c in &coarse_cells {
        let (id, rank) = coarse.patches[c];
        let mut p = PatchInfo::new(
            id,
            rank,
            ns,
            num_ghost_cells,
            c.map(|i| i as f64 / n as f64),
            coarse_spacings,
        );
        p.set_nbr_infos(coarse.nbr_infos(*c));

        let mut children = Vec::with_capacity(num_children);
        for o in Orthant::<D>::values().filter(|o| !o.is_null()) {
            let f = std::array::from_fn(|axis| {
                2 * c[axis] + usize::from(o.is_higher_on_axis(axis))
            });
            let (child_id, child_rank) = fine.patches[&f];
            children.push(ChildInfo {
                id: child_id,
                rank: child_rank,
            });

            let mut child = PatchInfo::new(
                child_id,
                child_rank,
                ns,
                num_ghost_cells,
                f.map(|i| i as f64 / (2 * n) as f64),
                fine_spacings,
            );
            child.refine_level = 1;
            child.parent = Some(ParentInfo {
                id,
                rank,
                orth_on_parent: o,
            });
            child.set_nbr_infos(fine.nbr_infos(f));
            fine_patches.push(child);
        }
        p.children = Children::Orthants(children);
        coarse_patches.push(p);
    }

    PatchHierarchy::new(ns, num_ghost_cells, vec![fine_patches, coarse_patches])
}
