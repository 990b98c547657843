//! Distributed domain

use super::PatchInfo;
use itertools::Itertools;
use mpi::{
    collective::SystemOperation,
    traits::{Communicator, CommunicatorCollectives},
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// The patches of one refinement level that are owned by this process
///
/// Patches are stored in an arena: the position of a patch in [`Domain::patches`] is its local
/// index, and it never changes for the lifetime of the domain.
#[derive(Debug)]
pub struct Domain<'a, C: Communicator, const D: usize> {
    comm: &'a C,
    id: usize,
    ns: [usize; D],
    num_ghost_cells: usize,
    patches: Vec<PatchInfo<D>>,
    num_global_patches: usize,
}

impl<'a, C: Communicator, const D: usize> Domain<'a, C, D> {
    /// Create a domain from the patches owned by this process
    ///
    /// This is a collective operation. It assigns the local and global index of every patch and
    /// fills in the local and global indices of their neighbors.
    pub fn new(
        comm: &'a C,
        id: usize,
        ns: [usize; D],
        num_ghost_cells: usize,
        mut patches: Vec<PatchInfo<D>>,
    ) -> Self {
        let rank = comm.rank() as usize;
        for p in &patches {
            assert_eq!(
                p.rank, rank,
                "Patch {} is owned by rank {} but was added on rank {rank}",
                p.id, p.rank
            );
            assert_eq!(p.ns, ns, "Patch {} has the wrong number of cells", p.id);
            assert_eq!(
                p.num_ghost_cells, num_ghost_cells,
                "Patch {} has the wrong number of ghost cells",
                p.id
            );
        }

        let num_local_patches = patches.len();
        let mut num_global_patches = 0;
        comm.all_reduce_into(
            &num_local_patches,
            &mut num_global_patches,
            SystemOperation::sum(),
        );

        // The exclusive scan leaves the result on rank 0 undefined.
        let mut first_global_index = 0;
        comm.exclusive_scan_into(
            &num_local_patches,
            &mut first_global_index,
            SystemOperation::sum(),
        );
        if rank == 0 {
            first_global_index = 0;
        }

        let mut id_to_local_index = HashMap::new();
        let mut id_to_global_index = HashMap::new();
        for (local_index, p) in patches.iter_mut().enumerate() {
            p.local_index = local_index;
            p.global_index = first_global_index + local_index;
            id_to_local_index.insert(p.id, p.local_index);
            id_to_global_index.insert(p.id, p.global_index);
        }

        let remote_global_indices = synchronize_global_indices(comm, &patches, &id_to_global_index);
        id_to_global_index.extend(remote_global_indices);

        for p in patches.iter_mut() {
            p.set_neighbor_local_indexes(&id_to_local_index);
            p.set_neighbor_global_indexes(&id_to_global_index);
        }

        debug!(
            domain = id,
            rank,
            num_local_patches,
            num_global_patches,
            "Created domain"
        );

        Self {
            comm,
            id,
            ns,
            num_ghost_cells,
            patches,
            num_global_patches,
        }
    }

    /// The communicator
    pub fn comm(&self) -> &'a C {
        self.comm
    }

    /// The rank of this process
    pub fn rank(&self) -> usize {
        self.comm.rank() as usize
    }

    /// The id of this domain
    pub fn id(&self) -> usize {
        self.id
    }

    /// The number of cells along each axis of every patch
    pub fn ns(&self) -> [usize; D] {
        self.ns
    }

    /// The number of ghost cells on each side of every patch
    pub fn num_ghost_cells(&self) -> usize {
        self.num_ghost_cells
    }

    /// The local patches, ordered by local index
    pub fn patches(&self) -> &[PatchInfo<D>] {
        &self.patches
    }

    /// The local patch with a given local index
    pub fn patch(&self, local_index: usize) -> &PatchInfo<D> {
        &self.patches[local_index]
    }

    /// The number of patches owned by this process
    pub fn num_local_patches(&self) -> usize {
        self.patches.len()
    }

    /// The number of patches owned by all processes
    pub fn num_global_patches(&self) -> usize {
        self.num_global_patches
    }

    /// The number of cells in each patch, excluding ghost cells
    pub fn num_cells_in_patch(&self) -> usize {
        self.ns.iter().product()
    }

    /// The number of cells owned by this process, excluding ghost cells
    pub fn num_local_cells(&self) -> usize {
        self.num_local_patches() * self.num_cells_in_patch()
    }

    /// The number of cells owned by all processes, excluding ghost cells
    pub fn num_global_cells(&self) -> usize {
        self.num_global_patches * self.num_cells_in_patch()
    }

    /// The number of cells owned by this process, including ghost cells
    pub fn num_local_cells_with_ghost(&self) -> usize {
        self.num_local_patches()
            * self
                .ns
                .iter()
                .map(|n| n + 2 * self.num_ghost_cells)
                .product::<usize>()
    }

    /// The volume covered by the patches on all processes
    ///
    /// This is a collective operation.
    pub fn volume(&self) -> f64 {
        let local_volume = self.patches.iter().map(|p| p.volume()).sum::<f64>();
        let mut volume = 0.0;
        self.comm
            .all_reduce_into(&local_volume, &mut volume, SystemOperation::sum());
        volume
    }
}

// Find the global indices of all neighbors that are owned by other processes. Each process sends
// the ids it needs to their owners, and the owners send back the global indices in the same order.
fn synchronize_global_indices<const D: usize>(
    comm: &impl Communicator,
    patches: &[PatchInfo<D>],
    id_to_global_index: &HashMap<usize, usize>,
) -> HashMap<usize, usize> {
    let rank = comm.rank() as usize;
    let size = comm.size() as usize;

    let mut requests = BTreeMap::<usize, BTreeSet<usize>>::new();
    for p in patches {
        for (id, owner) in p.nbr_ids().into_iter().zip(p.nbr_ranks()) {
            if owner != rank {
                assert!(owner < size, "Neighbor {id} of patch {} has rank {owner}", p.id);
                requests.entry(owner).or_default().insert(id);
            }
        }
    }

    let mut counts = vec![0; size];
    for (owner, ids) in &requests {
        counts[*owner] = ids.len();
    }
    let requested_ids = requests.values().flatten().copied().collect_vec();

    let (recv_counts, recv_ids) = all_to_all_varcount(comm, &counts, &requested_ids);

    let send_back = recv_ids
        .iter()
        .map(|id| {
            *id_to_global_index
                .get(id)
                .unwrap_or_else(|| panic!("Rank {rank} was asked for patch {id}, which it does not own"))
        })
        .collect_vec();

    let (_, global_indices) = all_to_all_varcount(comm, &recv_counts, &send_back);

    requested_ids.into_iter().zip(global_indices).collect()
}

// Performs an all-to-all communication.
// Returns the receive counts from each processor and the received data.
fn all_to_all_varcount(
    comm: &impl Communicator,
    counts: &[usize],
    data: &[usize],
) -> (Vec<usize>, Vec<usize>) {
    let counts = counts.iter().map(|&x| x as i32).collect_vec();

    let mut recv_counts = vec![0; comm.size() as usize];
    comm.all_to_all_into(&counts, &mut recv_counts);

    let send_displacements = counts
        .iter()
        .scan(0, |acc, &x| {
            let old = *acc;
            *acc += x;
            Some(old)
        })
        .collect_vec();
    let receive_displacements = recv_counts
        .iter()
        .scan(0, |acc, &x| {
            let old = *acc;
            *acc += x;
            Some(old)
        })
        .collect_vec();

    let mut receive_data = vec![0; recv_counts.iter().sum::<i32>() as usize];
    let send_partition = mpi::datatype::Partition::new(data, counts, send_displacements);
    let mut receive_partition = mpi::datatype::PartitionMut::new(
        &mut receive_data[..],
        &recv_counts[..],
        receive_displacements,
    );
    comm.all_to_all_varcount_into(&send_partition, &mut receive_partition);

    (
        recv_counts.iter().map(|i| *i as usize).collect_vec(),
        receive_data,
    )
}
