use approx::assert_relative_eq;
use mpi::{
    collective::SystemOperation,
    environment::Universe,
    traits::{Communicator, CommunicatorCollectives},
};
use ndamr::{Domain, shapes::unit_cube, shapes::unit_square, traits::Face, topology::Side};
use tracing_subscriber::EnvFilter;

/// Check the counts and indices of a domain
fn check_domain<C: Communicator, const D: usize>(domain: &Domain<'_, C, D>, num_patches: usize) {
    let comm = domain.comm();
    assert_eq!(domain.num_global_patches(), num_patches);
    assert_relative_eq!(domain.volume(), 1.0, epsilon = 1e-12);

    for (i, p) in domain.patches().iter().enumerate() {
        assert_eq!(p.local_index, i);
        assert_eq!(p.rank, comm.rank() as usize);
    }

    // Global indices are contiguous across processes
    let first = domain.patches().first().map(|p| p.global_index);
    for (i, p) in domain.patches().iter().enumerate() {
        assert_eq!(Some(p.global_index), first.map(|f| f + i));
    }
    let mut sum = 0;
    let local_sum = domain
        .patches()
        .iter()
        .map(|p| p.global_index)
        .sum::<usize>();
    comm.all_reduce_into(&local_sum, &mut sum, SystemOperation::sum());
    assert_eq!(sum, num_patches * (num_patches - 1) / 2);
}

/// Test the domains of a 2D hierarchy
fn test_unit_square<C: Communicator>(comm: &C) {
    let h = unit_square(3, [4, 4], 1, comm.size() as usize);
    h.validate().unwrap();
    let coarser = h.domain(comm, 1);
    let finer = h.domain(comm, 0);
    check_domain(&coarser, 9);
    check_domain(&finer, 36);

    // Neighbors owned by this process know their local index
    for p in finer.patches() {
        for s in Side::<2>::faces() {
            if let Some(info) = p.normal_nbr_info(s) {
                assert_eq!(
                    info.local_index.is_some(),
                    info.rank == comm.rank() as usize
                );
                if let Some(i) = info.local_index {
                    assert_eq!(finer.patch(i).id, info.id);
                }
            }
        }
    }
}

/// Test the domains of a 3D hierarchy
fn test_unit_cube<C: Communicator>(comm: &C) {
    let h = unit_cube(2, [2, 2, 2], 1, comm.size() as usize);
    h.validate().unwrap();
    let coarser = h.domain(comm, 1);
    let finer = h.domain(comm, 0);
    check_domain(&coarser, 8);
    check_domain(&finer, 64);
    assert_eq!(finer.num_cells_in_patch(), 8);
    assert_eq!(finer.num_global_cells(), 512);
}

/// Run tests
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let universe: Universe = mpi::initialize().unwrap();
    let world = universe.world();
    let rank = world.rank();

    if rank == 0 {
        println!("Testing the unit square");
    }
    test_unit_square(&world);

    if rank == 0 {
        println!("Testing the unit cube");
    }
    test_unit_cube(&world);
}
