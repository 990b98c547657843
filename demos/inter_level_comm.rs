use mpi::{environment::Universe, traits::Communicator};
use ndamr::{InterLevelComm, Vector, shapes};
use tracing_subscriber::EnvFilter;

/// Inter-level communication
///
/// Demonstration of moving data between two levels of a distributed patch hierarchy
fn main() {
    // Set RUST_LOG=ndamr=trace to see every exchange
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let universe: Universe = mpi::initialize().unwrap();
    let comm = universe.world();
    let rank = comm.rank();

    // Create a two level hierarchy on the unit square: 4 by 4 coarse patches of 8 by 8 cells, each
    // refined into 4 fine patches. The patches of each level are split between the processes.
    let hierarchy = shapes::unit_square(4, [8, 8], 1, comm.size() as usize);

    // Each process creates the domains of the two levels from the patches it owns
    let coarser = hierarchy.domain(&comm, 1);
    let finer = hierarchy.domain(&comm, 0);

    // The communication pattern is computed once and can be used for many exchanges
    let mut ilc = InterLevelComm::new(&coarser, 1, &finer).unwrap();
    println!(
        "Process {rank}: {} fine patches with a local parent, {} with a ghost parent",
        ilc.patches_with_local_parent().count(),
        ilc.patches_with_ghost_parent().count()
    );

    // Copy the coarse data into ghost patches, so that every fine patch can read its parent
    let mut vector = Vector::new(&coarser, 1);
    vector.set(1.0);
    let mut ghost_vector = ilc.get_new_ghost_vector();
    ilc.get_ghost_patches_start(&vector, &ghost_vector).unwrap();
    // Other work can be done here while the messages are in flight
    ilc.get_ghost_patches_finish(&vector, &mut ghost_vector)
        .unwrap();

    // Add the ghost patches back onto the coarse patches they stand for
    ilc.send_ghost_patches_start(&vector, &ghost_vector).unwrap();
    ilc.send_ghost_patches_finish(&mut vector, &ghost_vector)
        .unwrap();

    let total = vector.data().iter().sum::<f64>();
    println!(
        "Process {rank}: {} ghost patches, sum of coarse values {total}",
        ilc.num_ghost_patches()
    );
}
