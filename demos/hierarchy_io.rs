use mpi::{
    environment::Universe,
    traits::{Communicator, CommunicatorCollectives},
};
use ndamr::{
    PatchHierarchy, shapes,
    traits::{RONExport, RONImport},
};

/// Hierarchy I/O
///
/// Demonstration of exporting a patch hierarchy in RON format and reading it back on every
/// process
fn main() {
    let universe: Universe = mpi::initialize().unwrap();
    let comm = universe.world();
    let rank = comm.rank();

    // Create a hierarchy on process 0 and export it
    if rank == 0 {
        let h = shapes::unit_cube(2, [4, 4, 4], 1, comm.size() as usize);
        h.export_as_ron("_unit_cube_hierarchy.ron").unwrap();
    }

    // Wait for export to finish
    comm.barrier();

    // Every process imports the hierarchy and creates the domains of the patches it owns
    let h = PatchHierarchy::<3>::import_from_ron("_unit_cube_hierarchy.ron").unwrap();
    h.validate().unwrap();
    for level in 0..h.num_levels() {
        let domain = h.domain(&comm, level);
        println!(
            "Process {rank}: level {level} has {} of {} patches",
            domain.num_local_patches(),
            domain.num_global_patches()
        );
    }
}
