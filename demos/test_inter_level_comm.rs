use approx::assert_relative_eq;
use itertools::Itertools;
use mpi::{
    collective::SystemOperation,
    environment::Universe,
    traits::{Communicator, CommunicatorCollectives},
};
use ndamr::{
    InterLevelComm, Vector,
    gmg::InterLevelCommError,
    shapes::{unit_cube, unit_square},
};
use tracing_subscriber::EnvFilter;

/// Test getting and sending ghost patches for a single coarse patch with four children
fn test_single_coarse_patch<C: Communicator>(comm: &C) {
    let size = comm.size() as usize;
    let h = unit_square(1, [2, 2], 0, size);
    let coarser = h.domain(comm, 1);
    let finer = h.domain(comm, 0);
    let mut ilc = InterLevelComm::new(&coarser, 1, &finer).unwrap();

    let mut vector = Vector::new(&coarser, 1);
    vector.set_with_ghost(7.0);
    let mut ghost_vector = ilc.get_new_ghost_vector();

    ilc.get_ghost_patches_start(&vector, &ghost_vector).unwrap();
    ilc.get_ghost_patches_finish(&vector, &mut ghost_vector)
        .unwrap();
    for value in ghost_vector.data() {
        assert_relative_eq!(*value, 7.0);
    }

    // Restrict 3.0 from every child into its ghost parent, so a ghost patch holds the sum
    // over the children on this process
    ghost_vector.set_with_ghost(0.0);
    for (ghost_index, _) in ilc.patches_with_ghost_parent() {
        for value in ghost_vector.patch_mut(ghost_index) {
            *value += 3.0;
        }
    }
    ilc.send_ghost_patches_start(&vector, &ghost_vector).unwrap();
    ilc.send_ghost_patches_finish(&mut vector, &ghost_vector)
        .unwrap();

    if comm.rank() == 0 {
        // Only children on other processes contribute, so with two processes this is 13.0
        let remote_children = h.level(1)[0]
            .children
            .child_ranks()
            .filter(|r| *r != 0)
            .count();
        for value in vector.data() {
            assert_relative_eq!(*value, 7.0 + 3.0 * remote_children as f64);
        }
    } else {
        assert_eq!(vector.num_local_patches(), 0);
    }
}

/// Test that every ghost patch receives the data of the patch it stands for
fn test_ghost_patches_match_ids<C: Communicator>(comm: &C) {
    let size = comm.size() as usize;
    let h = unit_cube(2, [2, 3, 2], 1, size);
    let coarser = h.domain(comm, 1);
    let finer = h.domain(comm, 0);
    let mut ilc = InterLevelComm::new(&coarser, 2, &finer).unwrap();

    let mut vector = Vector::new(&coarser, 2);
    for (i, p) in coarser.patches().iter().enumerate() {
        for c in 0..2 {
            let mut view = vector.component_view_mut(i, c);
            ndamr::vector::for_each_index(view.ghost_start(), view.ghost_end(), |index| {
                view[index] = (10 * p.id + c) as f64 + 0.001 * index[0] as f64;
            });
        }
    }
    let mut ghost_vector = ilc.get_new_ghost_vector();
    ilc.get_ghost_patches_start(&vector, &ghost_vector).unwrap();
    ilc.get_ghost_patches_finish(&vector, &mut ghost_vector)
        .unwrap();

    for (ghost_index, id) in ilc.plan().ghost_parent_ids().iter().enumerate() {
        for c in 0..2 {
            let view = ghost_vector.component_view(ghost_index, c);
            ndamr::vector::for_each_index(view.ghost_start(), view.ghost_end(), |index| {
                assert_relative_eq!(
                    view[index],
                    (10 * id + c) as f64 + 0.001 * index[0] as f64
                );
            });
        }
    }
    for (ghost_index, patch) in ilc.patches_with_ghost_parent() {
        assert_eq!(
            patch.parent.map(|p| p.id),
            Some(ilc.plan().ghost_parent_ids()[ghost_index])
        );
    }

    // Each ghost patch is sent once to its owner, so a coarse patch accumulates one
    // contribution per other process that holds any of its children
    ghost_vector.set_with_ghost(1.0);
    vector.set_with_ghost(0.0);
    ilc.send_ghost_patches_start(&vector, &ghost_vector).unwrap();
    ilc.send_ghost_patches_finish(&mut vector, &ghost_vector)
        .unwrap();
    let rank = comm.rank() as usize;
    for (i, p) in coarser.patches().iter().enumerate() {
        let expected = p
            .children
            .child_ranks()
            .filter(|r| *r != rank)
            .unique()
            .count() as f64;
        for value in vector.patch(i) {
            assert_relative_eq!(*value, expected);
        }
    }
}

/// Test that the plan on each process matches the plans computed for every other process
fn test_plans_agree<C: Communicator>(comm: &C) {
    let size = comm.size() as usize;
    let rank = comm.rank() as usize;
    let h = unit_square(3, [2, 2], 1, size);
    let coarser = h.domain(comm, 1);
    let finer = h.domain(comm, 0);
    let ilc = InterLevelComm::new(&coarser, 1, &finer).unwrap();

    for other in (0..size).filter(|r| *r != rank) {
        let other_plan = ndamr::gmg::ExchangePlan::new(
            other,
            &h.local_patches(1, other),
            &h.local_patches(0, other),
        )
        .unwrap();
        let sent = ilc
            .plan()
            .vector_schedule()
            .iter()
            .find(|t| t.rank == other)
            .map(|t| t.ids.clone());
        let received = other_plan
            .ghost_schedule()
            .iter()
            .find(|t| t.rank == rank)
            .map(|t| t.ids.clone());
        assert_eq!(sent, received);
    }
}

/// Test the errors returned for calls made out of order
fn test_usage_errors<C: Communicator>(comm: &C) {
    let h = unit_square(2, [2, 2], 1, comm.size() as usize);
    let coarser = h.domain(comm, 1);
    let finer = h.domain(comm, 0);
    let mut ilc = InterLevelComm::new(&coarser, 1, &finer).unwrap();
    let mut vector = Vector::new(&coarser, 1);
    let mut ghost_vector = ilc.get_new_ghost_vector();
    let mut other_vector = vector.clone();

    assert_eq!(
        ilc.send_ghost_patches_finish(&mut vector, &ghost_vector),
        Err(InterLevelCommError::NoCommunicationStarted {
            call: "send_ghost_patches_finish"
        })
    );

    ilc.get_ghost_patches_start(&vector, &ghost_vector).unwrap();
    assert_eq!(
        ilc.send_ghost_patches_start(&vector, &ghost_vector),
        Err(InterLevelCommError::UnfinishedCommunication {
            call: "send_ghost_patches_start",
            in_flight: "get_ghost_patches_start"
        })
    );
    assert_eq!(
        ilc.send_ghost_patches_finish(&mut vector, &ghost_vector),
        Err(InterLevelCommError::DirectionMismatch {
            call: "send_ghost_patches_finish",
            in_flight: "get_ghost_patches_start"
        })
    );
    assert_eq!(
        ilc.get_ghost_patches_finish(&other_vector, &mut ghost_vector),
        Err(InterLevelCommError::VectorMismatch {
            call: "get_ghost_patches_finish",
            in_flight: "get_ghost_patches_start"
        })
    );
    ilc.get_ghost_patches_finish(&vector, &mut ghost_vector)
        .unwrap();

    other_vector = Vector::new(&coarser, 2);
    assert!(matches!(
        ilc.get_ghost_patches_start(&other_vector, &ghost_vector),
        Err(InterLevelCommError::WrongNumberOfComponents { .. })
    ));
}

/// Test that dropping an exchange that is in flight completes its messages
fn test_drop_in_flight<C: Communicator>(comm: &C) {
    let h = unit_square(1, [4, 4], 1, comm.size() as usize);
    let coarser = h.domain(comm, 1);
    let finer = h.domain(comm, 0);
    {
        let mut ilc = InterLevelComm::new(&coarser, 1, &finer).unwrap();
        let vector = Vector::new(&coarser, 1);
        let ghost_vector = ilc.get_new_ghost_vector();
        ilc.get_ghost_patches_start(&vector, &ghost_vector).unwrap();
    }

    comm.barrier();
    let mut total = 0;
    comm.all_reduce_into(&1, &mut total, SystemOperation::sum());
    assert_eq!(total, comm.size());
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
        println!("Testing a single coarse patch");
    }
    test_single_coarse_patch(&world);

    if rank == 0 {
        println!("Testing that ghost patches match their ids");
    }
    test_ghost_patches_match_ids(&world);

    if rank == 0 {
        println!("Testing that plans agree");
    }
    test_plans_agree(&world);

    if rank == 0 {
        println!("Testing usage errors");
    }
    test_usage_errors(&world);

    if rank == 0 {
        println!("Testing dropping an exchange in flight");
    }
    test_drop_in_flight(&world);
}
