//! Test inter-level communication on a single process
use approx::assert_relative_eq;
use mpi::traits::Communicator;
use ndamr::{
    InterLevelComm, Vector,
    gmg::InterLevelCommError,
    shapes::{unit_cube, unit_square},
    vector::for_each_index,
};

fn check_single_process_exchange<C: Communicator>(comm: &C) {
    let h = unit_square(4, [4, 4], 1, 1);
    let coarser = h.domain(comm, 1);
    let finer = h.domain(comm, 0);
    let mut ilc = InterLevelComm::new(&coarser, 2, &finer).unwrap();

    assert_eq!(ilc.num_ghost_patches(), 0);
    assert_eq!(ilc.patch_size(), 2 * 6 * 6);
    assert_eq!(ilc.patches_with_local_parent().count(), 64);
    assert_eq!(ilc.patches_with_ghost_parent().count(), 0);
    for (coarser_index, patch) in ilc.patches_with_local_parent() {
        assert_eq!(
            patch.parent.map(|p| p.id),
            Some(coarser.patch(coarser_index).id)
        );
    }

    let mut vector = Vector::new(&coarser, 2);
    vector.set(4.0);
    let before = vector.clone();
    let mut ghost_vector = ilc.get_new_ghost_vector();
    assert_eq!(ghost_vector.num_local_patches(), 0);

    ilc.get_ghost_patches_start(&vector, &ghost_vector).unwrap();
    ilc.get_ghost_patches_finish(&vector, &mut ghost_vector)
        .unwrap();
    ilc.send_ghost_patches_start(&vector, &ghost_vector).unwrap();
    ilc.send_ghost_patches_finish(&mut vector, &ghost_vector)
        .unwrap();
    assert_eq!(vector, before);
    let view = vector.component_view(0, 1);
    for_each_index(view.start(), view.end(), |index| {
        assert_relative_eq!(view[index], 4.0);
    });
    assert_relative_eq!(view[view.ghost_start()], 0.0);
}

fn check_usage_errors<C: Communicator>(comm: &C) {
    let h = unit_cube(1, [2, 2, 2], 1, 1);
    let coarser = h.domain(comm, 1);
    let finer = h.domain(comm, 0);
    let mut ilc = InterLevelComm::new(&coarser, 1, &finer).unwrap();
    let mut vector = Vector::new(&coarser, 1);
    let mut ghost_vector = ilc.get_new_ghost_vector();
    let mut other_ghost_vector = ilc.get_new_ghost_vector();

    assert_eq!(
        ilc.get_ghost_patches_finish(&vector, &mut ghost_vector),
        Err(InterLevelCommError::NoCommunicationStarted {
            call: "get_ghost_patches_finish"
        })
    );

    ilc.send_ghost_patches_start(&vector, &ghost_vector).unwrap();
    assert_eq!(
        ilc.send_ghost_patches_start(&vector, &ghost_vector),
        Err(InterLevelCommError::UnfinishedCommunication {
            call: "send_ghost_patches_start",
            in_flight: "send_ghost_patches_start"
        })
    );
    assert_eq!(
        ilc.get_ghost_patches_start(&vector, &ghost_vector),
        Err(InterLevelCommError::UnfinishedCommunication {
            call: "get_ghost_patches_start",
            in_flight: "send_ghost_patches_start"
        })
    );
    assert_eq!(
        ilc.get_ghost_patches_finish(&vector, &mut ghost_vector),
        Err(InterLevelCommError::DirectionMismatch {
            call: "get_ghost_patches_finish",
            in_flight: "send_ghost_patches_start"
        })
    );
    assert_eq!(
        ilc.send_ghost_patches_finish(&mut vector, &other_ghost_vector),
        Err(InterLevelCommError::GhostVectorMismatch {
            call: "send_ghost_patches_finish",
            in_flight: "send_ghost_patches_start"
        })
    );
    // A rejected finish leaves the exchange in flight
    ilc.send_ghost_patches_finish(&mut vector, &ghost_vector)
        .unwrap();

    assert_eq!(
        ilc.get_ghost_patches_finish(&vector, &mut other_ghost_vector),
        Err(InterLevelCommError::NoCommunicationStarted {
            call: "get_ghost_patches_finish"
        })
    );

    let short_vector = Vector::<3>::with_patches([2, 2, 2], 1, 1, 0);
    assert_eq!(
        ilc.get_ghost_patches_start(&short_vector, &ghost_vector),
        Err(InterLevelCommError::WrongNumberOfPatches {
            call: "get_ghost_patches_start",
            name: "vector",
            expected: 1,
            found: 0
        })
    );
    let wide_vector = Vector::<3>::with_patches([2, 2, 2], 2, 1, 1);
    assert_eq!(
        ilc.send_ghost_patches_start(&wide_vector, &ghost_vector),
        Err(InterLevelCommError::WrongPatchShape {
            call: "send_ghost_patches_start",
            name: "vector"
        })
    );
    let wrong_ghost_vector = Vector::<3>::with_patches([2, 2, 2], 1, 1, 3);
    assert!(matches!(
        ilc.send_ghost_patches_start(&vector, &wrong_ghost_vector),
        Err(InterLevelCommError::WrongNumberOfPatches {
            name: "ghost vector",
            ..
        })
    ));

    // A clone never carries an exchange in flight
    ilc.get_ghost_patches_start(&vector, &ghost_vector).unwrap();
    let mut copy = ilc.clone();
    copy.get_ghost_patches_start(&vector, &ghost_vector).unwrap();
    copy.get_ghost_patches_finish(&vector, &mut other_ghost_vector)
        .unwrap_err();
    copy.get_ghost_patches_finish(&vector, &mut ghost_vector)
        .unwrap();
    ilc.get_ghost_patches_finish(&vector, &mut ghost_vector)
        .unwrap();
}

fn check_domain_mismatch<C: Communicator>(comm: &C) {
    let h = unit_square(2, [4, 4], 1, 1);
    let other = unit_square(2, [2, 2], 1, 1);
    let coarser = h.domain(comm, 1);
    let finer = other.domain(comm, 0);
    assert_eq!(
        InterLevelComm::new(&coarser, 1, &finer).map(|_| ()),
        Err(InterLevelCommError::DomainShapeMismatch)
    );

    // The coarser level has no parents, so it cannot be used as the finer domain
    let coarsest = h.domain(comm, 1);
    assert_eq!(
        InterLevelComm::new(&coarser, 1, &coarsest).map(|_| ()),
        Err(InterLevelCommError::MissingParent {
            id: h.level(1)[0].id
        })
    );
}

#[test]
fn test_inter_level_comm() {
    // MPI can only be initialised once per process, so every check runs in this test
    let universe = mpi::initialize().unwrap();
    let world = universe.world();
    assert_eq!(world.size(), 1);

    check_single_process_exchange(&world);
    check_usage_errors(&world);
    check_domain_mismatch(&world);
}
