//! Test input/output
#![cfg(feature = "serde")]
use ndamr::{
    PatchHierarchy,
    shapes::{unit_cube, unit_square},
    topology::{Corner, Edge},
    traits::{RONExport, RONImport, RonError},
};

#[test]
fn test_unit_square_ron_io() {
    let h = unit_square(3, [4, 4], 1, 2);
    h.export_as_ron("_test_io_unit_square.ron").unwrap();
    let h2 = PatchHierarchy::<2>::import_from_ron("_test_io_unit_square.ron").unwrap();
    assert_eq!(h2, h);
    assert_eq!(
        h2.level(0)[0].normal_nbr_info(Corner::<2>::ne()),
        h.level(0)[0].normal_nbr_info(Corner::<2>::ne())
    );
}

#[test]
fn test_unit_cube_ron_string() {
    let h = unit_cube(1, [2, 2, 2], 0, 1);
    let s = h.to_ron_string().unwrap();
    let h2 = PatchHierarchy::<3>::from_ron_string(&s).unwrap();
    assert_eq!(h2.validate(), Ok(()));
    let bsw = &h2.level(0)[0];
    assert!(bsw.has_nbr(Edge::te()));
    assert!(!bsw.has_nbr(Edge::bs()));
}

#[test]
fn test_import_wrong_dimension() {
    let s = unit_cube(1, [2, 2, 2], 0, 1).to_ron_string().unwrap();
    assert!(matches!(
        PatchHierarchy::<2>::from_ron_string(&s),
        Err(RonError::InvalidData(_))
    ));
}
