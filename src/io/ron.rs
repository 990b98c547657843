//! RON I/O
use crate::domain::{Children, NbrInfo, ParentInfo, PatchHierarchy, PatchInfo};
use crate::topology::Orthant;
use crate::traits::{
    ConvertToSerializable, RONExport, RONImport, RonError, number_of_boundary_faces,
};
use serde::{Deserialize, Serialize};

impl<T: ConvertToSerializable> RONExport for T {
    fn to_ron_string(&self) -> Result<String, RonError> {
        Ok(ron::to_string(&self.to_serializable())?)
    }
}

impl<T: ConvertToSerializable> RONImport for T {
    fn from_ron_string(s: &str) -> Result<Self, RonError> {
        Self::from_serializable(ron::from_str(s)?)
    }
}

fn to_array<T: Copy, const D: usize>(values: &[T], name: &str) -> Result<[T; D], RonError> {
    values.try_into().map_err(|_| {
        RonError::InvalidData(format!(
            "{name} has {} entries but the dimension is {D}",
            values.len()
        ))
    })
}

#[derive(Debug, Serialize, Deserialize)]
/// Serializable parent information
pub struct SerializableParentInfo {
    id: usize,
    rank: usize,
    orth_on_parent: usize,
}

#[derive(Debug, Serialize, Deserialize)]
/// Serializable patch
pub struct SerializablePatchInfo {
    id: usize,
    rank: usize,
    refine_level: usize,
    parent: Option<SerializableParentInfo>,
    children: Children,
    ns: Vec<usize>,
    num_ghost_cells: usize,
    starts: Vec<f64>,
    spacings: Vec<f64>,
    nbr_infos: Vec<Option<NbrInfo>>,
}

impl<const D: usize> ConvertToSerializable for PatchInfo<D> {
    type SerializableType = SerializablePatchInfo;

    fn to_serializable(&self) -> SerializablePatchInfo {
        SerializablePatchInfo {
            id: self.id,
            rank: self.rank,
            refine_level: self.refine_level,
            parent: self.parent.map(|p| SerializableParentInfo {
                id: p.id,
                rank: p.rank,
                orth_on_parent: p.orth_on_parent.index(),
            }),
            children: self.children.clone(),
            ns: self.ns.to_vec(),
            num_ghost_cells: self.num_ghost_cells,
            starts: self.starts.to_vec(),
            spacings: self.spacings.to_vec(),
            nbr_infos: self.nbr_infos().to_vec(),
        }
    }

    fn from_serializable(s: SerializablePatchInfo) -> Result<Self, RonError> {
        if s.nbr_infos.len() != number_of_boundary_faces(D) {
            return Err(RonError::InvalidData(format!(
                "Patch {} has {} neighbor entries but {} are needed",
                s.id,
                s.nbr_infos.len(),
                number_of_boundary_faces(D)
            )));
        }
        let parent = match s.parent {
            Some(p) if p.orth_on_parent > Orthant::<D>::NUMBER_OF => {
                return Err(RonError::InvalidData(format!(
                    "Patch {} has invalid parent orthant {}",
                    s.id, p.orth_on_parent
                )));
            }
            Some(p) => Some(ParentInfo {
                id: p.id,
                rank: p.rank,
                orth_on_parent: Orthant::new(p.orth_on_parent),
            }),
            None => None,
        };

        let mut patch = PatchInfo::new(
            s.id,
            s.rank,
            to_array(&s.ns, "ns")?,
            s.num_ghost_cells,
            to_array(&s.starts, "starts")?,
            to_array(&s.spacings, "spacings")?,
        );
        patch.refine_level = s.refine_level;
        patch.parent = parent;
        patch.children = s.children;
        patch.set_nbr_infos(s.nbr_infos);
        Ok(patch)
    }
}

#[derive(Debug, Serialize, Deserialize)]
/// Serializable hierarchy
pub struct SerializableHierarchy {
    ns: Vec<usize>,
    num_ghost_cells: usize,
    levels: Vec<Vec<SerializablePatchInfo>>,
}

impl<const D: usize> ConvertToSerializable for PatchHierarchy<D> {
    type SerializableType = SerializableHierarchy;

    fn to_serializable(&self) -> SerializableHierarchy {
        SerializableHierarchy {
            ns: self.ns().to_vec(),
            num_ghost_cells: self.num_ghost_cells(),
            levels: self
                .levels()
                .iter()
                .map(|level| level.iter().map(|p| p.to_serializable()).collect())
                .collect(),
        }
    }

    fn from_serializable(s: SerializableHierarchy) -> Result<Self, RonError> {
        let levels = s
            .levels
            .into_iter()
            .map(|level| {
                level
                    .into_iter()
                    .map(PatchInfo::from_serializable)
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PatchHierarchy::new(
            to_array(&s.ns, "ns")?,
            s.num_ghost_cells,
            levels,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shapes::{unit_cube, unit_square};
    use crate::topology::Side;

    #[test]
    fn test_patch_round_trip() {
        let h = unit_square(2, [4, 4], 1, 2);
        let p = &h.level(0)[5];
        let s = p.to_ron_string().unwrap();
        let p2 = PatchInfo::<2>::from_ron_string(&s).unwrap();
        assert_eq!(p2.id, p.id);
        assert_eq!(p2.parent, p.parent);
        assert_eq!(p2.children, p.children);
        assert_eq!(p2.nbr_infos(), p.nbr_infos());
        assert_eq!(p2.starts, p.starts);
    }

    #[test]
    fn test_hierarchy_export_and_import() {
        let h = unit_cube(2, [2, 2, 2], 1, 3);
        h.export_as_ron("_test_export_hierarchy.ron").unwrap();
        let h2 = PatchHierarchy::<3>::import_from_ron("_test_export_hierarchy.ron").unwrap();
        assert_eq!(h2.num_levels(), 2);
        assert_eq!(h2.level(0).len(), 64);
        assert_eq!(h2.validate(), Ok(()));
        assert_eq!(h2, h);
        std::fs::remove_file("_test_export_hierarchy.ron").unwrap();
    }

    #[test]
    fn test_wrong_dimension() {
        let h = unit_square(1, [2, 2], 0, 1);
        let s = h.to_ron_string().unwrap();
        assert!(matches!(
            PatchHierarchy::<3>::from_ron_string(&s),
            Err(RonError::InvalidData(_))
        ));
    }

    #[test]
    fn test_invalid_ron() {
        assert!(matches!(
            PatchHierarchy::<2>::from_ron_string("(ns: [2, 2]"),
            Err(RonError::Deserialize(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            PatchHierarchy::<2>::import_from_ron("_this_file_does_not_exist.ron"),
            Err(RonError::File { .. })
        ));
    }

    #[test]
    fn test_neighbors_survive() {
        let h = unit_square(2, [2, 2], 0, 1);
        let s = h.to_ron_string().unwrap();
        let h2 = PatchHierarchy::<2>::from_ron_string(&s).unwrap();
        for (a, b) in h.level(1).iter().zip(h2.level(1)) {
            assert_eq!(
                a.normal_nbr_info(Side::<2>::east()),
                b.normal_nbr_info(Side::<2>::east())
            );
        }
    }
}
