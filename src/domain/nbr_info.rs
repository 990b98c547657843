//! Neighbor information

use crate::topology::Orthant;
use std::collections::HashMap;

/// The refinement relationship between a patch and its neighbors across one face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NbrType {
    /// One neighbor at the same refinement level
    Normal,
    /// One neighbor at the next coarser level
    Coarse,
    /// Several neighbors at the next finer level
    Fine,
}

/// A neighbor at the same refinement level
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalNbrInfo {
    /// Id of the neighbor
    pub id: usize,
    /// Rank that owns the neighbor
    pub rank: usize,
    /// Local index of the neighbor, if it is owned by this process
    pub local_index: Option<usize>,
    /// Global index of the neighbor
    pub global_index: Option<usize>,
}

/// A neighbor at the next coarser refinement level
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoarseNbrInfo {
    /// Id of the neighbor
    pub id: usize,
    /// Rank that owns the neighbor
    pub rank: usize,
    /// Index of the orthant of the neighbor's face that this patch touches
    ///
    /// For a face of dimension M, this is the index of an `Orthant<M>`.
    pub orth_on_coarse: usize,
    /// Local index of the neighbor, if it is owned by this process
    pub local_index: Option<usize>,
    /// Global index of the neighbor
    pub global_index: Option<usize>,
}

impl CoarseNbrInfo {
    /// The orthant of the neighbor's face that this patch touches
    pub fn orth_on_coarse<const M: usize>(&self) -> Orthant<M> {
        Orthant::new(self.orth_on_coarse)
    }
}

/// The neighbors at the next finer refinement level
///
/// Across a face of dimension M there are `2^M` finer neighbors, ordered by the orthant of the
/// face that they cover.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FineNbrInfo {
    /// Ids of the neighbors
    pub ids: Vec<usize>,
    /// Ranks that own the neighbors
    pub ranks: Vec<usize>,
    /// Local indices of the neighbors owned by this process
    pub local_indexes: Vec<Option<usize>>,
    /// Global indices of the neighbors
    pub global_indexes: Vec<Option<usize>>,
}

/// The neighbor information for one face of a patch
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NbrInfo {
    /// Same level neighbor
    Normal(NormalNbrInfo),
    /// Coarser neighbor
    Coarse(CoarseNbrInfo),
    /// Finer neighbors
    Fine(FineNbrInfo),
}

impl NbrInfo {
    /// Create information for a neighbor at the same level
    pub fn normal(id: usize, rank: usize) -> Self {
        Self::Normal(NormalNbrInfo {
            id,
            rank,
            local_index: None,
            global_index: None,
        })
    }

    /// Create information for a coarser neighbor
    pub fn coarse<const M: usize>(id: usize, rank: usize, orth_on_coarse: Orthant<M>) -> Self {
        assert!(!orth_on_coarse.is_null());
        Self::Coarse(CoarseNbrInfo {
            id,
            rank,
            orth_on_coarse: orth_on_coarse.index(),
            local_index: None,
            global_index: None,
        })
    }

    /// Create information for finer neighbors
    pub fn fine(ids: Vec<usize>, ranks: Vec<usize>) -> Self {
        assert_eq!(
            ids.len(),
            ranks.len(),
            "Fine neighbor ids and ranks must have the same length"
        );
        assert!(ids.len().is_power_of_two());
        let n = ids.len();
        Self::Fine(FineNbrInfo {
            ids,
            ranks,
            local_indexes: vec![None; n],
            global_indexes: vec![None; n],
        })
    }

    /// The type of this neighbor relationship
    pub fn nbr_type(&self) -> NbrType {
        match self {
            Self::Normal(_) => NbrType::Normal,
            Self::Coarse(_) => NbrType::Coarse,
            Self::Fine(_) => NbrType::Fine,
        }
    }

    /// The ids of the neighbors
    pub fn ids(&self) -> &[usize] {
        match self {
            Self::Normal(info) => std::slice::from_ref(&info.id),
            Self::Coarse(info) => std::slice::from_ref(&info.id),
            Self::Fine(info) => &info.ids,
        }
    }

    /// The ranks that own the neighbors
    pub fn ranks(&self) -> &[usize] {
        match self {
            Self::Normal(info) => std::slice::from_ref(&info.rank),
            Self::Coarse(info) => std::slice::from_ref(&info.rank),
            Self::Fine(info) => &info.ranks,
        }
    }

    /// Set the local index of every neighbor whose id is in `id_to_local_index`
    ///
    /// Neighbors that are not in the map keep their current local index.
    pub fn set_local_indexes(&mut self, id_to_local_index: &HashMap<usize, usize>) {
        match self {
            Self::Normal(info) => {
                if let Some(i) = id_to_local_index.get(&info.id) {
                    info.local_index = Some(*i);
                }
            }
            Self::Coarse(info) => {
                if let Some(i) = id_to_local_index.get(&info.id) {
                    info.local_index = Some(*i);
                }
            }
            Self::Fine(info) => {
                for (id, local_index) in info.ids.iter().zip(info.local_indexes.iter_mut()) {
                    if let Some(i) = id_to_local_index.get(id) {
                        *local_index = Some(*i);
                    }
                }
            }
        }
    }

    /// Set the global index of every neighbor whose id is in `id_to_global_index`
    pub fn set_global_indexes(&mut self, id_to_global_index: &HashMap<usize, usize>) {
        match self {
            Self::Normal(info) => {
                info.global_index = id_to_global_index.get(&info.id).copied();
            }
            Self::Coarse(info) => {
                info.global_index = id_to_global_index.get(&info.id).copied();
            }
            Self::Fine(info) => {
                for (id, global_index) in info.ids.iter().zip(info.global_indexes.iter_mut()) {
                    *global_index = id_to_global_index.get(id).copied();
                }
            }
        }
    }
}
