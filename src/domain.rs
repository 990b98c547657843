//! Patches and domains

mod hierarchy;
mod nbr_info;
mod parallel_domain;
mod patch_info;

pub use hierarchy::{HierarchyError, PatchHierarchy};
pub use nbr_info::{CoarseNbrInfo, FineNbrInfo, NbrInfo, NbrType, NormalNbrInfo};
pub use parallel_domain::Domain;
pub use patch_info::{ChildInfo, Children, ParentInfo, PatchInfo};
