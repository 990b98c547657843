//! n-dimensional adaptive mesh refinement
#![cfg_attr(feature = "strict", deny(warnings), deny(unused_crate_dependencies))]
#![warn(missing_docs)]

pub mod domain;
pub mod gmg;
mod io;
pub mod shapes;
pub mod topology;
pub mod traits;
pub mod vector;

pub use domain::{Domain, PatchHierarchy, PatchInfo};
pub use gmg::InterLevelComm;
pub use vector::Vector;
