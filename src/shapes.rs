//! Functions to create simple example hierarchies

mod uniform;

pub use uniform::{unit_cube, unit_square};
