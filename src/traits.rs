//! Traits

mod face;
#[cfg(feature = "serde")]
mod io;

pub use face::{
    Face, face_dim, face_in_direction, face_offset, number_of_boundary_faces, number_of_faces,
    opposite_flat_index,
};
#[cfg(feature = "serde")]
pub(crate) use io::ConvertToSerializable;
#[cfg(feature = "serde")]
pub use io::{RONExport, RONImport, RonError};
