//! Cell data

mod component_view;
pub mod loops;
mod patch_vector;

pub use component_view::{ComponentView, ComponentViewMut};
pub use loops::for_each_index;
pub use patch_vector::Vector;
