//! Topology of a hypercube: orthants, sides, edges and corners

mod corner;
mod edge;
mod orthant;
mod side;

pub use corner::Corner;
pub use edge::Edge;
pub use orthant::Orthant;
pub use side::Side;
