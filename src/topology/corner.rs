//! Corners of a hypercube

use super::{Orthant, Side};
use std::fmt;

/// A corner of a D-dimensional cell
///
/// Corners use the same bit layout as orthants: bit `i` of the index is set if the corner is at
/// the upper end of axis `i`. The index `2^D` is reserved for the null corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Corner<const D: usize> {
    index: u8,
}

impl<const D: usize> Corner<D> {
    /// The number of valid corners
    pub const NUMBER_OF: usize = 1 << D;

    /// Create a corner from its raw index
    ///
    /// Panics if the index is larger than the index of the null corner.
    pub fn new(index: usize) -> Self {
        assert!(D <= 3, "Corners are only defined up to dimension 3");
        assert!(
            index <= Self::NUMBER_OF,
            "Corner index {index} out of range for dimension {D}"
        );
        Self { index: index as u8 }
    }

    /// The null corner
    pub const fn null() -> Self {
        Self {
            index: (1 << D) as u8,
        }
    }

    /// The raw index of this corner
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Is this the null corner?
    pub fn is_null(&self) -> bool {
        self.index() == Self::NUMBER_OF
    }

    /// The corner at the other end of the cell's diagonal
    pub fn opposite(&self) -> Self {
        Self {
            index: self.index ^ ((1 << D) - 1) as u8,
        }
    }

    /// The D sides that meet at this corner, ordered by axis
    pub fn sides(&self) -> [Side<D>; D] {
        self.to_orthant().exterior_sides()
    }

    /// The corner of the same cell on the other end of the axis normal to `side`
    pub fn nbr_on_side(&self, side: Side<D>) -> Self {
        Self::from_orthant(self.to_orthant().nbr_on_side(side))
    }

    /// The sides of the orthant at this corner that face the rest of the cell
    pub fn interior_sides(&self) -> [Side<D>; D] {
        self.to_orthant().interior_sides()
    }

    /// The sides of the orthant at this corner that lie on the boundary of the cell
    pub fn exterior_sides(&self) -> [Side<D>; D] {
        self.to_orthant().exterior_sides()
    }

    /// Is this corner on `side`?
    pub fn is_on_side(&self, side: Side<D>) -> bool {
        self.to_orthant().is_on_side(side)
    }

    /// The corners that lie on `side`, in increasing order
    pub fn values_on_side(side: Side<D>) -> Vec<Self> {
        Orthant::values_on_side(side)
            .into_iter()
            .map(Self::from_orthant)
            .collect()
    }

    /// The orthant of the cell that contains this corner
    pub fn to_orthant(&self) -> Orthant<D> {
        Orthant::new(self.index())
    }

    /// The corner of the cell contained in an orthant
    pub fn from_orthant(orthant: Orthant<D>) -> Self {
        Self::new(orthant.index())
    }

    /// Iterate over all valid corners followed by the null corner
    pub fn values() -> impl Iterator<Item = Self> {
        (0..=Self::NUMBER_OF).map(Self::new)
    }
}

macro_rules! impl_collapse {
    ($d:literal, $lower:literal) => {
        impl Corner<$d> {
            /// Drop `axis` from this corner, giving the corner of the (D-1)-dimensional face
            /// that it projects onto
            pub fn collapse_on_axis(&self, axis: usize) -> Corner<$lower> {
                Corner::from_orthant(self.to_orthant().collapse_on_axis(axis))
            }
        }
    };
}

impl_collapse!(2, 1);
impl_collapse!(3, 2);

impl Corner<2> {
    /// South-west corner
    pub const fn sw() -> Self {
        Self { index: 0 }
    }
    /// South-east corner
    pub const fn se() -> Self {
        Self { index: 1 }
    }
    /// North-west corner
    pub const fn nw() -> Self {
        Self { index: 2 }
    }
    /// North-east corner
    pub const fn ne() -> Self {
        Self { index: 3 }
    }
}

impl Corner<3> {
    /// Bottom-south-west corner
    pub const fn bsw() -> Self {
        Self { index: 0 }
    }
    /// Bottom-south-east corner
    pub const fn bse() -> Self {
        Self { index: 1 }
    }
    /// Bottom-north-west corner
    pub const fn bnw() -> Self {
        Self { index: 2 }
    }
    /// Bottom-north-east corner
    pub const fn bne() -> Self {
        Self { index: 3 }
    }
    /// Top-south-west corner
    pub const fn tsw() -> Self {
        Self { index: 4 }
    }
    /// Top-south-east corner
    pub const fn tse() -> Self {
        Self { index: 5 }
    }
    /// Top-north-west corner
    pub const fn tnw() -> Self {
        Self { index: 6 }
    }
    /// Top-north-east corner
    pub const fn tne() -> Self {
        Self { index: 7 }
    }
}

impl<const D: usize> fmt::Display for Corner<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Corner<{D}>::null()")
        } else if D == 0 {
            write!(f, "Corner<0>::new(0)")
        } else {
            write!(f, "Corner<{D}>::{}()", self.to_orthant().name())
        }
    }
}
