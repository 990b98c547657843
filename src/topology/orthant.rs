//! Orthants

use super::Side;
use std::fmt;

const NAMES: [&[&str]; 4] = [
    &[],
    &["lower", "upper"],
    &["sw", "se", "nw", "ne"],
    &["bsw", "bse", "bnw", "bne", "tsw", "tse", "tnw", "tne"],
];

/// One of the `2^D` sub-cells obtained by bisecting a D-dimensional cell along every axis
///
/// Bit `i` of the index is set if the orthant is in the upper half along axis `i`. The index
/// `2^D` is reserved for the null orthant, which compares greater than every valid orthant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Orthant<const D: usize> {
    index: u8,
}

impl<const D: usize> Orthant<D> {
    /// The number of valid orthants
    pub const NUMBER_OF: usize = 1 << D;

    /// Create an orthant from its raw index
    ///
    /// Panics if the index is larger than the index of the null orthant.
    pub fn new(index: usize) -> Self {
        assert!(D <= 3, "Orthants are only defined up to dimension 3");
        assert!(
            index <= Self::NUMBER_OF,
            "Orthant index {index} out of range for dimension {D}"
        );
        Self { index: index as u8 }
    }

    /// The null orthant
    pub const fn null() -> Self {
        Self {
            index: (1 << D) as u8,
        }
    }

    /// The raw index of this orthant
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Is this the null orthant?
    pub fn is_null(&self) -> bool {
        self.index() == Self::NUMBER_OF
    }

    /// Is this orthant in the lower half along an axis?
    pub fn is_lower_on_axis(&self, axis: usize) -> bool {
        (self.index >> axis) & 1 == 0
    }

    /// Is this orthant in the upper half along an axis?
    pub fn is_higher_on_axis(&self, axis: usize) -> bool {
        (self.index >> axis) & 1 == 1
    }

    /// The orthant on the other side of `side`
    ///
    /// This is the orthant that shares every axis position with this one except along the axis
    /// normal to `side`.
    pub fn nbr_on_side(&self, side: Side<D>) -> Self {
        debug_assert!(!side.is_null());
        Self {
            index: self.index ^ (1 << side.axis_index()),
        }
    }

    /// The sides of this orthant that face the other orthants of the parent cell, one per axis
    pub fn interior_sides(&self) -> [Side<D>; D] {
        std::array::from_fn(|axis| {
            if self.is_lower_on_axis(axis) {
                Side::higher_side_on_axis(axis)
            } else {
                Side::lower_side_on_axis(axis)
            }
        })
    }

    /// The sides of this orthant that lie on the boundary of the parent cell, one per axis
    pub fn exterior_sides(&self) -> [Side<D>; D] {
        std::array::from_fn(|axis| {
            if self.is_lower_on_axis(axis) {
                Side::lower_side_on_axis(axis)
            } else {
                Side::higher_side_on_axis(axis)
            }
        })
    }

    /// Does this orthant touch `side` of the parent cell?
    pub fn is_on_side(&self, side: Side<D>) -> bool {
        self.is_higher_on_axis(side.axis_index()) == side.is_higher_on_axis()
    }

    /// The orthants that touch `side` of the parent cell, in increasing order
    pub fn values_on_side(side: Side<D>) -> Vec<Self> {
        let axis = side.axis_index();
        let lower_mask = (1usize << axis) - 1;
        let upper_mask = usize::MAX << (axis + 1);
        let bit = usize::from(side.is_higher_on_axis()) << axis;
        (0..Self::NUMBER_OF / 2)
            .map(|i| Self::new(((i << 1) & upper_mask) | (i & lower_mask) | bit))
            .collect()
    }

    /// Iterate over all valid orthants followed by the null orthant
    pub fn values() -> impl Iterator<Item = Self> {
        (0..=Self::NUMBER_OF).map(Self::new)
    }

    /// Panics for the null orthant
    pub(crate) fn name(&self) -> &'static str {
        NAMES[D][self.index()]
    }
}

macro_rules! impl_collapse {
    ($d:literal, $lower:literal) => {
        impl Orthant<$d> {
            /// Drop `axis` from this orthant, giving the orthant of the (D-1)-dimensional face
            /// that it projects onto
            pub fn collapse_on_axis(&self, axis: usize) -> Orthant<$lower> {
                assert!(axis < $d, "Axis {axis} out of range for dimension {}", $d);
                debug_assert!(!self.is_null());
                let upper_mask = usize::MAX << axis;
                let index = self.index();
                Orthant::new(((index >> 1) & upper_mask) | (index & !upper_mask))
            }
        }
    };
}

impl_collapse!(1, 0);
impl_collapse!(2, 1);
impl_collapse!(3, 2);

impl Orthant<1> {
    /// Lower half
    pub const fn lower() -> Self {
        Self { index: 0 }
    }
    /// Upper half
    pub const fn upper() -> Self {
        Self { index: 1 }
    }
}

impl Orthant<2> {
    /// South-west quadrant
    pub const fn sw() -> Self {
        Self { index: 0 }
    }
    /// South-east quadrant
    pub const fn se() -> Self {
        Self { index: 1 }
    }
    /// North-west quadrant
    pub const fn nw() -> Self {
        Self { index: 2 }
    }
    /// North-east quadrant
    pub const fn ne() -> Self {
        Self { index: 3 }
    }
}

impl Orthant<3> {
    /// Bottom-south-west octant
    pub const fn bsw() -> Self {
        Self { index: 0 }
    }
    /// Bottom-south-east octant
    pub const fn bse() -> Self {
        Self { index: 1 }
    }
    /// Bottom-north-west octant
    pub const fn bnw() -> Self {
        Self { index: 2 }
    }
    /// Bottom-north-east octant
    pub const fn bne() -> Self {
        Self { index: 3 }
    }
    /// Top-south-west octant
    pub const fn tsw() -> Self {
        Self { index: 4 }
    }
    /// Top-south-east octant
    pub const fn tse() -> Self {
        Self { index: 5 }
    }
    /// Top-north-west octant
    pub const fn tnw() -> Self {
        Self { index: 6 }
    }
    /// Top-north-east octant
    pub const fn tne() -> Self {
        Self { index: 7 }
    }
}

impl<const D: usize> fmt::Display for Orthant<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Orthant<{D}>::null()")
        } else if D == 0 {
            // The only orthant of a point has no name
            write!(f, "Orthant<0>::new(0)")
        } else {
            write!(f, "Orthant<{D}>::{}()", self.name())
        }
    }
}
