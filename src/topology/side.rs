//! Sides of a hypercube

use std::fmt;

const NAMES: [&str; 6] = ["west", "east", "south", "north", "bottom", "top"];

/// A (D-1)-dimensional side of a D-dimensional cell
///
/// The sides are numbered so that the side with index `2 * axis` is the lower side on `axis` and
/// `2 * axis + 1` is the upper side. The index `2 * D` is reserved for the null side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Side<const D: usize> {
    index: u8,
}

impl<const D: usize> Side<D> {
    /// The number of valid sides
    pub const NUMBER_OF: usize = 2 * D;

    /// Create a side from its raw index
    ///
    /// Panics if the index is larger than the index of the null side.
    pub fn new(index: usize) -> Self {
        assert!(
            index <= Self::NUMBER_OF,
            "Side index {index} out of range for dimension {D}"
        );
        Self { index: index as u8 }
    }

    /// The null side
    pub const fn null() -> Self {
        Self {
            index: (2 * D) as u8,
        }
    }

    /// The raw index of this side
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Is this the null side?
    pub fn is_null(&self) -> bool {
        self.index() == Self::NUMBER_OF
    }

    /// The lower side on an axis
    pub fn lower_side_on_axis(axis: usize) -> Self {
        assert!(axis < D, "Axis {axis} out of range for dimension {D}");
        Self::new(2 * axis)
    }

    /// The upper side on an axis
    pub fn higher_side_on_axis(axis: usize) -> Self {
        assert!(axis < D, "Axis {axis} out of range for dimension {D}");
        Self::new(2 * axis + 1)
    }

    /// The axis that is normal to this side
    pub fn axis_index(&self) -> usize {
        self.index() >> 1
    }

    /// Is this the lower side on its axis?
    pub fn is_lower_on_axis(&self) -> bool {
        self.index & 1 == 0
    }

    /// Is this the upper side on its axis?
    pub fn is_higher_on_axis(&self) -> bool {
        self.index & 1 == 1
    }

    /// The side on the opposite end of the same axis
    pub fn opposite(&self) -> Self {
        Self {
            index: self.index ^ 1,
        }
    }

    /// Iterate over all valid sides followed by the null side
    pub fn values() -> impl Iterator<Item = Self> {
        (0..=Self::NUMBER_OF).map(Self::new)
    }

    fn name(&self) -> Option<&'static str> {
        if self.index() < Self::NUMBER_OF {
            NAMES.get(self.index()).copied()
        } else {
            None
        }
    }
}

impl Side<1> {
    /// Lower side on axis 0
    pub const fn west() -> Self {
        Self { index: 0 }
    }
    /// Upper side on axis 0
    pub const fn east() -> Self {
        Self { index: 1 }
    }
}

impl Side<2> {
    /// Lower side on axis 0
    pub const fn west() -> Self {
        Self { index: 0 }
    }
    /// Upper side on axis 0
    pub const fn east() -> Self {
        Self { index: 1 }
    }
    /// Lower side on axis 1
    pub const fn south() -> Self {
        Self { index: 2 }
    }
    /// Upper side on axis 1
    pub const fn north() -> Self {
        Self { index: 3 }
    }
}

impl Side<3> {
    /// Lower side on axis 0
    pub const fn west() -> Self {
        Self { index: 0 }
    }
    /// Upper side on axis 0
    pub const fn east() -> Self {
        Self { index: 1 }
    }
    /// Lower side on axis 1
    pub const fn south() -> Self {
        Self { index: 2 }
    }
    /// Upper side on axis 1
    pub const fn north() -> Self {
        Self { index: 3 }
    }
    /// Lower side on axis 2
    pub const fn bottom() -> Self {
        Self { index: 4 }
    }
    /// Upper side on axis 2
    pub const fn top() -> Self {
        Self { index: 5 }
    }
}

impl<const D: usize> fmt::Display for Side<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Side<{D}>::null()")
        } else if let Some(name) = self.name() {
            write!(f, "Side<{D}>::{name}()")
        } else {
            // Sides above dimension 3 have no names
            write!(f, "Side<{D}>::new({})", self.index)
        }
    }
}
