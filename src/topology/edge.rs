//! Edges of a cube

use super::Side;
use std::fmt;

const NAMES: [&str; 12] = [
    "bs", "bn", "ts", "tn", "bw", "be", "tw", "te", "sw", "se", "nw", "ne",
];

/// An edge of a three-dimensional cell
///
/// The edges are grouped by the axis they run parallel to: indices `4 * axis..4 * axis + 4`.
/// Within a group, bit 0 and bit 1 of the index pick the lower or upper side on the first and
/// second of the two remaining axes. The index 12 is reserved for the null edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    index: u8,
}

impl Edge {
    /// The number of valid edges
    pub const NUMBER_OF: usize = 12;

    /// Create an edge from its raw index
    ///
    /// Panics if the index is larger than the index of the null edge.
    pub fn new(index: usize) -> Self {
        assert!(
            index <= Self::NUMBER_OF,
            "Edge index {index} out of range"
        );
        Self { index: index as u8 }
    }

    /// The null edge
    pub const fn null() -> Self {
        Self { index: 12 }
    }

    /// The raw index of this edge
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Is this the null edge?
    pub fn is_null(&self) -> bool {
        self.index() == Self::NUMBER_OF
    }

    /// The axis this edge runs parallel to
    pub fn axis_index(&self) -> usize {
        self.index() / 4
    }

    /// The edge on the diagonally opposite side of the cell
    pub fn opposite(&self) -> Self {
        Self {
            index: self.index ^ 0b11,
        }
    }

    /// The two sides that meet at this edge, ordered by axis
    pub fn sides(&self) -> [Side<3>; 2] {
        let others = match self.axis_index() {
            0 => [1, 2],
            1 => [0, 2],
            _ => [0, 1],
        };
        std::array::from_fn(|i| Side::new((others[i] << 1) | ((self.index() >> i) & 1)))
    }

    /// Is this edge on `side`?
    pub fn is_on_side(&self, side: Side<3>) -> bool {
        self.sides().contains(&side)
    }

    /// Iterate over all valid edges followed by the null edge
    pub fn values() -> impl Iterator<Item = Self> {
        (0..=Self::NUMBER_OF).map(Self::new)
    }

    /// Bottom-south edge
    pub const fn bs() -> Self {
        Self { index: 0 }
    }
    /// Bottom-north edge
    pub const fn bn() -> Self {
        Self { index: 1 }
    }
    /// Top-south edge
    pub const fn ts() -> Self {
        Self { index: 2 }
    }
    /// Top-north edge
    pub const fn tn() -> Self {
        Self { index: 3 }
    }
    /// Bottom-west edge
    pub const fn bw() -> Self {
        Self { index: 4 }
    }
    /// Bottom-east edge
    pub const fn be() -> Self {
        Self { index: 5 }
    }
    /// Top-west edge
    pub const fn tw() -> Self {
        Self { index: 6 }
    }
    /// Top-east edge
    pub const fn te() -> Self {
        Self { index: 7 }
    }
    /// South-west edge
    pub const fn sw() -> Self {
        Self { index: 8 }
    }
    /// South-east edge
    pub const fn se() -> Self {
        Self { index: 9 }
    }
    /// North-west edge
    pub const fn nw() -> Self {
        Self { index: 10 }
    }
    /// North-east edge
    pub const fn ne() -> Self {
        Self { index: 11 }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Edge::null()")
        } else {
            write!(f, "Edge::{}()", NAMES[self.index()])
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sides() {
        assert_eq!(Edge::bs().sides(), [Side::<3>::south(), Side::<3>::bottom()]);
        assert_eq!(Edge::tn().sides(), [Side::<3>::north(), Side::<3>::top()]);
        assert_eq!(Edge::be().sides(), [Side::<3>::east(), Side::<3>::bottom()]);
        assert_eq!(Edge::tw().sides(), [Side::<3>::west(), Side::<3>::top()]);
        assert_eq!(Edge::se().sides(), [Side::<3>::east(), Side::<3>::south()]);
        assert_eq!(Edge::nw().sides(), [Side::<3>::west(), Side::<3>::north()]);
    }

    #[test]
    fn test_axis() {
        for e in Edge::values().filter(|e| !e.is_null()) {
            for s in e.sides() {
                assert_ne!(s.axis_index(), e.axis_index());
                assert!(e.is_on_side(s));
            }
        }
        assert_eq!(Edge::tn().axis_index(), 0);
        assert_eq!(Edge::tw().axis_index(), 1);
        assert_eq!(Edge::ne().axis_index(), 2);
    }

    #[test]
    fn test_opposite() {
        assert_eq!(Edge::bs().opposite(), Edge::tn());
        assert_eq!(Edge::be().opposite(), Edge::tw());
        assert_eq!(Edge::nw().opposite(), Edge::se());
        for e in Edge::values().filter(|e| !e.is_null()) {
            assert_eq!(e.opposite().axis_index(), e.axis_index());
            for (a, b) in e.sides().iter().zip(e.opposite().sides()) {
                assert_eq!(a.opposite(), b);
            }
        }
    }

    #[test]
    fn test_values() {
        let values = Edge::values().collect::<Vec<_>>();
        assert_eq!(values.len(), 13);
        assert_eq!(values[12], Edge::null());
        for w in values.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Edge::bs()), "Edge::bs()");
        assert_eq!(format!("{}", Edge::ne()), "Edge::ne()");
        assert_eq!(format!("{}", Edge::null()), "Edge::null()");
    }
}
