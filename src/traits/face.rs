//! Faces of a hypercube

use crate::topology::{Corner, Edge, Side};
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// The number of M-dimensional faces of a D-dimensional hypercube
pub const fn number_of_faces(d: usize, m: usize) -> usize {
    if m > d {
        return 0;
    }
    let mut binomial = 1;
    let mut i = 0;
    while i < m {
        binomial = binomial * (d - i) / (i + 1);
        i += 1;
    }
    (1 << (d - m)) * binomial
}

/// The position of the first M-dimensional face in a flat array holding every face of dimension
/// less than D, ordered by face dimension
pub const fn face_offset(d: usize, m: usize) -> usize {
    let mut offset = 0;
    let mut k = 0;
    while k < m {
        offset += number_of_faces(d, k);
        k += 1;
    }
    offset
}

/// The number of faces of dimension less than D of a D-dimensional hypercube
pub const fn number_of_boundary_faces(d: usize) -> usize {
    face_offset(d, d)
}

/// The dimension of the face at a position in the flat numbering
pub fn face_dim(d: usize, flat_index: usize) -> usize {
    assert!(
        flat_index < number_of_boundary_faces(d),
        "Face {flat_index} out of range for dimension {d}"
    );
    let mut m = 0;
    while flat_index >= face_offset(d, m + 1) {
        m += 1;
    }
    m
}

/// The position in the flat numbering of the face on the opposite side of the cell
pub fn opposite_flat_index(d: usize, flat_index: usize) -> usize {
    let m = face_dim(d, flat_index);
    let offset = face_offset(d, m);
    // the low d - m bits pick the lower or upper end of each axis the face does not span
    offset + ((flat_index - offset) ^ ((1 << (d - m)) - 1))
}

/// The position in the flat numbering of the face that lies in the direction of `offset`
///
/// Each entry of `offset` must be -1, 0 or 1. The axes where it is 0 are the axes the face spans.
/// Returns `None` for the zero offset.
pub fn face_in_direction<const D: usize>(offset: [isize; D]) -> Option<usize> {
    assert!(D <= 3, "Faces are only numbered up to dimension 3");
    debug_assert!(offset.iter().all(|o| o.abs() <= 1));
    let spanned = (0..D).filter(|a| offset[*a] == 0).collect::<Vec<_>>();
    let normal = (0..D).filter(|a| offset[*a] != 0).collect::<Vec<_>>();
    let m = spanned.len();
    let group = match m {
        _ if m == D => return None,
        0 => 0,
        _ if m == D - 1 => normal[0],
        // edges of a cube are grouped by the axis they run along
        _ => spanned[0],
    };
    let bits = normal
        .iter()
        .enumerate()
        .filter(|(_, a)| offset[**a] > 0)
        .fold(0, |bits, (k, _)| bits | (1 << k));
    Some(face_offset(D, m) + (group << (D - m)) + bits)
}

/// A face of a D-dimensional hypercube
///
/// Faces of every dimension share one flat numbering: the corners come first, then the edges,
/// then the sides. A patch stores one neighbor entry per position in this numbering.
pub trait Face<const D: usize>: Copy + Eq + Ord + Hash + Debug + Display {
    /// The dimension of the face
    const DIM: usize;
    /// The number of valid faces of this type
    const NUMBER_OF: usize;

    /// The index of this face among faces of the same type
    fn index(&self) -> usize;

    /// Create a face from its index among faces of the same type
    fn from_index(index: usize) -> Self;

    /// The face on the opposite side of the cell
    fn opposite(&self) -> Self;

    /// The null face
    fn null() -> Self {
        Self::from_index(Self::NUMBER_OF)
    }

    /// The position of this face in the flat numbering of all faces
    fn flat_index(&self) -> usize {
        debug_assert!(self.index() < Self::NUMBER_OF);
        face_offset(D, Self::DIM) + self.index()
    }

    /// Iterate over every valid face of this type
    fn faces() -> impl Iterator<Item = Self> {
        (0..Self::NUMBER_OF).map(Self::from_index)
    }
}

impl<const D: usize> Face<D> for Side<D> {
    const DIM: usize = D - 1;
    const NUMBER_OF: usize = 2 * D;

    fn index(&self) -> usize {
        Side::index(self)
    }
    fn from_index(index: usize) -> Self {
        Side::new(index)
    }
    fn opposite(&self) -> Self {
        Side::opposite(self)
    }
}

impl Face<3> for Edge {
    const DIM: usize = 1;
    const NUMBER_OF: usize = 12;

    fn index(&self) -> usize {
        Edge::index(self)
    }
    fn from_index(index: usize) -> Self {
        Edge::new(index)
    }
    fn opposite(&self) -> Self {
        Edge::opposite(self)
    }
}

impl<const D: usize> Face<D> for Corner<D> {
    const DIM: usize = 0;
    const NUMBER_OF: usize = 1 << D;

    fn index(&self) -> usize {
        Corner::index(self)
    }
    fn from_index(index: usize) -> Self {
        Corner::new(index)
    }
    fn opposite(&self) -> Self {
        Corner::opposite(self)
    }
}
