//! Index loops

/// Call `f` for every index in the box from `start` to `end` (inclusive)
///
/// Axis 0 varies fastest. Nothing is called if the box is empty.
pub fn for_each_index<const D: usize>(
    start: [isize; D],
    end: [isize; D],
    mut f: impl FnMut([isize; D]),
) {
    if start.iter().zip(&end).any(|(s, e)| e < s) {
        return;
    }
    let mut index = start;
    loop {
        f(index);
        let mut axis = 0;
        loop {
            if axis == D {
                return;
            }
            if index[axis] < end[axis] {
                index[axis] += 1;
                break;
            }
            index[axis] = start[axis];
            axis += 1;
        }
    }
}
