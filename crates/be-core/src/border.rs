/// How samples outside the grid are resolved along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BorderMode {
    /// Repeat the edge voxel.
    #[default]
    Clamp,
    /// Treat outside samples as a fixed value.
    Constant(f64),
    /// Mirror around the edge voxel without repeating it.
    Reflect101,
}

/// Resolves a possibly out-of-range coordinate on an axis of length `len`.
///
/// Returns `None` when the sample lies outside and the mode supplies a constant
/// instead, or when the axis is empty.
pub fn resolve_index(i: isize, len: usize, mode: BorderMode) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if i >= 0 && (i as usize) < len {
        return Some(i as usize);
    }

    match mode {
        BorderMode::Constant(_) => None,
        BorderMode::Clamp => Some(if i < 0 { 0 } else { len - 1 }),
        BorderMode::Reflect101 => {
            if len == 1 {
                return Some(0);
            }
            let period = (2 * len - 2) as isize;
            let r = i.rem_euclid(period) as usize;
            Some(if r < len { r } else { period as usize - r })
        }
    }
}
