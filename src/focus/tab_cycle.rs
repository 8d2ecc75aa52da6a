/// Which way TAB moves through a popup's controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn from_shift(shift: bool) -> Self {
        if shift {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }
}

/// Index of the control that should take focus next.
///
/// Wraps at both ends. When `focused` is not one of the controls (focus sits on the
/// popup's container), forward lands on the first control and backward on the last.
/// Returns `None` only for an empty sequence.
pub fn next_index<N: PartialEq>(
    controls: &[N],
    focused: &N,
    direction: Direction,
) -> Option<usize> {
    let len = controls.len();
    if len == 0 {
        return None;
    }

    let idx = match (controls.iter().position(|c| c == focused), direction) {
        (Some(i), Direction::Forward) => (i + 1) % len,
        (Some(i), Direction::Backward) => (i + len - 1) % len,
        (None, Direction::Forward) => 0,
        (None, Direction::Backward) => len - 1,
    };
    Some(idx)
}
