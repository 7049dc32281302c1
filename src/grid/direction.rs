/// The six adjacency directions of a pointy-top hexagonal grid, indexed from
/// East in socket order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HexDirection {
    East = 0,
    NorthEast = 1,
    NorthWest = 2,
    West = 3,
    SouthWest = 4,
    SouthEast = 5,
}

impl HexDirection {
    /// Returns the direction pointing the opposite way.
    pub fn opposite(&self) -> HexDirection {
        match self {
            HexDirection::East => HexDirection::West,
            HexDirection::NorthEast => HexDirection::SouthWest,
            HexDirection::NorthWest => HexDirection::SouthEast,
            HexDirection::West => HexDirection::East,
            HexDirection::SouthWest => HexDirection::NorthEast,
            HexDirection::SouthEast => HexDirection::NorthWest,
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }

    #[inline]
    pub fn delta(&self) -> &'static AxialDelta {
        &HEX_DELTAS[*self as usize]
    }
}

/// Axial coordinate offset of one step in a [`HexDirection`]
pub struct AxialDelta {
    pub dq: i32,
    pub dr: i32,
}

pub const HEX_DIRECTIONS: &[HexDirection; 6] = &[
    HexDirection::East,
    HexDirection::NorthEast,
    HexDirection::NorthWest,
    HexDirection::West,
    HexDirection::SouthWest,
    HexDirection::SouthEast,
];

pub const HEX_DELTAS: &[AxialDelta; 6] = &[
    AxialDelta {
        // East
        dq: 1,
        dr: 0,
    },
    AxialDelta {
        // NorthEast
        dq: 1,
        dr: -1,
    },
    AxialDelta {
        // NorthWest
        dq: 0,
        dr: -1,
    },
    AxialDelta {
        // West
        dq: -1,
        dr: 0,
    },
    AxialDelta {
        // SouthWest
        dq: -1,
        dr: 1,
    },
    AxialDelta {
        // SouthEast
        dq: 0,
        dr: 1,
    },
];

#[cfg(test)]
mod tests {
    use super::HEX_DIRECTIONS;

    #[test]
    fn opposite_is_three_steps_away() {
        for &direction in HEX_DIRECTIONS {
            assert_eq!(direction.opposite().index(), (direction.index() + 3) % 6);
            assert_eq!(direction.opposite().opposite(), direction);
        }
    }

    #[test]
    fn deltas_cancel_with_opposites() {
        for &direction in HEX_DIRECTIONS {
            let delta = direction.delta();
            let opposite = direction.opposite().delta();
            assert_eq!(delta.dq + opposite.dq, 0);
            assert_eq!(delta.dr + opposite.dr, 0);
        }
    }
}
