use std::{fmt, ops::Range};

use self::direction::HexDirection;

/// Defines the six hexagonal adjacency directions
pub mod direction;
/// Maps axial coordinates to world positions
pub mod layout;

/// Index of a cell in a [`HexGridConfig`]
pub type CellIndex = usize;

/// Axial coordinate on a pointy-top hexagonal grid.
///
/// The implicit third cube coordinate is `s = -q - r`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HexAxialCoord {
    /// Column
    pub q: i32,
    /// Row
    pub r: i32,
}

impl HexAxialCoord {
    pub fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Third cube coordinate, derived from `q` and `r`.
    #[inline]
    pub fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Returns the adjacent coordinate in `direction`.
    #[inline]
    pub fn neighbor(&self, direction: HexDirection) -> HexAxialCoord {
        let delta = direction.delta();
        HexAxialCoord {
            q: self.q + delta.dq,
            r: self.r + delta.dr,
        }
    }

    /// Hex-grid distance (number of steps) between two coordinates.
    pub fn distance_to(&self, other: &HexAxialCoord) -> i32 {
        let dq = self.q - other.q;
        let dr = self.r - other.r;
        (dq.abs() + dr.abs() + (dq + dr).abs()) / 2
    }
}

impl fmt::Display for HexAxialCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(q={}, r={})", self.q, self.r)
    }
}

/// Rectangular window over axial space: `(q, r)` is inside the grid iff
/// `0 <= q < width` and `0 <= r < height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexGridConfig {
    pub width: i32,
    pub height: i32,
}

impl Default for HexGridConfig {
    fn default() -> Self {
        Self {
            width: 8,
            height: 8,
        }
    }
}

impl fmt::Display for HexGridConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "( width: {}, height: {} )", self.width, self.height)
    }
}

impl HexGridConfig {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Returns the total number of cells in the grid
    pub fn total_cells(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }

    /// Returns a [`Range`] over all cell indexes in this grid
    pub fn indexes(&self) -> Range<CellIndex> {
        0..self.total_cells()
    }

    #[inline]
    pub fn contains(&self, coord: &HexAxialCoord) -> bool {
        coord.q >= 0 && coord.q < self.width && coord.r >= 0 && coord.r < self.height
    }

    /// Returns the index of a coordinate, row-major.
    ///
    /// NO CHECK is done to verify that the given coordinate is inside this grid.
    #[inline]
    pub fn index_of(&self, coord: &HexAxialCoord) -> CellIndex {
        (coord.q + coord.r * self.width) as CellIndex
    }

    /// Returns the coordinate of a cell index.
    ///
    /// NO CHECK is done to verify that the given index is a valid index for this grid.
    #[inline]
    pub fn coord_at(&self, index: CellIndex) -> HexAxialCoord {
        let index = index as i32;
        HexAxialCoord {
            q: index % self.width,
            r: index / self.width,
        }
    }

    /// Returns the index of the adjacent cell in `direction`, or `None` when
    /// the neighbor falls outside the grid.
    #[inline]
    pub fn neighbor_index(&self, coord: &HexAxialCoord, direction: HexDirection) -> Option<CellIndex> {
        let neighbor = coord.neighbor(direction);
        match self.contains(&neighbor) {
            true => Some(self.index_of(&neighbor)),
            false => None,
        }
    }

    /// Whether `coord` sits on the grid edge for `direction`: its neighbor in
    /// that direction is outside the grid.
    #[inline]
    pub fn is_boundary(&self, coord: &HexAxialCoord, direction: HexDirection) -> bool {
        !self.contains(&coord.neighbor(direction))
    }
}
