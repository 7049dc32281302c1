use crate::grid::{direction::HexDirection, HexAxialCoord};

/// A world-space position produced by a [`HexGridLayout`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WorldPosition {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Pointy-top hexagonal layout mapping axial coordinates to world positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexGridLayout {
    /// Distance from a hex center to any of its corners
    pub hex_size: f32,
    /// Fraction of `hex_size` between a cell center and its edge socket markers
    pub socket_offset_scale: f32,
}

impl Default for HexGridLayout {
    fn default() -> Self {
        Self {
            hex_size: 200.0,
            socket_offset_scale: 0.75,
        }
    }
}

impl HexGridLayout {
    /// Returns the world position of a cell center, at height `z`.
    pub fn axial_to_world(&self, coord: &HexAxialCoord, z: f32) -> WorldPosition {
        let sqrt_3 = 3.0_f32.sqrt();
        let q = coord.q as f32;
        let r = coord.r as f32;
        WorldPosition {
            x: self.hex_size * sqrt_3 * (q + r * 0.5),
            y: self.hex_size * 1.5 * r,
            z,
        }
    }

    /// Returns the world position of the socket marker of `coord` towards
    /// `direction`, offset from the cell center by
    /// `hex_size * socket_offset_scale`.
    pub fn socket_marker_position(
        &self,
        coord: &HexAxialCoord,
        direction: HexDirection,
        z: f32,
    ) -> WorldPosition {
        let center = self.axial_to_world(coord, z);
        let towards = self.axial_to_world(&coord.neighbor(direction), z);
        let (dx, dy) = (towards.x - center.x, towards.y - center.y);
        // Adjacent hex centers are always a positive distance apart.
        let inv_len = 1.0 / (dx * dx + dy * dy).sqrt();
        let offset = self.hex_size * self.socket_offset_scale * inv_len;
        WorldPosition {
            x: center.x + dx * offset,
            y: center.y + dy * offset,
            z,
        }
    }
}
