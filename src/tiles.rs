pub mod compat;
pub mod prototype;

use crate::{grid::direction::HexDirection, TileSetError};

/// Index of a tile in the list it was registered with.
pub type TileIndex = usize;

/// Kind of connector a tile exposes on one of its six edges.
///
/// Two adjacent tiles fit together when the sockets facing each other are
/// equal. [`SocketKind::Water`] and [`SocketKind::Lock`] additionally carry
/// canal connectivity and are treated as one family by the water-graph
/// checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketKind {
    Water,
    Bank,
    TowpathLeft,
    TowpathRight,
    Lock,
    Road,
}

impl SocketKind {
    /// Water and locks both carry canal connectivity.
    #[inline]
    pub fn is_water_like(&self) -> bool {
        matches!(self, SocketKind::Water | SocketKind::Lock)
    }
}

/// One canal tile: an identifier, a socket per hex edge and a selection
/// weight.
///
/// Sockets are stored in direction-index order, starting from
/// [`HexDirection::East`]. Rotated variants of the tile are derived at
/// compatibility-table build time, the definition itself is never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct TileDefinition {
    id: String,
    sockets: [SocketKind; 6],
    weight: f32,
    allow_as_boundary_port: bool,
}

impl TileDefinition {
    /// Creates a tile from its socket ring and selection weight.
    ///
    /// The tile is not allowed on the grid boundary with an outward water
    /// socket unless [`Self::with_boundary_port`] is called.
    pub fn new(id: impl Into<String>, sockets: [SocketKind; 6], weight: f32) -> Self {
        Self {
            id: id.into(),
            sockets,
            weight,
            allow_as_boundary_port: false,
        }
    }

    /// Allows this tile to sit on the grid boundary with a water or lock
    /// socket facing outward.
    pub fn with_boundary_port(mut self) -> Self {
        self.allow_as_boundary_port = true;
        self
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    #[inline]
    pub fn allow_as_boundary_port(&self) -> bool {
        self.allow_as_boundary_port
    }

    #[inline]
    pub fn sockets(&self) -> &[SocketKind; 6] {
        &self.sockets
    }

    /// Checks that this tile can be registered in a compatibility table.
    pub fn ensure_valid(&self) -> Result<(), TileSetError> {
        if self.id.is_empty() {
            return Err(TileSetError::EmptyTileId);
        }
        // Written this way so that NaN weights are rejected too.
        if !(self.weight >= 0.0) {
            return Err(TileSetError::InvalidWeight {
                tile_id: self.id.clone(),
                weight: self.weight,
            });
        }
        Ok(())
    }

    /// Returns the socket visible in `direction` after rotating the tile
    /// clockwise by `rotation_steps` sixths of a turn.
    ///
    /// Any `rotation_steps` value is accepted, it is wrapped into `0..6`
    /// first (negative values rotate the other way).
    pub fn socket(&self, direction: HexDirection, rotation_steps: i32) -> SocketKind {
        // Rotation is clockwise in 60 degree increments.
        let wrapped = ((rotation_steps % 6) + 6) % 6;
        let source = ((direction.index() as i32 - wrapped) + 6) % 6;
        self.sockets[source as usize]
    }
}
