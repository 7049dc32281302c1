use std::fmt::Write;

use bitvec::{bitvec, vec::BitVec};
use ndarray::{Array, Ix2};

use crate::{
    grid::direction::{HexDirection, HEX_DIRECTIONS},
    tiles::{SocketKind, TileDefinition, TileIndex},
    TileSetError,
};

/// Every tile contributes one variant per sixth-of-a-turn, symmetry is not
/// deduplicated.
pub const ROTATIONS_PER_TILE: usize = 6;

/// Flat index of a variant: `tile_index * ROTATIONS_PER_TILE + rotation`.
pub type VariantIndex = usize;

/// A rotated tile, the atomic unit the solver chooses between.
///
/// Field order matters for the derived ordering: variants sort by tile index
/// first, then by rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey {
    pub tile_index: TileIndex,
    pub rotation_steps: usize,
}

impl VariantKey {
    pub fn new(tile_index: TileIndex, rotation_steps: usize) -> Self {
        Self {
            tile_index,
            rotation_steps,
        }
    }

    #[inline]
    pub fn flat_index(&self) -> VariantIndex {
        self.tile_index * ROTATIONS_PER_TILE + self.rotation_steps
    }

    #[inline]
    pub(crate) fn from_flat(flat: VariantIndex) -> Self {
        Self {
            tile_index: flat / ROTATIONS_PER_TILE,
            rotation_steps: flat % ROTATIONS_PER_TILE,
        }
    }
}

/// Precomputed adjacency between all tile variants.
///
/// Built once from a validated tile list by brute-forcing every
/// (source variant, direction, target variant) triple. The per-direction
/// variant lists are in ascending `(tile_index, rotation_steps)` order, and
/// the bitmask form of the same data is what the solver's propagation reads.
pub struct TileCompatibilityTable {
    tiles: Vec<TileDefinition>,
    /// Indexed by [variant_flat_index][direction_index].
    compatible: Array<Vec<VariantKey>, Ix2>,
    /// Same adjacency as `compatible`, one bit per target variant.
    allowed_masks: Array<BitVec, Ix2>,
}

impl TileCompatibilityTable {
    /// Builds the table from a tile list.
    ///
    /// All tiles are validated before any adjacency work happens, the first
    /// invalid tile aborts the build.
    pub fn build(tiles: &[TileDefinition]) -> Result<Self, TileSetError> {
        for tile in tiles {
            tile.ensure_valid()?;
        }

        let tiles = tiles.to_vec();
        let variants_count = tiles.len() * ROTATIONS_PER_TILE;
        let mut compatible = Array::from_elem((variants_count, 6), Vec::new());
        let mut allowed_masks = Array::from_elem((variants_count, 6), bitvec![0; variants_count]);

        for source_flat in 0..variants_count {
            let source = VariantKey::from_flat(source_flat);
            let source_tile = &tiles[source.tile_index];
            for &direction in HEX_DIRECTIONS.iter() {
                let source_socket = source_tile.socket(direction, source.rotation_steps as i32);
                let facing = direction.opposite();
                // Ascending flat order is already ascending
                // (tile_index, rotation_steps) order, no sort needed.
                for target_flat in 0..variants_count {
                    let target = VariantKey::from_flat(target_flat);
                    let target_socket =
                        tiles[target.tile_index].socket(facing, target.rotation_steps as i32);
                    if source_socket == target_socket {
                        compatible[(source_flat, direction.index())].push(target);
                        allowed_masks[(source_flat, direction.index())].set(target_flat, true);
                    }
                }
            }
        }

        Ok(Self {
            tiles,
            compatible,
            allowed_masks,
        })
    }

    #[inline]
    pub fn tiles_count(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    pub fn variants_count(&self) -> usize {
        self.tiles.len() * ROTATIONS_PER_TILE
    }

    #[inline]
    pub fn tile(&self, tile_index: TileIndex) -> Option<&TileDefinition> {
        self.tiles.get(tile_index)
    }

    #[inline]
    pub fn tiles(&self) -> &[TileDefinition] {
        &self.tiles
    }

    /// Variants allowed next to `source` in `direction`, in ascending
    /// `(tile_index, rotation_steps)` order. Unknown variants have no
    /// neighbours.
    pub fn compatible_variants(&self, source: VariantKey, direction: HexDirection) -> &[VariantKey] {
        const EMPTY: &[VariantKey] = &[];
        let flat = source.flat_index();
        if source.rotation_steps >= ROTATIONS_PER_TILE || flat >= self.variants_count() {
            return EMPTY;
        }
        &self.compatible[(flat, direction.index())]
    }

    /// Bitmask form of [`Self::compatible_variants`], one bit per target
    /// variant flat index.
    #[inline]
    pub(crate) fn allowed_mask(&self, source_flat: VariantIndex, direction: HexDirection) -> &BitVec {
        &self.allowed_masks[(source_flat, direction.index())]
    }

    /// Socket a variant shows in `direction` once its rotation is applied.
    ///
    /// NO CHECK is done on the variant, it must come from this table.
    #[inline]
    pub fn shown_socket(&self, variant: VariantKey, direction: HexDirection) -> SocketKind {
        self.tiles[variant.tile_index].socket(direction, variant.rotation_steps as i32)
    }

    /// Whether two adjacent variants join through a water or lock socket.
    pub fn water_connected(
        &self,
        source: VariantKey,
        direction: HexDirection,
        target: VariantKey,
    ) -> bool {
        let source_socket = self.shown_socket(source, direction);
        let target_socket = self.shown_socket(target, direction.opposite());
        source_socket == target_socket && source_socket.is_water_like()
    }

    /// Whether a variant shows a water or lock socket on any of its six
    /// edges.
    pub fn is_water_variant(&self, variant: VariantKey) -> bool {
        HEX_DIRECTIONS
            .iter()
            .any(|&direction| self.shown_socket(variant, direction).is_water_like())
    }

    /// Human-readable dump of one variant's neighbours in one direction,
    /// for diagnostics.
    pub fn describe_compatibility(
        &self,
        tile_index: TileIndex,
        rotation_steps: usize,
        direction: HexDirection,
    ) -> String {
        let source = VariantKey::new(tile_index, rotation_steps);
        let allowed = self.compatible_variants(source, direction);
        let mut description = format!(
            "Source tileIndex={} rot={} dir={} has {} compatible variants:\n",
            source.tile_index,
            source.rotation_steps,
            direction.index(),
            allowed.len()
        );
        for variant in allowed {
            let tile_id = self
                .tile(variant.tile_index)
                .map_or("<invalid>", TileDefinition::id);
            let _ = writeln!(
                description,
                "- tileIndex={} tileId={} rot={}",
                variant.tile_index, tile_id, variant.rotation_steps
            );
        }
        description
    }
}
