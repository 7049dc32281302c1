use crate::tiles::TileDefinition;

/// First-pass canal tile set: straights, bends, junctions, a lock and the
/// banked filler tile.
///
/// Weights bias the solver towards simple straight runs and make crossings
/// rare. Only the dead end and the lock gate may terminate on the grid
/// boundary as an entry or exit port.
pub fn prototype_tile_set() -> Vec<TileDefinition> {
    use crate::tiles::SocketKind::{Bank, Lock, Road, TowpathLeft, TowpathRight, Water};

    vec![
        TileDefinition::new("water_straight_ew", [Water, Bank, Bank, Water, Bank, Bank], 1.0),
        TileDefinition::new("water_straight_nesw", [Bank, Water, Bank, Bank, Water, Bank], 1.0),
        TileDefinition::new("water_straight_nwse", [Bank, Bank, Water, Bank, Bank, Water], 1.0),
        TileDefinition::new("water_bend_gentle", [Water, Water, Bank, Bank, Bank, Bank], 0.9),
        TileDefinition::new("water_bend_hard", [Water, Bank, Water, Bank, Bank, Bank], 0.7),
        TileDefinition::new("water_t_junction", [Water, Water, Bank, Water, Bank, Bank], 0.35),
        TileDefinition::new("water_cross", [Water, Bank, Water, Water, Bank, Water], 0.15),
        TileDefinition::new("water_dead_end", [Water, Bank, Bank, Bank, Bank, Bank], 0.2)
            .with_boundary_port(),
        TileDefinition::new("lock_gate", [Lock, Bank, Bank, Lock, Bank, Bank], 0.25)
            .with_boundary_port(),
        TileDefinition::new(
            "towpath_left",
            [Water, TowpathLeft, Bank, Water, TowpathLeft, Bank],
            0.5,
        ),
        TileDefinition::new(
            "towpath_right",
            [Water, Bank, TowpathRight, Water, Bank, TowpathRight],
            0.5,
        ),
        TileDefinition::new("road_crossing", [Road, Bank, Water, Road, Bank, Water], 0.2),
        TileDefinition::new("solid_bank", [Bank; 6], 0.6),
    ]
}
