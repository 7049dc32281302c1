use std::collections::{HashMap, HashSet, VecDeque};

use crate::{
    grid::{
        direction::HEX_DIRECTIONS,
        layout::{HexGridLayout, WorldPosition},
        HexAxialCoord,
    },
    solver::SolvedCell,
    tiles::compat::{TileCompatibilityTable, VariantKey},
};

/// Extracts a water channel polyline from solved cells.
///
/// Endpoints default to a farthest-sweep over the water cells, starting from
/// the first water cell in result order. When `entry` and `exit` are both
/// given and both lie on solved cells they override the endpoints. Returns an
/// empty path when fewer than two water cells exist or when no water-connected
/// route joins the endpoints; a one-point path is possible when both endpoints
/// resolve to the same cell.
pub fn extract_water_path(
    table: &TileCompatibilityTable,
    cells: &[SolvedCell],
    entry: Option<HexAxialCoord>,
    exit: Option<HexAxialCoord>,
) -> Vec<HexAxialCoord> {
    let variant_by_coord: HashMap<HexAxialCoord, VariantKey> = cells
        .iter()
        .map(|cell| (cell.coord, cell.variant()))
        .collect();

    let water_coords: Vec<HexAxialCoord> = cells
        .iter()
        .filter(|cell| table.is_water_variant(cell.variant()))
        .map(|cell| cell.coord)
        .collect();
    if water_coords.len() < 2 {
        return Vec::new();
    }

    let mut start = water_coords[0];
    let mut farthest = start;
    let mut best_distance = -1;
    for &candidate in &water_coords {
        let distance = start.distance_to(&candidate);
        if distance > best_distance {
            best_distance = distance;
            farthest = candidate;
        }
    }

    let mut end = farthest;
    best_distance = -1;
    for &candidate in &water_coords {
        let distance = farthest.distance_to(&candidate);
        if distance > best_distance {
            best_distance = distance;
            end = candidate;
        }
    }

    if let (Some(entry_coord), Some(exit_coord)) = (entry, exit) {
        if variant_by_coord.contains_key(&entry_coord)
            && variant_by_coord.contains_key(&exit_coord)
        {
            start = entry_coord;
            end = exit_coord;
        }
    }

    find_water_path(table, &variant_by_coord, start, end).unwrap_or_default()
}

/// BFS from `start` to `goal` over water-connected cells, reconstructing the
/// route through a parent map.
fn find_water_path(
    table: &TileCompatibilityTable,
    variant_by_coord: &HashMap<HexAxialCoord, VariantKey>,
    start: HexAxialCoord,
    goal: HexAxialCoord,
) -> Option<Vec<HexAxialCoord>> {
    let mut queue = VecDeque::new();
    let mut parent: HashMap<HexAxialCoord, HexAxialCoord> = HashMap::new();
    let mut visited = HashSet::new();

    queue.push_back(start);
    visited.insert(start);

    let mut found = false;
    while let Some(current) = queue.pop_front() {
        if current == goal {
            found = true;
            break;
        }

        let current_variant = match variant_by_coord.get(&current) {
            Some(&variant) => variant,
            None => continue,
        };

        for &direction in HEX_DIRECTIONS {
            let neighbor = current.neighbor(direction);
            if visited.contains(&neighbor) {
                continue;
            }
            let neighbor_variant = match variant_by_coord.get(&neighbor) {
                Some(&variant) => variant,
                None => continue,
            };
            if !table.water_connected(current_variant, direction, neighbor_variant) {
                continue;
            }

            visited.insert(neighbor);
            parent.insert(neighbor, current);
            queue.push_back(neighbor);
        }
    }

    if !found {
        return None;
    }

    let mut path = vec![goal];
    let mut cursor = goal;
    while cursor != start {
        cursor = *parent.get(&cursor)?;
        path.push(cursor);
    }
    path.reverse();
    Some(path)
}

/// Maps a coordinate path to world positions at height `z_offset`.
pub fn path_world_points(
    layout: &HexGridLayout,
    path: &[HexAxialCoord],
    z_offset: f32,
) -> Vec<WorldPosition> {
    path.iter()
        .map(|coord| layout.axial_to_world(coord, z_offset))
        .collect()
}
