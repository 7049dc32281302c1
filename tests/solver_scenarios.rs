use canal_topology::{
    grid::{direction::HexDirection, HexAxialCoord, HexGridConfig},
    solver::{
        observer::{QueuedObserver, QueuedStatefulObserver, SolveUpdate},
        BoundaryPort, HexWfcSolver, SolveConfig, SolveResult,
    },
    tiles::{
        compat::TileCompatibilityTable, prototype::prototype_tile_set, SocketKind, TileDefinition,
    },
};

/// Solve config with every rejection policy disabled, so that only
/// contradictions and budgets can fail an attempt.
fn relaxed_config(seed: i32) -> SolveConfig {
    SolveConfig {
        seed,
        require_entry_exit_path: false,
        require_single_water_component: false,
        disallow_unassigned_boundary_water: false,
        ..Default::default()
    }
}

/// A tile with water on all six edges, allowed to terminate on the boundary.
fn full_water_tile() -> TileDefinition {
    TileDefinition::new("open_water", [SocketKind::Water; 6], 1.0).with_boundary_port()
}

/// A tile with a single water socket facing East in its base rotation.
fn single_water_tile(allow_boundary: bool) -> TileDefinition {
    use SocketKind::{Bank, Water};
    let tile = TileDefinition::new("inlet", [Water, Bank, Bank, Bank, Bank, Bank], 1.0);
    match allow_boundary {
        true => tile.with_boundary_port(),
        false => tile,
    }
}

fn build_solver(
    tiles: &[TileDefinition],
    grid: HexGridConfig,
    config: SolveConfig,
) -> HexWfcSolver {
    let table = TileCompatibilityTable::build(tiles).unwrap();
    HexWfcSolver::builder()
        .with_table(table)
        .with_grid(grid)
        .with_config(config)
        .build()
        .unwrap()
}

fn solve(tiles: &[TileDefinition], grid: HexGridConfig, config: SolveConfig) -> SolveResult {
    build_solver(tiles, grid, config).solve()
}

/// Every pair of adjacent solved cells must show equal sockets on their
/// shared edge.
fn assert_adjacent_sockets_match(result: &SolveResult, grid: &HexGridConfig) {
    let tiles = prototype_tile_set();
    for cell in &result.cells {
        for direction in [HexDirection::East, HexDirection::SouthEast, HexDirection::SouthWest] {
            let neighbor_coord = cell.coord.neighbor(direction);
            if !grid.contains(&neighbor_coord) {
                continue;
            }
            let neighbor = &result.cells[grid.index_of(&neighbor_coord)];
            let shown = tiles[cell.tile_index].socket(direction, cell.rotation_steps as i32);
            let facing = tiles[neighbor.tile_index]
                .socket(direction.opposite(), neighbor.rotation_steps as i32);
            assert_eq!(
                shown, facing,
                "socket mismatch between {} and {}",
                cell.coord, neighbor_coord
            );
        }
    }
}

#[test]
fn prototype_set_solves_a_small_grid() {
    let mut config = relaxed_config(12345);
    config.max_propagation_steps = 200_000;
    let grid = HexGridConfig::new(5, 4);

    let result = solve(&prototype_tile_set(), grid, config);

    assert!(result.solved, "expected a solve, got: {}", result.message);
    assert!(!result.contradiction);
    assert_eq!(result.collapsed_cells, 20);
    assert_eq!(result.cells.len(), 20);
    assert!(result.message.starts_with("Solved in attempt"));
    assert_adjacent_sockets_match(&result, &grid);
}

#[test]
fn prototype_set_solves_the_default_canal_window() {
    let result = solve(&prototype_tile_set(), HexGridConfig::new(16, 8), relaxed_config(1337));

    assert!(result.solved, "expected a solve, got: {}", result.message);
    assert_eq!(result.collapsed_cells, 128);
    assert_eq!(result.total_cells, 128);
    assert!(!result.contradiction);
}

#[test]
fn explicit_ports_solve_with_all_policies_enabled() {
    let entry = BoundaryPort::at(HexAxialCoord::new(0, 1), HexDirection::West);
    let exit = BoundaryPort::at(HexAxialCoord::new(3, 1), HexDirection::East);
    let config = SolveConfig {
        seed: 42,
        max_attempts: 2,
        require_entry_exit_path: true,
        require_single_water_component: true,
        entry_port: entry,
        exit_port: exit,
        ..Default::default()
    };

    let result = solve(&[full_water_tile()], HexGridConfig::new(4, 3), config);

    assert!(result.solved, "expected a solve, got: {}", result.message);
    assert!(!result.contradiction);
    assert_eq!(result.attempts_used, 1);
    assert!(result.has_resolved_ports);
    assert_eq!(result.resolved_entry_port, entry);
    assert_eq!(result.resolved_exit_port, exit);
}

#[test]
fn unassigned_boundary_water_is_rejected() {
    let config = SolveConfig {
        seed: 7,
        max_attempts: 1,
        ..Default::default()
    };

    // A 1x1 grid puts every socket on the boundary, and this tile always
    // shows exactly one outward water socket.
    let rejected = solve(
        &[single_water_tile(false)],
        HexGridConfig::new(1, 1),
        config.clone(),
    );
    assert!(!rejected.solved);
    assert!(rejected.message.contains("boundary water socket"));

    let allowed = solve(&[single_water_tile(true)], HexGridConfig::new(1, 1), config);
    assert!(allowed.solved, "expected a solve, got: {}", allowed.message);
    assert_eq!(allowed.collapsed_cells, 1);
    assert_eq!(allowed.cells[0].tile_id, "inlet");
}

#[test]
fn auto_selected_ports_are_the_farthest_connected_pair() {
    let config = SolveConfig {
        seed: 11,
        max_attempts: 1,
        require_entry_exit_path: true,
        ..Default::default()
    };

    let result = solve(&[full_water_tile()], HexGridConfig::new(4, 2), config);

    assert!(result.solved, "expected a solve, got: {}", result.message);
    assert!(result.has_resolved_ports);
    let entry = result.resolved_entry_port;
    let exit = result.resolved_exit_port;
    assert!(entry.enabled && exit.enabled);
    assert_ne!(entry.coord, exit.coord);
    assert_eq!(entry.coord, HexAxialCoord::new(0, 0));
    assert_eq!(exit.coord, HexAxialCoord::new(3, 1));
    assert_eq!(entry.coord.distance_to(&exit.coord), 4);
}

#[test]
fn split_water_components_fail_validation() {
    let config = SolveConfig {
        seed: 5,
        max_attempts: 2,
        require_single_water_component: true,
        disallow_unassigned_boundary_water: false,
        ..Default::default()
    };

    // In a one-column grid this tile cannot chain its single water socket
    // through the middle cell, so at least two components always remain.
    let result = solve(&[single_water_tile(false)], HexGridConfig::new(1, 3), config);

    assert!(!result.solved);
    assert!(result.contradiction);
    assert!(result.failed_single_water_component);
    assert!(result.message.contains("connected component"));
    assert_eq!(result.attempts_used, 2);
}

#[test]
fn tiny_time_budget_stops_the_solve() {
    let mut config = relaxed_config(7);
    config.max_attempts = 4;
    config.max_solve_time_seconds = 0.000_001;

    let result = solve(&[full_water_tile()], HexGridConfig::new(64, 64), config);

    assert!(!result.solved);
    assert!(result.time_budget_exceeded);
    assert!(!result.contradiction);
    assert!(result.message.contains("solve time budget"));
    assert_eq!(result.attempts_used, 1);
    assert!(result.solve_time_seconds > 0.0);
}

#[test]
fn exhausted_propagation_budget_reports_a_contradiction() {
    let mut config = relaxed_config(3);
    config.max_attempts = 2;
    config.max_propagation_steps = 3;

    let result = solve(&prototype_tile_set(), HexGridConfig::default(), config);

    assert!(!result.solved);
    assert!(result.contradiction);
    assert!(result.message.starts_with("Attempt 2 failed"));
    assert!(result.message.contains("propagation budget"));
    assert_eq!(result.attempts_used, 2);
}

#[test]
fn equal_seeds_solve_to_equal_grids() {
    let tiles = prototype_tile_set();
    let grid = HexGridConfig::new(6, 4);

    let first = solve(&tiles, grid, relaxed_config(777));
    let mut solver = build_solver(&tiles, grid, relaxed_config(0));
    let second = solver.solve_with_seed(777);

    assert_eq!(first.solved, second.solved);
    assert_eq!(first.attempts_used, second.attempts_used);
    assert_eq!(first.message, second.message);
    assert_eq!(first.cells, second.cells);
}

#[test]
fn queued_observer_sees_every_collapse() {
    let mut config = relaxed_config(21);
    config.max_attempts = 1;
    let mut solver = build_solver(&[full_water_tile()], HexGridConfig::new(3, 2), config);
    let mut observer = QueuedObserver::new(&mut solver);

    let result = solver.solve();
    assert!(result.solved, "expected a solve, got: {}", result.message);

    let updates = observer.dequeue_all();
    assert_eq!(updates.len(), 7);
    assert!(matches!(updates[0], SolveUpdate::Reinitialized(1)));
    let collapses = updates
        .iter()
        .filter(|update| matches!(update, SolveUpdate::Collapsed(_)))
        .count();
    assert_eq!(collapses, 6);
    assert!(!updates
        .iter()
        .any(|update| matches!(update, SolveUpdate::Failed(_))));
}

#[test]
fn stateful_observer_rebuilds_the_grid() {
    let mut config = relaxed_config(22);
    config.max_attempts = 1;
    let grid = HexGridConfig::new(3, 2);
    let mut solver = build_solver(&[full_water_tile()], grid, config);
    let mut observer = QueuedStatefulObserver::new(&mut solver);

    let result = solver.solve();
    assert!(result.solved, "expected a solve, got: {}", result.message);

    observer.dequeue_all();
    assert_eq!(observer.cells().len(), 6);
    for (index, cell) in observer.cells().iter().enumerate() {
        let cell = cell.as_ref().unwrap_or_else(|| panic!("cell {index} missing"));
        assert_eq!(cell.coord, grid.coord_at(index));
        assert_eq!(cell.tile_id, "open_water");
    }
}
