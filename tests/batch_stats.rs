use std::sync::Arc;

use canal_topology::{
    batch::{run_batch, BatchConfig, BatchReport, BatchStats},
    grid::HexGridConfig,
    solver::{SolveConfig, TileWeightMultiplier},
    tiles::{
        compat::TileCompatibilityTable, prototype::prototype_tile_set, SocketKind, TileDefinition,
    },
};

fn shared_table(tiles: &[TileDefinition]) -> Arc<TileCompatibilityTable> {
    Arc::new(TileCompatibilityTable::build(tiles).unwrap())
}

fn full_water_tile() -> TileDefinition {
    TileDefinition::new("open_water", [SocketKind::Water; 6], 1.0).with_boundary_port()
}

/// A tile with a single water socket facing East in its base rotation.
fn single_water_tile() -> TileDefinition {
    use SocketKind::{Bank, Water};
    TileDefinition::new("inlet", [Water, Bank, Bank, Bank, Bank, Bank], 1.0)
}

/// Solve config with every rejection policy disabled, so that only
/// contradictions and budgets can fail an attempt.
fn relaxed_config() -> SolveConfig {
    SolveConfig {
        require_entry_exit_path: false,
        require_single_water_component: false,
        disallow_unassigned_boundary_water: false,
        ..Default::default()
    }
}

fn assert_totals_consistent(stats: &BatchStats) {
    assert_eq!(stats.num_solved + stats.num_failed, stats.num_seeds_processed);
    assert!(stats.num_contradictions <= stats.num_failed);
    assert!(stats.num_single_component_failures <= stats.num_failed);
    assert!((0.0..=1.0).contains(&stats.contradiction_rate));
    let binned: i64 = stats.attempt_histogram.iter().map(|bin| bin.count).sum();
    assert_eq!(binned, i64::from(stats.num_solved));
}

#[test]
fn full_water_batches_solve_every_seed() {
    let mut config = relaxed_config();
    config.max_attempts = 1;
    let batch = BatchConfig {
        start_seed: 100,
        num_seeds: 6,
        max_batch_time_seconds: 0.0,
    };

    let stats = run_batch(
        shared_table(&[full_water_tile()]),
        HexGridConfig::new(3, 2),
        &config,
        &batch,
    )
    .unwrap();

    assert_eq!(stats.num_seeds_requested, 6);
    assert_eq!(stats.num_seeds_processed, 6);
    assert_eq!(stats.num_solved, 6);
    assert_eq!(stats.num_failed, 0);
    assert_eq!(stats.num_contradictions, 0);
    assert_eq!(stats.contradiction_rate, 0.0);
    assert!(!stats.batch_time_limit_exceeded);
    assert!((stats.average_attempts_used - 1.0).abs() < 1e-9);

    assert_eq!(stats.attempt_histogram.len(), 1);
    assert_eq!(stats.attempt_histogram[0].attempts, 1);
    assert_eq!(stats.attempt_histogram[0].count, 6);

    assert_eq!(stats.tile_histogram.len(), 1);
    assert_eq!(stats.tile_histogram[0].tile_id, "open_water");
    assert_eq!(stats.tile_histogram[0].count, 36);
    assert!((stats.tile_histogram[0].fraction - 1.0).abs() < 1e-9);

    assert_totals_consistent(&stats);
}

#[test]
fn zero_weight_multipliers_remove_a_tile_from_the_histogram() {
    use SocketKind::Bank;
    let tiles = [
        TileDefinition::new("reed_bed", [Bank; 6], 1.0),
        TileDefinition::new("mud_flat", [Bank; 6], 1.0),
    ];
    let config = SolveConfig {
        max_attempts: 1,
        biome_profile: String::from("marsh"),
        biome_weight_multipliers: vec![TileWeightMultiplier::new("reed_bed", 0.0)],
        ..Default::default()
    };
    let batch = BatchConfig {
        start_seed: 1,
        num_seeds: 48,
        max_batch_time_seconds: 0.0,
    };

    let stats = run_batch(
        shared_table(&tiles),
        HexGridConfig::new(1, 1),
        &config,
        &batch,
    )
    .unwrap();

    assert_eq!(stats.num_solved, 48);
    assert!(!stats
        .tile_histogram
        .iter()
        .any(|bin| bin.tile_id == "reed_bed"));
    let mud = stats
        .tile_histogram
        .iter()
        .find(|bin| bin.tile_id == "mud_flat")
        .unwrap();
    assert_eq!(mud.count, 48);
    assert!((mud.fraction - 1.0).abs() < 1e-9);
}

#[test]
fn single_component_failures_are_counted() {
    let config = SolveConfig {
        max_attempts: 1,
        require_single_water_component: true,
        disallow_unassigned_boundary_water: false,
        ..Default::default()
    };
    let batch = BatchConfig {
        start_seed: 1000,
        num_seeds: 5,
        max_batch_time_seconds: 0.0,
    };

    // One column of three cells: this tile cannot chain its single water
    // socket through the middle cell, every seed splits the water graph.
    let stats = run_batch(
        shared_table(&[single_water_tile()]),
        HexGridConfig::new(1, 3),
        &config,
        &batch,
    )
    .unwrap();

    assert_eq!(stats.num_seeds_processed, 5);
    assert_eq!(stats.num_solved, 0);
    assert_eq!(stats.num_failed, 5);
    assert_eq!(stats.num_single_component_failures, 5);
    assert_eq!(stats.num_contradictions, 5);
    assert!((stats.contradiction_rate - 1.0).abs() < 1e-9);
    assert!(stats.attempt_histogram.is_empty());
    assert!(stats.tile_histogram.is_empty());
    assert_totals_consistent(&stats);
}

#[test]
fn batch_time_limit_stops_the_sweep() {
    let mut config = relaxed_config();
    config.max_attempts = 1;
    let batch = BatchConfig {
        start_seed: 1,
        num_seeds: 1000,
        max_batch_time_seconds: 0.000_000_001,
    };

    let stats = run_batch(
        shared_table(&[full_water_tile()]),
        HexGridConfig::new(8, 8),
        &config,
        &batch,
    )
    .unwrap();

    assert!(stats.batch_time_limit_exceeded);
    assert_eq!(stats.num_seeds_requested, 1000);
    assert_eq!(stats.num_seeds_processed, 0);
    assert_eq!(stats.num_solved, 0);
    assert_eq!(stats.average_attempts_used, 0.0);
    assert!(stats.elapsed_batch_time_seconds > 0.0);
}

#[test]
fn mixed_outcomes_keep_the_totals_consistent() {
    let config = SolveConfig {
        max_attempts: 2,
        require_single_water_component: true,
        disallow_unassigned_boundary_water: false,
        ..Default::default()
    };
    let batch = BatchConfig {
        start_seed: 1,
        num_seeds: 48,
        max_batch_time_seconds: 0.0,
    };

    // Two stacked cells connect their water sockets only when both
    // rotations align, so the sweep mixes solved and rejected seeds.
    let stats = run_batch(
        shared_table(&[single_water_tile()]),
        HexGridConfig::new(1, 2),
        &config,
        &batch,
    )
    .unwrap();

    assert_eq!(stats.num_seeds_processed, 48);
    assert!(stats.average_attempts_used >= 1.0);
    assert!(stats.average_attempts_used <= 2.0);
    for bin in &stats.attempt_histogram {
        assert!((1..=2).contains(&bin.attempts));
        assert!(bin.count > 0);
    }
    if stats.num_solved > 0 {
        let fractions: f64 = stats.tile_histogram.iter().map(|bin| bin.fraction).sum();
        assert!((fractions - 1.0).abs() < 1e-9);
    }
    assert_totals_consistent(&stats);
}

#[test]
fn reliability_on_128_hexes() {
    let batch = BatchConfig {
        start_seed: 1337,
        num_seeds: 20,
        max_batch_time_seconds: 0.0,
    };

    let stats = run_batch(
        shared_table(&prototype_tile_set()),
        HexGridConfig::new(16, 8),
        &relaxed_config(),
        &batch,
    )
    .unwrap();

    assert_eq!(stats.num_seeds_processed, 20);
    assert!(
        stats.num_solved >= 18,
        "solve rate below 90%: {}/20",
        stats.num_solved
    );
    let solved_cells: i64 = stats.tile_histogram.iter().map(|bin| bin.count).sum();
    assert_eq!(solved_cells, 128 * i64::from(stats.num_solved));
    assert_totals_consistent(&stats);
}

#[test]
fn reliability_on_512_hexes() {
    let batch = BatchConfig {
        start_seed: 5000,
        num_seeds: 10,
        max_batch_time_seconds: 0.0,
    };

    let stats = run_batch(
        shared_table(&prototype_tile_set()),
        HexGridConfig::new(32, 16),
        &relaxed_config(),
        &batch,
    )
    .unwrap();

    assert_eq!(stats.num_seeds_processed, 10);
    assert!(
        stats.num_solved >= 9,
        "solve rate below 90%: {}/10",
        stats.num_solved
    );
    assert_totals_consistent(&stats);
}

#[test]
fn reports_round_trip_through_json_and_csv() {
    let mut config = relaxed_config();
    config.max_attempts = 1;
    let grid = HexGridConfig::new(3, 2);
    let batch = BatchConfig {
        start_seed: 9,
        num_seeds: 4,
        max_batch_time_seconds: 0.0,
    };

    let stats = run_batch(shared_table(&[full_water_tile()]), grid, &config, &batch).unwrap();
    let report = BatchReport::new(&grid, &config, &batch, stats);

    let json = report.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["grid_width"], 3);
    assert_eq!(value["start_seed"], 9);
    assert_eq!(value["num_solved"], 4);
    assert_eq!(value["biome_profile"], "default");
    assert_eq!(value["attempt_histogram"][0]["attempts"], 1);
    assert_eq!(value["tile_histogram"][0]["tile_id"], "open_water");
    assert_eq!(value["tile_histogram"][0]["count"], 24);

    let csv = report.to_csv();
    assert!(csv.contains("num_solved,4\n"));
    assert!(csv.contains("\nattempts,count\n1,4\n"));

    let json_path = std::env::temp_dir().join("canal_topology_report.json");
    let csv_path = std::env::temp_dir().join("canal_topology_report.csv");
    report.write_json(&json_path).unwrap();
    report.write_csv(&csv_path).unwrap();
    let written = std::fs::read_to_string(&json_path).unwrap();
    assert!(written.ends_with('\n'));
    assert_eq!(written.trim_end(), json);
    assert_eq!(std::fs::read_to_string(&csv_path).unwrap(), csv);
    let _ = std::fs::remove_file(&json_path);
    let _ = std::fs::remove_file(&csv_path);
}
