use std::{collections::BTreeMap, fmt::Write as _, fs, path::Path, sync::Arc, time::Instant};

use serde::Serialize;

#[cfg(feature = "debug-traces")]
use tracing::info;

use crate::{
    grid::HexGridConfig,
    solver::{HexWfcSolver, SolveConfig},
    tiles::compat::TileCompatibilityTable,
    ReportError, SolverError,
};

/// A sweep of consecutive seeds through one solver configuration.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub start_seed: i32,
    pub num_seeds: i32,
    /// Max total wall clock time for the whole batch in seconds. `<= 0`
    /// disables the time limit.
    pub max_batch_time_seconds: f64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            start_seed: 1,
            num_seeds: 32,
            max_batch_time_seconds: 0.0,
        }
    }
}

/// How many solves finished with a given `attempts_used`, solved runs only.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptHistogramBin {
    pub attempts: i32,
    pub count: i64,
}

/// How many solved cells used a given tile, across all solved runs.
#[derive(Debug, Clone, Serialize)]
pub struct TileHistogramBin {
    pub tile_id: String,
    pub count: i64,
    pub fraction: f64,
}

/// Aggregate outcome of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    pub num_seeds_requested: i32,
    pub num_seeds_processed: i32,
    pub num_solved: i32,
    pub num_failed: i32,
    pub num_contradictions: i32,
    pub num_time_budget_exceeded: i32,
    pub num_single_component_failures: i32,
    pub contradiction_rate: f64,
    pub average_attempts_used: f64,
    pub average_solve_time_seconds: f64,
    pub elapsed_batch_time_seconds: f64,
    pub batch_time_limit_exceeded: bool,
    /// Bins in ascending attempt count order.
    pub attempt_histogram: Vec<AttemptHistogramBin>,
    /// Bins in ascending tile id order.
    pub tile_histogram: Vec<TileHistogramBin>,
}

/// Solves `num_seeds` consecutive seeds and aggregates the outcomes.
///
/// A failed seed is counted and the sweep moves on, one bad seed never
/// aborts the batch. The batch time limit is checked between seeds, a
/// running solve is bounded only by the per-solve budgets.
pub fn run_batch(
    table: Arc<TileCompatibilityTable>,
    grid: HexGridConfig,
    solve_config: &SolveConfig,
    batch_config: &BatchConfig,
) -> Result<BatchStats, SolverError> {
    let start = Instant::now();
    let mut solver = HexWfcSolver::builder()
        .with_shared_table(table)
        .with_grid(grid)
        .with_config(solve_config.clone())
        .build()?;

    let mut stats = BatchStats {
        num_seeds_requested: batch_config.num_seeds,
        ..Default::default()
    };

    let mut attempts_total: i64 = 0;
    let mut solve_time_total: f64 = 0.0;
    let mut total_solved_cells: i64 = 0;
    let mut attempt_bins: BTreeMap<i32, i64> = BTreeMap::new();
    let mut tile_bins: BTreeMap<String, i64> = BTreeMap::new();

    for offset in 0..batch_config.num_seeds.max(0) {
        if batch_config.max_batch_time_seconds > 0.0
            && start.elapsed().as_secs_f64() >= batch_config.max_batch_time_seconds
        {
            stats.batch_time_limit_exceeded = true;
            break;
        }

        let seed = batch_config.start_seed.wrapping_add(offset);
        let result = solver.solve_with_seed(seed);

        stats.num_seeds_processed += 1;
        attempts_total += i64::from(result.attempts_used);
        solve_time_total += result.solve_time_seconds;

        if result.solved {
            stats.num_solved += 1;
            *attempt_bins.entry(result.attempts_used).or_insert(0) += 1;
            for cell in &result.cells {
                *tile_bins.entry(cell.tile_id.clone()).or_insert(0) += 1;
            }
            total_solved_cells += result.cells.len() as i64;
        } else {
            stats.num_failed += 1;
            if result.contradiction {
                stats.num_contradictions += 1;
            }
            if result.time_budget_exceeded {
                stats.num_time_budget_exceeded += 1;
            }
            if result.failed_single_water_component {
                stats.num_single_component_failures += 1;
            }
        }
    }

    stats.elapsed_batch_time_seconds = start.elapsed().as_secs_f64();
    if stats.num_seeds_processed > 0 {
        let processed = f64::from(stats.num_seeds_processed);
        stats.contradiction_rate = f64::from(stats.num_contradictions) / processed;
        stats.average_attempts_used = attempts_total as f64 / processed;
        stats.average_solve_time_seconds = solve_time_total / processed;
    }

    stats.attempt_histogram = attempt_bins
        .into_iter()
        .map(|(attempts, count)| AttemptHistogramBin { attempts, count })
        .collect();
    stats.tile_histogram = tile_bins
        .into_iter()
        .map(|(tile_id, count)| TileHistogramBin {
            tile_id,
            count,
            fraction: if total_solved_cells > 0 {
                count as f64 / total_solved_cells as f64
            } else {
                0.0
            },
        })
        .collect();

    #[cfg(feature = "debug-traces")]
    info!(
        "Batch complete: solved={}/{} contradictions={}",
        stats.num_solved, stats.num_seeds_processed, stats.num_contradictions
    );

    Ok(stats)
}

/// Batch stats together with the run parameters, ready to be written to
/// disk.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub grid_width: i32,
    pub grid_height: i32,
    pub start_seed: i32,
    pub num_seeds_requested: i32,
    pub num_seeds_processed: i32,
    pub num_solved: i32,
    pub num_failed: i32,
    pub num_contradictions: i32,
    pub num_time_budget_exceeded: i32,
    pub num_single_component_failures: i32,
    pub contradiction_rate: f64,
    pub average_attempts_used: f64,
    pub average_solve_time_seconds: f64,
    pub elapsed_batch_time_seconds: f64,
    pub batch_time_limit_exceeded: bool,
    pub biome_profile: String,
    pub require_entry_exit_path: bool,
    pub require_single_water_component: bool,
    pub auto_select_boundary_ports: bool,
    pub disallow_unassigned_boundary_water: bool,
    pub attempt_histogram: Vec<AttemptHistogramBin>,
    pub tile_histogram: Vec<TileHistogramBin>,
}

impl BatchReport {
    pub fn new(
        grid: &HexGridConfig,
        solve_config: &SolveConfig,
        batch_config: &BatchConfig,
        stats: BatchStats,
    ) -> Self {
        Self {
            grid_width: grid.width,
            grid_height: grid.height,
            start_seed: batch_config.start_seed,
            num_seeds_requested: stats.num_seeds_requested,
            num_seeds_processed: stats.num_seeds_processed,
            num_solved: stats.num_solved,
            num_failed: stats.num_failed,
            num_contradictions: stats.num_contradictions,
            num_time_budget_exceeded: stats.num_time_budget_exceeded,
            num_single_component_failures: stats.num_single_component_failures,
            contradiction_rate: stats.contradiction_rate,
            average_attempts_used: stats.average_attempts_used,
            average_solve_time_seconds: stats.average_solve_time_seconds,
            elapsed_batch_time_seconds: stats.elapsed_batch_time_seconds,
            batch_time_limit_exceeded: stats.batch_time_limit_exceeded,
            biome_profile: solve_config.biome_profile.clone(),
            require_entry_exit_path: solve_config.require_entry_exit_path,
            require_single_water_component: solve_config.require_single_water_component,
            auto_select_boundary_ports: solve_config.auto_select_boundary_ports,
            disallow_unassigned_boundary_water: solve_config.disallow_unassigned_boundary_water,
            attempt_histogram: stats.attempt_histogram,
            tile_histogram: stats.tile_histogram,
        }
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        let mut json = self.to_json()?;
        json.push('\n');
        fs::write(path, json).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Three CSV sections separated by blank lines: scalar metrics, the
    /// attempt histogram and the tile histogram.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from("metric,value\n");
        let _ = writeln!(csv, "grid_width,{}", self.grid_width);
        let _ = writeln!(csv, "grid_height,{}", self.grid_height);
        let _ = writeln!(csv, "start_seed,{}", self.start_seed);
        let _ = writeln!(csv, "num_seeds_requested,{}", self.num_seeds_requested);
        let _ = writeln!(csv, "num_seeds_processed,{}", self.num_seeds_processed);
        let _ = writeln!(csv, "num_solved,{}", self.num_solved);
        let _ = writeln!(csv, "num_failed,{}", self.num_failed);
        let _ = writeln!(csv, "num_contradictions,{}", self.num_contradictions);
        let _ = writeln!(csv, "num_time_budget_exceeded,{}", self.num_time_budget_exceeded);
        let _ = writeln!(
            csv,
            "num_single_component_failures,{}",
            self.num_single_component_failures
        );
        let _ = writeln!(csv, "contradiction_rate,{:.6}", self.contradiction_rate);
        let _ = writeln!(csv, "average_attempts_used,{:.6}", self.average_attempts_used);
        let _ = writeln!(
            csv,
            "average_solve_time_seconds,{:.6}",
            self.average_solve_time_seconds
        );
        let _ = writeln!(
            csv,
            "elapsed_batch_time_seconds,{:.6}",
            self.elapsed_batch_time_seconds
        );
        let _ = writeln!(
            csv,
            "batch_time_limit_exceeded,{}",
            self.batch_time_limit_exceeded
        );
        let _ = writeln!(csv, "biome_profile,{}", self.biome_profile);
        let _ = writeln!(csv, "require_entry_exit_path,{}", self.require_entry_exit_path);
        let _ = writeln!(
            csv,
            "require_single_water_component,{}",
            self.require_single_water_component
        );
        let _ = writeln!(
            csv,
            "auto_select_boundary_ports,{}",
            self.auto_select_boundary_ports
        );
        let _ = writeln!(
            csv,
            "disallow_unassigned_boundary_water,{}",
            self.disallow_unassigned_boundary_water
        );

        csv.push('\n');
        csv.push_str("attempts,count\n");
        for bin in &self.attempt_histogram {
            let _ = writeln!(csv, "{},{}", bin.attempts, bin.count);
        }

        csv.push('\n');
        csv.push_str("tile_id,count,fraction\n");
        for bin in &self.tile_histogram {
            let _ = writeln!(csv, "{},{},{:.6}", bin.tile_id, bin.count, bin.fraction);
        }

        csv
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), ReportError> {
        fs::write(path, self.to_csv()).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> BatchReport {
        let grid = HexGridConfig::new(6, 4);
        let solve_config = SolveConfig::default();
        let batch_config = BatchConfig {
            start_seed: 100,
            num_seeds: 2,
            max_batch_time_seconds: 0.0,
        };
        let stats = BatchStats {
            num_seeds_requested: 2,
            num_seeds_processed: 2,
            num_solved: 1,
            num_failed: 1,
            num_contradictions: 1,
            contradiction_rate: 0.5,
            average_attempts_used: 4.5,
            average_solve_time_seconds: 0.001,
            elapsed_batch_time_seconds: 0.002,
            attempt_histogram: vec![AttemptHistogramBin {
                attempts: 1,
                count: 1,
            }],
            tile_histogram: vec![TileHistogramBin {
                tile_id: "water_straight_ew".to_owned(),
                count: 24,
                fraction: 1.0,
            }],
            ..Default::default()
        };
        BatchReport::new(&grid, &solve_config, &batch_config, stats)
    }

    #[test]
    fn json_keys_keep_their_declaration_order() {
        let json = sample_report().to_json().unwrap();
        let positions = [
            "\"grid_width\"",
            "\"start_seed\"",
            "\"num_solved\"",
            "\"contradiction_rate\"",
            "\"biome_profile\"",
            "\"attempt_histogram\"",
            "\"tile_histogram\"",
        ]
        .map(|key| json.find(key).unwrap());
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn csv_contains_the_three_sections() {
        let csv = sample_report().to_csv();
        assert!(csv.starts_with("metric,value\n"));
        assert!(csv.contains("grid_width,6\n"));
        assert!(csv.contains("contradiction_rate,0.500000\n"));
        assert!(csv.contains("batch_time_limit_exceeded,false\n"));
        assert!(csv.contains("\nattempts,count\n1,1\n"));
        assert!(csv.contains("\ntile_id,count,fraction\nwater_straight_ew,24,1.000000\n"));
    }
}
