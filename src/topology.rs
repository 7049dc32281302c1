use std::sync::Arc;

#[cfg(feature = "debug-traces")]
use tracing::{info, warn};

use crate::{
    grid::{
        layout::{HexGridLayout, WorldPosition},
        HexAxialCoord, HexGridConfig,
    },
    path::{extract_water_path, path_world_points},
    seeds::{derive_stream_seed, DRESSING_STREAM, TOPOLOGY_STREAM},
    solver::{BoundaryPort, HexWfcSolver, SolveConfig, SolveResult},
    tiles::compat::TileCompatibilityTable,
    SolverError,
};

/// Everything one topology generation depends on besides the tile set.
#[derive(Debug, Clone)]
pub struct TopologyPipelineConfig {
    pub grid: HexGridConfig,
    pub solve: SolveConfig,
    pub layout: HexGridLayout,
    /// Height of the extracted path polyline above the grid plane.
    pub path_z_offset: f32,
    /// Height of the entry/exit port markers.
    pub port_marker_z_offset: f32,
    /// If true, the solve and dressing seeds are derived from the configured
    /// seed instead of both reusing it directly.
    pub derive_seed_streams_from_master: bool,
    pub generate_path: bool,
}

impl Default for TopologyPipelineConfig {
    fn default() -> Self {
        Self {
            grid: HexGridConfig::default(),
            solve: SolveConfig::default(),
            layout: HexGridLayout::default(),
            path_z_offset: 40.0,
            port_marker_z_offset: 30.0,
            derive_seed_streams_from_master: true,
            generate_path: true,
        }
    }
}

/// Record of one generation: the seeds that drove it, the ports it ended up
/// with and the size of the extracted path.
#[derive(Debug, Clone, Default)]
pub struct GenerationMetadata {
    pub master_seed: i32,
    pub topology_seed: i32,
    pub dressing_seed: i32,
    pub biome_profile: String,
    pub has_entry_port: bool,
    pub entry_port: BoundaryPort,
    pub has_exit_port: bool,
    pub exit_port: BoundaryPort,
    pub path_point_count: usize,
}

/// Product of a [`TopologyPipeline::generate`] call.
#[derive(Debug, Clone)]
pub struct TopologyOutput {
    pub solve: SolveResult,
    /// Water channel route, cell by cell. Empty when the solve failed or no
    /// route was found.
    pub water_path: Vec<HexAxialCoord>,
    /// `water_path` mapped to world positions.
    pub path_points: Vec<WorldPosition>,
    pub entry_marker: Option<WorldPosition>,
    pub exit_marker: Option<WorldPosition>,
    pub metadata: GenerationMetadata,
}

/// Orchestrates a full topology generation: stream seed derivation, the
/// solve itself, water path extraction and port markers.
pub struct TopologyPipeline {
    table: Arc<TileCompatibilityTable>,
    config: TopologyPipelineConfig,
}

impl TopologyPipeline {
    pub fn new(table: Arc<TileCompatibilityTable>, config: TopologyPipelineConfig) -> Self {
        Self { table, config }
    }

    #[inline]
    pub fn config(&self) -> &TopologyPipelineConfig {
        &self.config
    }

    /// Runs one full generation.
    ///
    /// A failed solve is not an error: the output then carries the failed
    /// [`SolveResult`] with an empty path and no port markers.
    pub fn generate(&self) -> Result<TopologyOutput, SolverError> {
        let master_seed = self.config.solve.seed;
        let (topology_seed, dressing_seed) = if self.config.derive_seed_streams_from_master {
            (
                derive_stream_seed(master_seed, TOPOLOGY_STREAM),
                derive_stream_seed(master_seed, DRESSING_STREAM),
            )
        } else {
            (master_seed, master_seed)
        };

        let mut solve_config = self.config.solve.clone();
        solve_config.seed = topology_seed;

        let mut metadata = GenerationMetadata {
            master_seed,
            topology_seed,
            dressing_seed,
            biome_profile: solve_config.biome_profile.clone(),
            ..Default::default()
        };

        let mut solver = HexWfcSolver::builder()
            .with_shared_table(Arc::clone(&self.table))
            .with_grid(self.config.grid)
            .with_config(solve_config.clone())
            .build()?;
        let solve = solver.solve();

        if !solve.solved {
            #[cfg(feature = "debug-traces")]
            warn!("Topology solve failed: {}", solve.message);
            return Ok(TopologyOutput {
                solve,
                water_path: Vec::new(),
                path_points: Vec::new(),
                entry_marker: None,
                exit_marker: None,
                metadata,
            });
        }

        if solve.has_resolved_ports {
            metadata.has_entry_port = true;
            metadata.entry_port = solve.resolved_entry_port;
            metadata.has_exit_port = true;
            metadata.exit_port = solve.resolved_exit_port;
        } else {
            metadata.has_entry_port = solve_config.entry_port.enabled;
            metadata.entry_port = solve_config.entry_port;
            metadata.has_exit_port = solve_config.exit_port.enabled;
            metadata.exit_port = solve_config.exit_port;
        }

        // Path endpoints follow the configured ports, not the resolved ones.
        let (entry_coord, exit_coord) =
            match (solve_config.entry_port.enabled, solve_config.exit_port.enabled) {
                (true, true) => (
                    Some(solve_config.entry_port.coord),
                    Some(solve_config.exit_port.coord),
                ),
                _ => (None, None),
            };

        let water_path = match self.config.generate_path {
            true => extract_water_path(&self.table, &solve.cells, entry_coord, exit_coord),
            false => Vec::new(),
        };
        let path_points =
            path_world_points(&self.config.layout, &water_path, self.config.path_z_offset);
        metadata.path_point_count = path_points.len();

        let entry_marker = match metadata.has_entry_port {
            true => Some(self.port_marker(&metadata.entry_port)),
            false => None,
        };
        let exit_marker = match metadata.has_exit_port {
            true => Some(self.port_marker(&metadata.exit_port)),
            false => None,
        };

        #[cfg(feature = "debug-traces")]
        info!(
            "Topology generated: {} cells, attempts={}, path points={}",
            solve.cells.len(),
            solve.attempts_used,
            metadata.path_point_count
        );

        Ok(TopologyOutput {
            solve,
            water_path,
            path_points,
            entry_marker,
            exit_marker,
            metadata,
        })
    }

    fn port_marker(&self, port: &BoundaryPort) -> WorldPosition {
        self.config.layout.socket_marker_position(
            &port.coord,
            port.direction,
            self.config.port_marker_z_offset,
        )
    }
}
