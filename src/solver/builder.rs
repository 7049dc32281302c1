use std::{marker::PhantomData, sync::Arc};

use crate::{grid::HexGridConfig, tiles::compat::TileCompatibilityTable, SolverError};

use super::{HexWfcSolver, SolveConfig};

/// Internal type used to provide a type-safe builder with a required table and grid
pub enum Set {}
/// Internal type used to provide a type-safe builder with a required table and grid
pub enum Unset {}

/// Used to instantiate a new [`HexWfcSolver`].
///
/// A [`TileCompatibilityTable`] and a [`HexGridConfig`] are the two non-optional values that are needed before being able to call `build`.
///
/// ### Example
///
/// Create a `HexWfcSolver` from a `SolverBuilder`.
/// ```
/// use canal_topology::{
///     grid::HexGridConfig,
///     solver::HexWfcSolver,
///     tiles::{compat::TileCompatibilityTable, prototype::prototype_tile_set},
/// };
///
/// let table = TileCompatibilityTable::build(&prototype_tile_set()).unwrap();
/// let mut solver = HexWfcSolver::builder()
///     .with_table(table)
///     .with_grid(HexGridConfig::new(5, 4))
///     .build()
///     .unwrap();
/// let result = solver.solve();
/// ```
pub struct SolverBuilder<T, G> {
    table: Option<Arc<TileCompatibilityTable>>,
    grid: Option<HexGridConfig>,
    config: SolveConfig,
    typestate: PhantomData<(T, G)>,
}

impl SolverBuilder<Unset, Unset> {
    /// Creates a [`SolverBuilder`] with its values set to their default.
    pub fn new() -> Self {
        Self {
            table: None,
            grid: None,
            config: SolveConfig::default(),
            typestate: PhantomData,
        }
    }

    /// Sets the [`TileCompatibilityTable`] to be used by the [`HexWfcSolver`]
    pub fn with_table(self, table: TileCompatibilityTable) -> SolverBuilder<Set, Unset> {
        SolverBuilder {
            table: Some(Arc::new(table)),

            grid: self.grid,
            config: self.config,

            typestate: PhantomData,
        }
    }

    /// Sets the [`TileCompatibilityTable`] to be used by the [`HexWfcSolver`]. The solver will hold a read-only Arc onto the table, which can be safely shared by multiple solvers.
    pub fn with_shared_table(self, table: Arc<TileCompatibilityTable>) -> SolverBuilder<Set, Unset> {
        SolverBuilder {
            table: Some(table),

            grid: self.grid,
            config: self.config,

            typestate: PhantomData,
        }
    }
}

impl SolverBuilder<Set, Unset> {
    /// Sets the [`HexGridConfig`] to be used by the [`HexWfcSolver`].
    pub fn with_grid(self, grid: HexGridConfig) -> SolverBuilder<Set, Set> {
        SolverBuilder {
            grid: Some(grid),

            table: self.table,
            config: self.config,

            typestate: PhantomData,
        }
    }
}

impl<T, G> SolverBuilder<T, G> {
    /// Specifies the [`SolveConfig`] to be used by the [`HexWfcSolver`]. Set to [`SolveConfig::default`] by default.
    pub fn with_config(mut self, config: SolveConfig) -> Self {
        self.config = config;
        self
    }
}

impl SolverBuilder<Set, Set> {
    /// Instantiates a [`HexWfcSolver`] as specified by the various builder parameters.
    pub fn build(self) -> Result<HexWfcSolver, SolverError> {
        // We know that self.table and self.grid are `Some` thanks to the typing.
        let table = self.table.unwrap();
        let grid = self.grid.unwrap();

        if grid.width <= 0 || grid.height <= 0 {
            return Err(SolverError::InvalidGridDimensions {
                width: grid.width,
                height: grid.height,
            });
        }
        if self.config.max_attempts <= 0 {
            return Err(SolverError::InvalidMaxAttempts(self.config.max_attempts));
        }
        if table.variants_count() == 0 {
            return Err(SolverError::EmptyCompatibilityTable);
        }

        let mut weight_scales = vec![1.0; table.tiles_count()];
        for multiplier in &self.config.biome_weight_multipliers {
            if let Some(tile_index) = table
                .tiles()
                .iter()
                .position(|tile| tile.id() == multiplier.tile_id)
            {
                // Last multiplier wins for a duplicated id, negative values
                // clamp to zero.
                weight_scales[tile_index] = multiplier.multiplier.max(0.0);
            }
        }

        Ok(HexWfcSolver::new(table, grid, self.config, weight_scales))
    }
}
