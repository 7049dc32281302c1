use std::{collections::VecDeque, sync::Arc, time::Instant};

use bitvec::{bitvec, vec::BitVec};
use rand::{
    distributions::Distribution, distributions::WeightedIndex, rngs::StdRng, SeedableRng,
};

#[cfg(feature = "debug-traces")]
use tracing::{debug, info};

use crate::{
    grid::{
        direction::{HexDirection, HEX_DIRECTIONS},
        CellIndex, HexAxialCoord, HexGridConfig,
    },
    tiles::{
        compat::{TileCompatibilityTable, VariantKey},
        TileIndex,
    },
};

use self::{
    builder::{SolverBuilder, Unset},
    observer::SolveUpdate,
};

/// Defines a [`SolverBuilder`] used to create a solver
pub mod builder;
/// Defines different possible observers to view the execution of a [`HexWfcSolver`]
pub mod observer;

/// Seed offset between two successive attempts of the same solve call.
pub const ATTEMPT_SEED_STRIDE: i32 = 7919;

/// An entry or exit point for the canal: a boundary cell and the outward
/// direction its water socket faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPort {
    pub enabled: bool,
    pub coord: HexAxialCoord,
    pub direction: HexDirection,
}

impl Default for BoundaryPort {
    fn default() -> Self {
        Self {
            enabled: false,
            coord: HexAxialCoord::default(),
            direction: HexDirection::East,
        }
    }
}

impl BoundaryPort {
    /// An enabled port at the given boundary cell and outward direction.
    pub fn at(coord: HexAxialCoord, direction: HexDirection) -> Self {
        Self {
            enabled: true,
            coord,
            direction,
        }
    }
}

/// Scales the selection weight of one tile, matched by id.
#[derive(Debug, Clone)]
pub struct TileWeightMultiplier {
    pub tile_id: String,
    pub multiplier: f32,
}

impl TileWeightMultiplier {
    pub fn new(tile_id: impl Into<String>, multiplier: f32) -> Self {
        Self {
            tile_id: tile_id.into(),
            multiplier,
        }
    }
}

/// Everything one solve call depends on besides the tile set and the grid.
#[derive(Debug, Clone)]
pub struct SolveConfig {
    pub seed: i32,
    pub max_attempts: i32,
    pub max_propagation_steps: i64,
    /// Max wall clock solve time in seconds. `<= 0` disables the time limit.
    pub max_solve_time_seconds: f64,
    pub require_entry_exit_path: bool,
    pub require_single_water_component: bool,
    pub entry_port: BoundaryPort,
    pub exit_port: BoundaryPort,
    /// If true and Entry/Exit are required but not fully specified, pick a
    /// valid pair from boundary water sockets.
    pub auto_select_boundary_ports: bool,
    /// If true, reject solutions with boundary water sockets that are not an
    /// explicit port and not allowed by tile definition.
    pub disallow_unassigned_boundary_water: bool,
    /// Optional profile name for analytics/debug output.
    pub biome_profile: String,
    /// Optional tile-level multipliers applied on top of per-tile base
    /// weights.
    pub biome_weight_multipliers: Vec<TileWeightMultiplier>,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            max_attempts: 8,
            max_propagation_steps: 100_000,
            max_solve_time_seconds: 0.0,
            require_entry_exit_path: false,
            require_single_water_component: false,
            entry_port: BoundaryPort::default(),
            exit_port: BoundaryPort::default(),
            auto_select_boundary_ports: true,
            disallow_unassigned_boundary_water: true,
            biome_profile: String::from("default"),
            biome_weight_multipliers: Vec::new(),
        }
    }
}

/// One collapsed cell of a solved grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedCell {
    pub coord: HexAxialCoord,
    pub tile_index: TileIndex,
    pub rotation_steps: usize,
    pub tile_id: String,
}

impl SolvedCell {
    #[inline]
    pub fn variant(&self) -> VariantKey {
        VariantKey::new(self.tile_index, self.rotation_steps)
    }
}

/// Outcome of a solve call. Failures are carried here as flags and a
/// message, never as a panic.
#[derive(Debug, Clone, Default)]
pub struct SolveResult {
    pub solved: bool,
    pub contradiction: bool,
    pub time_budget_exceeded: bool,
    /// Set when the last rejected attempt failed the single water component
    /// requirement.
    pub failed_single_water_component: bool,
    /// Diagnostic for the success, or for the last failed attempt.
    pub message: String,
    pub attempts_used: i32,
    pub collapsed_cells: usize,
    pub total_cells: usize,
    pub propagation_steps: i64,
    pub solve_time_seconds: f64,
    pub biome_profile: String,
    /// Collapsed cells in row-major `(r, q)` order. Empty unless `solved`.
    pub cells: Vec<SolvedCell>,
    pub has_resolved_ports: bool,
    pub resolved_entry_port: BoundaryPort,
    pub resolved_exit_port: BoundaryPort,
}

enum AttemptOutcome {
    /// Every cell reached exactly one candidate.
    Collapsed,
    Contradiction(String),
    TimeBudgetExceeded,
}

struct ValidationRejection {
    message: String,
    single_water_component: bool,
}

impl ValidationRejection {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            single_water_component: false,
        }
    }
}

/// Wave function collapse solver for canal topologies on a hexagonal grid.
///
/// Contradictions restart the whole attempt with a reseeded RNG, there is no
/// backtracking inside an attempt. Use a [`SolverBuilder`] to get an
/// instance of a solver.
pub struct HexWfcSolver {
    // === Read-only configuration ===
    grid: HexGridConfig,
    table: Arc<TileCompatibilityTable>,
    config: SolveConfig,
    /// Per-tile weight factor with the biome multipliers already applied.
    weight_scales: Vec<f32>,

    // === Attempt state ===
    rng: StdRng,
    /// `candidates[cell_index * variants_count + variant_flat]` is true (1)
    /// if the variant is still allowed on the cell
    candidates: BitVec,
    /// Stores how many variants are still possible for a given cell
    candidate_counts: Vec<usize>,

    // === Constraint propagation data ===
    /// Cells whose candidate reduction has not been pushed to their
    /// neighbors yet
    propagation_queue: VecDeque<CellIndex>,
    propagation_steps: i64,

    /// Observers signaled with updates of the cells.
    observers: Vec<crossbeam_channel::Sender<SolveUpdate>>,
}

impl HexWfcSolver {
    /// Returns a new `SolverBuilder`
    pub fn builder() -> SolverBuilder<Unset, Unset> {
        SolverBuilder::new()
    }

    pub(crate) fn new(
        table: Arc<TileCompatibilityTable>,
        grid: HexGridConfig,
        config: SolveConfig,
        weight_scales: Vec<f32>,
    ) -> Self {
        let variants_count = table.variants_count();
        let cells_count = grid.total_cells();
        Self {
            grid,
            table,
            config,
            weight_scales,

            rng: StdRng::seed_from_u64(0),
            candidates: bitvec![1; cells_count * variants_count],
            candidate_counts: vec![variants_count; cells_count],

            propagation_queue: VecDeque::new(),
            propagation_steps: 0,

            observers: Vec::new(),
        }
    }

    /// Returns the grid this solver operates on
    pub fn grid(&self) -> &HexGridConfig {
        &self.grid
    }

    pub fn config(&self) -> &SolveConfig {
        &self.config
    }

    /// Runs the full restart loop with the configured seed.
    ///
    /// Attempt `n` uses `seed + (n - 1) * ATTEMPT_SEED_STRIDE`, so a solve
    /// with the same inputs always replays the same sequence of attempts.
    pub fn solve(&mut self) -> SolveResult {
        let seed = self.config.seed;
        self.solve_with_seed(seed)
    }

    /// Same as [`Self::solve`] but with an explicit base seed. Batch runs
    /// use this to sweep consecutive seeds through one solver.
    pub fn solve_with_seed(&mut self, seed: i32) -> SolveResult {
        let start = Instant::now();
        let total_cells = self.grid.total_cells();
        let mut last_failure = String::from("Unknown failure.");
        let mut last_failure_single_component = false;

        for attempt in 1..=self.config.max_attempts {
            self.reinitialize_attempt(seed, attempt);

            match self.run_attempt(&start) {
                AttemptOutcome::TimeBudgetExceeded => {
                    return SolveResult {
                        time_budget_exceeded: true,
                        message: format!(
                            "Exceeded solve time budget ({:.3} seconds).",
                            self.config.max_solve_time_seconds
                        ),
                        attempts_used: attempt,
                        total_cells,
                        propagation_steps: self.propagation_steps,
                        solve_time_seconds: start.elapsed().as_secs_f64(),
                        biome_profile: self.config.biome_profile.clone(),
                        ..Default::default()
                    };
                }
                AttemptOutcome::Contradiction(message) => {
                    last_failure = format!("Attempt {} failed: {}", attempt, message);
                    last_failure_single_component = false;
                    continue;
                }
                AttemptOutcome::Collapsed => (),
            }

            match self.validate_solved_state() {
                Ok((entry, exit)) => return self.build_solved_result(attempt, &start, entry, exit),
                Err(rejection) => {
                    last_failure = format!(
                        "Attempt {} rejected by validation: {}",
                        attempt, rejection.message
                    );
                    last_failure_single_component = rejection.single_water_component;
                }
            }
        }

        SolveResult {
            contradiction: true,
            failed_single_water_component: last_failure_single_component,
            message: last_failure,
            attempts_used: self.config.max_attempts,
            total_cells,
            solve_time_seconds: start.elapsed().as_secs_f64(),
            biome_profile: self.config.biome_profile.clone(),
            ..Default::default()
        }
    }

    fn reinitialize_attempt(&mut self, seed: i32, attempt: i32) {
        for obs in &mut self.observers {
            let _ = obs.send(SolveUpdate::Reinitialized(attempt));
        }

        let attempt_seed = seed.wrapping_add((attempt - 1).wrapping_mul(ATTEMPT_SEED_STRIDE));
        self.rng = StdRng::seed_from_u64(u64::from(attempt_seed as u32));

        let variants_count = self.table.variants_count();
        let cells_count = self.grid.total_cells();
        self.candidates = bitvec![1; cells_count * variants_count];
        self.candidate_counts = vec![variants_count; cells_count];
        self.propagation_queue.clear();
        self.propagation_steps = 0;

        #[cfg(feature = "debug-traces")]
        info!("Attempt n°{} reinitialized with seed {}", attempt, attempt_seed);
    }

    fn run_attempt(&mut self, start: &Instant) -> AttemptOutcome {
        loop {
            if self.time_budget_exhausted(start) {
                return AttemptOutcome::TimeBudgetExceeded;
            }

            let cell_index = match self.select_lowest_entropy_cell() {
                Some(index) => index,
                None => return AttemptOutcome::Collapsed,
            };

            let picked = self.choose_variant(cell_index);
            self.collapse_cell(cell_index, picked);

            if let Err(outcome) = self.propagate(start) {
                return outcome;
            }
        }
    }

    /// Returns the uncollapsed cell with the fewest remaining candidates.
    ///
    /// The scan is in ascending index order, so entropy ties resolve to the
    /// lowest `(r, q)` cell.
    fn select_lowest_entropy_cell(&self) -> Option<CellIndex> {
        let mut best: Option<(CellIndex, usize)> = None;
        for (cell_index, &count) in self.candidate_counts.iter().enumerate() {
            if count <= 1 {
                continue;
            }
            match best {
                Some((_, best_count)) if count >= best_count => (),
                _ => best = Some((cell_index, count)),
            }
        }
        best.map(|(cell_index, _)| cell_index)
    }

    /// Weighted pick among the remaining candidates of a cell. The cell must
    /// have at least one candidate left.
    ///
    /// Candidates are visited in ascending flat index order, which is the
    /// deterministic `(tile_index, rotation_steps)` order.
    fn choose_variant(&mut self, cell_index: CellIndex) -> VariantKey {
        let variants_count = self.table.variants_count();
        let candidates: Vec<VariantKey> = self.candidates
            [cell_index * variants_count..(cell_index + 1) * variants_count]
            .iter_ones()
            .map(VariantKey::from_flat)
            .collect();
        let weights: Vec<f32> = candidates
            .iter()
            .map(|variant| self.effective_weight(variant.tile_index))
            .collect();

        match WeightedIndex::new(&weights) {
            Ok(distribution) => candidates[distribution.sample(&mut self.rng)],
            // Every remaining candidate has zero weight.
            Err(_) => candidates[0],
        }
    }

    #[inline]
    fn effective_weight(&self, tile_index: TileIndex) -> f32 {
        self.table.tiles()[tile_index].weight().max(0.0) * self.weight_scales[tile_index]
    }

    fn collapse_cell(&mut self, cell_index: CellIndex, picked: VariantKey) {
        let variants_count = self.table.variants_count();
        let start_bit = cell_index * variants_count;
        for mut bit in self.candidates[start_bit..start_bit + variants_count].iter_mut() {
            *bit = false;
        }
        self.candidates.set(start_bit + picked.flat_index(), true);
        self.candidate_counts[cell_index] = 1;

        #[cfg(feature = "debug-traces")]
        debug!(
            "Selected tile {} rot {} for cell {} at {}",
            picked.tile_index,
            picked.rotation_steps,
            cell_index,
            self.grid.coord_at(cell_index)
        );

        if !self.observers.is_empty() {
            self.signal_collapse(cell_index, picked);
        }
        self.propagation_queue.push_back(cell_index);
    }

    /// Pushes candidate reductions outward until the queue drains.
    ///
    /// Each processed (cell, existing neighbor) pair counts as one
    /// propagation step against the configured budget.
    fn propagate(&mut self, start: &Instant) -> Result<(), AttemptOutcome> {
        let variants_count = self.table.variants_count();

        while let Some(&current) = self.propagation_queue.front() {
            if self.propagation_steps >= self.config.max_propagation_steps {
                self.signal_failure(current);
                return Err(AttemptOutcome::Contradiction(format!(
                    "Exceeded propagation budget ({}).",
                    self.config.max_propagation_steps
                )));
            }
            if self.time_budget_exhausted(start) {
                return Err(AttemptOutcome::TimeBudgetExceeded);
            }
            self.propagation_queue.pop_front();

            let current_coord = self.grid.coord_at(current);
            for &direction in HEX_DIRECTIONS.iter() {
                let neighbor = match self.grid.neighbor_index(&current_coord, direction) {
                    Some(index) => index,
                    None => continue,
                };

                // Union of everything the current cell still supports in
                // this direction.
                let mut allowed = bitvec![0; variants_count];
                for source in self.candidates
                    [current * variants_count..(current + 1) * variants_count]
                    .iter_ones()
                {
                    for target in self.table.allowed_mask(source, direction).iter_ones() {
                        allowed.set(target, true);
                    }
                }

                let neighbor_start = neighbor * variants_count;
                let removed: Vec<usize> = self.candidates
                    [neighbor_start..neighbor_start + variants_count]
                    .iter_ones()
                    .filter(|&flat| !allowed[flat])
                    .collect();

                if !removed.is_empty() {
                    let remaining = self.candidate_counts[neighbor] - removed.len();
                    if remaining == 0 {
                        let neighbor_coord = self.grid.coord_at(neighbor);
                        self.signal_failure(neighbor);
                        return Err(AttemptOutcome::Contradiction(format!(
                            "Contradiction at {} when propagating from {}.",
                            neighbor_coord, current_coord
                        )));
                    }

                    for flat in removed {
                        self.candidates.set(neighbor_start + flat, false);
                    }
                    self.candidate_counts[neighbor] = remaining;

                    if remaining == 1 && !self.observers.is_empty() {
                        // The bans forced the neighbor into a definite state.
                        let forced = self.cell_variant(neighbor);
                        self.signal_collapse(neighbor, forced);
                    }
                    self.propagation_queue.push_back(neighbor);
                }

                self.propagation_steps += 1;
            }
        }
        Ok(())
    }

    #[inline]
    fn time_budget_exhausted(&self, start: &Instant) -> bool {
        self.config.max_solve_time_seconds > 0.0
            && start.elapsed().as_secs_f64() >= self.config.max_solve_time_seconds
    }

    /// Remaining variant of a collapsed cell. Falls back to the first
    /// variant if the cell is not collapsed.
    fn cell_variant(&self, cell_index: CellIndex) -> VariantKey {
        let variants_count = self.table.variants_count();
        let flat = self.candidates[cell_index * variants_count..(cell_index + 1) * variants_count]
            .first_one()
            .unwrap_or(0);
        VariantKey::from_flat(flat)
    }

    fn solved_cell(&self, cell_index: CellIndex, variant: VariantKey) -> SolvedCell {
        let tile_id = self
            .table
            .tile(variant.tile_index)
            .map_or_else(String::new, |tile| tile.id().to_string());
        SolvedCell {
            coord: self.grid.coord_at(cell_index),
            tile_index: variant.tile_index,
            rotation_steps: variant.rotation_steps,
            tile_id,
        }
    }

    fn build_solved_result(
        &self,
        attempt: i32,
        start: &Instant,
        entry: BoundaryPort,
        exit: BoundaryPort,
    ) -> SolveResult {
        let mut cells: Vec<SolvedCell> = self
            .grid
            .indexes()
            .map(|cell_index| self.solved_cell(cell_index, self.cell_variant(cell_index)))
            .collect();
        cells.sort_by_key(|cell| (cell.coord.r, cell.coord.q));

        SolveResult {
            solved: true,
            message: format!("Solved in attempt {}.", attempt),
            attempts_used: attempt,
            collapsed_cells: cells.len(),
            total_cells: self.grid.total_cells(),
            propagation_steps: self.propagation_steps,
            solve_time_seconds: start.elapsed().as_secs_f64(),
            biome_profile: self.config.biome_profile.clone(),
            has_resolved_ports: entry.enabled && exit.enabled,
            resolved_entry_port: entry,
            resolved_exit_port: exit,
            cells,
            ..Default::default()
        }
    }

    /// Checks a fully collapsed grid against the configured policies.
    ///
    /// Returns the resolved entry and exit ports, which are the configured
    /// ports unless an entry/exit path was required and auto-selection
    /// replaced them.
    fn validate_solved_state(
        &self,
    ) -> Result<(BoundaryPort, BoundaryPort), ValidationRejection> {
        for cell_index in self.grid.indexes() {
            if self.candidate_counts[cell_index] != 1 {
                return Err(ValidationRejection::new(format!(
                    "Cell {} was not collapsed.",
                    self.grid.coord_at(cell_index)
                )));
            }
        }

        let mut entry = self.config.entry_port;
        let mut exit = self.config.exit_port;

        if self.config.require_entry_exit_path {
            let (resolved_entry, resolved_exit) = self.resolve_boundary_ports()?;
            entry = resolved_entry;
            exit = resolved_exit;

            if !self.has_entry_exit_path(&entry, &exit) {
                return Err(ValidationRejection::new(
                    "No water path exists between Entry and Exit ports.",
                ));
            }
        } else {
            if entry.enabled {
                self.validate_boundary_port(&entry)?;
            }
            if exit.enabled {
                self.validate_boundary_port(&exit)?;
            }
        }

        if self.config.disallow_unassigned_boundary_water {
            self.validate_boundary_sockets(&entry, &exit)?;
        }

        if self.config.require_single_water_component && !self.has_single_water_component() {
            return Err(ValidationRejection {
                message: String::from("Water graph has more than one connected component."),
                single_water_component: true,
            });
        }

        Ok((entry, exit))
    }

    /// Turns the configured ports into a usable entry/exit pair, completing
    /// missing ones from boundary water sockets when auto-selection is on.
    fn resolve_boundary_ports(
        &self,
    ) -> Result<(BoundaryPort, BoundaryPort), ValidationRejection> {
        let entry_provided = self.config.entry_port.enabled;
        let exit_provided = self.config.exit_port.enabled;

        if entry_provided && exit_provided {
            self.validate_boundary_port(&self.config.entry_port)?;
            self.validate_boundary_port(&self.config.exit_port)?;
            if self.config.entry_port.coord == self.config.exit_port.coord {
                return Err(ValidationRejection::new(
                    "Entry and Exit ports must be on different cells.",
                ));
            }
            return Ok((self.config.entry_port, self.config.exit_port));
        }

        if !self.config.auto_select_boundary_ports {
            return Err(ValidationRejection::new(
                "Entry/Exit path required but one or both ports are missing and auto-selection is disabled.",
            ));
        }

        let candidates = self.collect_boundary_water_sockets(true);
        if candidates.len() < 2 {
            return Err(ValidationRejection::new(
                "Could not auto-select Entry/Exit ports: fewer than two explicit boundary water sockets found.",
            ));
        }

        if entry_provided || exit_provided {
            let fixed = if entry_provided {
                self.config.entry_port
            } else {
                self.config.exit_port
            };
            self.validate_boundary_port(&fixed)?;

            let mut best: Option<(i32, BoundaryPort)> = None;
            for candidate in &candidates {
                if candidate.coord == fixed.coord {
                    continue;
                }
                if !self.has_entry_exit_path(&fixed, candidate) {
                    continue;
                }
                let distance = fixed.coord.distance_to(&candidate.coord);
                let better = match &best {
                    None => true,
                    Some((best_distance, best_candidate)) => {
                        distance > *best_distance
                            || (distance == *best_distance
                                && Self::is_better_port(candidate, best_candidate))
                    }
                };
                if better {
                    best = Some((distance, *candidate));
                }
            }

            return match best {
                Some((_, matched)) if entry_provided => Ok((fixed, matched)),
                Some((_, matched)) => Ok((matched, fixed)),
                None => Err(ValidationRejection::new(
                    "Could not auto-select a matching boundary port for the provided port.",
                )),
            };
        }

        // Neither port given: farthest-apart connected pair, lowest (r, q,
        // direction) on ties.
        let mut best: Option<(i32, BoundaryPort, BoundaryPort)> = None;
        for (i, a) in candidates.iter().enumerate() {
            for b in candidates.iter().skip(i + 1) {
                if a.coord == b.coord {
                    continue;
                }
                if !self.has_entry_exit_path(a, b) {
                    continue;
                }
                let distance = a.coord.distance_to(&b.coord);
                let better = match &best {
                    None => true,
                    Some((best_distance, best_entry, best_exit)) => {
                        distance > *best_distance
                            || (distance == *best_distance
                                && (Self::is_better_port(a, best_entry)
                                    || (Self::is_same_port(a, best_entry)
                                        && Self::is_better_port(b, best_exit))))
                    }
                };
                if better {
                    best = Some((distance, *a, *b));
                }
            }
        }

        match best {
            Some((_, entry, exit)) => Ok((entry, exit)),
            None => Err(ValidationRejection::new(
                "Could not auto-select Entry/Exit ports with a valid water path.",
            )),
        }
    }

    fn validate_boundary_port(&self, port: &BoundaryPort) -> Result<(), ValidationRejection> {
        if !self.grid.contains(&port.coord) {
            return Err(ValidationRejection::new(format!(
                "Port coord {} is outside grid.",
                port.coord
            )));
        }

        if self.grid.contains(&port.coord.neighbor(port.direction)) {
            return Err(ValidationRejection::new(format!(
                "Port at {} is not on boundary for direction {}.",
                port.coord,
                port.direction.index()
            )));
        }

        let cell_index = self.grid.index_of(&port.coord);
        if self.candidate_counts[cell_index] != 1 {
            return Err(ValidationRejection::new(format!(
                "Port cell {} is not collapsed.",
                port.coord
            )));
        }

        let variant = self.cell_variant(cell_index);
        if !self.table.shown_socket(variant, port.direction).is_water_like() {
            return Err(ValidationRejection::new(format!(
                "Port at {} does not expose a water/lock socket.",
                port.coord
            )));
        }

        Ok(())
    }

    /// Rejects boundary water sockets that are neither a resolved port nor
    /// on a tile flagged for boundary use.
    fn validate_boundary_sockets(
        &self,
        entry: &BoundaryPort,
        exit: &BoundaryPort,
    ) -> Result<(), ValidationRejection> {
        for socket_port in self.collect_boundary_water_sockets(false) {
            if Self::is_same_port(&socket_port, entry) || Self::is_same_port(&socket_port, exit) {
                continue;
            }

            let variant = self.cell_variant(self.grid.index_of(&socket_port.coord));
            let explicitly_allowed = self
                .table
                .tile(variant.tile_index)
                .map_or(false, |tile| tile.allow_as_boundary_port());
            if !explicitly_allowed {
                return Err(ValidationRejection::new(format!(
                    "Unassigned boundary water socket at {} dir={} is not explicitly allowed.",
                    socket_port.coord,
                    socket_port.direction.index()
                )));
            }
        }
        Ok(())
    }

    /// All collapsed boundary cells showing an outward water or lock socket,
    /// one port per (cell, direction), in ascending `(r, q, direction)`
    /// order.
    fn collect_boundary_water_sockets(
        &self,
        require_explicit_boundary_flag: bool,
    ) -> Vec<BoundaryPort> {
        let mut ports = Vec::new();
        for cell_index in self.grid.indexes() {
            if self.candidate_counts[cell_index] != 1 {
                continue;
            }

            let variant = self.cell_variant(cell_index);
            let tile = match self.table.tile(variant.tile_index) {
                Some(tile) => tile,
                None => continue,
            };
            if require_explicit_boundary_flag && !tile.allow_as_boundary_port() {
                continue;
            }

            let coord = self.grid.coord_at(cell_index);
            for &direction in HEX_DIRECTIONS.iter() {
                if self.grid.contains(&coord.neighbor(direction)) {
                    continue;
                }
                if !self.table.shown_socket(variant, direction).is_water_like() {
                    continue;
                }
                ports.push(BoundaryPort::at(coord, direction));
            }
        }
        ports
    }

    fn is_same_port(a: &BoundaryPort, b: &BoundaryPort) -> bool {
        a.enabled && b.enabled && a.coord == b.coord && a.direction == b.direction
    }

    fn is_better_port(a: &BoundaryPort, b: &BoundaryPort) -> bool {
        if a.coord.r != b.coord.r {
            return a.coord.r < b.coord.r;
        }
        if a.coord.q != b.coord.q {
            return a.coord.q < b.coord.q;
        }
        a.direction.index() < b.direction.index()
    }

    /// BFS over water connections between the chosen variants, from the
    /// entry cell to the exit cell.
    fn has_entry_exit_path(&self, entry: &BoundaryPort, exit: &BoundaryPort) -> bool {
        if entry.coord == exit.coord {
            return true;
        }

        let mut visited = bitvec![0; self.grid.total_cells()];
        let mut queue = VecDeque::new();
        let entry_index = self.grid.index_of(&entry.coord);
        visited.set(entry_index, true);
        queue.push_back(entry_index);

        while let Some(current) = queue.pop_front() {
            let current_coord = self.grid.coord_at(current);
            let current_variant = self.cell_variant(current);
            for &direction in HEX_DIRECTIONS.iter() {
                let neighbor = match self.grid.neighbor_index(&current_coord, direction) {
                    Some(index) => index,
                    None => continue,
                };
                if visited[neighbor] {
                    continue;
                }
                if !self
                    .table
                    .water_connected(current_variant, direction, self.cell_variant(neighbor))
                {
                    continue;
                }
                if self.grid.coord_at(neighbor) == exit.coord {
                    return true;
                }
                visited.set(neighbor, true);
                queue.push_back(neighbor);
            }
        }
        false
    }

    /// Whether the water-like cells form at most one connected component
    /// under water-socket adjacency.
    fn has_single_water_component(&self) -> bool {
        let mut is_water = bitvec![0; self.grid.total_cells()];
        for cell_index in self.grid.indexes() {
            if self.table.is_water_variant(self.cell_variant(cell_index)) {
                is_water.set(cell_index, true);
            }
        }

        if is_water.count_ones() <= 1 {
            return true;
        }

        let mut visited = bitvec![0; self.grid.total_cells()];
        let mut components = 0;
        for search_start in is_water.iter_ones() {
            if visited[search_start] {
                continue;
            }
            components += 1;
            if components > 1 {
                return false;
            }

            let mut queue = VecDeque::new();
            visited.set(search_start, true);
            queue.push_back(search_start);

            while let Some(current) = queue.pop_front() {
                let current_coord = self.grid.coord_at(current);
                let current_variant = self.cell_variant(current);
                for &direction in HEX_DIRECTIONS.iter() {
                    let neighbor = match self.grid.neighbor_index(&current_coord, direction) {
                        Some(index) => index,
                        None => continue,
                    };
                    if !is_water[neighbor] || visited[neighbor] {
                        continue;
                    }
                    if !self.table.water_connected(
                        current_variant,
                        direction,
                        self.cell_variant(neighbor),
                    ) {
                        continue;
                    }
                    visited.set(neighbor, true);
                    queue.push_back(neighbor);
                }
            }
        }
        true
    }

    fn signal_collapse(&mut self, cell_index: CellIndex, variant: VariantKey) {
        let update = SolveUpdate::Collapsed(self.solved_cell(cell_index, variant));
        for obs in &mut self.observers {
            let _ = obs.send(update.clone());
        }
    }

    fn signal_failure(&mut self, cell_index: CellIndex) {
        #[cfg(feature = "debug-traces")]
        debug!("Attempt failed due to a contradiction");

        let coord = self.grid.coord_at(cell_index);
        for obs in &mut self.observers {
            let _ = obs.send(SolveUpdate::Failed(coord));
        }
    }

    pub(crate) fn add_observer_queue(&mut self) -> crossbeam_channel::Receiver<SolveUpdate> {
        // Unbounded because retries can produce more updates than there are
        // cells.
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.observers.push(sender);
        receiver
    }
}
