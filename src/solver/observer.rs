use crossbeam_channel::Receiver;

use crate::grid::{HexAxialCoord, HexGridConfig};

use super::{HexWfcSolver, SolvedCell};

/// Update sent to observers of a running [`HexWfcSolver`]
#[derive(Debug, Clone)]
pub enum SolveUpdate {
    /// A cell reached a single candidate, either picked directly or forced
    /// by propagation
    Collapsed(SolvedCell),
    /// The given attempt number started, every cell is back to all
    /// candidates
    Reinitialized(i32),
    /// The attempt failed due to a contradiction at the specified coordinate
    Failed(HexAxialCoord),
}

pub struct QueuedObserver {
    receiver: Receiver<SolveUpdate>,
}

impl QueuedObserver {
    pub fn new(solver: &mut HexWfcSolver) -> Self {
        let receiver = solver.add_observer_queue();
        QueuedObserver { receiver }
    }

    /// Dequeues all queued updates.
    ///
    /// Returns all retrieved [`SolveUpdate`] in a `Vec`.
    /// The `Vec` may be empty if no update was queued.
    pub fn dequeue_all(&mut self) -> Vec<SolveUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = self.receiver.try_recv() {
            updates.push(update);
        }
        updates
    }

    /// Dequeues 1 queued update.
    ///
    /// Returns [`Some(SolveUpdate)`] if there was an update to process, else returns `None`.
    pub fn dequeue_one(&mut self) -> Option<SolveUpdate> {
        match self.receiver.try_recv() {
            Ok(update) => Some(update),
            Err(_) => None,
        }
    }
}

/// Observer that maintains a view of the grid from the updates it dequeues.
pub struct QueuedStatefulObserver {
    grid: HexGridConfig,
    cells: Vec<Option<SolvedCell>>,
    receiver: Receiver<SolveUpdate>,
}

impl QueuedStatefulObserver {
    pub fn new(solver: &mut HexWfcSolver) -> Self {
        let receiver = solver.add_observer_queue();
        let grid = *solver.grid();
        QueuedStatefulObserver {
            grid,
            cells: vec![None; grid.total_cells()],
            receiver,
        }
    }

    /// Current view of the grid, one entry per cell in index order.
    pub fn cells(&self) -> &[Option<SolvedCell>] {
        &self.cells
    }

    /// Updates the internal state of the observer by dequeuing all queued updates.
    pub fn dequeue_all(&mut self) {
        while let Ok(update) = self.receiver.try_recv() {
            self.apply(update);
        }
    }

    /// Updates the internal state of the observer by dequeuing 1 queued update.
    ///
    /// Returns [`Some(SolveUpdate)`] if there was an update to process, else returns `None`.
    pub fn dequeue_one(&mut self) -> Option<SolveUpdate> {
        match self.receiver.try_recv() {
            Ok(update) => {
                self.apply(update.clone());
                Some(update)
            }
            Err(_) => None,
        }
    }

    fn apply(&mut self, update: SolveUpdate) {
        match update {
            SolveUpdate::Collapsed(cell) => {
                let index = self.grid.index_of(&cell.coord);
                self.cells[index] = Some(cell);
            }
            SolveUpdate::Reinitialized(_) | SolveUpdate::Failed(_) => self.cells.fill(None),
        }
    }
}
