pub mod batch;
pub mod grid;
pub mod path;
pub mod seeds;
pub mod solver;
pub mod tiles;
pub mod topology;

/// Errors detected while validating tile definitions or building a
/// [`tiles::compat::TileCompatibilityTable`].
#[derive(thiserror::Error, Debug)]
pub enum TileSetError {
    #[error("Tile id must be set")]
    EmptyTileId,
    #[error("Tile {tile_id} has invalid weight {weight}, weight must be >= 0")]
    InvalidWeight { tile_id: String, weight: f32 },
}

/// Errors rejected at solver construction. Runtime solve failures do not use
/// this type, they are reported inside [`solver::SolveResult`].
#[derive(thiserror::Error, Debug)]
pub enum SolverError {
    #[error("Grid dimensions must be > 0, got width={width} height={height}")]
    InvalidGridDimensions { width: i32, height: i32 },
    #[error("max_attempts must be > 0, got {0}")]
    InvalidMaxAttempts(i32),
    #[error("Compatibility table has no variants")]
    EmptyCompatibilityTable,
}

/// Errors while writing a batch report to disk.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("Failed to serialize report")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write report to {path}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}
