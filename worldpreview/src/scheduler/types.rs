//! Scheduler result and error types.

use thiserror::Error;

use crate::geometry::TileCoord;
use crate::raster::TileImage;

/// Outcome of one tile after collection.
#[derive(Debug, Clone)]
pub struct TileResult {
    pub coord: TileCoord,
    /// `None` if the tile failed and should stay at the background fill.
    pub image: Option<TileImage>,
}

impl TileResult {
    pub fn is_rendered(&self) -> bool {
        self.image.is_some()
    }
}

/// Job-level outcomes that stop collection early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// The job's cancellation token fired.
    #[error("tile collection was cancelled")]
    Cancelled,

    /// The engine was shut down while collecting.
    #[error("tile collection was interrupted")]
    Interrupted,
}

/// Summary counters for a finished collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleStats {
    /// Tiles submitted to the pool.
    pub submitted: usize,
    /// Tiles that produced an image.
    pub rendered: usize,
    /// Tiles that failed and were left blank.
    pub failed: usize,
}
