//! Tile scheduling.
//!
//! Converts a tile grid into rendered tiles with bounded parallelism. Every
//! tile is one task on the shared worker pool; the calling thread then
//! collects the results in the same row-major order they were submitted.
//!
//! ```text
//!             scatter                          gather
//! TileGrid ─────────────► worker pool ─────────────────► Vec<TileResult>
//!  (row-major)            (any completion order)          (row-major)
//!                              │
//!                              └──► ProgressTracker ──► ProgressListener
//! ```
//!
//! A tile whose computation fails or panics is logged and returned without
//! an image. Only cancellation and engine shutdown stop a collection early.

mod progress;
mod tiles;
mod types;

pub use progress::{ProgressListener, ProgressTracker};
pub use tiles::{PendingTiles, TileScheduler, DEFAULT_POLL_INTERVAL};
pub use types::{ScheduleError, ScheduleStats, TileResult};
