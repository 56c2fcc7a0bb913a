//! Scatter-gather over the worker pool.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use rayon::ThreadPool;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::progress::{ProgressListener, ProgressTracker};
use super::types::{ScheduleError, ScheduleStats, TileResult};
use crate::geometry::{TileCoord, TileGrid};
use crate::raster::{TileError, TileImage};

/// Default time the collector blocks on one result before re-checking the
/// cancellation tokens.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Dispatches one task per tile and collects the results in grid order.
///
/// Submission and collection both walk the grid row-major, so compositing
/// order is deterministic no matter which worker finishes first.
#[derive(Debug, Clone)]
pub struct TileScheduler {
    poll_interval: Duration,
}

impl TileScheduler {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Submit one task per tile of `grid` to `pool`.
    ///
    /// Each task runs `compute` for its tile and then reports progress.
    /// Tasks that have not started by the time `cancellation` fires skip
    /// the computation.
    pub fn scatter<F>(
        &self,
        pool: &ThreadPool,
        grid: &TileGrid,
        compute: Arc<F>,
        progress: Option<Arc<dyn ProgressListener>>,
        cancellation: CancellationToken,
    ) -> PendingTiles
    where
        F: Fn(TileCoord) -> Result<TileImage, TileError> + Send + Sync + 'static,
    {
        let tracker = Arc::new(ProgressTracker::new(grid.len(), progress));
        let mut pending = Vec::with_capacity(grid.len());

        for coord in grid.coords() {
            let (tx, rx) = mpsc::sync_channel(1);
            let compute = Arc::clone(&compute);
            let tracker = Arc::clone(&tracker);
            let cancelled = cancellation.clone();

            pool.spawn(move || {
                if cancelled.is_cancelled() {
                    return;
                }
                let result = panic::catch_unwind(AssertUnwindSafe(|| (*compute)(coord)))
                    .unwrap_or_else(|payload| Err(TileError::Panicked(panic_message(&*payload))));
                tracker.tile_finished();
                // The collector may already have given up on this job.
                let _ = tx.send(result);
            });

            pending.push(PendingTile {
                coord,
                receiver: rx,
            });
        }

        debug!(
            tiles = pending.len(),
            columns = grid.width(),
            rows = grid.depth(),
            "Submitted tile tasks"
        );

        PendingTiles {
            pending,
            tracker,
            cancellation,
            poll_interval: self.poll_interval,
        }
    }

    /// Scatter and gather in one call.
    pub fn run<F>(
        &self,
        pool: &ThreadPool,
        grid: &TileGrid,
        compute: F,
        progress: Option<Arc<dyn ProgressListener>>,
        cancellation: CancellationToken,
        interrupt: &CancellationToken,
    ) -> Result<(Vec<TileResult>, ScheduleStats), ScheduleError>
    where
        F: Fn(TileCoord) -> Result<TileImage, TileError> + Send + Sync + 'static,
    {
        self.scatter(pool, grid, Arc::new(compute), progress, cancellation)
            .gather(interrupt)
    }
}

impl Default for TileScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

struct PendingTile {
    coord: TileCoord,
    receiver: Receiver<Result<TileImage, TileError>>,
}

/// Tiles submitted for one job, waiting to be collected.
///
/// Dropping this without gathering abandons the job; running tasks finish
/// in the background and their results are discarded.
pub struct PendingTiles {
    pending: Vec<PendingTile>,
    tracker: Arc<ProgressTracker>,
    cancellation: CancellationToken,
    poll_interval: Duration,
}

impl PendingTiles {
    /// Number of submitted tiles.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Fraction of submitted tiles that have finished so far.
    pub fn progress(&self) -> f32 {
        self.tracker.fraction()
    }

    /// Wait for every tile in submission order.
    ///
    /// Failed tiles are logged and come back with `image: None`. The job and
    /// interrupt tokens are checked before and after each tile and while
    /// blocked on a result.
    pub fn gather(
        self,
        interrupt: &CancellationToken,
    ) -> Result<(Vec<TileResult>, ScheduleStats), ScheduleError> {
        let mut stats = ScheduleStats {
            submitted: self.pending.len(),
            ..ScheduleStats::default()
        };
        let mut results = Vec::with_capacity(self.pending.len());

        for tile in &self.pending {
            self.check(interrupt)?;

            let image = match self.wait(tile, interrupt)? {
                Ok(image) => {
                    stats.rendered += 1;
                    Some(image)
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!(tile = %tile.coord, error = %e, "Could not rasterize tile");
                    None
                }
            };
            results.push(TileResult {
                coord: tile.coord,
                image,
            });

            self.check(interrupt)?;
        }

        Ok((results, stats))
    }

    fn wait(
        &self,
        tile: &PendingTile,
        interrupt: &CancellationToken,
    ) -> Result<Result<TileImage, TileError>, ScheduleError> {
        loop {
            match tile.receiver.recv_timeout(self.poll_interval) {
                Ok(result) => return Ok(result),
                Err(RecvTimeoutError::Timeout) => self.check(interrupt)?,
                Err(RecvTimeoutError::Disconnected) => {
                    self.check(interrupt)?;
                    return Ok(Err(TileError::Lost));
                }
            }
        }
    }

    fn check(&self, interrupt: &CancellationToken) -> Result<(), ScheduleError> {
        if interrupt.is_cancelled() {
            return Err(ScheduleError::Interrupted);
        }
        if self.cancellation.is_cancelled() {
            return Err(ScheduleError::Cancelled);
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
