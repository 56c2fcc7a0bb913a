//! Progress reporting for a running render.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

/// Receives the fraction of completed tiles while a render runs.
///
/// Called from worker threads. Calls for one render are serialized and
/// never go backwards, but implementations are still shared across threads
/// and must be `Send + Sync`. Closures of type `Fn(f32)` implement this
/// trait directly.
pub trait ProgressListener: Send + Sync {
    /// `fraction` is in `0.0..=1.0`.
    fn on_progress(&self, fraction: f32);
}

impl<F> ProgressListener for F
where
    F: Fn(f32) + Send + Sync,
{
    fn on_progress(&self, fraction: f32) {
        self(fraction)
    }
}

/// Per-job completion counter.
///
/// Every finished tile, successful or not, counts toward completion, so the
/// reported fraction reaches exactly 1.0 once the last tile task returns.
pub struct ProgressTracker {
    completed: AtomicUsize,
    total: usize,
    last_reported: Mutex<usize>,
    listener: Option<Arc<dyn ProgressListener>>,
}

impl ProgressTracker {
    pub fn new(total: usize, listener: Option<Arc<dyn ProgressListener>>) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
            last_reported: Mutex::new(0),
            listener,
        }
    }

    /// Record one finished tile and notify the listener.
    ///
    /// Returns the number of tiles finished so far.
    pub fn tile_finished(&self) -> usize {
        let completed = self.completed.fetch_add(1, Ordering::AcqRel) + 1;

        if let Some(listener) = &self.listener {
            // Workers can reach this point out of counter order. Holding the
            // lock across the callback and dropping stale counts keeps the
            // reported sequence non-decreasing.
            let mut last = self.last_reported.lock();
            if completed > *last {
                *last = completed;
                let fraction = self.fraction_of(completed);
                // A panicking listener must not take the tile result down with it.
                let report = panic::catch_unwind(AssertUnwindSafe(|| listener.on_progress(fraction)));
                if report.is_err() {
                    warn!(completed, total = self.total, "Progress listener panicked");
                }
            }
        }

        completed
    }

    /// Number of finished tiles.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Current completion fraction.
    pub fn fraction(&self) -> f32 {
        self.fraction_of(self.completed())
    }

    /// Exactly 1.0 only once every tile has finished, even where `f32`
    /// would round a nearly complete ratio up.
    fn fraction_of(&self, completed: usize) -> f32 {
        if completed >= self.total {
            return 1.0;
        }
        let fraction = (completed as f64 / self.total as f64) as f32;
        fraction.min(1.0 - f32::EPSILON)
    }
}
