//! Errors surfaced by the preview engine.

use thiserror::Error;

use crate::scheduler::ScheduleError;
use crate::source::SourceError;

/// Errors that can end a render or prevent the engine from starting.
///
/// Per-tile failures never show up here; they are logged and the tile is
/// left blank.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// The job's cancellation token fired while collecting tiles.
    #[error("render was cancelled")]
    Cancelled,

    /// The engine was closed while this render was collecting tiles.
    #[error("render was interrupted")]
    Interrupted,

    /// `render` was called after `close`.
    #[error("preview engine is closed")]
    EngineClosed,

    /// The requested output cannot be rendered.
    #[error("invalid output geometry {width}×{height} at scale {scale}: {reason}")]
    InvalidGeometry {
        width: u32,
        height: u32,
        scale: u32,
        reason: String,
    },

    /// The data source failed to prepare for rendering.
    #[error("data source error: {0}")]
    Source(#[from] SourceError),

    /// The worker pool could not be created.
    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl PreviewError {
    /// Returns true if the render stopped because it was cancelled or
    /// interrupted, as opposed to failing.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Interrupted)
    }
}

impl From<ScheduleError> for PreviewError {
    fn from(e: ScheduleError) -> Self {
        match e {
            ScheduleError::Cancelled => PreviewError::Cancelled,
            ScheduleError::Interrupted => PreviewError::Interrupted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_schedule_error() {
        assert!(matches!(
            PreviewError::from(ScheduleError::Cancelled),
            PreviewError::Cancelled
        ));
        assert!(matches!(
            PreviewError::from(ScheduleError::Interrupted),
            PreviewError::Interrupted
        ));
    }

    #[test]
    fn test_is_cancellation() {
        assert!(PreviewError::Cancelled.is_cancellation());
        assert!(PreviewError::Interrupted.is_cancellation());
        assert!(!PreviewError::EngineClosed.is_cancellation());
    }

    #[test]
    fn test_invalid_geometry_display() {
        let err = PreviewError::InvalidGeometry {
            width: 0,
            height: 100,
            scale: 1,
            reason: "output must not be empty".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid output geometry 0×100 at scale 1: output must not be empty"
        );
    }
}
