//! Render job description.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::PreviewError;
use crate::compositor::MAX_OUTPUT_WIDTH;
use crate::geometry::Viewport;
use crate::scheduler::ProgressListener;

/// One render request.
///
/// A job describes the output size, the world-pixels-per-output-pixel scale,
/// an optional progress listener and the token used to cancel it. The view
/// is centered on world origin.
///
/// # Example
///
/// ```
/// use worldpreview::engine::RenderJob;
///
/// let job = RenderJob::new(512, 512)
///     .with_scale(4)
///     .with_progress(|fraction: f32| println!("{:.0}%", fraction * 100.0));
///
/// // Cancel from anywhere holding a clone of the token
/// let token = job.cancellation_token().clone();
/// token.cancel();
/// assert!(job.is_cancelled());
/// ```
#[derive(Clone)]
pub struct RenderJob {
    width: u32,
    height: u32,
    scale: u32,
    progress: Option<Arc<dyn ProgressListener>>,
    cancellation: CancellationToken,
}

impl RenderJob {
    /// Create a job for an output of `width` × `height` pixels at scale 1.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scale: 1,
            progress: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Set how many world pixels one output pixel covers along each axis.
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    /// Attach a progress listener.
    pub fn with_progress(mut self, listener: impl ProgressListener + 'static) -> Self {
        self.progress = Some(Arc::new(listener));
        self
    }

    /// Attach an already shared progress listener.
    pub fn with_progress_listener(mut self, listener: Arc<dyn ProgressListener>) -> Self {
        self.progress = Some(listener);
        self
    }

    /// Use an existing cancellation token, e.g. a child of an app-wide token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn progress(&self) -> Option<&Arc<dyn ProgressListener>> {
        self.progress.as_ref()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Request cancellation of this job.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// The viewport this job renders.
    pub fn viewport(&self) -> Viewport {
        Viewport::centered(self.width, self.height, self.scale)
    }

    /// Reject geometry that cannot be rendered.
    pub fn validate(&self) -> Result<(), PreviewError> {
        let reason = if self.width == 0 || self.height == 0 {
            "output must not be empty"
        } else if self.scale == 0 {
            "scale must be at least 1"
        } else if self.width > MAX_OUTPUT_WIDTH {
            "output is too wide to composite"
        } else if self.width as u64 * self.scale as u64 > i32::MAX as u64
            || self.height as u64 * self.scale as u64 > i32::MAX as u64
        {
            "visible world area is too large"
        } else {
            return Ok(());
        };

        Err(PreviewError::InvalidGeometry {
            width: self.width,
            height: self.height,
            scale: self.scale,
            reason: reason.to_string(),
        })
    }
}

impl fmt::Debug for RenderJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderJob")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("scale", &self.scale)
            .field("progress", &self.progress.is_some())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
