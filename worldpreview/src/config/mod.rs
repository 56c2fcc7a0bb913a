//! Preview engine configuration.
//!
//! `PreviewConfig` carries every tunable of the engine. It can be built in
//! code with the `with_*` methods or read from the `[preview]` section of
//! an INI file:
//!
//! ```ini
//! [preview]
//! threads = 8
//! tile_width = 64
//! tile_depth = 64
//! tile_height = 256
//! tile_background = #000000
//! canvas_background = #00000000
//! axis_color = #808080
//! poll_interval_ms = 25
//! ```

mod file;

use std::time::Duration;

use image::Rgba;

use crate::compositor::AXIS_GRAY;
use crate::geometry::TileLayout;
use crate::scheduler::DEFAULT_POLL_INTERVAL;

pub use file::{parse_color, ConfigError, PREVIEW_SECTION};

/// Configuration for a [`PreviewEngine`](crate::engine::PreviewEngine).
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewConfig {
    /// Worker pool size. `None` uses the available parallelism.
    pub worker_threads: Option<usize>,

    /// Tile dimensions.
    pub tile_layout: TileLayout,

    /// Fill color of each tile before layers draw.
    pub tile_background: Rgba<u8>,

    /// Fill color of the output where no tile was drawn.
    pub canvas_background: Rgba<u8>,

    /// Color of the guide lines through world origin.
    pub axis_color: Rgba<u8>,

    /// How long the collector blocks before re-checking cancellation.
    pub poll_interval: Duration,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            tile_layout: TileLayout::default(),
            tile_background: Rgba([0, 0, 0, 255]),
            canvas_background: Rgba([0, 0, 0, 0]),
            axis_color: Rgba(AXIS_GRAY),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PreviewConfig {
    /// Set a fixed worker pool size.
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads.max(1));
        self
    }

    pub fn with_tile_layout(mut self, layout: TileLayout) -> Self {
        self.tile_layout = layout;
        self
    }

    pub fn with_tile_background(mut self, color: Rgba<u8>) -> Self {
        self.tile_background = color;
        self
    }

    pub fn with_canvas_background(mut self, color: Rgba<u8>) -> Self {
        self.canvas_background = color;
        self
    }

    pub fn with_axis_color(mut self, color: Rgba<u8>) -> Self {
        self.axis_color = color;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Number of worker threads the engine will start.
    pub fn worker_count(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        })
    }
}
