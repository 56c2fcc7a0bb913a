//! Preview engine.
//!
//! The engine ties the pipeline together for one render:
//!
//! ```text
//! RenderJob ──► validate ──► Viewport ──► LogicalArea ──► TileGrid
//!                                                            │
//!                                     ┌──────────────────────┘
//!                                     ▼
//!                     TileScheduler (worker pool, one task per tile)
//!                        query source ─► rasterize layers ─► TileImage
//!                                     │
//!                                     ▼
//!                     Compositor ─► output image + axis lines
//! ```
//!
//! Tile failures are logged and leave a blank region; cancellation and
//! engine shutdown end the render with an error and no image.

mod error;
mod job;
mod preview;

pub use error::PreviewError;
pub use job::RenderJob;
pub use preview::{EngineState, PreviewEngine};
