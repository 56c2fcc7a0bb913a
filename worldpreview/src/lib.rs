//! WorldPreview - Tiled parallel previews of procedurally generated worlds
//!
//! This library renders a top-down image of a world generator's output. The
//! visible area is split into fixed-size tiles, each tile is queried from a
//! [`source::DataSource`] and drawn by a stack of [`raster::VisualLayer`]s on
//! a worker pool, and the finished tiles are composited into one image with
//! guide lines through world origin.
//!
//! The entry point is [`engine::PreviewEngine`].

pub mod compositor;
pub mod config;
pub mod engine;
pub mod geometry;
pub mod raster;
pub mod scheduler;
pub mod source;

pub use config::PreviewConfig;
pub use engine::{EngineState, PreviewEngine, PreviewError, RenderJob};
