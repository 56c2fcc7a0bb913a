//! Tile rasterization.
//!
//! A tile is rasterized by filling a small pixel buffer with the background
//! color and letting every visible [`VisualLayer`] draw into it, in order.
//!
//! ```text
//! TileSample ──► TileRasterizer ──► TileImage
//!                  │
//!                  ├── background fill
//!                  ├── layer 0 (visible)
//!                  ├── layer 1 (hidden, skipped)
//!                  └── layer 2 (visible)
//! ```

mod error;
mod layer;
mod rasterizer;

pub use error::{LayerError, TileError};
pub use layer::VisualLayer;
pub use rasterizer::{TileImage, TileRasterizer};
