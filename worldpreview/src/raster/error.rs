//! Error types for tile computation.

use thiserror::Error;

use crate::source::SourceError;

/// Error returned by a visual layer while drawing a tile.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct LayerError(String);

impl LayerError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Failure of a single tile's compute unit.
///
/// These never abort a render; the scheduler logs them and leaves the tile
/// blank.
#[derive(Debug, Error)]
pub enum TileError {
    /// The data source query failed.
    #[error("data source error: {0}")]
    Source(#[from] SourceError),

    /// A visual layer failed while drawing.
    #[error("layer '{layer}' failed: {source}")]
    Layer {
        layer: String,
        #[source]
        source: LayerError,
    },

    /// The tile pixel buffer could not be allocated.
    #[error("cannot allocate a {width}×{height} tile buffer")]
    Allocation { width: u32, height: u32 },

    /// The compute unit panicked.
    #[error("tile computation panicked: {0}")]
    Panicked(String),

    /// The worker dropped the task without reporting a result.
    #[error("tile result was lost")]
    Lost,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_layer_error_display_includes_layer_name() {
        let err = TileError::Layer {
            layer: "biomes".to_string(),
            source: LayerError::new("missing facet"),
        };
        assert_eq!(err.to_string(), "layer 'biomes' failed: missing facet");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_from_source_error() {
        let err: TileError = SourceError::Query("timeout".to_string()).into();
        assert!(matches!(err, TileError::Source(_)));
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_allocation_display() {
        let err = TileError::Allocation {
            width: 0,
            height: 64,
        };
        assert_eq!(err.to_string(), "cannot allocate a 0×64 tile buffer");
    }
}
