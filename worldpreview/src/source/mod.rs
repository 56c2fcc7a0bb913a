//! Data source abstraction.
//!
//! The pipeline never looks inside the data a source returns. It only asks
//! for the sample backing one [`TileVolume`] and hands it to the visual
//! layers, which know how to interpret it.

use thiserror::Error;

use crate::geometry::TileVolume;

/// Errors raised by a data source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The requested volume lies outside the data the source can provide.
    #[error("volume {0} is outside the data source bounds")]
    OutOfBounds(TileVolume),

    /// The source failed to produce data for the volume.
    #[error("data source query failed: {0}")]
    Query(String),

    /// The source could not be initialised.
    #[error("data source unavailable: {0}")]
    Unavailable(String),
}

/// Supplier of world data for tile volumes.
///
/// Implementations are queried concurrently from every worker thread and
/// must therefore be `Send + Sync`. A query may be arbitrarily expensive,
/// for example when it triggers world generation on first use.
pub trait DataSource: Send + Sync + 'static {
    /// Data returned for one tile volume.
    type Sample: 'static;

    /// Short name used in log output.
    fn name(&self) -> &str;

    /// Called once per render before any tile is scheduled.
    ///
    /// Sources with expensive one-time setup should do it here so that the
    /// cost is not paid by whichever tile happens to run first.
    fn prepare(&self) -> Result<(), SourceError> {
        Ok(())
    }

    /// Fetch the data for a tile volume.
    fn query(&self, volume: &TileVolume) -> Result<Self::Sample, SourceError>;
}
