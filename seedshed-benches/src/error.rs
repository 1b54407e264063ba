//! Benchmark setup error type.
//!
//! Lets setup functions propagate failures with `?` instead of panicking
//! inside Criterion closures.

use seedshed_core::WatershedError;

use crate::volume::SyntheticVolumeError;

/// Errors that may occur during benchmark setup.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Synthetic volume generation failed.
    #[error("synthetic volume generation failed: {0}")]
    Synthetic(#[from] SyntheticVolumeError),
    /// Core validation or segmentation failed.
    #[error("watershed operation failed: {0}")]
    Watershed(#[from] WatershedError),
}
