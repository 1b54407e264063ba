//! Writes final region labels into the caller's segmentation buffer.

use std::collections::HashSet;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::instrument;

use crate::{
    Result,
    error::{VolumeBuffer, WatershedError},
    union_find::{RegionLabels, UNASSIGNED},
};

/// Counts describing a materialized segmentation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LabelCensus {
    /// Voxels that received a nonzero label.
    pub labelled: usize,
    /// Voxels left at [`UNASSIGNED`].
    pub unassigned: usize,
    /// Distinct nonzero labels present in the output.
    pub distinct_labels: usize,
}

/// Writes the label of every voxel's region into `output`.
///
/// Each voxel's value depends only on its own root lookup, so the pass is
/// split across threads when the `parallel` feature is enabled.
///
/// # Errors
/// Returns [`WatershedError::BufferLengthMismatch`] when `output` and
/// `labels` cover different voxel counts; `output` is untouched in that case.
///
/// # Examples
/// ```
/// use seedshed_core::{SeededUnionFind, materialize};
///
/// let mut regions = SeededUnionFind::from_seeds(&[5, 0, 0]);
/// regions.offer(0, 1)?;
/// let mut output = vec![0; 3];
/// let census = materialize(regions.flatten(), &mut output)?;
/// assert_eq!(output, vec![5, 5, 0]);
/// assert_eq!(census.labelled, 2);
/// # Ok::<(), seedshed_core::WatershedError>(())
/// ```
#[instrument(name = "core.materialize", skip_all, fields(voxels = labels.len()))]
pub fn materialize(labels: RegionLabels<'_>, output: &mut [u32]) -> Result<LabelCensus> {
    if output.len() != labels.len() {
        return Err(WatershedError::BufferLengthMismatch {
            buffer: VolumeBuffer::Segmentation,
            expected: labels.len(),
            actual: output.len(),
        });
    }

    let labelled = write_labels(labels, output);
    let distinct: HashSet<u32> = output
        .iter()
        .copied()
        .filter(|label| *label != UNASSIGNED)
        .collect();

    Ok(LabelCensus {
        labelled,
        unassigned: output.len() - labelled,
        distinct_labels: distinct.len(),
    })
}

#[cfg(feature = "parallel")]
fn write_labels(labels: RegionLabels<'_>, output: &mut [u32]) -> usize {
    output
        .par_iter_mut()
        .enumerate()
        .map(|(voxel, slot)| {
            *slot = labels.label(voxel);
            usize::from(*slot != UNASSIGNED)
        })
        .sum()
}

#[cfg(not(feature = "parallel"))]
fn write_labels(labels: RegionLabels<'_>, output: &mut [u32]) -> usize {
    output
        .iter_mut()
        .enumerate()
        .map(|(voxel, slot)| {
            *slot = labels.label(voxel);
            usize::from(*slot != UNASSIGNED)
        })
        .sum()
}
