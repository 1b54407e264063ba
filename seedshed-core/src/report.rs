//! Summary of a completed watershed run.

use crate::{materialize::LabelCensus, union_find::MergeTally};

/// Counts describing one [`crate::SeededWatershed::run`] invocation.
///
/// # Examples
/// ```
/// use seedshed_core::{AffinityField, Segmentation, VolumeShape, seeded_watershed};
///
/// let shape = VolumeShape::new(1, 1, 3)?;
/// let mut labels = vec![6, 0, 0];
/// let affinity = vec![255_u8; 9];
/// let field = AffinityField::new(&affinity, [3, 1, 1, 3])?;
/// let mut segmentation = Segmentation::new(&mut labels, shape)?;
/// let report = seeded_watershed(&mut segmentation, &field, 1)?;
/// assert_eq!(report.labelled_voxels(), 3);
/// assert_eq!(report.claims(), 2);
/// # Ok::<(), seedshed_core::WatershedError>(())
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct WatershedReport {
    voxels: usize,
    seed_voxels: usize,
    edges: usize,
    admitted_edges: usize,
    tally: MergeTally,
    sealed_regions: usize,
    census: LabelCensus,
}

impl WatershedReport {
    pub(crate) const fn new(
        voxels: usize,
        seed_voxels: usize,
        edges: usize,
        admitted_edges: usize,
        tally: MergeTally,
        sealed_regions: usize,
        census: LabelCensus,
    ) -> Self {
        Self {
            voxels,
            seed_voxels,
            edges,
            admitted_edges,
            tally,
            sealed_regions,
            census,
        }
    }

    /// Voxels in the volume.
    #[must_use]
    pub const fn voxels(&self) -> usize {
        self.voxels
    }

    /// Voxels that carried a nonzero label on input.
    #[must_use]
    pub const fn seed_voxels(&self) -> usize {
        self.seed_voxels
    }

    /// Edges in the 6-connected grid graph.
    #[must_use]
    pub const fn edges(&self) -> usize {
        self.edges
    }

    /// Edges that passed the threshold gate and were processed.
    #[must_use]
    pub const fn admitted_edges(&self) -> usize {
        self.admitted_edges
    }

    /// Edges rejected by the threshold gate.
    #[must_use]
    pub const fn gated_out_edges(&self) -> usize {
        self.edges.saturating_sub(self.admitted_edges)
    }

    /// Merges in which an unclaimed region acquired a label.
    #[must_use]
    pub const fn claims(&self) -> usize {
        self.tally.claimed
    }

    /// Merges that left labels unchanged.
    #[must_use]
    pub const fn joins(&self) -> usize {
        self.tally.joined
    }

    /// Admitted edges whose endpoints already shared a region.
    #[must_use]
    pub const fn redundant_edges(&self) -> usize {
        self.tally.same_region
    }

    /// Admitted edges between differently labelled regions.
    #[must_use]
    pub const fn conflicts(&self) -> usize {
        self.tally.conflicts
    }

    /// Regions sealed by contact with a competing label.
    #[must_use]
    pub const fn sealed_regions(&self) -> usize {
        self.sealed_regions
    }

    /// Voxels carrying a nonzero label on output.
    #[must_use]
    pub const fn labelled_voxels(&self) -> usize {
        self.census.labelled
    }

    /// Voxels left unassigned on output.
    #[must_use]
    pub const fn unassigned_voxels(&self) -> usize {
        self.census.unassigned
    }

    /// Distinct nonzero labels on output.
    #[must_use]
    pub const fn distinct_labels(&self) -> usize {
        self.census.distinct_labels
    }
}
