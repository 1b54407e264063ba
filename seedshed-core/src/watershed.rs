//! Seeded watershed orchestration.
//!
//! Wires the stages together: validate congruence, view the affinity field as
//! a graph, order its admitted edges, grow the seeds with the union-find
//! engine, and materialize labels into the caller's buffer.

use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use crate::{
    Result,
    error::WatershedError,
    graph::{AffinityGraph, EdgeId},
    materialize::materialize,
    ordering::{AffinityPolarity, OrderedEdges, OrderingStrategy, ThresholdGate},
    report::WatershedReport,
    union_find::{MergeTally, SeededUnionFind},
    volume::{AffinityField, Segmentation},
};

/// Edges processed between deadline checks inside one weight tier.
const DEADLINE_STRIDE: usize = 1 << 16;

/// Configures and constructs [`SeededWatershed`] instances.
///
/// # Examples
/// ```
/// use std::time::Duration;
///
/// use seedshed_core::{AffinityPolarity, OrderingStrategy, WatershedBuilder};
///
/// let watershed = WatershedBuilder::new()
///     .with_threshold(12)
///     .with_polarity(AffinityPolarity::Dissimilarity)
///     .with_ordering(OrderingStrategy::ComparisonSort)
///     .with_time_budget(Duration::from_secs(30))
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(watershed.threshold(), 12);
/// assert_eq!(watershed.polarity(), AffinityPolarity::Dissimilarity);
/// ```
#[derive(Clone, Debug, Default)]
pub struct WatershedBuilder {
    threshold: u8,
    polarity: AffinityPolarity,
    ordering: OrderingStrategy,
    time_budget: Option<Duration>,
}

impl WatershedBuilder {
    /// Creates a builder with threshold `0`, [`AffinityPolarity::Similarity`],
    /// [`OrderingStrategy::Bucket`] and no time budget.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the threshold an edge must meet to participate in connectivity.
    #[must_use]
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    /// Returns the configured threshold.
    #[must_use]
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Sets how affinity magnitudes map to connection strength.
    #[must_use]
    pub fn with_polarity(mut self, polarity: AffinityPolarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Returns the configured polarity.
    #[must_use]
    pub fn polarity(&self) -> AffinityPolarity {
        self.polarity
    }

    /// Sets the edge ordering algorithm.
    #[must_use]
    pub fn with_ordering(mut self, ordering: OrderingStrategy) -> Self {
        self.ordering = ordering;
        self
    }

    /// Returns the configured ordering algorithm.
    #[must_use]
    pub fn ordering(&self) -> OrderingStrategy {
        self.ordering
    }

    /// Bounds the wall-clock time of each run.
    #[must_use]
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    /// Returns the configured time budget, if any.
    #[must_use]
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget
    }

    /// Validates the configuration and constructs a [`SeededWatershed`].
    ///
    /// # Errors
    /// Returns [`WatershedError::InvalidTimeBudget`] when a zero time budget
    /// was configured.
    pub fn build(self) -> Result<SeededWatershed> {
        if self.time_budget == Some(Duration::ZERO) {
            return Err(WatershedError::InvalidTimeBudget);
        }
        Ok(SeededWatershed {
            gate: ThresholdGate::new(self.threshold, self.polarity),
            ordering: self.ordering,
            time_budget: self.time_budget,
        })
    }
}

/// Grows seed labels through an affinity graph, strongest connections first.
///
/// # Examples
/// ```
/// use seedshed_core::{AffinityField, Segmentation, VolumeShape, WatershedBuilder};
///
/// // Two seeds at either end of a row, a weak link in the middle.
/// let shape = VolumeShape::new(1, 1, 4)?;
/// let mut labels = vec![1, 0, 0, 2];
/// let mut affinity = vec![0_u8; 3 * 4];
/// affinity[8..].copy_from_slice(&[0, 200, 10, 90]);
/// let field = AffinityField::new(&affinity, [3, 1, 1, 4])?;
///
/// let watershed = WatershedBuilder::new().with_threshold(5).build()?;
/// let mut segmentation = Segmentation::new(&mut labels, shape)?;
/// let report = watershed.run(&mut segmentation, &field)?;
/// assert_eq!(labels, vec![1, 1, 2, 2]);
/// assert_eq!(report.conflicts(), 1);
/// # Ok::<(), seedshed_core::WatershedError>(())
/// ```
#[derive(Clone, Debug)]
pub struct SeededWatershed {
    gate: ThresholdGate,
    ordering: OrderingStrategy,
    time_budget: Option<Duration>,
}

impl SeededWatershed {
    /// Returns the threshold edges must meet.
    #[must_use]
    pub fn threshold(&self) -> u8 {
        self.gate.threshold()
    }

    /// Returns the comparison direction.
    #[must_use]
    pub fn polarity(&self) -> AffinityPolarity {
        self.gate.polarity()
    }

    /// Returns the edge ordering algorithm.
    #[must_use]
    pub fn ordering(&self) -> OrderingStrategy {
        self.ordering
    }

    /// Returns the per-run time budget, if any.
    #[must_use]
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget
    }

    /// Segments `segmentation` in place using `affinity`.
    ///
    /// Seeds keep their labels, unclaimed voxels take the label of the seed
    /// reachable through the strongest bottleneck path, and voxels reachable
    /// only through edges the threshold rejects are set to `0`.
    ///
    /// # Errors
    /// Returns [`WatershedError::ShapeMismatch`] when the affinity field's
    /// spatial extents differ from the segmentation's, and
    /// [`WatershedError::DeadlineExceeded`] when the time budget runs out
    /// after ordering or during the union pass. In both cases `segmentation`
    /// is left exactly as it was.
    #[instrument(
        name = "core.watershed",
        err,
        skip_all,
        fields(
            dims = ?segmentation.shape().dims(),
            threshold = self.gate.threshold(),
            polarity = ?self.gate.polarity(),
            ordering = ?self.ordering,
        ),
    )]
    pub fn run(
        &self,
        segmentation: &mut Segmentation<'_>,
        affinity: &AffinityField<'_>,
    ) -> Result<WatershedReport> {
        affinity.ensure_congruent(segmentation)?;
        let deadline = self
            .time_budget
            .and_then(|budget| Instant::now().checked_add(budget));

        let graph = AffinityGraph::new(affinity);
        let ordered = OrderedEdges::build(graph, self.gate, self.ordering);
        ensure_time_left(deadline, 0, ordered.len())?;

        let seed_voxels = segmentation.seed_count();
        let mut regions = SeededUnionFind::from_seeds(segmentation.labels());
        let tally = union_pass(&mut regions, &ordered, deadline)?;
        let sealed_regions = regions.sealed_region_count();
        let census = materialize(regions.flatten(), segmentation.labels_mut())?;

        let report = WatershedReport::new(
            graph.shape().voxel_count(),
            seed_voxels,
            graph.edge_count(),
            ordered.len(),
            tally,
            sealed_regions,
            census,
        );
        record_metrics(&report);
        info!(
            seeds = report.seed_voxels(),
            labelled = report.labelled_voxels(),
            unassigned = report.unassigned_voxels(),
            conflicts = report.conflicts(),
            sealed = report.sealed_regions(),
            "seeded watershed completed"
        );
        Ok(report)
    }
}

/// Segments `segmentation` in place with the default configuration and the
/// given similarity `threshold`.
///
/// # Errors
/// Returns the same errors as [`SeededWatershed::run`].
pub fn seeded_watershed(
    segmentation: &mut Segmentation<'_>,
    affinity: &AffinityField<'_>,
    threshold: u8,
) -> Result<WatershedReport> {
    WatershedBuilder::new()
        .with_threshold(threshold)
        .build()?
        .run(segmentation, affinity)
}

#[instrument(name = "core.union", skip_all, fields(edges = ordered.len()))]
fn union_pass(
    regions: &mut SeededUnionFind,
    ordered: &OrderedEdges<'_>,
    deadline: Option<Instant>,
) -> Result<MergeTally> {
    let graph = ordered.graph();
    let total = ordered.len();
    let mut tally = MergeTally::default();
    let mut processed = 0_usize;

    for tier in ordered.tiers() {
        for chunk in tier.ids().chunks(DEADLINE_STRIDE) {
            ensure_time_left(deadline, processed, total)?;
            for id in chunk {
                let edge = graph.edge(*id).ok_or_else(|| unresolved(*id, graph))?;
                tally.considered += 1;
                tally.record(regions.offer(edge.lower(), edge.upper())?);
            }
            processed += chunk.len();
        }
    }

    Ok(tally)
}

fn ensure_time_left(deadline: Option<Instant>, processed: usize, total: usize) -> Result<()> {
    if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
        debug!(processed, total, "time budget exhausted");
        return Err(WatershedError::DeadlineExceeded { processed, total });
    }
    Ok(())
}

fn unresolved(id: EdgeId, graph: AffinityGraph<'_>) -> WatershedError {
    WatershedError::InvariantViolation {
        invariant: "ordered edge must resolve to a valid grid edge",
        index: id.get(),
        len: graph.shape().edge_slot_count(),
    }
}

#[cfg(feature = "metrics")]
fn record_metrics(report: &WatershedReport) {
    let as_count = |value: usize| u64::try_from(value).unwrap_or(u64::MAX);
    metrics::counter!("seedshed_edges_considered").increment(as_count(report.admitted_edges()));
    metrics::counter!("seedshed_region_conflicts").increment(as_count(report.conflicts()));
    metrics::counter!("seedshed_voxels_labelled").increment(as_count(report.labelled_voxels()));
}

#[cfg(not(feature = "metrics"))]
fn record_metrics(_report: &WatershedReport) {}
