//! Strongest-first edge ordering.
//!
//! Edges are ranked by connection strength and, within one weight, by
//! increasing [`EdgeId`]. Processing in this order is what gives the
//! union-find pass its maximum-bottleneck semantics. The threshold gate is a
//! pure function of weight, so edges it rejects are dropped here rather than
//! stored and skipped later.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::graph::{AffinityEdge, AffinityGraph, EdgeId};

/// Number of distinct `u8` magnitudes, one tier each.
const TIERS: usize = 256;

/// How affinity magnitudes map to connection strength.
///
/// # Examples
/// ```
/// use seedshed_core::AffinityPolarity;
///
/// assert!(AffinityPolarity::Similarity.is_stronger(200, 100));
/// assert!(AffinityPolarity::Dissimilarity.is_stronger(100, 200));
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum AffinityPolarity {
    /// Higher magnitudes bind more strongly; an edge passes when
    /// `weight >= threshold`.
    #[default]
    Similarity,
    /// Lower magnitudes bind more strongly; an edge passes when
    /// `weight <= threshold`.
    Dissimilarity,
}

impl AffinityPolarity {
    /// Processing rank of `weight`: `0` for the strongest magnitude.
    #[must_use]
    pub const fn rank(self, weight: u8) -> u8 {
        match self {
            Self::Similarity => u8::MAX - weight,
            Self::Dissimilarity => weight,
        }
    }

    /// Inverse of [`Self::rank`].
    #[must_use]
    pub const fn weight_at_rank(self, rank: u8) -> u8 {
        match self {
            Self::Similarity => u8::MAX - rank,
            Self::Dissimilarity => rank,
        }
    }

    /// Returns `true` when `left` binds strictly more strongly than `right`.
    #[must_use]
    pub const fn is_stronger(self, left: u8, right: u8) -> bool {
        self.rank(left) < self.rank(right)
    }
}

/// Decides which edges may participate in connectivity.
///
/// # Examples
/// ```
/// use seedshed_core::{AffinityPolarity, ThresholdGate};
///
/// let gate = ThresholdGate::new(10, AffinityPolarity::Similarity);
/// assert!(gate.admits(10));
/// assert!(!gate.admits(9));
///
/// let gate = ThresholdGate::new(10, AffinityPolarity::Dissimilarity);
/// assert!(gate.admits(10));
/// assert!(!gate.admits(11));
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ThresholdGate {
    threshold: u8,
    polarity: AffinityPolarity,
}

impl ThresholdGate {
    /// Creates a gate comparing against `threshold` in the given polarity.
    #[must_use]
    pub const fn new(threshold: u8, polarity: AffinityPolarity) -> Self {
        Self {
            threshold,
            polarity,
        }
    }

    /// The threshold magnitude.
    #[must_use]
    pub const fn threshold(&self) -> u8 {
        self.threshold
    }

    /// The comparison direction.
    #[must_use]
    pub const fn polarity(&self) -> AffinityPolarity {
        self.polarity
    }

    /// Returns `true` when an edge of `weight` is at least as strong as the
    /// threshold.
    #[must_use]
    pub const fn admits(&self, weight: u8) -> bool {
        self.polarity.rank(weight) <= self.polarity.rank(self.threshold)
    }
}

/// Algorithm used to put edges in processing order.
///
/// Both strategies produce the identical sequence.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum OrderingStrategy {
    /// Counting sort into one bucket per magnitude. Linear time; stores one
    /// [`EdgeId`] per admitted edge.
    #[default]
    Bucket,
    /// Comparison sort on `(rank, EdgeId)`; parallel when the `parallel`
    /// feature is enabled.
    ComparisonSort,
}

/// One weight tier: every admitted edge of a single magnitude, by [`EdgeId`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EdgeTier<'a> {
    weight: u8,
    ids: &'a [EdgeId],
}

impl<'a> EdgeTier<'a> {
    /// The magnitude shared by every edge in the tier.
    #[must_use]
    pub const fn weight(&self) -> u8 {
        self.weight
    }

    /// Edge identifiers in increasing order.
    #[must_use]
    pub const fn ids(&self) -> &'a [EdgeId] {
        self.ids
    }
}

/// Admitted edges of a graph in processing order.
///
/// Holds one [`EdgeId`] (a `usize`) per admitted edge plus 257 offsets, so a
/// volume of `V` voxels with every edge admitted costs about `24 · V` bytes
/// on 64-bit targets. Raising the threshold shrinks it proportionally.
#[derive(Clone, Debug)]
pub struct OrderedEdges<'g> {
    graph: AffinityGraph<'g>,
    polarity: AffinityPolarity,
    ids: Vec<EdgeId>,
    /// `offsets[r]..offsets[r + 1]` is the slice of rank `r`.
    offsets: Vec<usize>,
}

impl<'g> OrderedEdges<'g> {
    /// Orders the edges of `graph` admitted by `gate`.
    #[instrument(
        name = "core.order_edges",
        skip(graph),
        fields(edges = graph.edge_count(), threshold = gate.threshold(), polarity = ?gate.polarity()),
    )]
    pub fn build(graph: AffinityGraph<'g>, gate: ThresholdGate, strategy: OrderingStrategy) -> Self {
        let ordered = match strategy {
            OrderingStrategy::Bucket => Self::bucket_sort(graph, gate),
            OrderingStrategy::ComparisonSort => Self::comparison_sort(graph, gate),
        };
        debug!(
            admitted = ordered.len(),
            gated_out = graph.edge_count() - ordered.len(),
            "edge ordering complete"
        );
        ordered
    }

    fn bucket_sort(graph: AffinityGraph<'g>, gate: ThresholdGate) -> Self {
        let polarity = gate.polarity();
        let counts = count_ranks(&graph, gate);
        let offsets = exclusive_offsets(&counts);

        let total = offsets.last().copied().unwrap_or(0);
        let mut ids = vec![EdgeId::from_slot(0); total];
        let mut cursors = offsets.clone();
        for edge in graph.edges().filter(|edge| gate.admits(edge.weight())) {
            let rank = usize::from(polarity.rank(edge.weight()));
            if let Some(cursor) = cursors.get_mut(rank) {
                if let Some(slot) = ids.get_mut(*cursor) {
                    *slot = edge.id();
                }
                *cursor += 1;
            }
        }

        Self {
            graph,
            polarity,
            ids,
            offsets,
        }
    }

    fn comparison_sort(graph: AffinityGraph<'g>, gate: ThresholdGate) -> Self {
        let polarity = gate.polarity();
        let mut keyed: Vec<(u8, EdgeId)> = graph
            .edges()
            .filter(|edge| gate.admits(edge.weight()))
            .map(|edge| (polarity.rank(edge.weight()), edge.id()))
            .collect();
        sort_keys(&mut keyed);

        let mut counts = [0_usize; TIERS];
        for (rank, _) in &keyed {
            counts[usize::from(*rank)] += 1;
        }

        Self {
            graph,
            polarity,
            ids: keyed.into_iter().map(|(_, id)| id).collect(),
            offsets: exclusive_offsets(&counts),
        }
    }

    /// Number of admitted edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` when no edge passed the gate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Edge identifiers in processing order.
    #[must_use]
    pub fn ids(&self) -> &[EdgeId] {
        &self.ids
    }

    /// The graph the identifiers refer to.
    #[must_use]
    pub const fn graph(&self) -> AffinityGraph<'g> {
        self.graph
    }

    /// Non-empty weight tiers, strongest first.
    pub fn tiers(&self) -> impl Iterator<Item = EdgeTier<'_>> + '_ {
        self.offsets
            .windows(2)
            .zip(0..=u8::MAX)
            .filter_map(move |(bounds, rank)| {
                let ids = self.ids.get(bounds[0]..bounds[1])?;
                (!ids.is_empty()).then_some(EdgeTier {
                    weight: self.polarity.weight_at_rank(rank),
                    ids,
                })
            })
    }

    /// Resolved edges in processing order.
    pub fn iter(&self) -> impl Iterator<Item = AffinityEdge> + '_ {
        self.ids.iter().filter_map(|id| self.graph.edge(*id))
    }
}

fn exclusive_offsets(counts: &[usize; TIERS]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(TIERS + 1);
    let mut running = 0_usize;
    offsets.push(running);
    for count in counts {
        running += count;
        offsets.push(running);
    }
    offsets
}

fn count_slab(graph: &AffinityGraph<'_>, gate: ThresholdGate, z: usize) -> [usize; TIERS] {
    let mut counts = [0_usize; TIERS];
    for edge in graph.edges_in_slab(z..z + 1) {
        if gate.admits(edge.weight()) {
            counts[usize::from(gate.polarity().rank(edge.weight()))] += 1;
        }
    }
    counts
}

fn merge_counts(mut left: [usize; TIERS], right: [usize; TIERS]) -> [usize; TIERS] {
    for (total, count) in left.iter_mut().zip(right) {
        *total += count;
    }
    left
}

#[cfg(feature = "parallel")]
fn count_ranks(graph: &AffinityGraph<'_>, gate: ThresholdGate) -> [usize; TIERS] {
    (0..graph.shape().depth())
        .into_par_iter()
        .map(|z| count_slab(graph, gate, z))
        .reduce(|| [0_usize; TIERS], merge_counts)
}

#[cfg(not(feature = "parallel"))]
fn count_ranks(graph: &AffinityGraph<'_>, gate: ThresholdGate) -> [usize; TIERS] {
    (0..graph.shape().depth())
        .map(|z| count_slab(graph, gate, z))
        .fold([0_usize; TIERS], merge_counts)
}

#[cfg(feature = "parallel")]
fn sort_keys(keys: &mut [(u8, EdgeId)]) {
    // The key is total, so an unstable sort is still deterministic.
    keys.par_sort_unstable();
}

#[cfg(not(feature = "parallel"))]
fn sort_keys(keys: &mut [(u8, EdgeId)]) {
    keys.sort_unstable();
}
