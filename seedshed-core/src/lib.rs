//! Seeded watershed segmentation of 3-D volumes over affinity graphs.
//!
//! Seeds in a `u32` segmentation volume grow through a `(3, Z, Y, X)` field of
//! `u8` edge affinities. Edges are processed strongest first, so every voxel
//! takes the label of the seed it reaches through the strongest bottleneck
//! path; competing seeds never absorb each other, and voxels reachable only
//! through edges the threshold rejects stay `0`.
//!
//! The pipeline runs in explicit stages, each usable on its own:
//!
//! 1. [`AffinityGraph`] derives edges from the field by index arithmetic.
//! 2. [`OrderedEdges`] ranks admitted edges strongest first, breaking ties by
//!    [`EdgeId`].
//! 3. [`SeededUnionFind`] grows seed regions and seals competing ones.
//! 4. [`materialize`] writes each voxel's region label into the caller's buffer.
//!
//! [`SeededWatershed`] (built with [`WatershedBuilder`]) runs all four.
//!
//! # Metrics
//!
//! When the `metrics` feature is enabled each run emits the counters
//! `seedshed_edges_considered`, `seedshed_region_conflicts` and
//! `seedshed_voxels_labelled`.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod graph;
mod materialize;
mod ordering;
mod report;
mod shape;
mod union_find;
mod volume;
mod watershed;

pub use crate::{
    error::{Result, VolumeBuffer, WatershedError, WatershedErrorCode},
    graph::{AffinityEdge, AffinityGraph, EdgeId},
    materialize::{LabelCensus, materialize},
    ordering::{AffinityPolarity, EdgeTier, OrderedEdges, OrderingStrategy, ThresholdGate},
    report::WatershedReport,
    shape::{Direction, VolumeShape},
    union_find::{MergeOutcome, MergeTally, RegionLabels, SeededUnionFind, UNASSIGNED},
    volume::{AffinityField, Segmentation},
    watershed::{SeededWatershed, WatershedBuilder, seeded_watershed},
};

#[cfg(test)]
mod properties;
#[cfg(test)]
mod test_utils;
