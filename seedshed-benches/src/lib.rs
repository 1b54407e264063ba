//! Benchmark support crate for seedshed.
//!
//! Provides synthetic membrane volumes and parameter types used by the
//! Criterion benchmarks for edge ordering and full watershed runs.

pub mod error;
pub mod params;
pub mod volume;
