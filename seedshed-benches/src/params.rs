//! Benchmark parameter types.

use std::fmt;

use seedshed_core::OrderingStrategy;

/// Parameters for one watershed or ordering benchmark run.
#[derive(Clone, Debug)]
pub struct VolumeBenchParams {
    /// Edge length of the cubic volume.
    pub side: usize,
    /// Ordering algorithm under test.
    pub ordering: OrderingStrategy,
}

impl fmt::Display for VolumeBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ordering = match self.ordering {
            OrderingStrategy::Bucket => "bucket",
            OrderingStrategy::ComparisonSort => "sort",
        };
        write!(f, "side={},{ordering}", self.side)
    }
}
