//! Volume fixtures shared by the seedshed-core integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use seedshed_core::{
    AffinityField, AffinityPolarity, Direction, OrderingStrategy, Result, Segmentation,
    VolumeShape, WatershedBuilder, WatershedReport,
};

/// A seed volume and its affinity field, built up voxel by voxel.
///
/// Affinities are written in similarity terms (`255` binds, `0` cuts) and
/// inverted on the way out when a run uses [`AffinityPolarity::Dissimilarity`].
#[derive(Clone, Debug)]
pub struct TestVolume {
    shape: VolumeShape,
    labels: Vec<u32>,
    affinity: Vec<u8>,
}

impl TestVolume {
    /// A `(depth, height, width)` volume with no seeds and every edge at
    /// `weight`.
    #[must_use]
    pub fn filled(depth: usize, height: usize, width: usize, weight: u8) -> Self {
        let shape = VolumeShape::new(depth, height, width).expect("test volume dims are valid");
        Self {
            shape,
            labels: vec![0; shape.voxel_count()],
            affinity: vec![weight; 3 * shape.voxel_count()],
        }
    }

    /// A cube of side `side` with every edge at full strength.
    #[must_use]
    pub fn cube(side: usize) -> Self {
        Self::filled(side, side, side, u8::MAX)
    }

    #[must_use]
    pub fn shape(&self) -> VolumeShape {
        self.shape
    }

    #[must_use]
    pub fn dims(&self) -> [usize; 4] {
        let [depth, height, width] = self.shape.dims();
        [3, depth, height, width]
    }

    #[must_use]
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    #[must_use]
    pub fn affinity(&self) -> &[u8] {
        &self.affinity
    }

    pub fn seed(&mut self, z: usize, y: usize, x: usize, label: u32) -> &mut Self {
        let voxel = self.shape.linear_index(z, y, x);
        self.labels[voxel] = label;
        self
    }

    /// Sets the edge between `(z, y, x)` and its backward neighbour along
    /// `direction`.
    pub fn set_edge(
        &mut self,
        direction: Direction,
        [z, y, x]: [usize; 3],
        weight: u8,
    ) -> &mut Self {
        let slot = direction.plane() * self.shape.voxel_count() + self.shape.linear_index(z, y, x);
        self.affinity[slot] = weight;
        self
    }

    /// Sets every `direction` edge whose upper endpoint satisfies `select`.
    pub fn set_edges_where<F>(&mut self, direction: Direction, weight: u8, select: F) -> &mut Self
    where
        F: Fn([usize; 3]) -> bool,
    {
        for voxel in 0..self.shape.voxel_count() {
            let coords = self.shape.coordinates(voxel).expect("voxel is in range");
            if select(coords) {
                self.set_edge(direction, coords, weight);
            }
        }
        self
    }

    #[must_use]
    pub fn label_at(labels: &[u32], shape: VolumeShape, z: usize, y: usize, x: usize) -> u32 {
        labels[shape.linear_index(z, y, x)]
    }

    /// Runs a watershed with the given configuration and returns the
    /// segmented labels alongside the report.
    pub fn run_with(
        &self,
        threshold: u8,
        polarity: AffinityPolarity,
        ordering: OrderingStrategy,
    ) -> Result<(Vec<u32>, WatershedReport)> {
        let affinity = self.affinity_for(polarity);
        let threshold = match polarity {
            AffinityPolarity::Similarity => threshold,
            AffinityPolarity::Dissimilarity => u8::MAX - threshold,
        };
        let mut labels = self.labels.clone();
        let field = AffinityField::new(&affinity, self.dims())?;
        let mut segmentation = Segmentation::new(&mut labels, self.shape)?;
        let report = WatershedBuilder::new()
            .with_threshold(threshold)
            .with_polarity(polarity)
            .with_ordering(ordering)
            .build()?
            .run(&mut segmentation, &field)?;
        Ok((labels, report))
    }

    /// Runs with similarity polarity and bucket ordering.
    pub fn run(&self, threshold: u8) -> Result<(Vec<u32>, WatershedReport)> {
        self.run_with(threshold, AffinityPolarity::Similarity, OrderingStrategy::Bucket)
    }

    fn affinity_for(&self, polarity: AffinityPolarity) -> Vec<u8> {
        match polarity {
            AffinityPolarity::Similarity => self.affinity.clone(),
            AffinityPolarity::Dissimilarity => {
                self.affinity.iter().map(|weight| u8::MAX - weight).collect()
            }
        }
    }
}

/// Seven-cube with one seed in the centre, enclosed by a shell of zero-weight
/// edges so the interior `1..=4` cube is sealed from the outside.
#[must_use]
pub fn boxed_seed() -> TestVolume {
    let mut volume = TestVolume::cube(7);
    let inner = |value: usize| (1..=5).contains(&value);
    volume
        .set_edges_where(Direction::Z, 0, |[z, y, x]| (z == 1 || z == 5) && inner(y) && inner(x))
        .set_edges_where(Direction::Y, 0, |[z, y, x]| (y == 1 || y == 5) && inner(z) && inner(x))
        .set_edges_where(Direction::X, 0, |[z, y, x]| (x == 1 || x == 5) && inner(z) && inner(y))
        .seed(3, 3, 3, 1);
    volume
}

/// Seven-cube with seeds near either Z face and every Z edge crossing
/// between planes 2 and 3 cut.
#[must_use]
pub fn split_by_membrane() -> TestVolume {
    let mut volume = TestVolume::cube(7);
    volume
        .set_edges_where(Direction::Z, 0, |[z, _, _]| z == 3)
        .seed(1, 3, 3, 1)
        .seed(5, 3, 3, 2);
    volume
}

/// Seven-cube with seeds near either Z face and two membranes around the
/// middle planes `2..=3`, each pierced by a single opening.
///
/// The opening towards seed `1` has weight `low_channel`; the opening towards
/// seed `2` has weight `high_channel`, or stays closed when `None`.
#[must_use]
pub fn competing_channels(low_channel: u8, high_channel: Option<u8>) -> TestVolume {
    let mut volume = TestVolume::cube(7);
    volume
        .set_edges_where(Direction::Z, 0, |[z, _, _]| z == 2 || z == 4)
        .set_edge(Direction::Z, [2, 3, 3], low_channel)
        .seed(1, 3, 3, 1)
        .seed(5, 3, 3, 2);
    if let Some(weight) = high_channel {
        volume.set_edge(Direction::Z, [4, 3, 3], weight);
    }
    volume
}
