//! Synthetic membrane volumes.
//!
//! Strong affinities fill cubic cells separated by weak membrane planes, with
//! seeds on a coarser lattice, so a run exercises claims, joins and
//! conflicts in realistic proportions.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use seedshed_core::{
    AffinityField, Direction, SeededWatershed, Segmentation, VolumeShape, WatershedError,
    WatershedReport,
};

/// Configuration for [`SyntheticVolume::generate`].
#[derive(Clone, Copy, Debug)]
pub struct SyntheticVolumeConfig {
    /// Edge length of the cubic volume.
    pub side: usize,
    /// Distance between membrane planes along every axis.
    pub membrane_spacing: usize,
    /// Distance between seeds along every axis.
    pub seed_spacing: usize,
    /// RNG seed for affinity noise.
    pub seed: u64,
}

/// Errors raised by [`SyntheticVolume::generate`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SyntheticVolumeError {
    /// The volume would contain no voxels.
    #[error("volume side must be non-zero")]
    ZeroSide,
    /// A spacing of zero places no planes or seeds.
    #[error("{context} must be non-zero")]
    ZeroSpacing {
        /// Which spacing was zero.
        context: &'static str,
    },
    /// The core rejected the requested extents.
    #[error(transparent)]
    Shape(#[from] WatershedError),
}

/// Seeds and affinities for one cubic benchmark volume.
#[derive(Clone, Debug)]
pub struct SyntheticVolume {
    shape: VolumeShape,
    seeds: Vec<u32>,
    affinity: Vec<u8>,
}

impl SyntheticVolume {
    /// Generates a deterministic volume from `config`.
    ///
    /// # Errors
    /// Returns [`SyntheticVolumeError`] when the side or a spacing is zero or
    /// the extents overflow.
    ///
    /// # Examples
    /// ```
    /// use seedshed_benches::volume::{SyntheticVolume, SyntheticVolumeConfig};
    ///
    /// let volume = SyntheticVolume::generate(&SyntheticVolumeConfig {
    ///     side: 8,
    ///     membrane_spacing: 4,
    ///     seed_spacing: 3,
    ///     seed: 7,
    /// })?;
    /// assert_eq!(volume.seeds().len(), 512);
    /// assert_eq!(volume.affinity().len(), 3 * 512);
    /// # Ok::<(), seedshed_benches::volume::SyntheticVolumeError>(())
    /// ```
    pub fn generate(config: &SyntheticVolumeConfig) -> Result<Self, SyntheticVolumeError> {
        if config.side == 0 {
            return Err(SyntheticVolumeError::ZeroSide);
        }
        if config.membrane_spacing == 0 {
            return Err(SyntheticVolumeError::ZeroSpacing {
                context: "membrane spacing",
            });
        }
        if config.seed_spacing == 0 {
            return Err(SyntheticVolumeError::ZeroSpacing {
                context: "seed spacing",
            });
        }

        let shape = VolumeShape::new(config.side, config.side, config.side)?;
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let affinity = Direction::ALL
            .iter()
            .flat_map(|direction| {
                (0..shape.voxel_count()).map(move |voxel| (*direction, voxel))
            })
            .map(|(direction, voxel)| {
                let on_membrane = shape
                    .coordinates(voxel)
                    .and_then(|coords| coords.get(direction.plane()).copied())
                    .is_some_and(|axis| axis.is_multiple_of(config.membrane_spacing));
                if on_membrane {
                    rng.gen_range(0_u8..40)
                } else {
                    rng.gen_range(160_u8..=255)
                }
            })
            .collect();

        let mut next_label = 0_u32;
        let seeds = (0..shape.voxel_count())
            .map(|voxel| {
                let seeded = shape.coordinates(voxel).is_some_and(|coords| {
                    coords
                        .iter()
                        .all(|axis| axis.is_multiple_of(config.seed_spacing))
                });
                if seeded {
                    next_label = next_label.saturating_add(1);
                    next_label
                } else {
                    0
                }
            })
            .collect();

        Ok(Self {
            shape,
            seeds,
            affinity,
        })
    }

    /// Geometry of the volume.
    #[must_use]
    pub const fn shape(&self) -> VolumeShape {
        self.shape
    }

    /// Seed labels, `0` where unseeded.
    #[must_use]
    pub fn seeds(&self) -> &[u32] {
        &self.seeds
    }

    /// Affinity values in `(3, Z, Y, X)` order.
    #[must_use]
    pub fn affinity(&self) -> &[u8] {
        &self.affinity
    }

    /// Borrows the affinities as a validated field.
    ///
    /// # Errors
    /// Propagates core validation failures.
    pub fn field(&self) -> Result<AffinityField<'_>, WatershedError> {
        let [depth, height, width] = self.shape.dims();
        AffinityField::new(&self.affinity, [3, depth, height, width])
    }

    /// Wraps `labels` as a segmentation over this volume's shape.
    ///
    /// # Errors
    /// Propagates core validation failures.
    pub fn segmentation<'a>(
        &self,
        labels: &'a mut [u32],
    ) -> Result<Segmentation<'a>, WatershedError> {
        Segmentation::new(labels, self.shape)
    }

    /// Segments `labels` in place with `watershed` over `field`.
    ///
    /// # Errors
    /// Returns validation failures for `labels` and any error from the run.
    pub fn segment(
        &self,
        field: &AffinityField<'_>,
        watershed: &SeededWatershed,
        labels: &mut [u32],
    ) -> Result<WatershedReport, WatershedError> {
        let mut segmentation = self.segmentation(labels)?;
        watershed.run(&mut segmentation, field)
    }
}
