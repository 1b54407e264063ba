//! Validated views over caller-owned volume buffers.
//!
//! These types are the boundary between raw buffers and the core. Their
//! constructors perform every shape and length check, so the graph view and
//! union-find engine can assume congruent inputs and never index out of range.

use crate::{
    Result,
    error::{VolumeBuffer, WatershedError},
    shape::{Direction, VolumeShape},
};

/// Mutable borrow of a `(Z, Y, X)` segmentation volume in C order.
///
/// Nonzero values are seed labels on input and final labels on output; zero
/// means unlabeled. The watershed writes its result back into this buffer, so
/// callers observe the mutation through their original handle.
///
/// # Examples
/// ```
/// use seedshed_core::{Segmentation, VolumeShape};
///
/// let shape = VolumeShape::new(1, 2, 2)?;
/// let mut labels = vec![0, 7, 0, 0];
/// let segmentation = Segmentation::new(&mut labels, shape)?;
/// assert_eq!(segmentation.seed_count(), 1);
/// # Ok::<(), seedshed_core::WatershedError>(())
/// ```
#[derive(Debug)]
pub struct Segmentation<'a> {
    labels: &'a mut [u32],
    shape: VolumeShape,
}

impl<'a> Segmentation<'a> {
    /// Wraps `labels` as a segmentation volume of `shape`.
    ///
    /// # Errors
    /// Returns [`WatershedError::BufferLengthMismatch`] when `labels` does not
    /// hold exactly `shape.voxel_count()` values.
    pub fn new(labels: &'a mut [u32], shape: VolumeShape) -> Result<Self> {
        if labels.len() != shape.voxel_count() {
            return Err(WatershedError::BufferLengthMismatch {
                buffer: VolumeBuffer::Segmentation,
                expected: shape.voxel_count(),
                actual: labels.len(),
            });
        }
        Ok(Self { labels, shape })
    }

    /// Grid geometry of the volume.
    #[must_use]
    pub const fn shape(&self) -> VolumeShape {
        self.shape
    }

    /// Current labels in C order.
    #[must_use]
    pub fn labels(&self) -> &[u32] {
        &*self.labels
    }

    pub(crate) fn labels_mut(&mut self) -> &mut [u32] {
        &mut *self.labels
    }

    /// Number of voxels carrying a nonzero label.
    #[must_use]
    pub fn seed_count(&self) -> usize {
        self.labels.iter().filter(|&&label| label != 0).count()
    }
}

/// Read-only borrow of a `(3, Z, Y, X)` affinity field of `u8` magnitudes.
///
/// Plane `d` holds, at voxel `v`, the strength of the edge between `v` and
/// its backward neighbour along [`Direction`] `d`. Entries on the near border
/// of each axis have no edge and are never read.
///
/// # Examples
/// ```
/// use seedshed_core::{AffinityField, Direction};
///
/// let values = vec![255_u8; 3 * 2 * 2 * 2];
/// let field = AffinityField::new(&values, [3, 2, 2, 2])?;
/// assert_eq!(field.shape().voxel_count(), 8);
/// assert_eq!(field.weight(Direction::X, 1), Some(255));
/// # Ok::<(), seedshed_core::WatershedError>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct AffinityField<'a> {
    values: &'a [u8],
    shape: VolumeShape,
}

impl<'a> AffinityField<'a> {
    /// Wraps `values` laid out with dimensions `dims = [3, Z, Y, X]`.
    ///
    /// # Errors
    /// Returns [`WatershedError::ShapeMismatch`] when `dims[0] != 3`,
    /// [`WatershedError::VolumeTooLarge`] when the spatial extents overflow,
    /// and [`WatershedError::BufferLengthMismatch`] when `values` does not hold
    /// exactly the product of `dims`.
    pub fn new(values: &'a [u8], dims: [usize; 4]) -> Result<Self> {
        let [planes, depth, height, width] = dims;
        if planes != Direction::ALL.len() {
            return Err(WatershedError::ShapeMismatch {
                expected: [Direction::ALL.len(), depth, height, width],
                actual: dims,
            });
        }
        let shape = VolumeShape::new(depth, height, width)?;
        if values.len() != shape.edge_slot_count() {
            return Err(WatershedError::BufferLengthMismatch {
                buffer: VolumeBuffer::Affinity,
                expected: shape.edge_slot_count(),
                actual: values.len(),
            });
        }
        Ok(Self { values, shape })
    }

    /// Spatial geometry of the field.
    #[must_use]
    pub const fn shape(&self) -> VolumeShape {
        self.shape
    }

    /// Dimensions as `[3, Z, Y, X]`.
    #[must_use]
    pub const fn dims(&self) -> [usize; 4] {
        let [depth, height, width] = self.shape.dims();
        [Direction::ALL.len(), depth, height, width]
    }

    /// Raw magnitude stored for `voxel` in the plane of `direction`.
    #[must_use]
    pub fn weight(&self, direction: Direction, voxel: usize) -> Option<u8> {
        let offset = direction
            .plane()
            .checked_mul(self.shape.voxel_count())?
            .checked_add(voxel)?;
        if voxel >= self.shape.voxel_count() {
            return None;
        }
        self.values.get(offset).copied()
    }

    /// The `Z·Y·X` magnitudes of one direction's plane.
    pub(crate) fn plane(&self, direction: Direction) -> &'a [u8] {
        let len = self.shape.voxel_count();
        let start = direction.plane() * len;
        self.values.get(start..start + len).unwrap_or_default()
    }

    /// Confirms the field's spatial extents equal the segmentation's.
    ///
    /// # Errors
    /// Returns [`WatershedError::ShapeMismatch`] when any axis differs.
    pub fn ensure_congruent(&self, segmentation: &Segmentation<'_>) -> Result<()> {
        if self.shape == segmentation.shape() {
            return Ok(());
        }
        let [depth, height, width] = segmentation.shape().dims();
        Err(WatershedError::ShapeMismatch {
            expected: [Direction::ALL.len(), depth, height, width],
            actual: self.dims(),
        })
    }
}
