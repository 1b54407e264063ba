//! Voxel grid geometry.
//!
//! A [`VolumeShape`] maps `(z, y, x)` coordinates to C-order linear indices
//! and answers neighbour queries by stride arithmetic, so no adjacency
//! structure ever needs to be stored.

use crate::{Result, error::WatershedError};

/// Axis along which an affinity edge connects two voxels.
///
/// The discriminant matches the leading axis of the affinity field.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Direction {
    /// Connects `(z - 1, y, x)` and `(z, y, x)`.
    Z = 0,
    /// Connects `(z, y - 1, x)` and `(z, y, x)`.
    Y = 1,
    /// Connects `(z, y, x - 1)` and `(z, y, x)`.
    X = 2,
}

impl Direction {
    /// All directions in affinity-plane order.
    pub const ALL: [Self; 3] = [Self::Z, Self::Y, Self::X];

    /// Returns the affinity plane index for this direction.
    #[must_use]
    pub const fn plane(self) -> usize {
        self as usize
    }

    /// Recovers a direction from its affinity plane index.
    #[must_use]
    pub const fn from_plane(plane: usize) -> Option<Self> {
        match plane {
            0 => Some(Self::Z),
            1 => Some(Self::Y),
            2 => Some(Self::X),
            _ => None,
        }
    }
}

/// Extents of a `(Z, Y, X)` voxel grid.
///
/// # Examples
/// ```
/// use seedshed_core::{Direction, VolumeShape};
///
/// let shape = VolumeShape::new(2, 3, 4)?;
/// assert_eq!(shape.voxel_count(), 24);
/// assert_eq!(shape.linear_index(1, 2, 3), 23);
/// assert_eq!(shape.forward_neighbour(0, Direction::Z), Some(12));
/// assert_eq!(shape.forward_neighbour(23, Direction::X), None);
/// # Ok::<(), seedshed_core::WatershedError>(())
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct VolumeShape {
    depth: usize,
    height: usize,
    width: usize,
    plane: usize,
    voxels: usize,
}

impl VolumeShape {
    /// Creates a shape with `depth` Z planes of `height` rows of `width` voxels.
    ///
    /// Zero extents are accepted and describe an empty volume.
    ///
    /// # Errors
    /// Returns [`WatershedError::VolumeTooLarge`] when the voxel count, or the
    /// three affinity planes over it, would overflow `usize`.
    pub fn new(depth: usize, height: usize, width: usize) -> Result<Self> {
        let too_large = || WatershedError::VolumeTooLarge {
            dims: [depth, height, width],
        };
        let plane = height.checked_mul(width).ok_or_else(too_large)?;
        let voxels = depth.checked_mul(plane).ok_or_else(too_large)?;
        voxels.checked_mul(Direction::ALL.len()).ok_or_else(too_large)?;
        Ok(Self {
            depth,
            height,
            width,
            plane,
            voxels,
        })
    }

    /// Number of Z planes.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Number of rows per Z plane.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Number of voxels per row.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Extents as a `[Z, Y, X]` array.
    #[must_use]
    pub const fn dims(&self) -> [usize; 3] {
        [self.depth, self.height, self.width]
    }

    /// Total voxel count `Z·Y·X`.
    #[must_use]
    pub const fn voxel_count(&self) -> usize {
        self.voxels
    }

    /// Voxels in one Z plane, `Y·X`.
    #[must_use]
    pub const fn plane_len(&self) -> usize {
        self.plane
    }

    /// Linear distance between a voxel and its neighbour along `direction`.
    #[must_use]
    pub const fn stride(&self, direction: Direction) -> usize {
        match direction {
            Direction::Z => self.plane,
            Direction::Y => self.width,
            Direction::X => 1,
        }
    }

    /// Number of voxels along `direction`.
    #[must_use]
    pub const fn extent(&self, direction: Direction) -> usize {
        match direction {
            Direction::Z => self.depth,
            Direction::Y => self.height,
            Direction::X => self.width,
        }
    }

    /// C-order linear index of `(z, y, x)`.
    ///
    /// The coordinates are not bounds-checked; callers pass coordinates
    /// inside the shape.
    #[must_use]
    pub const fn linear_index(&self, z: usize, y: usize, x: usize) -> usize {
        (z * self.height + y) * self.width + x
    }

    /// Inverse of [`Self::linear_index`]; `None` when `index` is outside the grid.
    #[must_use]
    pub const fn coordinates(&self, index: usize) -> Option<[usize; 3]> {
        if index >= self.voxels {
            return None;
        }
        let z = index / self.plane;
        let within = index % self.plane;
        Some([z, within / self.width, within % self.width])
    }

    /// Position of `index` along `direction`.
    const fn axis_position(&self, index: usize, direction: Direction) -> usize {
        match direction {
            Direction::Z => index / self.plane,
            Direction::Y => (index % self.plane) / self.width,
            Direction::X => index % self.width,
        }
    }

    /// The voxel one step forward along `direction`, if it exists.
    ///
    /// Every edge is named by its lower endpoint, so this is the only
    /// neighbour query edge enumeration needs.
    #[must_use]
    pub const fn forward_neighbour(&self, index: usize, direction: Direction) -> Option<usize> {
        if index >= self.voxels {
            return None;
        }
        if self.axis_position(index, direction) + 1 >= self.extent(direction) {
            return None;
        }
        Some(index + self.stride(direction))
    }

    /// Number of edges along `direction`: every voxel except the last layer.
    #[must_use]
    pub const fn edge_count_along(&self, direction: Direction) -> usize {
        let extent = self.extent(direction);
        if extent == 0 {
            return 0;
        }
        (self.voxels / extent) * (extent - 1)
    }

    /// Number of edges in the 6-connected grid graph.
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edge_count_along(Direction::Z)
            + self.edge_count_along(Direction::Y)
            + self.edge_count_along(Direction::X)
    }

    /// Number of `(voxel, direction)` slots, `3·Z·Y·X`; bounds every `EdgeId`.
    #[must_use]
    pub const fn edge_slot_count(&self) -> usize {
        self.voxels * Direction::ALL.len()
    }
}
