//! Implicit 6-connected graph over an affinity field.
//!
//! Nothing is materialized: an edge is named by an [`EdgeId`] that packs its
//! lower endpoint and direction, and its upper endpoint and weight are derived
//! from stride arithmetic and a single read of the affinity plane.

use std::ops::Range;

use crate::{
    shape::{Direction, VolumeShape},
    volume::AffinityField,
};

/// Identifier of one `(lower voxel, direction)` edge slot.
///
/// The natural order of identifiers is increasing lower endpoint, then
/// direction, which is the deterministic tie-break between equal weights.
///
/// # Examples
/// ```
/// use seedshed_core::{Direction, EdgeId};
///
/// let id = EdgeId::new(4, Direction::Y).expect("slot fits in usize");
/// assert_eq!(id.lower(), 4);
/// assert_eq!(id.direction(), Direction::Y);
/// assert!(EdgeId::new(4, Direction::X) > Some(id));
/// assert!(EdgeId::new(5, Direction::Z) > EdgeId::new(4, Direction::X));
/// assert_eq!(EdgeId::new(usize::MAX, Direction::Z), None);
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct EdgeId(usize);

impl EdgeId {
    /// Identifier of the edge leaving `lower` forward along `direction`, or
    /// `None` when the packed slot overflows `usize`.
    #[must_use]
    pub const fn new(lower: usize, direction: Direction) -> Option<Self> {
        match lower.checked_mul(Direction::ALL.len()) {
            Some(base) => match base.checked_add(direction.plane()) {
                Some(slot) => Some(Self(slot)),
                None => None,
            },
            None => None,
        }
    }

    pub(crate) const fn from_slot(slot: usize) -> Self {
        Self(slot)
    }

    /// The packed slot index, `lower · 3 + direction`.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// The lower-numbered endpoint.
    #[must_use]
    pub const fn lower(self) -> usize {
        self.0 / Direction::ALL.len()
    }

    /// The axis the edge runs along.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match Direction::from_plane(self.0 % Direction::ALL.len()) {
            Some(direction) => direction,
            None => Direction::X,
        }
    }
}

/// A resolved edge: both endpoints and the raw affinity magnitude.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct AffinityEdge {
    id: EdgeId,
    upper: usize,
    weight: u8,
}

impl AffinityEdge {
    /// Builds an edge directly; used for synthetic edge lists in tests and
    /// callers driving the union-find engine without a volume.
    #[must_use]
    pub const fn new(id: EdgeId, upper: usize, weight: u8) -> Self {
        Self { id, upper, weight }
    }

    /// The edge identifier.
    #[must_use]
    pub const fn id(&self) -> EdgeId {
        self.id
    }

    /// The lower-numbered endpoint (the backward neighbour).
    #[must_use]
    pub const fn lower(&self) -> usize {
        self.id.lower()
    }

    /// The higher-numbered endpoint (the voxel holding the affinity entry).
    #[must_use]
    pub const fn upper(&self) -> usize {
        self.upper
    }

    /// The axis the edge runs along.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.id.direction()
    }

    /// The raw affinity magnitude.
    #[must_use]
    pub const fn weight(&self) -> u8 {
        self.weight
    }
}

/// Read-only adapter enumerating the valid edges of an [`AffinityField`].
///
/// # Examples
/// ```
/// use seedshed_core::{AffinityField, AffinityGraph};
///
/// let values = vec![200_u8; 3 * 3 * 3 * 3];
/// let field = AffinityField::new(&values, [3, 3, 3, 3])?;
/// let graph = AffinityGraph::new(&field);
/// assert_eq!(graph.edges().count(), graph.edge_count());
/// assert_eq!(graph.edge_count(), 54);
/// # Ok::<(), seedshed_core::WatershedError>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct AffinityGraph<'a> {
    shape: VolumeShape,
    planes: [&'a [u8]; 3],
}

impl<'a> AffinityGraph<'a> {
    /// Creates a view over `field`.
    #[must_use]
    pub fn new(field: &AffinityField<'a>) -> Self {
        Self {
            shape: field.shape(),
            planes: Direction::ALL.map(|direction| field.plane(direction)),
        }
    }

    /// Grid geometry of the underlying volume.
    #[must_use]
    pub const fn shape(&self) -> VolumeShape {
        self.shape
    }

    /// Number of valid edges.
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.shape.edge_count()
    }

    /// Resolves `id`, or `None` when the slot has no forward neighbour.
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<AffinityEdge> {
        let direction = id.direction();
        let upper = self.shape.forward_neighbour(id.lower(), direction)?;
        let weight = *self.planes.get(direction.plane())?.get(upper)?;
        Some(AffinityEdge::new(id, upper, weight))
    }

    /// Weight of `id`, or `None` when the slot has no forward neighbour.
    #[must_use]
    pub fn weight(&self, id: EdgeId) -> Option<u8> {
        self.edge(id).map(|edge| edge.weight())
    }

    /// Every valid edge in increasing [`EdgeId`] order.
    pub fn edges(&self) -> impl Iterator<Item = AffinityEdge> + '_ {
        self.edges_in_slab(0..self.shape.depth())
    }

    /// Edges whose lower endpoint lies in the Z planes `planes`, in
    /// increasing [`EdgeId`] order. Planes past the volume are ignored.
    pub fn edges_in_slab(&self, planes: Range<usize>) -> impl Iterator<Item = AffinityEdge> + '_ {
        let slots = self.slab_slots(planes);
        slots.filter_map(move |slot| self.edge(EdgeId::from_slot(slot)))
    }

    fn slab_slots(&self, planes: Range<usize>) -> Range<usize> {
        let depth = self.shape.depth();
        let per_plane = self.shape.plane_len() * Direction::ALL.len();
        let start = planes.start.min(depth) * per_plane;
        let end = planes.end.min(depth).max(planes.start.min(depth)) * per_plane;
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use rstest::rstest;

    fn ramp_field(dims: [usize; 4]) -> Vec<u8> {
        (0..dims.iter().product::<usize>())
            .map(|index| (index % 251) as u8)
            .collect()
    }

    #[rstest]
    #[case::cube([3, 3, 3, 3])]
    #[case::flat([3, 1, 4, 5])]
    #[case::column([3, 6, 1, 1])]
    #[case::single([3, 1, 1, 1])]
    fn enumerates_each_edge_once_in_id_order(#[case] dims: [usize; 4]) {
        let values = ramp_field(dims);
        let field = AffinityField::new(&values, dims).expect("field must be valid");
        let graph = AffinityGraph::new(&field);

        let edges: Vec<_> = graph.edges().collect();
        assert_eq!(edges.len(), graph.edge_count());
        assert!(edges.windows(2).all(|pair| pair[0].id() < pair[1].id()));

        let mut pairs = HashSet::new();
        for edge in &edges {
            assert!(edge.upper() < graph.shape().voxel_count());
            assert_eq!(
                edge.upper() - edge.lower(),
                graph.shape().stride(edge.direction())
            );
            assert!(pairs.insert((edge.lower(), edge.upper())));
        }
    }

    fn id(lower: usize, direction: Direction) -> EdgeId {
        EdgeId::new(lower, direction).expect("test slots fit in usize")
    }

    #[test]
    fn packed_slots_reject_overflow() {
        // usize::MAX is a multiple of three, so only the Z slot of `last` fits.
        let last = usize::MAX / 3;
        assert_eq!(EdgeId::new(last, Direction::Z).map(EdgeId::get), Some(usize::MAX));
        assert_eq!(EdgeId::new(last, Direction::Y), None);
        assert_eq!(EdgeId::new(last, Direction::X), None);
        assert_eq!(EdgeId::new(last + 1, Direction::Z), None);
    }

    #[test]
    fn weight_is_read_from_the_upper_endpoint() {
        let dims = [3, 2, 2, 2];
        let mut values = vec![0_u8; 24];
        // plane Z, voxel (1, 0, 1) = index 5
        values[5] = 77;
        let field = AffinityField::new(&values, dims).expect("field must be valid");
        let graph = AffinityGraph::new(&field);
        let edge = graph
            .edge(id(1, Direction::Z))
            .expect("voxel 1 has a forward Z neighbour");
        assert_eq!(edge.upper(), 5);
        assert_eq!(edge.weight(), 77);
    }

    #[test]
    fn border_slots_have_no_edge() {
        let values = vec![1_u8; 3 * 8];
        let field = AffinityField::new(&values, [3, 2, 2, 2]).expect("field must be valid");
        let graph = AffinityGraph::new(&field);
        assert_eq!(graph.edge(id(7, Direction::Z)), None);
        assert_eq!(graph.weight(id(1, Direction::X)), None);
        assert_eq!(graph.weight(id(8, Direction::Z)), None);
    }

    #[test]
    fn slabs_partition_the_edge_stream() {
        let dims = [3, 5, 3, 4];
        let values = ramp_field(dims);
        let field = AffinityField::new(&values, dims).expect("field must be valid");
        let graph = AffinityGraph::new(&field);

        let stitched: Vec<_> = [0..2, 2..3, 3..9]
            .into_iter()
            .flat_map(|planes| graph.edges_in_slab(planes).collect::<Vec<_>>())
            .collect();
        let whole: Vec<_> = graph.edges().collect();
        assert_eq!(stitched, whole);
    }
}
