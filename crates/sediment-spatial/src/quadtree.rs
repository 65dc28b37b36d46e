use glam::DVec2;
use thiserror::Error;

use crate::Aabb2;

/// Maximum number of particles a leaf buffers before it splits.
pub const NODE_CAPACITY: usize = 4;

/// Errors that can occur during quadtree insertion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuadtreeError {
    /// A position fell outside the acting node's box.
    #[error("position {position} outside node with left edge {left_edge} and right edge {right_edge}")]
    OutOfBounds {
        /// The offending position.
        position: DVec2,
        /// Lower-left corner of the acting node.
        left_edge: DVec2,
        /// Upper-right corner of the acting node.
        right_edge: DVec2,
    },

    /// Deposit field length differs from the position count.
    #[error("deposit field has {deposit} entries but {positions} positions were given")]
    FieldLengthMismatch {
        /// Number of deposit entries supplied.
        deposit: usize,
        /// Number of positions supplied.
        positions: usize,
    },
}

/// Quadrant of a node relative to its center.
///
/// The discriminant is a 2-bit code: bit 0 is set iff `x > center.x`,
/// bit 1 is set iff `y > center.y`. The code doubles as the child slot
/// index, so dispatch is direct indexed access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    /// `x <= center.x`, `y <= center.y`.
    SouthWest = 0b00,
    /// `x > center.x`, `y <= center.y`.
    SouthEast = 0b01,
    /// `x <= center.x`, `y > center.y`.
    NorthWest = 0b10,
    /// `x > center.x`, `y > center.y`.
    NorthEast = 0b11,
}

impl Quadrant {
    /// All quadrants in child-slot order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::SouthWest,
        Quadrant::SouthEast,
        Quadrant::NorthWest,
        Quadrant::NorthEast,
    ];

    /// Classifies a position relative to a node center.
    pub fn classify(position: DVec2, center: DVec2) -> Self {
        let code = (position.x > center.x) as usize | (((position.y > center.y) as usize) << 1);
        Self::ALL[code]
    }

    /// Child slot index of this quadrant.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Unit offset from a node center toward this quadrant's child center.
    pub fn offset(self) -> DVec2 {
        match self {
            Quadrant::SouthWest => DVec2::new(-1.0, -1.0),
            Quadrant::SouthEast => DVec2::new(1.0, -1.0),
            Quadrant::NorthWest => DVec2::new(-1.0, 1.0),
            Quadrant::NorthEast => DVec2::new(1.0, 1.0),
        }
    }
}

/// A quadtree node over 2D particle positions.
///
/// Leaves buffer up to [`NODE_CAPACITY`] particles together with an
/// optional per-particle deposit value. Inserting past capacity splits
/// the node irreversibly: the buffered particles and the incoming batch
/// are redistributed among up to four lazily created children, which can
/// cascade further down. Internal nodes hold no particles of their own.
///
/// Positions must lie strictly inside the acting node's box; a batch
/// containing any position on or outside the boundary is rejected as a
/// whole. More than [`NODE_CAPACITY`] coincident positions can never be
/// separated by subdivision and will recurse without bound.
///
/// # Example
///
/// ```
/// use glam::DVec2;
/// use sediment_spatial::ParticleQuadtree;
///
/// let mut tree = ParticleQuadtree::new(DVec2::new(0.5, 0.5), 0.5);
/// tree.insert(
///     &[DVec2::new(0.25, 0.25), DVec2::new(0.75, 0.75)],
///     Some(&[1.0, 2.0]),
/// )
/// .unwrap();
///
/// assert_eq!(tree.num_particles(), 2);
/// assert!(tree.is_leaf());
/// ```
#[derive(Debug, Clone)]
pub struct ParticleQuadtree {
    center: DVec2,
    half_width: f64,
    state: NodeState,
}

#[derive(Debug, Clone)]
enum NodeState {
    /// Leaf node buffering particles directly.
    Leaf {
        positions: Vec<DVec2>,
        deposit: Option<Vec<f64>>,
    },
    /// Internal node with four lazily created children in quadrant order.
    Internal {
        children: [Option<Box<ParticleQuadtree>>; 4],
    },
}

impl ParticleQuadtree {
    /// Creates an empty leaf node, a square of side `2 * half_width`
    /// around `center`.
    pub fn new(center: DVec2, half_width: f64) -> Self {
        Self {
            center,
            half_width,
            state: NodeState::Leaf {
                positions: Vec::with_capacity(NODE_CAPACITY),
                deposit: None,
            },
        }
    }

    /// Returns the center of this node.
    pub fn center(&self) -> DVec2 {
        self.center
    }

    /// Returns the half-width of this node's square.
    pub fn half_width(&self) -> f64 {
        self.half_width
    }

    /// Returns the lower-left corner of this node's box.
    pub fn left_edge(&self) -> DVec2 {
        self.center - self.half_width
    }

    /// Returns the upper-right corner of this node's box.
    pub fn right_edge(&self) -> DVec2 {
        self.center + self.half_width
    }

    /// Returns this node's box.
    pub fn bounds(&self) -> Aabb2 {
        Aabb2::from_center_half_extents(self.center, DVec2::splat(self.half_width))
    }

    /// Returns the area of this node's box.
    ///
    /// The leaves of a tree tile their root exactly, so leaf areas sum to
    /// the root's area.
    pub fn area(&self) -> f64 {
        self.bounds().area()
    }

    /// Returns `true` if this node has never been split.
    pub fn is_leaf(&self) -> bool {
        matches!(self.state, NodeState::Leaf { .. })
    }

    /// Returns the number of particles owned by this node, transitively
    /// for internal nodes.
    pub fn num_particles(&self) -> usize {
        match &self.state {
            NodeState::Leaf { positions, .. } => positions.len(),
            NodeState::Internal { children } => {
                children.iter().flatten().map(|c| c.num_particles()).sum()
            }
        }
    }

    /// Returns the positions buffered directly in this node.
    ///
    /// Internal nodes hold no particles and return an empty slice.
    pub fn positions(&self) -> &[DVec2] {
        match &self.state {
            NodeState::Leaf { positions, .. } => positions,
            NodeState::Internal { .. } => &[],
        }
    }

    /// Returns the deposit values buffered directly in this node, if any
    /// were supplied.
    pub fn deposit(&self) -> Option<&[f64]> {
        match &self.state {
            NodeState::Leaf { deposit, .. } => deposit.as_deref(),
            NodeState::Internal { .. } => None,
        }
    }

    /// Inserts a batch of particles, splitting nodes as they overflow.
    ///
    /// Every position must lie strictly inside this node's box
    /// (`left_edge < p < right_edge` componentwise); any violation
    /// rejects the whole batch before anything is buffered. A deposit
    /// field, when supplied, must have one entry per position and is
    /// carried through every split in lockstep with the positions.
    pub fn insert(
        &mut self,
        positions: &[DVec2],
        deposit: Option<&[f64]>,
    ) -> Result<(), QuadtreeError> {
        if let Some(field) = deposit {
            if field.len() != positions.len() {
                return Err(QuadtreeError::FieldLengthMismatch {
                    deposit: field.len(),
                    positions: positions.len(),
                });
            }
        }

        let left_edge = self.left_edge();
        let right_edge = self.right_edge();
        for &p in positions {
            let inside =
                p.x > left_edge.x && p.x < right_edge.x && p.y > left_edge.y && p.y < right_edge.y;
            if !inside {
                return Err(QuadtreeError::OutOfBounds {
                    position: p,
                    left_edge,
                    right_edge,
                });
            }
        }

        match &mut self.state {
            NodeState::Leaf {
                positions: buffered,
                deposit: carried,
            } => {
                if buffered.len() + positions.len() <= NODE_CAPACITY {
                    let buffered_len = buffered.len();
                    buffered.extend_from_slice(positions);
                    *carried = merge_deposits(carried.take(), buffered_len, deposit, positions.len());
                    return Ok(());
                }

                // Overflow: drain the leaf buffer, merge it with the
                // incoming batch and convert this node to internal.
                let buffered_len = buffered.len();
                let mut merged = std::mem::take(buffered);
                merged.extend_from_slice(positions);
                let merged_deposit =
                    merge_deposits(carried.take(), buffered_len, deposit, positions.len());

                self.state = NodeState::Internal {
                    children: [None, None, None, None],
                };
                self.partition(&merged, merged_deposit.as_deref())
            }
            NodeState::Internal { .. } => self.partition(positions, deposit),
        }
    }

    /// Inserts a single particle without a deposit value.
    pub fn insert_one(&mut self, position: DVec2) -> Result<(), QuadtreeError> {
        self.insert(&[position], None)
    }

    /// Partitions a batch by quadrant code and recursively inserts each
    /// non-empty subset into the corresponding (lazily created) child.
    fn partition(
        &mut self,
        positions: &[DVec2],
        deposit: Option<&[f64]>,
    ) -> Result<(), QuadtreeError> {
        let mut position_buckets: [Vec<DVec2>; 4] = Default::default();
        let mut deposit_buckets: [Vec<f64>; 4] = Default::default();
        for (i, &p) in positions.iter().enumerate() {
            let slot = Quadrant::classify(p, self.center).index();
            position_buckets[slot].push(p);
            if let Some(field) = deposit {
                deposit_buckets[slot].push(field[i]);
            }
        }

        let center = self.center;
        let half_width = self.half_width;
        if let NodeState::Internal { children } = &mut self.state {
            for quadrant in Quadrant::ALL {
                let slot = quadrant.index();
                if position_buckets[slot].is_empty() {
                    continue;
                }
                let child = children[slot].get_or_insert_with(|| {
                    Box::new(ParticleQuadtree::new(
                        center + half_width / 2.0 * quadrant.offset(),
                        half_width / 2.0,
                    ))
                });
                let child_deposit = deposit.map(|_| deposit_buckets[slot].as_slice());
                child.insert(&position_buckets[slot], child_deposit)?;
            }
        }
        Ok(())
    }

    /// Returns the non-empty children in SW, SE, NW, NE order.
    pub fn children(&self) -> impl Iterator<Item = &ParticleQuadtree> {
        let children: Vec<&ParticleQuadtree> = match &self.state {
            NodeState::Leaf { .. } => Vec::new(),
            NodeState::Internal { children } => {
                children.iter().flatten().map(|c| c.as_ref()).collect()
            }
        };
        children.into_iter()
    }

    /// Returns every leaf reachable from this node, depth-first in
    /// SW, SE, NW, NE order. Each call re-walks the tree.
    pub fn leaves(&self) -> impl Iterator<Item = &ParticleQuadtree> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves.into_iter()
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a ParticleQuadtree>) {
        match &self.state {
            NodeState::Leaf { .. } => leaves.push(self),
            NodeState::Internal { children } => {
                for child in children.iter().flatten() {
                    child.collect_leaves(leaves);
                }
            }
        }
    }
}

/// Appends an optional incoming deposit slice to an optional buffered
/// one, backfilling zeros for particles that never carried a value.
fn merge_deposits(
    buffered: Option<Vec<f64>>,
    buffered_len: usize,
    incoming: Option<&[f64]>,
    incoming_len: usize,
) -> Option<Vec<f64>> {
    match (buffered, incoming) {
        (None, None) => None,
        (Some(mut values), Some(new)) => {
            values.extend_from_slice(new);
            Some(values)
        }
        (Some(mut values), None) => {
            values.resize(buffered_len + incoming_len, 0.0);
            Some(values)
        }
        (None, Some(new)) => {
            let mut values = vec![0.0; buffered_len];
            values.extend_from_slice(new);
            Some(values)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Simple LCG random number generator for deterministic point clouds.
    struct Rng {
        state: u64,
    }

    impl Rng {
        fn new(seed: u64) -> Self {
            Self {
                state: seed.wrapping_add(1),
            }
        }

        fn next_u64(&mut self) -> u64 {
            self.state = self
                .state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            self.state
        }

        fn next_f64(&mut self) -> f64 {
            (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
        }

        /// Roughly normal around 0.5: mean of eight uniform draws.
        fn clustered(&mut self) -> f64 {
            let mut sum = 0.0;
            for _ in 0..8 {
                sum += self.next_f64();
            }
            sum / 8.0
        }
    }

    fn clustered_positions(count: usize, seed: u64) -> Vec<DVec2> {
        let mut rng = Rng::new(seed);
        (0..count)
            .map(|_| DVec2::new(rng.clustered(), rng.clustered()))
            .collect()
    }

    fn unit_tree() -> ParticleQuadtree {
        ParticleQuadtree::new(DVec2::new(0.5, 0.5), 0.5)
    }

    #[test]
    fn test_quadrant_codes() {
        let center = DVec2::new(0.5, 0.5);
        assert_eq!(
            Quadrant::classify(DVec2::new(0.2, 0.2), center),
            Quadrant::SouthWest
        );
        assert_eq!(
            Quadrant::classify(DVec2::new(0.8, 0.2), center),
            Quadrant::SouthEast
        );
        assert_eq!(
            Quadrant::classify(DVec2::new(0.2, 0.8), center),
            Quadrant::NorthWest
        );
        assert_eq!(
            Quadrant::classify(DVec2::new(0.8, 0.8), center),
            Quadrant::NorthEast
        );
        // Positions exactly on the center line go to the low side.
        assert_eq!(Quadrant::classify(center, center), Quadrant::SouthWest);
    }

    #[test]
    fn test_insert_within_capacity_stays_leaf() {
        let mut tree = unit_tree();
        tree.insert(
            &[
                DVec2::new(0.1, 0.1),
                DVec2::new(0.9, 0.1),
                DVec2::new(0.9, 0.9),
                DVec2::new(0.1, 0.9),
            ],
            None,
        )
        .unwrap();

        assert!(tree.is_leaf());
        assert_eq!(tree.num_particles(), 4);
        assert_eq!(tree.positions().len(), 4);
    }

    #[test]
    fn test_overflow_splits_and_redistributes() {
        let mut tree = unit_tree();
        tree.insert(
            &[
                DVec2::new(0.1, 0.1),
                DVec2::new(0.9, 0.1),
                DVec2::new(0.9, 0.9),
                DVec2::new(0.1, 0.9),
                DVec2::new(0.2, 0.2),
            ],
            None,
        )
        .unwrap();

        assert!(!tree.is_leaf());
        assert_eq!(tree.positions().len(), 0);
        assert_eq!(tree.num_particles(), 5);
        // One particle per quadrant except SW, which got two.
        let counts: Vec<usize> = tree.children().map(|c| c.num_particles()).collect();
        assert_eq!(counts, vec![2, 1, 1, 1]);
    }

    #[test]
    fn test_split_is_irreversible() {
        let mut tree = unit_tree();
        for i in 0..5 {
            let offset = 0.1 + 0.15 * i as f64;
            tree.insert_one(DVec2::new(offset, offset)).unwrap();
        }
        assert!(!tree.is_leaf());
        // Nothing ever merges a split node back into a leaf.
        tree.insert_one(DVec2::new(0.9, 0.9)).unwrap();
        assert!(!tree.is_leaf());
    }

    #[test]
    fn test_out_of_bounds_rejects_whole_batch() {
        let mut tree = unit_tree();
        let result = tree.insert(&[DVec2::new(0.5, 0.5), DVec2::new(1.5, 0.5)], None);
        assert!(matches!(result, Err(QuadtreeError::OutOfBounds { .. })));
        assert_eq!(tree.num_particles(), 0);
    }

    #[test]
    fn test_position_on_edge_is_rejected() {
        let mut tree = unit_tree();
        assert!(tree.insert_one(DVec2::new(0.0, 0.5)).is_err());
        assert!(tree.insert_one(DVec2::new(1.0, 0.5)).is_err());
        assert!(tree.insert_one(DVec2::new(0.5, 0.0)).is_err());
        assert!(tree.insert_one(DVec2::new(0.5, 1.0)).is_err());
        assert_eq!(tree.num_particles(), 0);
    }

    #[test]
    fn test_field_length_mismatch() {
        let mut tree = unit_tree();
        let result = tree.insert(&[DVec2::new(0.5, 0.5)], Some(&[1.0, 2.0]));
        assert_eq!(
            result,
            Err(QuadtreeError::FieldLengthMismatch {
                deposit: 2,
                positions: 1,
            })
        );
        assert_eq!(tree.num_particles(), 0);
    }

    #[test]
    fn test_conservation_clustered_1000() {
        let positions = clustered_positions(1000, 0x4d3d3d3);
        let mut tree = unit_tree();
        tree.insert(&positions, None).unwrap();

        let total: usize = tree.leaves().map(|leaf| leaf.num_particles()).sum();
        assert_eq!(total, 1000);
    }

    #[test]
    fn test_field_conservation_clustered_1000() {
        let positions = clustered_positions(1000, 0x4d3d3d3);
        let deposit = vec![1.0; 1000];
        let mut tree = unit_tree();
        tree.insert(&positions, Some(&deposit)).unwrap();

        let total: f64 = tree
            .leaves()
            .map(|leaf| leaf.deposit().map_or(0.0, |d| d.iter().sum()))
            .sum();
        assert!((total - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_leaf_areas_tile_the_root() {
        let positions = clustered_positions(1000, 0xdeadbeef);
        let mut tree = unit_tree();
        tree.insert(&positions, None).unwrap();

        let total: f64 = tree.leaves().map(|leaf| leaf.area()).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_leaf_capacity_and_containment() {
        let positions = clustered_positions(1000, 0x5eed);
        let mut tree = unit_tree();
        tree.insert(&positions, None).unwrap();

        for leaf in tree.leaves() {
            assert!(leaf.num_particles() <= NODE_CAPACITY);
            let left_edge = leaf.left_edge();
            let right_edge = leaf.right_edge();
            for &p in leaf.positions() {
                assert!(p.x >= left_edge.x && p.x < right_edge.x);
                assert!(p.y >= left_edge.y && p.y < right_edge.y);
            }
        }
    }

    #[test]
    fn test_deposit_follows_positions_through_splits() {
        let mut tree = unit_tree();
        let positions = [
            DVec2::new(0.1, 0.1),
            DVec2::new(0.9, 0.1),
            DVec2::new(0.9, 0.9),
            DVec2::new(0.1, 0.9),
            DVec2::new(0.2, 0.2),
        ];
        let deposit = [1.0, 2.0, 3.0, 4.0, 5.0];
        tree.insert(&positions, Some(&deposit)).unwrap();

        for leaf in tree.leaves() {
            let values = leaf.deposit().unwrap();
            assert_eq!(values.len(), leaf.num_particles());
            for (p, &value) in leaf.positions().iter().zip(values) {
                let original = positions.iter().position(|q| q == p).unwrap();
                assert_eq!(value, deposit[original]);
            }
        }
    }

    #[test]
    fn test_children_in_quadrant_order() {
        let mut tree = unit_tree();
        tree.insert(
            &[
                DVec2::new(0.2, 0.2),
                DVec2::new(0.8, 0.2),
                DVec2::new(0.2, 0.8),
                DVec2::new(0.8, 0.8),
                DVec2::new(0.3, 0.3),
            ],
            None,
        )
        .unwrap();

        let centers: Vec<DVec2> = tree.children().map(|c| c.center()).collect();
        assert_eq!(
            centers,
            vec![
                DVec2::new(0.25, 0.25),
                DVec2::new(0.75, 0.25),
                DVec2::new(0.25, 0.75),
                DVec2::new(0.75, 0.75),
            ]
        );
        for child in tree.children() {
            assert_eq!(child.half_width(), 0.25);
        }
    }

    #[test]
    fn test_leaves_restartable() {
        let positions = clustered_positions(100, 7);
        let mut tree = unit_tree();
        tree.insert(&positions, None).unwrap();

        let first: usize = tree.leaves().count();
        let second: usize = tree.leaves().count();
        assert_eq!(first, second);
    }
}
