//! Spatial partitioning for 2D particle distributions.
//!
//! This crate provides the spatial half of the sediment toolkit:
//!
//! - [`ParticleQuadtree`] - a capacity-bounded quadtree that buckets 2D
//!   particles into leaf nodes, optionally carrying one scalar deposit
//!   value per particle
//! - [`Aabb2`] - the f64 axis-aligned box used for node extents and
//!   tessellation domains
//!
//! # Example
//!
//! ```
//! use glam::DVec2;
//! use sediment_spatial::ParticleQuadtree;
//!
//! let mut tree = ParticleQuadtree::new(DVec2::new(0.5, 0.5), 0.5);
//!
//! // Bulk-insert particles; the tree splits nodes as they fill up.
//! let positions = vec![
//!     DVec2::new(0.2, 0.2),
//!     DVec2::new(0.8, 0.2),
//!     DVec2::new(0.8, 0.8),
//!     DVec2::new(0.2, 0.8),
//!     DVec2::new(0.5001, 0.5001),
//! ];
//! tree.insert(&positions, None).unwrap();
//!
//! let total: usize = tree.leaves().map(|leaf| leaf.num_particles()).sum();
//! assert_eq!(total, 5);
//! ```

use glam::DVec2;

mod quadtree;

pub use quadtree::*;

/// 2D axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb2 {
    /// Minimum corner (lower-left).
    pub min: DVec2,
    /// Maximum corner (upper-right).
    pub max: DVec2,
}

impl Aabb2 {
    /// Creates a new AABB from min and max corners.
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Creates an AABB from center and half-extents.
    pub fn from_center_half_extents(center: DVec2, half_extents: DVec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Returns the center of the AABB.
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Returns the half-extents (half-size) of the AABB.
    pub fn half_extents(&self) -> DVec2 {
        (self.max - self.min) * 0.5
    }

    /// Returns the size of the AABB.
    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    /// Returns the extent along the x axis.
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Returns the extent along the y axis.
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Returns the enclosed area.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Checks if this AABB contains a point (boundary inclusive).
    pub fn contains_point(&self, point: DVec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Checks if this AABB contains a point with half-open semantics
    /// (`min <= point < max` componentwise).
    pub fn contains_point_half_open(&self, point: DVec2) -> bool {
        point.x >= self.min.x
            && point.x < self.max.x
            && point.y >= self.min.y
            && point.y < self.max.y
    }

    /// Returns the four corners in counter-clockwise order starting at `min`.
    pub fn corners(&self) -> [DVec2; 4] {
        [
            self.min,
            DVec2::new(self.max.x, self.min.y),
            self.max,
            DVec2::new(self.min.x, self.max.y),
        ]
    }

    /// Returns the four boundary segments in counter-clockwise order:
    /// bottom, right, top, left.
    pub fn edges(&self) -> [(DVec2, DVec2); 4] {
        let [a, b, c, d] = self.corners();
        [(a, b), (b, c), (c, d), (d, a)]
    }
}
