//! 2D computational geometry for particle tessellation.
//!
//! Provides the segment, polygon and Delaunay/Voronoi primitives the
//! mesh crate builds on:
//!
//! - [`segment_intersection`] - proper segment-segment crossing test
//! - [`point_in_polygon`] / [`polygon_area`] - polygon membership and
//!   shoelace area
//! - [`delaunay_triangulation`] / [`VoronoiDiagram`] - Bowyer-Watson
//!   triangulation and its Voronoi dual
//!
//! The [`VoronoiDiagram`] produced here is the raw, unbounded diagram;
//! ridges reaching infinity keep an explicit `None` end. Clipping the
//! diagram to a finite domain is the mesh crate's job.

mod delaunay;
mod geometry;

pub use delaunay::{Region, Ridge, Triangle, VoronoiDiagram, delaunay_triangulation};
pub use geometry::{point_in_polygon, polygon_area, segment_intersection};
