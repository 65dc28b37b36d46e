//! Domain-bounded Voronoi tessellation of 2D particle distributions.
//!
//! [`BoundedVoronoiMesh`] assigns every particle an exclusive polygonal
//! cell, truncates the tessellation at a rectangular domain boundary and
//! rasterizes a per-particle deposit field onto it:
//!
//! - finite Voronoi ridges are clipped against the domain
//! - ridges reaching infinity are extended outward from their finite
//!   vertex, then clipped the same way
//! - synthesized perimeter segments close the cells the boundary cut open
//! - [`BoundedVoronoiMesh::pixelize`] paints deposit density (deposit
//!   over cell area) onto a [`ScalarImage`]
//!
//! # Example
//!
//! ```
//! use glam::DVec2;
//! use sediment_mesh::{BoundedVoronoiMesh, ScalarImage};
//! use sediment_spatial::Aabb2;
//!
//! let points = vec![
//!     DVec2::new(0.25, 0.25),
//!     DVec2::new(0.75, 0.25),
//!     DVec2::new(0.75, 0.75),
//!     DVec2::new(0.25, 0.75),
//!     DVec2::new(0.5, 0.5),
//! ];
//! let bounds = Aabb2::new(DVec2::ZERO, DVec2::ONE);
//! let mesh = BoundedVoronoiMesh::new(&points, None, bounds).unwrap();
//!
//! let mut image = ScalarImage::new(64, 64);
//! mesh.pixelize(&mut image);
//! assert!(image.unwritten() < 64 * 64);
//! ```

use glam::DVec2;
use thiserror::Error;

use sediment_spatial::Aabb2;
use sediment_vector::{VoronoiDiagram, point_in_polygon, polygon_area, segment_intersection};

mod raster;

pub use raster::ScalarImage;

/// Errors that can occur during mesh construction and rasterization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// Deposit field length differs from the particle count.
    #[error("deposit field has {deposit} entries but {positions} positions were given")]
    FieldLengthMismatch {
        /// Number of deposit entries supplied.
        deposit: usize,
        /// Number of positions supplied.
        positions: usize,
    },

    /// Raster buffer length does not match its stated dimensions.
    #[error("image with {samples} samples cannot have shape {width}x{height}")]
    ImageShape {
        /// Stated width in pixels.
        width: usize,
        /// Stated height in pixels.
        height: usize,
        /// Number of samples actually supplied.
        samples: usize,
    },
}

/// A Voronoi tessellation clipped to a rectangular domain.
///
/// Built once from particle positions, an optional deposit field and the
/// domain bounds; immutable afterwards. [`segments`](Self::segments)
/// holds the clipped tessellation, including the synthesized segments
/// that run along the domain perimeter and close boundary-cut cells.
#[derive(Debug, Clone)]
pub struct BoundedVoronoiMesh {
    points: Vec<DVec2>,
    deposit_field: Option<Vec<f64>>,
    bounds: Aabb2,
    diagram: VoronoiDiagram,
    segments: Vec<(DVec2, DVec2)>,
}

impl BoundedVoronoiMesh {
    /// Builds the mesh from particle positions.
    ///
    /// A deposit field, when supplied, must have one entry per position.
    pub fn new(
        points: &[DVec2],
        deposit_field: Option<&[f64]>,
        bounds: Aabb2,
    ) -> Result<Self, MeshError> {
        if let Some(field) = deposit_field {
            if field.len() != points.len() {
                return Err(MeshError::FieldLengthMismatch {
                    deposit: field.len(),
                    positions: points.len(),
                });
            }
        }

        let diagram = VoronoiDiagram::new(points);

        let mut segments = Vec::new();
        for ridge in &diagram.ridges {
            let clipped = match ridge.ends {
                (Some(a), Some(b)) => {
                    clip_edges(diagram.vertices[a], diagram.vertices[b], bounds)
                }
                (Some(v), None) | (None, Some(v)) => {
                    let vertex = diagram.vertices[v];
                    let far = far_point(
                        vertex,
                        diagram.sites[ridge.sites.0],
                        diagram.sites[ridge.sites.1],
                        bounds,
                    );
                    clip_edges(vertex, far, bounds)
                }
                (None, None) => None,
            };
            segments.extend(clipped);
        }

        let closing = boundary_closing_segments(&segments, bounds);
        segments.extend(closing);

        Ok(Self {
            points: points.to_vec(),
            deposit_field: deposit_field.map(<[f64]>::to_vec),
            bounds,
            diagram,
            segments,
        })
    }

    /// Returns the particle positions the mesh was built from.
    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    /// Returns the deposit field, if one was supplied.
    pub fn deposit_field(&self) -> Option<&[f64]> {
        self.deposit_field.as_deref()
    }

    /// Returns the domain bounds.
    pub fn bounds(&self) -> Aabb2 {
        self.bounds
    }

    /// Returns the number of particles.
    pub fn num_particles(&self) -> usize {
        self.points.len()
    }

    /// Returns the raw unbounded diagram the mesh was clipped from.
    pub fn diagram(&self) -> &VoronoiDiagram {
        &self.diagram
    }

    /// Returns the clipped tessellation as line segments, boundary
    /// closures included. Every endpoint lies within the domain.
    pub fn segments(&self) -> &[(DVec2, DVec2)] {
        &self.segments
    }

    /// Rasterizes deposit density onto `image`, which spans the domain.
    ///
    /// Every pixel whose center falls inside a site's bounded cell
    /// receives that site's deposit (1.0 when no field was supplied)
    /// divided by the cell polygon's area. Unbounded cells are skipped,
    /// so their pixels keep whatever `image` already held. Sites are
    /// processed in ascending index order; for pixel centers exactly on
    /// a shared cell boundary the later site wins.
    pub fn pixelize(&self, image: &mut ScalarImage) {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return;
        }
        let step = self.bounds.size() / DVec2::new(width as f64, height as f64);

        for (site, region) in self.diagram.regions.iter().enumerate() {
            if !region.bounded || region.vertices.len() < 3 {
                continue;
            }
            let polygon = self.diagram.region_polygon(site);
            let area = polygon_area(&polygon).abs();
            if area == 0.0 {
                continue;
            }
            let deposit = self.deposit_field.as_ref().map_or(1.0, |f| f[site]);
            let value = deposit / area;

            // Scan only the pixels whose centers can fall inside the
            // polygon's bounding box; membership itself stays exact.
            let (lo, hi) = polygon_bounds(&polygon);
            let x_span = pixel_span(lo.x, hi.x, self.bounds.min.x, step.x, width);
            let y_span = pixel_span(lo.y, hi.y, self.bounds.min.y, step.y, height);
            let ((x0, x1), (y0, y1)) = match (x_span, y_span) {
                (Some(xs), Some(ys)) => (xs, ys),
                _ => continue,
            };

            for y in y0..=y1 {
                for x in x0..=x1 {
                    let center = image.pixel_center(x, y, self.bounds);
                    if point_in_polygon(center, &polygon) {
                        image.set(x, y, value);
                    }
                }
            }
        }
    }
}

/// Clips a segment against a rectangular domain.
///
/// Endpoints inside the half-open box (`min <= p < max`) are kept; an
/// endpoint outside it is replaced by the segment's nearest proper
/// crossing of the domain boundary. Returns `None` when an outside
/// endpoint has no boundary crossing to clip to, which discards the
/// segment. Crossings exactly through a corner or collinear with a
/// boundary edge count as no crossing.
pub fn clip_edges(v0: DVec2, v1: DVec2, bounds: Aabb2) -> Option<(DVec2, DVec2)> {
    let mut clipped = [v0, v1];
    for endpoint in &mut clipped {
        if bounds.contains_point_half_open(*endpoint) {
            continue;
        }
        let mut nearest: Option<DVec2> = None;
        for (e0, e1) in bounds.edges() {
            if let Some(hit) = segment_intersection(v0, v1, e0, e1) {
                let closer = nearest
                    .map_or(true, |n| hit.distance_squared(*endpoint) < n.distance_squared(*endpoint));
                if closer {
                    nearest = Some(hit);
                }
            }
        }
        *endpoint = nearest?;
    }
    Some((clipped[0], clipped[1]))
}

/// Extends an unbounded ridge from its finite vertex to a far point.
///
/// The direction is the normal of the tangent between the two generating
/// sites, signed to point away from the domain center, and the reach is
/// one domain width (the larger bounds extent).
fn far_point(vertex: DVec2, site_a: DVec2, site_b: DVec2, bounds: Aabb2) -> DVec2 {
    let tangent = (site_b - site_a).normalize_or_zero();
    let normal = DVec2::new(-tangent.y, tangent.x);
    let midpoint = (site_a + site_b) * 0.5;
    let outward = if normal.dot(midpoint - bounds.center()) < 0.0 {
        -normal
    } else {
        normal
    };
    vertex + outward * bounds.size().max_element()
}

/// Endpoints within this distance of a boundary line count as lying on
/// it; clipped endpoints are computed intersections, not exact values.
const BOUNDARY_SNAP: f64 = 1e-9;

/// Synthesizes the perimeter segments that close cells cut open by the
/// domain boundary.
///
/// For each of the four boundary lines, every clipped endpoint lying on
/// that line plus the line's two corners are sorted along the boundary
/// and joined consecutively.
fn boundary_closing_segments(
    clipped: &[(DVec2, DVec2)],
    bounds: Aabb2,
) -> Vec<(DVec2, DVec2)> {
    let mut closing = Vec::new();
    let low = bounds.min.to_array();
    let high = bounds.max.to_array();

    for axis in 0..2 {
        let other = 1 - axis;
        for bound in [low[axis], high[axis]] {
            let mut stops = vec![low[other], high[other]];
            for &(a, b) in clipped {
                for p in [a.to_array(), b.to_array()] {
                    if (p[axis] - bound).abs() < BOUNDARY_SNAP {
                        stops.push(p[other]);
                    }
                }
            }
            stops.sort_by(|a, b| a.partial_cmp(b).unwrap());
            stops.dedup_by(|a, b| (*a - *b).abs() < BOUNDARY_SNAP);

            for pair in stops.windows(2) {
                closing.push((
                    axis_point(axis, bound, pair[0]),
                    axis_point(axis, bound, pair[1]),
                ));
            }
        }
    }

    closing
}

/// Builds a point from a fixed coordinate on one axis and a free one on
/// the other.
fn axis_point(axis: usize, fixed: f64, free: f64) -> DVec2 {
    if axis == 0 {
        DVec2::new(fixed, free)
    } else {
        DVec2::new(free, fixed)
    }
}

fn polygon_bounds(polygon: &[DVec2]) -> (DVec2, DVec2) {
    let mut min = polygon[0];
    let mut max = polygon[0];
    for &p in &polygon[1..] {
        min = min.min(p);
        max = max.max(p);
    }
    (min, max)
}

/// Returns the inclusive pixel index range whose centers lie in
/// `[lo, hi]` along one axis.
fn pixel_span(lo: f64, hi: f64, origin: f64, step: f64, count: usize) -> Option<(usize, usize)> {
    let first = ((lo - origin) / step - 0.5).ceil().max(0.0);
    let last = ((hi - origin) / step - 0.5).floor().min(count as f64 - 1.0);
    if last < first {
        return None;
    }
    Some((first as usize, last as usize))
}
