//! Delaunay triangulation and Voronoi diagrams.
//!
//! Implements the Bowyer-Watson algorithm for Delaunay triangulation and
//! derives the Voronoi diagram as its dual: one vertex per triangle
//! circumcenter, one ridge per Delaunay edge and one polygonal region
//! per site. Ridges dual to convex-hull edges extend to infinity and
//! keep an explicit `None` end rather than a sentinel index.

use std::collections::{HashMap, HashSet};

use glam::DVec2;

/// A triangle defined by three vertex indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Triangle {
    /// First vertex index.
    pub a: usize,
    /// Second vertex index.
    pub b: usize,
    /// Third vertex index.
    pub c: usize,
}

impl Triangle {
    /// Creates a new triangle.
    pub fn new(a: usize, b: usize, c: usize) -> Self {
        Self { a, b, c }
    }

    /// Returns the vertices as an array.
    pub fn vertices(&self) -> [usize; 3] {
        [self.a, self.b, self.c]
    }

    /// Returns the edges as pairs of vertex indices, normalized to
    /// (min, max).
    pub fn edges(&self) -> [(usize, usize); 3] {
        [
            (self.a.min(self.b), self.a.max(self.b)),
            (self.b.min(self.c), self.b.max(self.c)),
            (self.c.min(self.a), self.c.max(self.a)),
        ]
    }

    /// Checks if the triangle contains a vertex index.
    pub fn contains_vertex(&self, v: usize) -> bool {
        self.a == v || self.b == v || self.c == v
    }
}

/// One ridge of a Voronoi diagram: the edge separating the cells of two
/// neighboring sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ridge {
    /// Indices of the two generating sites the ridge separates.
    pub sites: (usize, usize),
    /// Indices into [`VoronoiDiagram::vertices`]; a `None` end extends
    /// to infinity.
    pub ends: (Option<usize>, Option<usize>),
}

impl Ridge {
    /// Returns `true` if both ends are finite vertices.
    pub fn is_finite(&self) -> bool {
        self.ends.0.is_some() && self.ends.1.is_some()
    }
}

/// The polygonal region owned by one site.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    /// Vertex indices in counter-clockwise order around the site.
    pub vertices: Vec<usize>,
    /// `false` when the region extends to infinity, which happens iff
    /// the site lies on the convex hull of the input.
    pub bounded: bool,
}

/// An unbounded Voronoi diagram: vertices, ridges and per-site regions.
///
/// # Example
///
/// ```
/// use glam::DVec2;
/// use sediment_vector::VoronoiDiagram;
///
/// let points = vec![
///     DVec2::new(0.0, 0.0),
///     DVec2::new(1.0, 0.0),
///     DVec2::new(0.5, 1.0),
/// ];
///
/// let diagram = VoronoiDiagram::new(&points);
/// assert_eq!(diagram.regions.len(), 3); // One region per site
/// assert_eq!(diagram.vertices.len(), 1); // One triangle, one circumcenter
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoronoiDiagram {
    /// The original sites (points).
    pub sites: Vec<DVec2>,
    /// All Voronoi vertices (circumcenters of Delaunay triangles).
    pub vertices: Vec<DVec2>,
    /// All ridges, one per Delaunay edge.
    pub ridges: Vec<Ridge>,
    /// The regions, one per site.
    pub regions: Vec<Region>,
}

impl VoronoiDiagram {
    /// Computes the Voronoi diagram of a set of sites.
    ///
    /// Fewer than 3 sites cannot be triangulated and yield a diagram
    /// with no vertices or ridges, every region empty and unbounded.
    pub fn new(points: &[DVec2]) -> Self {
        let triangles = delaunay_triangulation(points);
        if triangles.is_empty() {
            return Self {
                sites: points.to_vec(),
                vertices: Vec::new(),
                ridges: Vec::new(),
                regions: vec![
                    Region {
                        vertices: Vec::new(),
                        bounded: false,
                    };
                    points.len()
                ],
            };
        }

        // One Voronoi vertex per triangle circumcenter.
        let vertices: Vec<DVec2> = triangles
            .iter()
            .map(|tri| {
                let a = points[tri.a];
                let b = points[tri.b];
                let c = points[tri.c];
                // Fallback for degenerate triangles
                circumcenter(a, b, c).unwrap_or((a + b + c) / 3.0)
            })
            .collect();

        // Map each Delaunay edge to the triangles sharing it.
        let mut edge_triangles: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for (ti, tri) in triangles.iter().enumerate() {
            for edge in tri.edges() {
                edge_triangles.entry(edge).or_default().push(ti);
            }
        }

        // One ridge per Delaunay edge; hull edges have a single adjacent
        // triangle and their dual ridge runs off to infinity.
        let mut on_hull = vec![false; points.len()];
        let mut ridges = Vec::with_capacity(edge_triangles.len());
        let mut seen_edges = HashSet::new();
        for tri in &triangles {
            for edge in tri.edges() {
                if !seen_edges.insert(edge) {
                    continue;
                }
                let adjacent = &edge_triangles[&edge];
                let ends = match adjacent.as_slice() {
                    [t0, t1] => (Some(*t0), Some(*t1)),
                    [t0] => {
                        on_hull[edge.0] = true;
                        on_hull[edge.1] = true;
                        (Some(*t0), None)
                    }
                    _ => continue, // Degenerate: edge shared by >2 triangles
                };
                ridges.push(Ridge { sites: edge, ends });
            }
        }

        // Build regions: the circumcenters of the triangles around each
        // site, sorted counter-clockwise. The angular sort is valid
        // because every Voronoi cell is convex and contains its site.
        let mut site_triangles: Vec<Vec<usize>> = vec![Vec::new(); points.len()];
        for (ti, tri) in triangles.iter().enumerate() {
            site_triangles[tri.a].push(ti);
            site_triangles[tri.b].push(ti);
            site_triangles[tri.c].push(ti);
        }

        let regions = site_triangles
            .iter()
            .enumerate()
            .map(|(pi, incident)| {
                let site = points[pi];
                let mut around: Vec<usize> = incident.clone();
                around.sort_by(|&i, &j| {
                    let ai = angle_around(site, vertices[i]);
                    let aj = angle_around(site, vertices[j]);
                    ai.partial_cmp(&aj).unwrap()
                });
                Region {
                    bounded: !on_hull[pi] && !around.is_empty(),
                    vertices: around,
                }
            })
            .collect();

        Self {
            sites: points.to_vec(),
            vertices,
            ridges,
            regions,
        }
    }

    /// Returns the polygon of a region as vertex coordinates.
    pub fn region_polygon(&self, site: usize) -> Vec<DVec2> {
        self.regions[site]
            .vertices
            .iter()
            .map(|&v| self.vertices[v])
            .collect()
    }
}

fn angle_around(site: DVec2, vertex: DVec2) -> f64 {
    let d = vertex - site;
    d.y.atan2(d.x)
}

/// Computes the Delaunay triangulation of a set of points.
///
/// Uses the Bowyer-Watson algorithm. Returns triangles as vertex
/// indices; fewer than 3 points yield no triangles.
pub fn delaunay_triangulation(points: &[DVec2]) -> Vec<Triangle> {
    if points.len() < 3 {
        return Vec::new();
    }

    // Create super-triangle that contains all points
    let super_tri = create_super_triangle(points);

    // Extended points list including super-triangle vertices
    let n = points.len();
    let mut all_points: Vec<DVec2> = points.to_vec();
    all_points.extend_from_slice(&super_tri);

    // Start with super-triangle
    let mut triangles = vec![Triangle {
        a: n,
        b: n + 1,
        c: n + 2,
    }];

    // Insert each point
    for i in 0..n {
        let point = all_points[i];

        // Find triangles whose circumcircle contains this point
        let mut bad_triangles = Vec::new();
        for (ti, tri) in triangles.iter().enumerate() {
            let (center, radius_sq) = circumcircle(&all_points, tri);
            let dist_sq = (point - center).length_squared();
            if dist_sq <= radius_sq + 1e-10 {
                bad_triangles.push(ti);
            }
        }

        // Find the boundary of the polygonal hole
        let mut polygon = Vec::new();
        for &ti in &bad_triangles {
            let tri = &triangles[ti];
            let edges = [(tri.a, tri.b), (tri.b, tri.c), (tri.c, tri.a)];

            for edge in edges {
                let is_shared = bad_triangles.iter().any(|&other_ti| {
                    if other_ti == ti {
                        return false;
                    }
                    let other = &triangles[other_ti];
                    let other_edges = [(other.a, other.b), (other.b, other.c), (other.c, other.a)];
                    other_edges.contains(&edge) || other_edges.contains(&(edge.1, edge.0))
                });

                if !is_shared {
                    polygon.push(edge);
                }
            }
        }

        // Remove bad triangles (in reverse order to preserve indices)
        bad_triangles.sort_unstable();
        for ti in bad_triangles.into_iter().rev() {
            triangles.swap_remove(ti);
        }

        // Create new triangles from polygon edges to the new point
        for (e1, e2) in polygon {
            triangles.push(Triangle { a: e1, b: e2, c: i });
        }
    }

    // Remove triangles that share vertices with super-triangle
    triangles.retain(|tri| tri.a < n && tri.b < n && tri.c < n);

    triangles
}

/// Creates a super-triangle that contains all points.
fn create_super_triangle(points: &[DVec2]) -> [DVec2; 3] {
    // Find bounding box
    let mut min = points[0];
    let mut max = points[0];
    for &p in points {
        min = min.min(p);
        max = max.max(p);
    }

    let dx = max.x - min.x;
    let dy = max.y - min.y;
    let delta_max = dx.max(dy).max(1.0);
    let mid_x = (min.x + max.x) / 2.0;
    let mid_y = (min.y + max.y) / 2.0;

    // Create large triangle that definitely contains all points
    [
        DVec2::new(mid_x - 20.0 * delta_max, mid_y - delta_max),
        DVec2::new(mid_x, mid_y + 20.0 * delta_max),
        DVec2::new(mid_x + 20.0 * delta_max, mid_y - delta_max),
    ]
}

/// Computes circumcircle center and squared radius, falling back to the
/// centroid for degenerate (collinear) triangles.
fn circumcircle(points: &[DVec2], tri: &Triangle) -> (DVec2, f64) {
    let a = points[tri.a];
    let b = points[tri.b];
    let c = points[tri.c];

    match circumcenter(a, b, c) {
        Some(center) => {
            let radius_sq = (a - center).length_squared();
            (center, radius_sq)
        }
        None => {
            let center = (a + b + c) / 3.0;
            let radius_sq = (a - center)
                .length_squared()
                .max((b - center).length_squared());
            (center, radius_sq)
        }
    }
}

/// Computes the circumcenter of a triangle, or `None` for collinear
/// vertices.
fn circumcenter(a: DVec2, b: DVec2, c: DVec2) -> Option<DVec2> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));

    if d.abs() < 1e-12 {
        return None;
    }

    let a_sq = a.x * a.x + a.y * a.y;
    let b_sq = b.x * b.x + b.y * b.y;
    let c_sq = c.x * c.x + c.y * c.y;

    let ux = (a_sq * (b.y - c.y) + b_sq * (c.y - a.y) + c_sq * (a.y - b.y)) / d;
    let uy = (a_sq * (c.x - b.x) + b_sq * (a.x - c.x) + c_sq * (b.x - a.x)) / d;

    Some(DVec2::new(ux, uy))
}
