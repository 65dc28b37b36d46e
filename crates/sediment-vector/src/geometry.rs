use glam::DVec2;

/// Computes the proper intersection of two line segments.
///
/// Uses the standard parametric cross-product test. The intersection is
/// returned only when both parametric fractions lie strictly inside
/// `(0, 1)`; touching endpoints do not count as a crossing. A zero
/// cross-product denominator means the lines are parallel and yields
/// `None` regardless of overlap, so collinear segments never intersect.
///
/// # Example
///
/// ```
/// use glam::DVec2;
/// use sediment_vector::segment_intersection;
///
/// let hit = segment_intersection(
///     DVec2::new(0.0, 0.0),
///     DVec2::new(1.0, 1.0),
///     DVec2::new(0.0, 1.0),
///     DVec2::new(1.0, 0.0),
/// );
/// assert_eq!(hit, Some(DVec2::new(0.5, 0.5)));
/// ```
pub fn segment_intersection(a0: DVec2, a1: DVec2, b0: DVec2, b1: DVec2) -> Option<DVec2> {
    let da = a1 - a0;
    let db = b1 - b0;

    let denom = da.x * db.y - da.y * db.x;
    if denom.abs() < 1e-12 {
        return None; // Parallel or collinear
    }

    let d = b0 - a0;
    let t = (d.x * db.y - d.y * db.x) / denom;
    let u = (d.x * da.y - d.y * da.x) / denom;

    if t > 0.0 && t < 1.0 && u > 0.0 && u < 1.0 {
        Some(a0 + da * t)
    } else {
        None
    }
}

/// Tests if a point is inside a polygon (defined by vertices in order).
///
/// Uses the ray casting algorithm.
pub fn point_in_polygon(point: DVec2, polygon: &[DVec2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let n = polygon.len();

    let mut j = n - 1;
    for i in 0..n {
        let pi = polygon[i];
        let pj = polygon[j];

        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }

        j = i;
    }

    inside
}

/// Computes the signed shoelace area of a polygon (negative for
/// clockwise winding).
pub fn polygon_area(vertices: &[DVec2]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = vertices.len();

    for i in 0..n {
        let j = (i + 1) % n;
        area += vertices[i].x * vertices[j].y;
        area -= vertices[j].x * vertices[i].y;
    }

    area / 2.0
}
