//! Closed-curve polygon approximation (Ramer-Douglas-Peucker).
//!
//! Reduces a traced contour to a handful of vertices so a noisy
//! boundary becomes the clean triangular or polygonal chip silhouette.
//! The curve is treated as closed: it is split at its starting point
//! and the point farthest from it, and each half is simplified
//! independently.

use crate::types::{Contour, Point, Polygon};

/// Approximate a closed contour with a polygon.
///
/// Every dropped contour point lies within `epsilon` pixels of the
/// polygon edge that replaces it. Contours with fewer than three
/// points are returned as-is (after duplicate removal).
#[must_use = "returns the approximated polygon"]
pub fn approximate_closed(contour: &Contour, epsilon: f64) -> Polygon {
    let points = contour.points();
    if points.len() < 3 {
        return Polygon::new(points.to_vec());
    }

    let start = points[0];
    let Some(far) = (1..points.len()).max_by(|&a, &b| {
        start
            .distance_squared(points[a])
            .total_cmp(&start.distance_squared(points[b]))
    }) else {
        return Polygon::new(vec![start]);
    };
    if points[far] == start {
        return Polygon::new(vec![start]);
    }

    // Close the ring so the second half can end on the start point.
    let mut ring = points.to_vec();
    ring.push(start);
    let last = ring.len() - 1;

    let mut kept = vec![false; ring.len()];
    kept[0] = true;
    kept[far] = true;
    kept[last] = true;

    rdp_recurse(&ring, 0, far, epsilon, &mut kept);
    rdp_recurse(&ring, far, last, epsilon, &mut kept);

    let vertices = ring[..last]
        .iter()
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect();

    Polygon::new(vertices)
}

/// Recursive step of the Ramer-Douglas-Peucker algorithm.
///
/// Finds the point between `start` and `end` that is farthest from the
/// segment between them. If that distance exceeds `epsilon`, the point
/// is kept and both sub-ranges are processed.
fn rdp_recurse(points: &[Point], start: usize, end: usize, epsilon: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;

    for i in (start + 1)..end {
        let d = perpendicular_distance(points[i], points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > epsilon {
        kept[max_idx] = true;
        rdp_recurse(points, start, max_idx, epsilon, kept);
        rdp_recurse(points, max_idx, end, epsilon, kept);
    }
}

/// Perpendicular distance from point `p` to the line through `a` and `b`.
///
/// When `a` and `b` coincide, returns the distance from `p` to `a`.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = f64::from(b.x) - f64::from(a.x);
    let dy = f64::from(b.y) - f64::from(a.y);
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        return p.distance(a);
    }

    let ax_px = f64::from(a.x) - f64::from(p.x);
    let ay_py = f64::from(a.y) - f64::from(p.y);
    let cross = dx.mul_add(ay_py, -(dy * ax_px));
    cross.abs() / length_sq.sqrt()
}
