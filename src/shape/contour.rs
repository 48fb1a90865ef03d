//! Planar contour geometry: area, perimeter, centroid, convex hull and the
//! minimum-area enclosing rectangle.
//!
//! Contours are closed polygons given as ordered vertex lists; the closing
//! edge from the last vertex back to the first is implicit. Accumulation is
//! done in f64 to keep large pixel coordinates well conditioned.
use crate::angle::{direction_deg, normalize_grasp_deg};
use crate::types::OrientedRect;

const EPS: f64 = 1e-9;

/// Signed shoelace area; positive for counter-clockwise vertex order in a
/// y-up frame.
fn signed_area(pts: &[[f32; 2]]) -> f64 {
    if pts.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0f64;
    for i in 0..pts.len() {
        let a = pts[i];
        let b = pts[(i + 1) % pts.len()];
        acc += a[0] as f64 * b[1] as f64 - b[0] as f64 * a[1] as f64;
    }
    0.5 * acc
}

/// Enclosed area of a closed polygon, independent of vertex order.
pub fn polygon_area(pts: &[[f32; 2]]) -> f32 {
    signed_area(pts).abs() as f32
}

/// Length of the closed boundary.
pub fn perimeter(pts: &[[f32; 2]]) -> f32 {
    if pts.len() < 2 {
        return 0.0;
    }
    let mut acc = 0.0f64;
    for i in 0..pts.len() {
        let a = pts[i];
        let b = pts[(i + 1) % pts.len()];
        let dx = (b[0] - a[0]) as f64;
        let dy = (b[1] - a[1]) as f64;
        acc += (dx * dx + dy * dy).sqrt();
    }
    acc as f32
}

/// Isoperimetric ratio `4π·A / P²`: 1 for a disc, smaller for anything else.
pub fn circularity(area: f32, perimeter: f32) -> f32 {
    if perimeter <= f32::EPSILON {
        return 0.0;
    }
    (4.0 * std::f32::consts::PI * area / (perimeter * perimeter)).clamp(0.0, 1.0)
}

/// Arithmetic mean of the vertices. `None` for an empty contour.
pub fn vertex_mean(pts: &[[f32; 2]]) -> Option<[f32; 2]> {
    if pts.is_empty() {
        return None;
    }
    let n = pts.len() as f64;
    let (sx, sy) = pts
        .iter()
        .fold((0.0f64, 0.0f64), |(sx, sy), p| (sx + p[0] as f64, sy + p[1] as f64));
    Some([(sx / n) as f32, (sy / n) as f32])
}

/// Area centroid from the first-order polygon moments. Falls back to the
/// vertex mean when the polygon encloses no area.
pub fn centroid(pts: &[[f32; 2]]) -> Option<[f32; 2]> {
    let a = signed_area(pts);
    if a.abs() <= EPS {
        return vertex_mean(pts);
    }
    let (mut cx, mut cy) = (0.0f64, 0.0f64);
    for i in 0..pts.len() {
        let (x0, y0) = (pts[i][0] as f64, pts[i][1] as f64);
        let j = (i + 1) % pts.len();
        let (x1, y1) = (pts[j][0] as f64, pts[j][1] as f64);
        let cross = x0 * y1 - x1 * y0;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }
    Some([(cx / (6.0 * a)) as f32, (cy / (6.0 * a)) as f32])
}

fn cross(o: [f32; 2], a: [f32; 2], b: [f32; 2]) -> f64 {
    (a[0] - o[0]) as f64 * (b[1] - o[1]) as f64 - (a[1] - o[1]) as f64 * (b[0] - o[0]) as f64
}

/// Convex hull (Andrew's monotone chain). Collinear points are dropped.
pub fn convex_hull(pts: &[[f32; 2]]) -> Vec<[f32; 2]> {
    let mut sorted: Vec<[f32; 2]> = pts
        .iter()
        .copied()
        .filter(|p| p[0].is_finite() && p[1].is_finite())
        .collect();
    sorted.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let mut hull: Vec<[f32; 2]> = Vec::with_capacity(sorted.len() * 2);
    for &p in &sorted {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

/// Minimum-area enclosing rectangle of a point set.
///
/// Evaluates every hull edge direction (rotating calipers). The returned
/// angle is normalized into (−90, 90] since a rectangle is symmetric under a
/// half turn. `None` for an empty input.
pub fn min_area_rect(pts: &[[f32; 2]]) -> Option<OrientedRect> {
    let hull = convex_hull(pts);
    match hull.len() {
        0 => return None,
        1 => {
            return Some(OrientedRect {
                center: hull[0],
                width: 0.0,
                height: 0.0,
                angle_deg: 0.0,
            })
        }
        2 => {
            let (a, b) = (hull[0], hull[1]);
            let d = [b[0] - a[0], b[1] - a[1]];
            return Some(OrientedRect {
                center: [0.5 * (a[0] + b[0]), 0.5 * (a[1] + b[1])],
                width: (d[0] * d[0] + d[1] * d[1]).sqrt(),
                height: 0.0,
                angle_deg: normalize_grasp_deg(direction_deg(d)),
            });
        }
        _ => {}
    }

    let mut best: Option<(f64, OrientedRect)> = None;
    for i in 0..hull.len() {
        let a = hull[i];
        let b = hull[(i + 1) % hull.len()];
        let (dx, dy) = ((b[0] - a[0]) as f64, (b[1] - a[1]) as f64);
        let len = (dx * dx + dy * dy).sqrt();
        if len <= EPS {
            continue;
        }
        let u = [dx / len, dy / len];
        let v = [-u[1], u[0]];
        let (mut umin, mut umax, mut vmin, mut vmax) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
        for p in &hull {
            let (px, py) = ((p[0] - a[0]) as f64, (p[1] - a[1]) as f64);
            let pu = px * u[0] + py * u[1];
            let pv = px * v[0] + py * v[1];
            umin = umin.min(pu);
            umax = umax.max(pu);
            vmin = vmin.min(pv);
            vmax = vmax.max(pv);
        }
        let area = (umax - umin) * (vmax - vmin);
        if best.as_ref().map_or(true, |(best_area, _)| area < *best_area - EPS) {
            let cu = 0.5 * (umin + umax);
            let cv = 0.5 * (vmin + vmax);
            let center = [
                (a[0] as f64 + cu * u[0] + cv * v[0]) as f32,
                (a[1] as f64 + cu * u[1] + cv * v[1]) as f32,
            ];
            best = Some((
                area,
                OrientedRect {
                    center,
                    width: (umax - umin) as f32,
                    height: (vmax - vmin) as f32,
                    angle_deg: normalize_grasp_deg(dy.atan2(dx).to_degrees() as f32),
                },
            ));
        }
    }
    best.map(|(_, rect)| rect)
}
