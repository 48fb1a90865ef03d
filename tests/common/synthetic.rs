#![allow(dead_code)]

use grasp_pick::types::{PixelRect, Region};

/// Closed circle contour with `n` points, starting at `phase_deg`.
pub fn circle(center: [f32; 2], radius: f32, n: usize, phase_deg: f32) -> Vec<[f32; 2]> {
    (0..n)
        .map(|i| {
            let t = (phase_deg + i as f32 * 360.0 / n as f32).to_radians();
            [center[0] + radius * t.cos(), center[1] + radius * t.sin()]
        })
        .collect()
}

/// Flat ring (washer) region.
pub fn ring_region(center: [f32; 2], outer: f32, inner: f32, phase_deg: f32) -> Region {
    Region {
        bbox: PixelRect::new(center[0] - outer, center[1] - outer, 2.0 * outer, 2.0 * outer),
        outer: circle(center, outer, 96, phase_deg),
        hole: Some(circle(center, inner, 64, phase_deg)),
    }
}

/// Solid rectangle `length` x `width` whose long axis points along `angle_deg`.
/// Edges are densely sampled so the contour is never degenerate.
pub fn rotated_rect_region(center: [f32; 2], length: f32, width: f32, angle_deg: f32) -> Region {
    let (s, c) = angle_deg.to_radians().sin_cos();
    let (hl, hw) = (length / 2.0, width / 2.0);
    let corners = [[-hl, -hw], [hl, -hw], [hl, hw], [-hl, hw]];
    let per_edge = 12;
    let mut outer = Vec::with_capacity(corners.len() * per_edge);
    for k in 0..corners.len() {
        let a = corners[k];
        let b = corners[(k + 1) % corners.len()];
        for j in 0..per_edge {
            let t = j as f32 / per_edge as f32;
            let lx = a[0] + (b[0] - a[0]) * t;
            let ly = a[1] + (b[1] - a[1]) * t;
            outer.push([center[0] + lx * c - ly * s, center[1] + lx * s + ly * c]);
        }
    }
    let bbox = PixelRect::from_points(&outer).unwrap_or_default();
    Region {
        bbox,
        outer,
        hole: None,
    }
}
