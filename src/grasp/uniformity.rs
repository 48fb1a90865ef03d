//! Shape-agnostic grasp path scored by depth uniformity along the grip line.
//!
//! Used when shape classification is skipped: only an axis-aligned box and a
//! depth map are known. Each configured orientation yields one grip line
//! through the box centre; lines on a flat surface score close to 1.
use super::params::{GraspParams, UniformityParams};
use crate::angle::{normalize_grasp_deg, unit_vector};
use crate::image::DepthMap;
use crate::types::{GraspCandidate, GraspKind, PixelRect};
use log::debug;

/// Scores the grip line of `length_px` through `center` along `angle_deg`.
///
/// Samples `samples` equally spaced points, keeps those inside `bbox` with a
/// finite depth, and maps their population variance `v` to
/// `exp(-v / variance_threshold)`. Fewer than three usable samples score 0.
pub fn line_uniformity(
    depth: &DepthMap,
    bbox: &PixelRect,
    center: [f32; 2],
    angle_deg: f32,
    length_px: f32,
    params: &UniformityParams,
) -> f32 {
    let n = params.samples.max(2);
    let dir = unit_vector(angle_deg);
    let mut values = Vec::with_capacity(n);
    for i in 0..n {
        let t = (i as f32 / (n - 1) as f32 - 0.5) * length_px;
        let p = [
            (center[0] + t * dir[0]).floor(),
            (center[1] + t * dir[1]).floor(),
        ];
        if !bbox.contains(p) {
            continue;
        }
        if let Some(v) = depth.sample(p) {
            values.push(v as f64);
        }
    }
    if values.len() < 3 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    let score = (-variance / params.variance_threshold as f64).exp();
    (score as f32).clamp(0.0, 1.0)
}

/// Grip line length for one orientation: box width for horizontal, box height
/// for vertical, a shortened diagonal otherwise.
fn line_length(bbox: &PixelRect, angle_deg: f32, params: &UniformityParams) -> f32 {
    let a = angle_deg.rem_euclid(180.0);
    if a.abs() < 1e-3 || (a - 180.0).abs() < 1e-3 {
        bbox.width * params.length_ratio
    } else if (a - 90.0).abs() < 1e-3 {
        bbox.height * params.length_ratio
    } else {
        bbox.width.hypot(bbox.height) * params.length_ratio * params.diagonal_factor
    }
}

fn line_inside_box(
    bbox: &PixelRect,
    center: [f32; 2],
    angle_deg: f32,
    length_px: f32,
    params: &UniformityParams,
) -> bool {
    let m = params.center_margin_px;
    let (x1, y1) = (bbox.x + bbox.width, bbox.y + bbox.height);
    if center[0] < bbox.x + m || center[0] > x1 - m || center[1] < bbox.y + m || center[1] > y1 - m
    {
        return false;
    }
    let tol = params.endpoint_tolerance_px;
    let dir = unit_vector(angle_deg);
    let half = 0.5 * length_px;
    [-1.0f32, 1.0].iter().all(|&sign| {
        let ex = center[0] + sign * half * dir[0];
        let ey = center[1] + sign * half * dir[1];
        ex >= bbox.x - tol && ex <= x1 + tol && ey >= bbox.y - tol && ey <= y1 + tol
    })
}

/// Candidates for one bounding box, unsorted. Boxes under the minimum size
/// yield nothing; lines scoring 0 (too few depth samples) are rejected.
pub fn uniform_candidates(
    depth: &DepthMap,
    bbox: &PixelRect,
    params: &GraspParams,
) -> Vec<GraspCandidate> {
    let up = &params.uniformity;
    if bbox.width < up.min_object_width || bbox.height < up.min_object_height {
        debug!(
            "uniform_candidates: box {:.0}x{:.0} below minimum size",
            bbox.width, bbox.height
        );
        return Vec::new();
    }
    let center = bbox.center();
    let mut out = Vec::with_capacity(up.orientations_deg.len());
    for &angle in &up.orientations_deg {
        let length_px = line_length(bbox, angle, up);
        if !line_inside_box(bbox, center, angle, length_px, up) {
            continue;
        }
        let aperture_mm = params.px_to_mm(length_px);
        if !params.fits(aperture_mm) {
            continue;
        }
        let score = line_uniformity(depth, bbox, center, angle, length_px, up);
        if score <= 0.0 {
            debug!("uniform_candidates: {:.0} deg line has no usable depth", angle);
            continue;
        }
        out.push(GraspCandidate {
            center_px: center,
            approach_angle_deg: normalize_grasp_deg(angle),
            aperture_mm,
            score,
            kind: GraspKind::DepthUniform,
            sensor_point_px: center,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_surface_scores_one() {
        let depth = DepthMap::filled(100, 100, 3.0);
        let bbox = PixelRect::new(20.0, 20.0, 60.0, 60.0);
        let up = UniformityParams::default();
        let s = line_uniformity(&depth, &bbox, bbox.center(), 0.0, 36.0, &up);
        assert!((s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn step_edge_lowers_score() {
        let mut depth = DepthMap::filled(100, 100, 1.0);
        depth.fill_rect(&PixelRect::new(50.0, 0.0, 50.0, 100.0), 2.0);
        let bbox = PixelRect::new(20.0, 20.0, 60.0, 60.0);
        let up = UniformityParams::default();
        let across = line_uniformity(&depth, &bbox, bbox.center(), 0.0, 36.0, &up);
        let along = line_uniformity(&depth, &bbox, [40.0, 50.0], 90.0, 36.0, &up);
        assert!(across < 0.5);
        assert!(along > 0.99);
    }

    #[test]
    fn too_few_samples_score_zero() {
        let depth = DepthMap::filled(100, 100, 1.0);
        let bbox = PixelRect::new(20.0, 20.0, 60.0, 60.0);
        let up = UniformityParams::default();
        let s = line_uniformity(&depth, &bbox, [0.0, 0.0], 0.0, 4.0, &up);
        assert_eq!(s, 0.0);
    }

    #[test]
    fn small_boxes_are_skipped() {
        let depth = DepthMap::filled(100, 100, 1.0);
        let bbox = PixelRect::new(20.0, 20.0, 20.0, 60.0);
        assert!(uniform_candidates(&depth, &bbox, &GraspParams::default()).is_empty());
    }

    #[test]
    fn one_candidate_per_orientation_on_flat_box() {
        let depth = DepthMap::filled(200, 200, 1.0);
        let bbox = PixelRect::new(50.0, 50.0, 80.0, 60.0);
        let cands = uniform_candidates(&depth, &bbox, &GraspParams::default());
        assert_eq!(cands.len(), 4);
        assert!(cands.iter().all(|c| c.kind == GraspKind::DepthUniform));
        assert!((cands[0].aperture_mm - 48.0 / 2.7703).abs() < 1e-3);
    }

    #[test]
    fn box_off_the_depth_map_has_no_candidates() {
        let depth = DepthMap::filled(100, 100, 1.0);
        let bbox = PixelRect::new(200.0, 200.0, 80.0, 60.0);
        assert!(uniform_candidates(&depth, &bbox, &GraspParams::default()).is_empty());
    }

    #[test]
    fn box_half_off_the_map_keeps_only_sampled_lines() {
        // the 0 deg line lies fully on the map, the 90 deg line only partly
        let depth = DepthMap::filled(100, 80, 1.0);
        let bbox = PixelRect::new(10.0, 40.0, 80.0, 60.0);
        let cands = uniform_candidates(&depth, &bbox, &GraspParams::default());
        assert!(!cands.is_empty());
        assert!(cands.iter().all(|c| c.score > 0.0));
    }
}
