//! Geometric grasp rules, one per shape class.
//!
//! [`ShapeRule::select`] picks exactly one rule for an object; each rule
//! then emits zero or more candidates. Apertures that exceed the gripper are
//! dropped here, at generation time.
use super::params::GraspParams;
use crate::angle::{direction_deg, normalize_grasp_deg, unit_vector};
use crate::shape::axes::principal_axes;
use crate::shape::contour::min_area_rect;
use crate::types::{DetectedObject, GraspCandidate, GraspKind, ShapeClass};
use log::debug;

/// Ring radii measured from the outer and hole rectangles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingGeometry {
    pub center: [f32; 2],
    pub outer_radius_px: f32,
    pub inner_radius_px: f32,
}

impl RingGeometry {
    /// Measures the ring; `None` without a usable hole contour.
    pub fn measure(obj: &DetectedObject) -> Option<Self> {
        let hole = obj.inner_contour.as_deref()?;
        let outer_rect = min_area_rect(&obj.outer_contour)?;
        let hole_rect = min_area_rect(hole)?;
        Some(Self {
            center: obj.center,
            outer_radius_px: 0.5 * outer_rect.short_side(),
            inner_radius_px: 0.5 * hole_rect.short_side(),
        })
    }

    pub fn thickness_px(&self) -> f32 {
        self.outer_radius_px - self.inner_radius_px
    }

    pub fn mean_radius_px(&self) -> f32 {
        0.5 * (self.outer_radius_px + self.inner_radius_px)
    }
}

/// Grasp rule chosen for one object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShapeRule {
    /// Grip the ring wall at four positions around the mean radius.
    Ring(RingGeometry),
    /// Grip across the narrow side, with a long-side alternative.
    Elongated,
    /// Grip across the minor principal axis.
    Solid,
    /// Only the bounding box is known; grip its shorter side.
    Degenerate,
}

impl ShapeRule {
    pub fn select(obj: &DetectedObject, params: &GraspParams) -> Self {
        if obj.degenerate {
            return ShapeRule::Degenerate;
        }
        if obj.shape == ShapeClass::Ring {
            match RingGeometry::measure(obj) {
                Some(ring) => {
                    let thickness_mm = params.px_to_mm(ring.thickness_px());
                    if thickness_mm > 0.0 && thickness_mm <= params.max_aperture_mm {
                        return ShapeRule::Ring(ring);
                    }
                    debug!(
                        "ShapeRule: ring thickness {:.1} mm unusable, treating as solid",
                        thickness_mm
                    );
                }
                None => debug!("ShapeRule: ring without measurable hole, treating as solid"),
            }
        }
        if obj.oriented_rect.aspect_ratio() > params.elongation_ratio {
            ShapeRule::Elongated
        } else {
            ShapeRule::Solid
        }
    }

    /// Emits the candidates of this rule, unsorted.
    pub fn candidates(&self, obj: &DetectedObject, params: &GraspParams) -> Vec<GraspCandidate> {
        match self {
            ShapeRule::Ring(ring) => ring_candidates(ring, params),
            ShapeRule::Elongated => elongated_candidates(obj, params),
            ShapeRule::Solid => solid_candidates(obj, params),
            ShapeRule::Degenerate => fallback_candidates(obj, params),
        }
    }
}

fn offset(center: [f32; 2], dir: [f32; 2], dist: f32) -> [f32; 2] {
    [center[0] + dir[0] * dist, center[1] + dir[1] * dist]
}

fn ring_candidates(ring: &RingGeometry, params: &GraspParams) -> Vec<GraspCandidate> {
    let thickness_px = ring.thickness_px();
    let aperture_mm = params.px_to_mm(thickness_px);
    let grip_radius = ring.mean_radius_px();
    let sensor_radius = grip_radius + thickness_px * params.ring_sensor_offset_ratio;
    [0.0f32, 90.0, 180.0, 270.0]
        .iter()
        .enumerate()
        .map(|(i, &ray_deg)| {
            let dir = unit_vector(ray_deg);
            GraspCandidate {
                center_px: offset(ring.center, dir, grip_radius),
                approach_angle_deg: normalize_grasp_deg(ray_deg),
                aperture_mm,
                score: (1.0 - i as f32 * params.ring_score_step).clamp(0.0, 1.0),
                kind: GraspKind::RingEdge,
                sensor_point_px: offset(ring.center, dir, sensor_radius),
            }
        })
        .collect()
}

fn elongated_candidates(obj: &DetectedObject, params: &GraspParams) -> Vec<GraspCandidate> {
    let rect = &obj.oriented_rect;
    let narrow_angle = rect.short_side_angle_deg();
    let mut out = Vec::with_capacity(2);

    let narrow_mm = params.px_to_mm(rect.short_side());
    if params.fits(narrow_mm) {
        out.push(GraspCandidate {
            center_px: rect.center,
            approach_angle_deg: normalize_grasp_deg(narrow_angle),
            aperture_mm: narrow_mm,
            score: 1.0,
            kind: GraspKind::NarrowSide,
            sensor_point_px: rect.center,
        });
    }

    let long_mm = params.px_to_mm(rect.long_side());
    if params.fits(long_mm) {
        out.push(GraspCandidate {
            center_px: rect.center,
            approach_angle_deg: normalize_grasp_deg(narrow_angle + 90.0),
            aperture_mm: long_mm,
            score: params.long_side_score,
            kind: GraspKind::LongSide,
            sensor_point_px: rect.center,
        });
    }
    out
}

fn solid_candidates(obj: &DetectedObject, params: &GraspParams) -> Vec<GraspCandidate> {
    let Some(axes) = principal_axes(&obj.outer_contour) else {
        debug!("ShapeRule: ill-conditioned covariance, using rectangle fallback");
        return fallback_candidates(obj, params);
    };
    let aperture_mm = params.px_to_mm(axes.minor_extent(&obj.outer_contour));
    if !params.fits(aperture_mm) {
        debug!(
            "ShapeRule: principal-axis width {:.1} mm exceeds gripper, using rectangle fallback",
            aperture_mm
        );
        return fallback_candidates(obj, params);
    }
    vec![GraspCandidate {
        center_px: axes.mean,
        approach_angle_deg: normalize_grasp_deg(direction_deg(axes.major) + 90.0),
        aperture_mm,
        score: 1.0,
        kind: GraspKind::PcaSolid,
        sensor_point_px: axes.mean,
    }]
}

fn fallback_candidates(obj: &DetectedObject, params: &GraspParams) -> Vec<GraspCandidate> {
    let rect = &obj.oriented_rect;
    let aperture_mm = params.px_to_mm(rect.short_side());
    if !params.fits(aperture_mm) {
        debug!(
            "ShapeRule: shorter side {:.1} mm exceeds gripper, object ungraspable",
            aperture_mm
        );
        return Vec::new();
    }
    vec![GraspCandidate {
        center_px: rect.center,
        approach_angle_deg: normalize_grasp_deg(rect.short_side_angle_deg()),
        aperture_mm,
        score: params.fallback_score,
        kind: GraspKind::FallbackRect,
        sensor_point_px: rect.center,
    }]
}
