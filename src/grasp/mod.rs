//! Grasp candidate generation.
//!
//! Two entry points:
//! - [`GraspGenerator::generate_candidates`]: shape-aware. One [`ShapeRule`]
//!   is selected per object (ring, elongated, solid, degenerate) and emits
//!   geometric candidates.
//! - [`GraspGenerator::generate_uniform`]: shape-agnostic. Grip lines through
//!   a bounding box are scored by depth uniformity.
//!
//! Both return candidates sorted by descending score and truncated to
//! `max_candidates`. Every emitted aperture fits the gripper; an object whose
//! candidates are all infeasible yields an empty list.

pub mod params;
pub mod rules;
pub mod uniformity;

pub use params::{GraspParams, UniformityParams};
pub use rules::{RingGeometry, ShapeRule};

use crate::image::DepthMap;
use crate::types::{DetectedObject, GraspCandidate, PixelRect};
use log::debug;

/// Stateless candidate generator.
#[derive(Clone, Debug, Default)]
pub struct GraspGenerator {
    params: GraspParams,
}

impl GraspGenerator {
    pub fn new(params: GraspParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &GraspParams {
        &self.params
    }

    /// Ranked candidates for a classified object.
    pub fn generate_candidates(&self, obj: &DetectedObject) -> Vec<GraspCandidate> {
        let rule = ShapeRule::select(obj, &self.params);
        let cands = rule.candidates(obj, &self.params);
        debug!(
            "GraspGenerator: object at ({:.1}, {:.1}) rule={} candidates={}",
            obj.center[0],
            obj.center[1],
            rule_name(&rule),
            cands.len()
        );
        self.rank(cands)
    }

    /// Ranked depth-uniformity candidates for a bare bounding box.
    pub fn generate_uniform(&self, depth: &DepthMap, bbox: &PixelRect) -> Vec<GraspCandidate> {
        self.rank(uniformity::uniform_candidates(depth, bbox, &self.params))
    }

    /// Sorts by descending score (stable, so rule order breaks ties) and
    /// keeps the top `max_candidates`.
    fn rank(&self, mut cands: Vec<GraspCandidate>) -> Vec<GraspCandidate> {
        cands.retain(|c| self.params.fits(c.aperture_mm));
        cands.sort_by(|a, b| b.score.total_cmp(&a.score));
        cands.truncate(self.params.max_candidates);
        cands
    }
}

fn rule_name(rule: &ShapeRule) -> &'static str {
    match rule {
        ShapeRule::Ring(_) => "ring",
        ShapeRule::Elongated => "elongated",
        ShapeRule::Solid => "solid",
        ShapeRule::Degenerate => "degenerate",
    }
}
