//! Parameter types configuring grasp candidate generation.
//!
//! Defaults reproduce a 54 mm parallel gripper over a camera at roughly
//! 2.77 px/mm. The scale and the aperture limit are calibration values.

use serde::Deserialize;

/// Shape-aware generator parameters.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GraspParams {
    /// Image scale on the workspace plane.
    pub pixels_per_mm: f32,
    /// Largest physical jaw opening. Candidates above it are never emitted.
    pub max_aperture_mm: f32,
    /// Oriented-rect long/short ratio above which an object counts as elongated.
    pub elongation_ratio: f32,
    /// Score of the 90°-rotated alternative on elongated objects.
    pub long_side_score: f32,
    /// Score of the oriented-rectangle fallback.
    pub fallback_score: f32,
    /// Score decrement between consecutive ring candidates.
    pub ring_score_step: f32,
    /// Sensor point offset beyond the mean ring radius, as a fraction of the
    /// ring thickness.
    pub ring_sensor_offset_ratio: f32,
    /// Number of ranked candidates retained per object.
    pub max_candidates: usize,
    pub uniformity: UniformityParams,
}

impl Default for GraspParams {
    fn default() -> Self {
        Self {
            pixels_per_mm: 2.7703,
            max_aperture_mm: 54.0,
            elongation_ratio: 2.0,
            long_side_score: 0.5,
            fallback_score: 0.6,
            ring_score_step: 0.1,
            ring_sensor_offset_ratio: 0.3,
            max_candidates: 4,
            uniformity: UniformityParams::default(),
        }
    }
}

impl GraspParams {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.pixels_per_mm.is_finite() && self.pixels_per_mm > 0.0) {
            return Err(format!(
                "grasp: pixels_per_mm must be positive, got {}",
                self.pixels_per_mm
            ));
        }
        if !(self.max_aperture_mm.is_finite() && self.max_aperture_mm > 0.0) {
            return Err(format!(
                "grasp: max_aperture_mm must be positive, got {}",
                self.max_aperture_mm
            ));
        }
        if self.max_candidates == 0 {
            return Err("grasp: max_candidates must be at least 1".to_string());
        }
        self.uniformity.validate()
    }

    /// Converts a pixel length on the workspace plane to millimetres.
    #[inline]
    pub fn px_to_mm(&self, px: f32) -> f32 {
        px / self.pixels_per_mm
    }

    #[inline]
    pub fn fits(&self, aperture_mm: f32) -> bool {
        aperture_mm.is_finite() && aperture_mm >= 0.0 && aperture_mm <= self.max_aperture_mm
    }
}

/// Depth-uniformity scoring used by the shape-agnostic path.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct UniformityParams {
    /// Samples along the grip line.
    pub samples: usize,
    /// Depth variance scale: `score = exp(-variance / variance_threshold)`.
    pub variance_threshold: f32,
    /// Grip orientations tried per bounding box (degrees).
    pub orientations_deg: Vec<f32>,
    /// Grip line length as a fraction of the box extent along the line.
    pub length_ratio: f32,
    /// Extra factor applied to the box diagonal for oblique orientations.
    pub diagonal_factor: f32,
    pub min_object_width: f32,
    pub min_object_height: f32,
    /// Required clearance of the grip centre from the box edges (px).
    pub center_margin_px: f32,
    /// Allowed overshoot of the grip line end points beyond the box (px).
    pub endpoint_tolerance_px: f32,
}

impl Default for UniformityParams {
    fn default() -> Self {
        Self {
            samples: 10,
            variance_threshold: 0.1,
            orientations_deg: vec![0.0, 45.0, 90.0, 135.0],
            length_ratio: 0.6,
            diagonal_factor: 0.7,
            min_object_width: 30.0,
            min_object_height: 30.0,
            center_margin_px: 5.0,
            endpoint_tolerance_px: 10.0,
        }
    }
}

impl UniformityParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.samples < 3 {
            return Err(format!(
                "grasp.uniformity: samples must be at least 3, got {}",
                self.samples
            ));
        }
        if !(self.variance_threshold.is_finite() && self.variance_threshold > 0.0) {
            return Err(format!(
                "grasp.uniformity: variance_threshold must be positive, got {}",
                self.variance_threshold
            ));
        }
        Ok(())
    }
}
