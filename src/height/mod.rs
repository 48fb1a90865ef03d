//! Object height from a relative depth map or a rangefinder reading.
//!
//! The depth map is relative, so heights are measured against a floor
//! reference captured once from an empty workspace ([`HeightEstimator::calibrate_floor`]).
//! Each query samples the object box five times (whole box plus its four
//! corner windows), takes the median, converts it to millimetres and pushes
//! it into a short rolling history whose median is returned.
//!
//! Without a floor reference every query yields height 0.

pub mod history;

pub use history::RollingMedian;

use crate::image::{depth::median, DepthMap};
use crate::types::PixelRect;
use log::{debug, info, warn};
use serde::Deserialize;

/// Height and Z calibration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HeightParams {
    /// Millimetres of height per unit of relative depth above the floor.
    pub vertical_scale: f32,
    /// Readings kept in the rolling history.
    pub history_len: usize,
    /// Side fraction of the central window used for floor calibration.
    pub floor_window_fraction: f32,
    /// Workspace Z of the floor plane.
    pub floor_z: f64,
    /// Highest Z a grasp may target.
    pub safe_z: f64,
    /// Z gained per millimetre of object height.
    pub height_coefficient: f64,
    /// Rangefinder distance to the empty floor at the sensing pose.
    pub range_floor_mm: Option<f32>,
    /// Fixed correction added to every rangefinder reading.
    pub range_correction_mm: f32,
}

impl Default for HeightParams {
    fn default() -> Self {
        Self {
            vertical_scale: 57.428_993,
            history_len: 5,
            floor_window_fraction: 1.0 / 3.0,
            floor_z: -64.0,
            safe_z: -40.0,
            height_coefficient: 0.5,
            range_floor_mm: None,
            range_correction_mm: -21.0,
        }
    }
}

impl HeightParams {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.vertical_scale.is_finite() && self.vertical_scale > 0.0) {
            return Err(format!(
                "height: vertical_scale must be positive, got {}",
                self.vertical_scale
            ));
        }
        if self.history_len == 0 {
            return Err("height: history_len must be at least 1".to_string());
        }
        if !(self.floor_window_fraction > 0.0 && self.floor_window_fraction <= 1.0) {
            return Err(format!(
                "height: floor_window_fraction {} must lie in (0, 1]",
                self.floor_window_fraction
            ));
        }
        if !(self.floor_z.is_finite() && self.safe_z.is_finite()) || self.floor_z > self.safe_z {
            return Err(format!(
                "height: Z band [{}, {}] is invalid",
                self.floor_z, self.safe_z
            ));
        }
        if !self.height_coefficient.is_finite() {
            return Err("height: height_coefficient must be finite".to_string());
        }
        Ok(())
    }
}

/// Floor reference plus rolling history for the tracked object.
#[derive(Clone, Debug)]
pub struct HeightEstimator {
    params: HeightParams,
    floor: Option<f32>,
    history: RollingMedian,
}

impl Default for HeightEstimator {
    fn default() -> Self {
        Self::new(HeightParams::default())
    }
}

impl HeightEstimator {
    pub fn new(params: HeightParams) -> Self {
        let history = RollingMedian::new(params.history_len);
        Self {
            params,
            floor: None,
            history,
        }
    }

    pub fn params(&self) -> &HeightParams {
        &self.params
    }

    pub fn floor_reference(&self) -> Option<f32> {
        self.floor
    }

    /// Sets the floor reference directly, e.g. from a stored calibration.
    pub fn set_floor_reference(&mut self, floor: f32) {
        self.floor = floor.is_finite().then_some(floor);
    }

    /// Captures the floor reference from an empty-workspace depth map.
    /// Returns the stored value; `None` leaves the previous reference.
    pub fn calibrate_floor(&mut self, depth: &DepthMap) -> Option<f32> {
        let win = depth.central_window(self.params.floor_window_fraction)?;
        let Some(floor) = depth.window_median(&win) else {
            warn!("HeightEstimator: floor window has no finite samples");
            return None;
        };
        info!("HeightEstimator: floor reference {:.4}", floor);
        self.floor = Some(floor);
        Some(floor)
    }

    /// Smoothed object height in millimetres for the box `bbox`.
    ///
    /// Returns 0 before floor calibration or for a box outside the map; in
    /// both cases the history is left untouched.
    pub fn estimate_height(&mut self, depth: &DepthMap, bbox: &PixelRect) -> f32 {
        match self.measure_height(depth, bbox) {
            Some(raw) => self.push_reading(raw),
            None => 0.0,
        }
    }

    /// Unsmoothed height of `bbox`; leaves the history untouched. `None`
    /// before floor calibration or for a box outside the map.
    pub fn measure_height(&self, depth: &DepthMap, bbox: &PixelRect) -> Option<f32> {
        let floor = self.floor?;
        let object_depth = sample_object_depth(depth, bbox)?;
        Some(((object_depth - floor) * self.params.vertical_scale).max(0.0))
    }

    /// Smoothed height from a rangefinder distance reading (mm).
    ///
    /// Returns 0 when no range floor is configured or the reading is not finite.
    pub fn estimate_height_from_range(&mut self, reading_mm: f32) -> f32 {
        let Some(range_floor) = self.params.range_floor_mm else {
            return 0.0;
        };
        if !reading_mm.is_finite() {
            return 0.0;
        }
        let raw = (range_floor - (reading_mm + self.params.range_correction_mm)).max(0.0);
        self.push_reading(raw)
    }

    fn push_reading(&mut self, raw: f32) -> f32 {
        self.history.push(raw);
        let smoothed = self.history.median().unwrap_or(raw);
        debug!(
            "HeightEstimator: raw={:.1} mm smoothed={:.1} mm ({} readings)",
            raw,
            smoothed,
            self.history.len()
        );
        smoothed
    }

    /// Forgets previous readings; called when the tracked object changes.
    pub fn reset_history(&mut self) {
        self.history.clear();
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Workspace Z for an object of `height_mm`, clamped to the safe band.
    pub fn height_to_z(&self, height_mm: f32) -> f64 {
        let p = &self.params;
        let z = p.floor_z + height_mm as f64 * p.height_coefficient;
        z.clamp(p.floor_z, p.safe_z)
    }
}

/// Median of the whole-box median and the four corner-window medians.
fn sample_object_depth(depth: &DepthMap, bbox: &PixelRect) -> Option<f32> {
    let win = depth.clip(bbox)?;
    let mut samples = Vec::with_capacity(5);
    samples.extend(depth.window_median(&win));
    if let Some(corners) = win.corner_windows() {
        samples.extend(corners.iter().filter_map(|c| depth.window_median(c)));
    }
    median(&mut samples)
}
