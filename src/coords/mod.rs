//! Pixel to workspace mapping.
//!
//! [`CoordinateMapper`] wraps the calibrated [`Homography`] plus the fixed
//! camera-to-robot rotation offset. An unset homography is a normal,
//! caller-visible state: mapping calls then return `None` and no motion
//! target can be produced.

pub mod homography;

pub use homography::{Homography, HomographyError};

use log::warn;
use serde::Deserialize;

/// Mapper calibration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MapperParams {
    /// Row-major pixel→workspace homography. `None` until calibrated.
    pub homography: Option<[[f64; 3]; 3]>,
    /// Robot rotation that corresponds to an image angle of zero.
    pub rotation_offset_deg: f64,
    /// Workspace offset of the height sensor relative to the tool centre (mm).
    pub sensor_offset_mm: [f64; 2],
}

impl Default for MapperParams {
    fn default() -> Self {
        Self {
            homography: None,
            rotation_offset_deg: -25.55,
            sensor_offset_mm: [25.08, 20.71],
        }
    }
}

impl MapperParams {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(rows) = self.homography {
            Homography::from_rows(rows).map_err(|e| format!("coords: invalid homography: {e}"))?;
        }
        if !self.rotation_offset_deg.is_finite() {
            return Err("coords: rotation_offset_deg must be finite".to_string());
        }
        if !self.sensor_offset_mm.iter().all(|v| v.is_finite()) {
            return Err("coords: sensor_offset_mm must be finite".to_string());
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct CoordinateMapper {
    homography: Option<Homography>,
    inverse: Option<Homography>,
    rotation_offset_deg: f64,
    sensor_offset_mm: [f64; 2],
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::new(&MapperParams::default())
    }
}

impl CoordinateMapper {
    /// Builds a mapper. An invalid homography in `params` is dropped with a
    /// warning; [`MapperParams::validate`] rejects it up front.
    pub fn new(params: &MapperParams) -> Self {
        let homography = params.homography.and_then(|rows| match Homography::from_rows(rows) {
            Ok(h) => Some(h),
            Err(e) => {
                warn!("CoordinateMapper: ignoring homography: {e}");
                None
            }
        });
        let mut mapper = Self {
            homography: None,
            inverse: None,
            rotation_offset_deg: params.rotation_offset_deg,
            sensor_offset_mm: params.sensor_offset_mm,
        };
        if let Some(h) = homography {
            mapper.set_homography(h);
        }
        mapper
    }

    pub fn set_homography(&mut self, h: Homography) {
        self.inverse = h.inverse();
        self.homography = Some(h);
    }

    pub fn homography(&self) -> Option<&Homography> {
        self.homography.as_ref()
    }

    pub fn is_calibrated(&self) -> bool {
        self.homography.is_some()
    }

    /// Workspace (x, y) in millimetres for an image point.
    pub fn pixel_to_workspace(&self, px: [f32; 2]) -> Option<[f64; 2]> {
        self.homography.as_ref()?.project([px[0] as f64, px[1] as f64])
    }

    /// Image point for a workspace (x, y); the inverse of [`Self::pixel_to_workspace`].
    pub fn workspace_to_pixel(&self, ws: [f64; 2]) -> Option<[f32; 2]> {
        let p = self.inverse.as_ref()?.project(ws)?;
        Some([p[0] as f32, p[1] as f32])
    }

    /// Robot approach rotation for an image-plane angle. Not normalized.
    pub fn image_angle_to_approach(&self, angle_deg: f32) -> f64 {
        self.rotation_offset_deg - angle_deg as f64
    }

    /// Tool position that places the height sensor over `px`.
    pub fn sensor_position_for(&self, px: [f32; 2]) -> Option<[f64; 2]> {
        let p = self.pixel_to_workspace(px)?;
        Some([p[0] - self.sensor_offset_mm[0], p[1] - self.sensor_offset_mm[1]])
    }
}
