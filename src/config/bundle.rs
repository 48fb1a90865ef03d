//! Calibration bundle: every tunable of a pick session in one JSON document.
//!
//! Missing sections and fields fall back to their defaults. Loading fails
//! hard on unreadable files, malformed JSON or constants that fail
//! validation; a session must not start with undefined geometry.
use crate::autopick::AutoPickParams;
use crate::coords::MapperParams;
use crate::grasp::GraspParams;
use crate::gripper::GripperParams;
use crate::height::HeightParams;
use crate::session::SessionParams;
use crate::shape::ShapeParams;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PickConfig {
    pub shape: ShapeParams,
    pub grasp: GraspParams,
    pub height: HeightParams,
    pub coords: MapperParams,
    pub gripper: GripperParams,
    pub autopick: AutoPickParams,
    pub session: SessionParams,
    /// Stored floor depth; skips floor calibration when present.
    pub floor_reference: Option<f32>,
}

impl PickConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.shape.validate()?;
        self.grasp.validate()?;
        self.height.validate()?;
        self.coords.validate()?;
        self.gripper.validate()?;
        self.autopick.validate()?;
        if let Some(floor) = self.floor_reference {
            if !floor.is_finite() {
                return Err("floor_reference must be finite".to_string());
            }
        }
        if self.grasp.max_aperture_mm > self.gripper.max_aperture_mm {
            return Err(format!(
                "grasp.max_aperture_mm {} exceeds gripper.max_aperture_mm {}",
                self.grasp.max_aperture_mm, self.gripper.max_aperture_mm
            ));
        }
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self, String> {
        let config: PickConfig =
            serde_json::from_str(text).map_err(|e| format!("Failed to parse config: {e}"))?;
        config.validate()?;
        Ok(config)
    }
}

/// Reads and validates a calibration bundle.
pub fn load_config(path: &Path) -> Result<PickConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: PickConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    config
        .validate()
        .map_err(|e| format!("Invalid config {}: {e}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = PickConfig::from_json("{}").unwrap();
        assert_eq!(cfg.grasp.max_candidates, 4);
        assert_eq!(cfg.autopick.stable_time_sec, 4.0);
        assert!(cfg.coords.homography.is_none());
    }

    #[test]
    fn partial_sections_override_fields() {
        let cfg = PickConfig::from_json(
            r#"{
                "grasp": { "pixels_per_mm": 2.2167 },
                "autopick": { "cooldown_sec": 1.5 },
                "session": { "auto_mode": false, "candidate_mode": "depthUniform" },
                "floor_reference": 0.42
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.grasp.pixels_per_mm, 2.2167);
        assert_eq!(cfg.grasp.max_aperture_mm, 54.0);
        assert_eq!(cfg.autopick.cooldown_sec, 1.5);
        assert!(!cfg.session.auto_mode);
        assert_eq!(cfg.floor_reference, Some(0.42));
    }

    #[test]
    fn invalid_constants_are_rejected() {
        let rejected = [
            r#"{ "grasp": { "pixels_per_mm": 0.0 } }"#,
            r#"{ "height": { "floor_z": 10.0, "safe_z": -10.0 } }"#,
            r#"{ "gripper": { "curve": [
                { "angle": 10, "width_mm": 5 },
                { "angle": 5, "width_mm": 1 }
            ] } }"#,
        ];
        for text in rejected {
            assert!(PickConfig::from_json(text).is_err(), "{text}");
        }
        assert!(PickConfig::from_json("not json").is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/pick.json")).unwrap_err();
        assert!(err.contains("/nonexistent/pick.json"));
    }
}
