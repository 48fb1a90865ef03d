//! Gripper aperture calibration.
//!
//! The actuator is driven by an angle; the jaw opening it produces is
//! described by a measured curve of (angle, width) control points with width
//! decreasing as the angle increases. Widths are interpolated piecewise
//! linearly and rounded to the actuator resolution.
use log::debug;
use serde::{Deserialize, Serialize};

/// One measured (actuator angle, jaw opening) pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub angle: f32,
    pub width_mm: f32,
}

/// Monotone calibration curve. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationCurve {
    points: Vec<CurvePoint>,
}

impl Default for CalibrationCurve {
    fn default() -> Self {
        Self {
            points: DEFAULT_CURVE
                .iter()
                .map(|&(angle, width_mm)| CurvePoint { angle, width_mm })
                .collect(),
        }
    }
}

const DEFAULT_CURVE: [(f32, f32); 9] = [
    (22.0, 54.0),
    (30.0, 52.0),
    (40.0, 48.0),
    (50.0, 40.0),
    (60.0, 32.0),
    (70.0, 23.0),
    (80.0, 12.0),
    (90.0, 3.0),
    (96.0, 0.0),
];

impl CalibrationCurve {
    /// Builds a curve; points must be sorted by strictly increasing angle with
    /// non-increasing width.
    pub fn new(points: Vec<CurvePoint>) -> Result<Self, String> {
        if points.len() < 2 {
            return Err(format!(
                "gripper: calibration curve needs at least 2 points, got {}",
                points.len()
            ));
        }
        if !points.iter().all(|p| p.angle.is_finite() && p.width_mm.is_finite()) {
            return Err("gripper: calibration curve contains non-finite values".to_string());
        }
        for w in points.windows(2) {
            if w[1].angle <= w[0].angle || w[1].width_mm > w[0].width_mm {
                return Err(format!(
                    "gripper: calibration curve not monotone between ({}, {}) and ({}, {})",
                    w[0].angle, w[0].width_mm, w[1].angle, w[1].width_mm
                ));
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Interpolated actuator angle for `width_mm`, clamped to the curve ends.
    pub fn angle_for_width(&self, width_mm: f32) -> f32 {
        let pts = &self.points;
        let (first, last) = (pts[0], pts[pts.len() - 1]);
        if width_mm >= first.width_mm {
            return first.angle;
        }
        if width_mm <= last.width_mm {
            return last.angle;
        }
        for seg in pts.windows(2) {
            let (a, b) = (seg[0], seg[1]);
            if width_mm <= a.width_mm && width_mm >= b.width_mm {
                let span = a.width_mm - b.width_mm;
                if span <= f32::EPSILON {
                    return a.angle;
                }
                let t = (a.width_mm - width_mm) / span;
                return a.angle + t * (b.angle - a.angle);
            }
        }
        last.angle
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GripperParams {
    pub max_aperture_mm: f32,
    /// Extra opening on approach.
    pub open_margin_mm: f32,
    /// Closing beyond the object width; zero grips at exact size.
    pub grip_margin_mm: f32,
    /// Extra opening on release.
    pub release_margin_mm: f32,
    /// Release width when no target is pending.
    pub default_release_width_mm: f32,
    /// Actuator step; commands are rounded to multiples of it.
    pub resolution: f32,
    /// Calibration points; `None` uses the built-in curve.
    pub curve: Option<Vec<CurvePoint>>,
}

impl Default for GripperParams {
    fn default() -> Self {
        Self {
            max_aperture_mm: 54.0,
            open_margin_mm: 5.0,
            grip_margin_mm: 5.0,
            release_margin_mm: 10.0,
            default_release_width_mm: 30.0,
            resolution: 1.0,
            curve: None,
        }
    }
}

impl GripperParams {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.max_aperture_mm.is_finite() && self.max_aperture_mm > 0.0) {
            return Err(format!(
                "gripper: max_aperture_mm must be positive, got {}",
                self.max_aperture_mm
            ));
        }
        for (name, v) in [
            ("open_margin_mm", self.open_margin_mm),
            ("grip_margin_mm", self.grip_margin_mm),
            ("release_margin_mm", self.release_margin_mm),
            ("default_release_width_mm", self.default_release_width_mm),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(format!("gripper: {name} must be non-negative, got {v}"));
            }
        }
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(format!(
                "gripper: resolution must be positive, got {}",
                self.resolution
            ));
        }
        self.build_curve().map(|_| ())
    }

    pub fn build_curve(&self) -> Result<CalibrationCurve, String> {
        match &self.curve {
            Some(points) => CalibrationCurve::new(points.clone()),
            None => Ok(CalibrationCurve::default()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GripperAction {
    Open,
    Grip,
    Release,
}

/// Actuator command handed to the external gripper driver.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GripperCommand {
    pub action: GripperAction,
    /// Commanded jaw opening after margins and clamping.
    pub width_mm: f32,
    pub angle: f32,
}

/// Width to actuator mapping plus the pending target between open and release.
#[derive(Clone, Debug)]
pub struct GripperCalibration {
    params: GripperParams,
    curve: CalibrationCurve,
    target_width_mm: Option<f32>,
}

impl Default for GripperCalibration {
    fn default() -> Self {
        Self {
            params: GripperParams::default(),
            curve: CalibrationCurve::default(),
            target_width_mm: None,
        }
    }
}

impl GripperCalibration {
    pub fn new(params: GripperParams) -> Result<Self, String> {
        params.validate()?;
        let curve = params.build_curve()?;
        Ok(Self {
            params,
            curve,
            target_width_mm: None,
        })
    }

    pub fn params(&self) -> &GripperParams {
        &self.params
    }

    pub fn curve(&self) -> &CalibrationCurve {
        &self.curve
    }

    pub fn target_width_mm(&self) -> Option<f32> {
        self.target_width_mm
    }

    /// Actuator command for a jaw opening, clamped to `[0, max_aperture]`.
    pub fn width_to_actuator(&self, width_mm: f32) -> f32 {
        let w = if width_mm.is_nan() {
            0.0
        } else {
            width_mm.clamp(0.0, self.params.max_aperture_mm)
        };
        let angle = self.curve.angle_for_width(w);
        let res = self.params.resolution;
        (angle / res).round() * res
    }

    fn command(&self, action: GripperAction, width_mm: f32) -> GripperCommand {
        let width_mm = width_mm.clamp(0.0, self.params.max_aperture_mm);
        let angle = self.width_to_actuator(width_mm);
        debug!("GripperCalibration: {:?} {:.1} mm -> {}", action, width_mm, angle);
        GripperCommand {
            action,
            width_mm,
            angle,
        }
    }

    /// Opens a little wider than the object and remembers it as the target.
    pub fn open_for(&mut self, width_mm: f32) -> GripperCommand {
        self.target_width_mm = Some(width_mm);
        self.command(GripperAction::Open, width_mm + self.params.open_margin_mm)
    }

    pub fn grip_for(&self, width_mm: f32) -> GripperCommand {
        self.command(
            GripperAction::Grip,
            (width_mm - self.params.grip_margin_mm).max(0.0),
        )
    }

    /// Reopens past the last target and clears it.
    pub fn release(&mut self) -> GripperCommand {
        let base = self
            .target_width_mm
            .take()
            .unwrap_or(self.params.default_release_width_mm);
        self.command(GripperAction::Release, base + self.params.release_margin_mm)
    }
}
