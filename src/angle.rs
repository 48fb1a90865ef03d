//! Angle utilities for grasp orientations.
//!
//! A parallel-jaw grasp is symmetric under a half turn, so grasp angles live
//! in the half-open range (−90°, 90°]. All angles here are in degrees.

/// Normalizes an angle in degrees into the range (−90, 90].
///
/// Equivalent to repeatedly adding or subtracting 180° until the value falls
/// into range. Non-finite inputs are returned unchanged.
#[inline]
pub fn normalize_grasp_deg(angle: f32) -> f32 {
    if !angle.is_finite() || (angle > -90.0 && angle <= 90.0) {
        return angle;
    }
    let mut out = 90.0 - (90.0 - angle).rem_euclid(180.0);
    // rem_euclid may round up to exactly 180 for tiny negative remainders
    if out <= -90.0 {
        out += 180.0;
    }
    out
}

/// Smallest unsigned difference between two grasp angles in degrees,
/// treating antipodal directions as equivalent. Returns a value in [0, 90].
#[inline]
pub fn grasp_angle_difference(a: f32, b: f32) -> f32 {
    let diff = (a - b).rem_euclid(180.0);
    if diff > 90.0 {
        180.0 - diff
    } else {
        diff
    }
}

/// Direction angle in degrees of a 2D vector, in (−180, 180].
#[inline]
pub fn direction_deg(v: [f32; 2]) -> f32 {
    v[1].atan2(v[0]).to_degrees()
}

/// Unit vector pointing along `angle_deg`.
#[inline]
pub fn unit_vector(angle_deg: f32) -> [f32; 2] {
    let r = angle_deg.to_radians();
    [r.cos(), r.sin()]
}
