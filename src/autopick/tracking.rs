//! Frame-to-frame continuity without object identities.
//!
//! Each frame the object closest to the frame centre is the target; it is
//! the same object as last frame when its centre moved less than the pixel
//! tolerance on both axes and its area changed by less than the relative
//! tolerance.
use serde::Serialize;

/// Spatial signature of a tracked object.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSignature {
    pub center: [f32; 2],
    pub area: f32,
}

impl ObjectSignature {
    pub fn new(center: [f32; 2], area: f32) -> Self {
        Self { center, area }
    }

    /// Continuity test against the previously tracked signature.
    pub fn matches(&self, tracked: &ObjectSignature, position_tol_px: f32, area_tol: f32) -> bool {
        let dx = (self.center[0] - tracked.center[0]).abs();
        let dy = (self.center[1] - tracked.center[1]).abs();
        let area_change = (self.area - tracked.area).abs() / tracked.area.max(1.0);
        dx < position_tol_px && dy < position_tol_px && area_change < area_tol
    }
}

/// Index of the signature closest to `frame_center`; the first wins ties.
pub fn closest_to_center(objects: &[ObjectSignature], frame_center: [f32; 2]) -> Option<usize> {
    objects
        .iter()
        .enumerate()
        .map(|(i, o)| {
            let dx = o.center[0] - frame_center[0];
            let dy = o.center[1] - frame_center[1];
            (i, dx * dx + dy * dy)
        })
        .fold(None, |best: Option<(usize, f32)>, (i, d)| match best {
            Some((_, bd)) if bd <= d => best,
            _ => Some((i, d)),
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_prefers_first_on_tie() {
        let objs = [
            ObjectSignature::new([110.0, 100.0], 1.0),
            ObjectSignature::new([90.0, 100.0], 1.0),
            ObjectSignature::new([300.0, 300.0], 1.0),
        ];
        assert_eq!(closest_to_center(&objs, [100.0, 100.0]), Some(0));
        assert_eq!(closest_to_center(&objs, [290.0, 290.0]), Some(2));
        assert_eq!(closest_to_center(&[], [0.0, 0.0]), None);
    }

    #[test]
    fn continuity_needs_both_axes_and_area() {
        let tracked = ObjectSignature::new([100.0, 100.0], 2000.0);
        assert!(ObjectSignature::new([119.0, 81.0], 2200.0).matches(&tracked, 20.0, 0.15));
        assert!(!ObjectSignature::new([120.0, 100.0], 2000.0).matches(&tracked, 20.0, 0.15));
        assert!(!ObjectSignature::new([100.0, 100.0], 2400.0).matches(&tracked, 20.0, 0.15));
    }
}
