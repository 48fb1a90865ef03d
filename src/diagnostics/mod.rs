//! Per-frame status report for display and JSON dumps.
//!
//! A [`FrameReport`] is returned by every
//! [`PickSession::process_frame`](crate::session::PickSession::process_frame)
//! call. It bundles the analyzed objects with their ranked candidates, the
//! state machine readouts, and the pick plan when this frame committed.

pub mod timing;

pub use timing::{StageTiming, TimingBreakdown};

use crate::autopick::Phase;
use crate::session::PickPlan;
use crate::types::{DetectedObject, GraspCandidate};
use serde::Serialize;

/// One analyzed object and its ranked candidates (best first).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReport {
    pub object: DetectedObject,
    pub candidates: Vec<GraspCandidate>,
}

impl ObjectReport {
    pub fn best(&self) -> Option<&GraspCandidate> {
        self.candidates.first()
    }

    pub fn is_graspable(&self) -> bool {
        !self.candidates.is_empty()
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReport {
    pub frame_index: u64,
    pub phase: Phase,
    pub auto_mode: bool,
    pub objects: Vec<ObjectReport>,
    /// Index into `objects` of the object the state machine is watching.
    pub tracked_object: Option<usize>,
    /// Smoothed height of the tracked object.
    pub tracked_height_mm: Option<f32>,
    /// Candidate rank used for the tracked object (0 unless overridden).
    pub selected_rank: usize,
    pub stable_progress: f64,
    pub countdown_remaining_sec: f64,
    /// Frames since the depth map in use arrived; `None` without a map.
    pub depth_age_frames: Option<u64>,
    /// Present only on the frame that committed to a pick.
    pub commit: Option<PickPlan>,
    pub timings: TimingBreakdown,
}

impl FrameReport {
    pub fn tracked(&self) -> Option<&ObjectReport> {
        self.tracked_object.and_then(|i| self.objects.get(i))
    }

    pub fn candidate_count(&self) -> usize {
        self.objects.iter().map(|o| o.candidates.len()).sum()
    }
}
