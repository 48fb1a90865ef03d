//! Autonomous pick trigger.
//!
//! A single-object state machine stepped once per frame:
//!
//! ```text
//! Idle ──target──▶ Detected ──dwell──▶ Stable ──next frame──▶ Countdown ──delay──▶ Picking
//!   ▲                 ▲  │ other object                         │ lost/changed      │ complete_pick
//!   │                 └──┘                                      ▼                   ▼
//!   └──────────── cooldown elapsed ◀──────────────────────── Cooldown ◀─────────────┘
//! ```
//!
//! Losing the target in Detected/Stable/Countdown returns to Idle; a
//! different target restarts Detected. Only Countdown → Picking is reported
//! to the caller (as a [`PickCommit`]). Picking is left only through
//! [`AutoPickStateMachine::complete_pick`]; detections are ignored while
//! Picking or cooling down.

pub mod tracking;

pub use tracking::{closest_to_center, ObjectSignature};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AutoPickParams {
    /// Dwell time in Detected before the object counts as stable.
    pub stable_time_sec: f64,
    /// Delay between entering Countdown and committing.
    pub countdown_sec: f64,
    /// Pause after a pick before new detections are considered.
    pub cooldown_sec: f64,
    /// Allowed centre motion per axis for the same object (px).
    pub position_tolerance_px: f32,
    /// Allowed relative area change for the same object.
    pub area_tolerance: f32,
    /// Image point targets are ranked against.
    pub frame_center: [f32; 2],
}

impl Default for AutoPickParams {
    fn default() -> Self {
        Self {
            stable_time_sec: 4.0,
            countdown_sec: 3.0,
            cooldown_sec: 3.0,
            position_tolerance_px: 20.0,
            area_tolerance: 0.15,
            frame_center: [320.0, 240.0],
        }
    }
}

impl AutoPickParams {
    pub fn validate(&self) -> Result<(), String> {
        for (name, v) in [
            ("stable_time_sec", self.stable_time_sec),
            ("countdown_sec", self.countdown_sec),
            ("cooldown_sec", self.cooldown_sec),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(format!("autopick: {name} must be non-negative, got {v}"));
            }
        }
        if !(self.position_tolerance_px.is_finite() && self.position_tolerance_px > 0.0) {
            return Err(format!(
                "autopick: position_tolerance_px must be positive, got {}",
                self.position_tolerance_px
            ));
        }
        if !(self.area_tolerance.is_finite() && self.area_tolerance > 0.0) {
            return Err(format!(
                "autopick: area_tolerance must be positive, got {}",
                self.area_tolerance
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Idle,
    Detected,
    Stable,
    Countdown,
    Picking,
    Cooldown,
}

/// How the external layer finished a pick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PickOutcome {
    Succeeded,
    Failed,
}

/// State owned by the machine. Mutated only by its transitions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickState {
    pub phase: Phase,
    /// Present iff the phase is neither Idle nor Cooldown.
    pub tracked: Option<ObjectSignature>,
    pub phase_entered_at: Option<Instant>,
}

impl Default for PickState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            tracked: None,
            phase_entered_at: None,
        }
    }
}

/// Emitted exactly once per pick, on Countdown → Picking.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickCommit {
    pub signature: ObjectSignature,
    /// Index of the committed object in the slice passed to `update`.
    pub index: usize,
}

/// Result of one `update` call.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStep {
    pub commit: Option<PickCommit>,
    /// Index of this frame's target, when detections were considered.
    pub target: Option<usize>,
    /// True when a new object started being tracked this frame.
    pub reacquired: bool,
}

#[derive(Clone, Debug, Default)]
pub struct AutoPickStateMachine {
    params: AutoPickParams,
    state: PickState,
}

impl AutoPickStateMachine {
    pub fn new(params: AutoPickParams) -> Self {
        Self {
            params,
            state: PickState::default(),
        }
    }

    pub fn params(&self) -> &AutoPickParams {
        &self.params
    }

    pub fn state(&self) -> &PickState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn tracked(&self) -> Option<&ObjectSignature> {
        self.state.tracked.as_ref()
    }

    /// Back to Idle, forgetting the tracked object.
    pub fn reset(&mut self) {
        if self.state.phase != Phase::Idle {
            debug!("AutoPick: {:?} -> Idle (reset)", self.state.phase);
        }
        self.state = PickState::default();
    }

    fn enter(&mut self, phase: Phase, tracked: Option<ObjectSignature>, now: Instant) {
        debug!("AutoPick: {:?} -> {:?}", self.state.phase, phase);
        self.state = PickState {
            phase,
            tracked,
            phase_entered_at: Some(now),
        };
    }

    fn elapsed(&self, now: Instant) -> Duration {
        self.state
            .phase_entered_at
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default()
    }

    /// Advances the machine by one frame.
    pub fn update(&mut self, objects: &[ObjectSignature], now: Instant) -> FrameStep {
        let mut step = FrameStep::default();
        match self.state.phase {
            Phase::Cooldown => {
                if self.elapsed(now).as_secs_f64() >= self.params.cooldown_sec {
                    self.reset();
                }
                return step;
            }
            Phase::Picking => return step,
            _ => {}
        }

        let Some(idx) = closest_to_center(objects, self.params.frame_center) else {
            self.reset();
            return step;
        };
        step.target = Some(idx);
        let target = objects[idx];

        let same = self.state.tracked.is_some_and(|tracked| {
            target.matches(
                &tracked,
                self.params.position_tolerance_px,
                self.params.area_tolerance,
            )
        });
        if !same {
            self.enter(Phase::Detected, Some(target), now);
            step.reacquired = true;
            return step;
        }
        self.state.tracked = Some(target);

        match self.state.phase {
            Phase::Detected => {
                if self.elapsed(now).as_secs_f64() >= self.params.stable_time_sec {
                    self.enter(Phase::Stable, Some(target), now);
                }
            }
            Phase::Stable => self.enter(Phase::Countdown, Some(target), now),
            Phase::Countdown => {
                if self.elapsed(now).as_secs_f64() >= self.params.countdown_sec {
                    self.enter(Phase::Picking, Some(target), now);
                    info!(
                        "AutoPick: commit at ({:.1}, {:.1}) area={:.0}",
                        target.center[0], target.center[1], target.area
                    );
                    step.commit = Some(PickCommit {
                        signature: target,
                        index: idx,
                    });
                }
            }
            Phase::Idle | Phase::Picking | Phase::Cooldown => {}
        }
        step
    }

    /// Leaves Picking for Cooldown. Returns false, changing nothing, when no
    /// pick is in flight.
    pub fn complete_pick(&mut self, outcome: PickOutcome, now: Instant) -> bool {
        if self.state.phase != Phase::Picking {
            warn!(
                "AutoPick: completion ({:?}) ignored in phase {:?}",
                outcome, self.state.phase
            );
            return false;
        }
        match outcome {
            PickOutcome::Succeeded => info!("AutoPick: pick succeeded"),
            PickOutcome::Failed => warn!("AutoPick: pick failed"),
        }
        self.enter(Phase::Cooldown, None, now);
        true
    }

    /// Seconds left before commit while in Countdown, otherwise 0.
    pub fn countdown_remaining(&self, now: Instant) -> f64 {
        if self.state.phase != Phase::Countdown {
            return 0.0;
        }
        (self.params.countdown_sec - self.elapsed(now).as_secs_f64()).max(0.0)
    }

    /// Fraction of the dwell time served while in Detected, otherwise 0.
    pub fn stable_progress(&self, now: Instant) -> f64 {
        if self.state.phase != Phase::Detected {
            return 0.0;
        }
        if self.params.stable_time_sec <= 0.0 {
            return 1.0;
        }
        (self.elapsed(now).as_secs_f64() / self.params.stable_time_sec).min(1.0)
    }
}
