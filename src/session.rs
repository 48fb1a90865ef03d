//! Per-session pick pipeline.
//!
//! [`PickSession`] owns every component and all cross-frame state: the
//! state machine, the height history, the latest depth map and the frame
//! counter. One call to [`PickSession::process_frame`] per camera frame runs
//!
//! regions → shape analysis → candidate generation → state machine →
//! (on commit) height, workspace pose and gripper commands.
//!
//! Depth maps arrive on their own cadence through
//! [`PickSession::submit_depth`]; each frame uses the most recent one.
//! Mutating calls must be serialized by the host.

use crate::autopick::{AutoPickStateMachine, ObjectSignature, Phase, PickOutcome};
use crate::config::PickConfig;
use crate::coords::CoordinateMapper;
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{FrameReport, ObjectReport, TimingBreakdown};
use crate::grasp::GraspGenerator;
use crate::gripper::{GripperCalibration, GripperCommand};
use crate::height::HeightEstimator;
use crate::image::DepthMap;
use crate::shape::ShapeAnalyzer;
use crate::types::{DetectedObject, GraspCandidate, Region, WorkspacePose};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Which generator produces candidates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CandidateMode {
    /// Geometric rules per shape class.
    #[default]
    ShapeAware,
    /// Depth-uniformity scoring over bounding boxes; needs a depth map.
    DepthUniform,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SessionParams {
    /// Step the state machine every frame. When off, candidates are still
    /// produced and picks are planned on request only.
    pub auto_mode: bool,
    pub candidate_mode: CandidateMode,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            auto_mode: true,
            candidate_mode: CandidateMode::ShapeAware,
        }
    }
}

/// Everything the motion and gripper layer needs to execute one pick.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickPlan {
    pub candidate: GraspCandidate,
    pub height_mm: f32,
    pub z: f64,
    /// Workspace target; `None` while the homography is unset.
    pub target: Option<WorkspacePose>,
    pub open: GripperCommand,
    pub grip: GripperCommand,
    /// Tool position that puts the height sensor over the candidate's
    /// sensing point.
    pub sensor_probe: Option<[f64; 2]>,
}

#[derive(Clone, Debug)]
struct LatestDepth {
    map: DepthMap,
    frame: u64,
}

pub struct PickSession {
    params: SessionParams,
    analyzer: ShapeAnalyzer,
    generator: GraspGenerator,
    height: HeightEstimator,
    mapper: CoordinateMapper,
    gripper: GripperCalibration,
    autopick: AutoPickStateMachine,
    frame_index: u64,
    depth: Option<LatestDepth>,
    objects: Vec<ObjectReport>,
    tracked_object: Option<usize>,
    tracked_height_mm: Option<f32>,
    override_rank: Option<usize>,
    active_plan: Option<PickPlan>,
    range_readings: usize,
    last_outcome: Option<PickOutcome>,
}

impl PickSession {
    /// Builds a session from a validated calibration bundle.
    pub fn new(config: &PickConfig) -> Result<Self, String> {
        config.validate()?;
        let gripper = GripperCalibration::new(config.gripper.clone())?;
        let mut height = HeightEstimator::new(config.height.clone());
        if let Some(floor) = config.floor_reference {
            height.set_floor_reference(floor);
        }
        Ok(Self {
            params: config.session.clone(),
            analyzer: ShapeAnalyzer::new(config.shape.clone()),
            generator: GraspGenerator::new(config.grasp.clone()),
            height,
            mapper: CoordinateMapper::new(&config.coords),
            gripper,
            autopick: AutoPickStateMachine::new(config.autopick.clone()),
            frame_index: 0,
            depth: None,
            objects: Vec::new(),
            tracked_object: None,
            tracked_height_mm: None,
            override_rank: None,
            active_plan: None,
            range_readings: 0,
            last_outcome: None,
        })
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn mapper_mut(&mut self) -> &mut CoordinateMapper {
        &mut self.mapper
    }

    pub fn height_estimator(&self) -> &HeightEstimator {
        &self.height
    }

    pub fn gripper(&self) -> &GripperCalibration {
        &self.gripper
    }

    pub fn state_machine(&self) -> &AutoPickStateMachine {
        &self.autopick
    }

    pub fn phase(&self) -> Phase {
        self.autopick.phase()
    }

    /// Number of frames processed so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn objects(&self) -> &[ObjectReport] {
        &self.objects
    }

    pub fn active_plan(&self) -> Option<&PickPlan> {
        self.active_plan.as_ref()
    }

    pub fn last_outcome(&self) -> Option<PickOutcome> {
        self.last_outcome
    }

    pub fn auto_mode(&self) -> bool {
        self.params.auto_mode
    }

    /// Turning auto mode off drops any tracked object that has not yet
    /// committed; a pick in flight is unaffected.
    pub fn set_auto_mode(&mut self, enabled: bool) {
        if self.params.auto_mode == enabled {
            return;
        }
        info!("PickSession: auto mode {}", if enabled { "on" } else { "off" });
        self.params.auto_mode = enabled;
        if !enabled && !matches!(self.autopick.phase(), Phase::Picking | Phase::Cooldown) {
            self.autopick.reset();
            self.tracked_object = None;
        }
    }

    /// Captures the floor reference from an empty-workspace depth map.
    pub fn calibrate_floor(&mut self, depth: &DepthMap) -> Option<f32> {
        self.height.calibrate_floor(depth)
    }

    /// Replaces the depth map used by subsequent frames.
    pub fn submit_depth(&mut self, map: DepthMap) {
        self.depth = Some(LatestDepth {
            map,
            frame: self.frame_index,
        });
    }

    /// Frames processed since the current depth map arrived.
    pub fn depth_age_frames(&self) -> Option<u64> {
        self.depth
            .as_ref()
            .map(|d| self.frame_index.saturating_sub(d.frame))
    }

    /// Chooses a non-best candidate rank for the tracked object. Cleared when
    /// the tracked object changes.
    pub fn select_candidate(&mut self, rank: usize) -> bool {
        let Some(report) = self.tracked_object.and_then(|i| self.objects.get(i)) else {
            return false;
        };
        if rank >= report.candidates.len() {
            return false;
        }
        debug!("PickSession: candidate rank {} selected", rank);
        self.override_rank = Some(rank);
        true
    }

    pub fn clear_candidate_override(&mut self) {
        self.override_rank = None;
    }

    /// Runs one frame.
    pub fn process_frame(&mut self, regions: &[Region], now: Instant) -> FrameReport {
        let frame_start = Instant::now();
        let mut timings = TimingBreakdown::default();

        let analyzer = &self.analyzer;
        let objects = timings.measure("shape", || analyzer.analyze_all(regions));
        let candidates = timings.measure("grasp", || self.generate_all(&objects));
        self.objects = objects
            .into_iter()
            .zip(candidates)
            .map(|(object, candidates)| ObjectReport { object, candidates })
            .collect();

        let mut commit = None;
        if self.params.auto_mode {
            let step_start = Instant::now();
            let graspable: Vec<usize> = (0..self.objects.len())
                .filter(|&i| self.objects[i].is_graspable())
                .collect();
            let signatures: Vec<ObjectSignature> = graspable
                .iter()
                .map(|&i| {
                    let o = &self.objects[i].object;
                    ObjectSignature::new(o.center, o.area)
                })
                .collect();
            let step = self.autopick.update(&signatures, now);
            if step.reacquired {
                self.height.reset_history();
                self.override_rank = None;
                self.tracked_height_mm = None;
            }
            self.tracked_object = step.target.map(|t| graspable[t]);
            if let Some(c) = step.commit {
                commit = Some(graspable[c.index]);
            }
            timings.push("autopick", elapsed_ms(step_start));
        } else if !matches!(self.autopick.phase(), Phase::Picking | Phase::Cooldown) {
            self.tracked_object = None;
        } else {
            // cooldown still elapses with auto mode off
            self.autopick.update(&[], now);
        }

        if let Some(idx) = self.tracked_object {
            let height_start = Instant::now();
            if let Some(depth) = &self.depth {
                let bbox = self.objects[idx].object.bounding_box;
                self.tracked_height_mm = Some(self.height.estimate_height(&depth.map, &bbox));
            }
            timings.push("height", elapsed_ms(height_start));
        }

        let plan = commit.and_then(|idx| {
            let rank = self.override_rank.unwrap_or(0);
            let plan = self.plan_for(idx, rank);
            if plan.is_none() {
                warn!("PickSession: committed object {} has no candidate", idx);
            }
            plan
        });
        if let Some(p) = &plan {
            self.active_plan = Some(p.clone());
            self.range_readings = 0;
        }

        timings.finish(frame_start);
        let report = FrameReport {
            frame_index: self.frame_index,
            phase: self.autopick.phase(),
            auto_mode: self.params.auto_mode,
            objects: self.objects.clone(),
            tracked_object: self.tracked_object,
            tracked_height_mm: self.tracked_height_mm,
            selected_rank: self.override_rank.unwrap_or(0),
            stable_progress: self.autopick.stable_progress(now),
            countdown_remaining_sec: self.autopick.countdown_remaining(now),
            depth_age_frames: self.depth_age_frames(),
            commit: plan,
            timings,
        };
        self.frame_index += 1;
        report
    }

    fn generate_all(&self, objects: &[DetectedObject]) -> Vec<Vec<GraspCandidate>> {
        let generate = |obj: &DetectedObject| -> Vec<GraspCandidate> {
            match self.params.candidate_mode {
                CandidateMode::ShapeAware => self.generator.generate_candidates(obj),
                CandidateMode::DepthUniform => match &self.depth {
                    Some(d) => self.generator.generate_uniform(&d.map, &obj.bounding_box),
                    None => Vec::new(),
                },
            }
        };
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            objects.par_iter().map(generate).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            objects.iter().map(generate).collect()
        }
    }

    /// Plans a pick of candidate `rank` of object `object_index` from the last
    /// processed frame, without involving the state machine. Opening the
    /// gripper records the aperture as its pending target.
    pub fn plan_for(&mut self, object_index: usize, rank: usize) -> Option<PickPlan> {
        let report = self.objects.get(object_index)?;
        let candidate = *report
            .candidates
            .get(rank)
            .or_else(|| report.candidates.first())?;
        let height_mm = if self.tracked_object == Some(object_index) {
            self.tracked_height_mm.unwrap_or(0.0)
        } else {
            self.depth
                .as_ref()
                .and_then(|d| self.height.measure_height(&d.map, &report.object.bounding_box))
                .unwrap_or(0.0)
        };
        let z = self.height.height_to_z(height_mm);
        let target = self
            .mapper
            .pixel_to_workspace(candidate.center_px)
            .map(|[x, y]| WorkspacePose {
                x,
                y,
                z,
                r: self.mapper.image_angle_to_approach(candidate.approach_angle_deg),
            });
        if target.is_none() {
            warn!("PickSession: homography unset, pick has no workspace target");
        }
        let sensor_probe = self.mapper.sensor_position_for(candidate.sensor_point_px);
        let open = self.gripper.open_for(candidate.aperture_mm);
        let grip = self.gripper.grip_for(candidate.aperture_mm);
        info!(
            "PickSession: plan {:?} aperture={:.1} mm height={:.1} mm z={:.1}",
            candidate.kind, candidate.aperture_mm, height_mm, z
        );
        Some(PickPlan {
            candidate,
            height_mm,
            z,
            target,
            open,
            grip,
            sensor_probe,
        })
    }

    /// Feeds a rangefinder reading taken over the active plan's sensing
    /// point and refreshes that plan's height and Z. The first reading for a
    /// plan replaces the depth-derived history. Without a pick in flight the
    /// reading is ignored and nothing changes.
    pub fn apply_range_reading(&mut self, reading_mm: f32) -> Option<&PickPlan> {
        if self.active_plan.is_none() {
            debug!(
                "PickSession: range reading {:.1} mm ignored, no pick in flight",
                reading_mm
            );
            return None;
        }
        if self.range_readings == 0 {
            self.height.reset_history();
        }
        self.range_readings += 1;
        let height_mm = self.height.estimate_height_from_range(reading_mm);
        self.tracked_height_mm = Some(height_mm);
        let z = self.height.height_to_z(height_mm);
        let plan = self.active_plan.as_mut()?;
        plan.height_mm = height_mm;
        plan.z = z;
        if let Some(t) = plan.target.as_mut() {
            t.z = z;
        }
        Some(&*plan)
    }

    /// Reports the end of the pick in flight. Returns false when nothing was
    /// in flight.
    pub fn complete_pick(&mut self, outcome: PickOutcome, now: Instant) -> bool {
        if !self.autopick.complete_pick(outcome, now) {
            return false;
        }
        self.last_outcome = Some(outcome);
        self.active_plan = None;
        self.override_rank = None;
        self.tracked_object = None;
        self.tracked_height_mm = None;
        self.height.reset_history();
        true
    }

    /// Reopens the gripper after the object has been placed.
    pub fn release_gripper(&mut self) -> GripperCommand {
        self.gripper.release()
    }
}
