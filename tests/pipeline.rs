mod common;

use common::synthetic::ring_region;
use grasp_pick::autopick::AutoPickParams;
use grasp_pick::coords::MapperParams;
use grasp_pick::gripper::GripperAction;
use grasp_pick::height::HeightParams;
use grasp_pick::image::DepthMap;
use grasp_pick::session::{CandidateMode, SessionParams};
use grasp_pick::types::GraspKind;
use grasp_pick::{Phase, PickConfig, PickOutcome, PickSession};
use std::time::{Duration, Instant};

const FLOOR: f32 = 0.40;
const TOP: f32 = 0.75;

fn config() -> PickConfig {
    PickConfig {
        coords: MapperParams {
            homography: Some([[0.5, 0.0, 100.0], [0.0, 0.5, -50.0], [0.0, 0.0, 1.0]]),
            ..Default::default()
        },
        autopick: AutoPickParams {
            stable_time_sec: 1.0,
            countdown_sec: 1.0,
            cooldown_sec: 1.0,
            ..Default::default()
        },
        height: HeightParams {
            range_floor_mm: Some(120.0),
            range_correction_mm: -20.0,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn uniform_config() -> PickConfig {
    PickConfig {
        session: SessionParams {
            candidate_mode: CandidateMode::DepthUniform,
            ..Default::default()
        },
        ..config()
    }
}

fn session_with_depth() -> PickSession {
    with_depth(&config())
}

fn with_depth(config: &PickConfig) -> PickSession {
    let mut session = PickSession::new(config).expect("valid config");
    assert_eq!(session.calibrate_floor(&DepthMap::filled(640, 480, FLOOR)), Some(FLOOR));
    let mut depth = DepthMap::filled(640, 480, FLOOR);
    depth.fill_rect(&ring_region([320.0, 240.0], 60.0, 30.0, 0.0).bbox, TOP);
    session.submit_depth(depth);
    session
}

#[test]
fn steady_ring_produces_one_mapped_pick() {
    let mut session = session_with_depth();
    let regions = [ring_region([320.0, 240.0], 60.0, 30.0, 0.0)];
    let t0 = Instant::now();

    let mut plans = Vec::new();
    for i in 0..16u32 {
        let report = session.process_frame(&regions, t0 + Duration::from_millis(250) * i);
        assert_eq!(report.objects.len(), 1);
        if let Some(plan) = report.commit {
            plans.push((i, plan));
        }
    }
    // detected at 0 s, stable at 1 s, countdown from 1.25 s, commit at 2.25 s
    assert_eq!(plans.len(), 1);
    let (frame, plan) = &plans[0];
    assert_eq!(*frame, 9);
    assert_eq!(session.phase(), Phase::Picking);

    assert_eq!(plan.candidate.kind, GraspKind::RingEdge);
    assert!(plan.candidate.aperture_mm > 0.0 && plan.candidate.aperture_mm <= 54.0);
    let expected_height = (TOP - FLOOR) * 57.428_993;
    assert!((plan.height_mm - expected_height).abs() < 0.05, "height={}", plan.height_mm);
    assert!((plan.z - (-64.0 + expected_height as f64 * 0.5)).abs() < 0.05);

    let target = plan.target.expect("homography is set");
    let [cx, cy] = plan.candidate.center_px;
    assert!((target.x - (0.5 * cx as f64 + 100.0)).abs() < 1e-6);
    assert!((target.y - (0.5 * cy as f64 - 50.0)).abs() < 1e-6);
    assert!((target.r - (-25.55 - plan.candidate.approach_angle_deg as f64)).abs() < 1e-6);
    assert!(plan.sensor_probe.is_some());

    assert_eq!(plan.open.action, GripperAction::Open);
    assert_eq!(plan.grip.action, GripperAction::Grip);
    assert!(plan.open.width_mm > plan.grip.width_mm);
    assert!(plan.open.angle <= plan.grip.angle);
}

#[test]
fn range_reading_refines_plan_then_cooldown_blocks_new_picks() {
    let mut session = session_with_depth();
    let regions = [ring_region([320.0, 240.0], 60.0, 30.0, 0.0)];
    let t0 = Instant::now();
    let at = |i: u32| t0 + Duration::from_millis(250) * i;

    let mut committed = None;
    for i in 0..10 {
        if let Some(plan) = session.process_frame(&regions, at(i)).commit {
            committed = Some(plan);
        }
    }
    let aperture = committed.expect("committed by frame 9").candidate.aperture_mm;

    // 120 - (110 - 20) = 30 mm
    let plan = session.apply_range_reading(110.0).expect("pick in flight").clone();
    assert!((plan.height_mm - 30.0).abs() < 1e-4);
    assert!((plan.z - -49.0).abs() < 1e-6);
    assert_eq!(plan.target.map(|t| t.z), Some(plan.z));

    assert!(session.complete_pick(PickOutcome::Succeeded, at(10)));
    assert_eq!(session.last_outcome(), Some(PickOutcome::Succeeded));
    assert!(session.active_plan().is_none());
    let release = session.release_gripper();
    assert_eq!(release.action, GripperAction::Release);
    assert!((release.width_mm - (aperture + 10.0)).abs() < 1e-4);

    let report = session.process_frame(&regions, at(11));
    assert_eq!(report.phase, Phase::Cooldown);
    assert!(report.commit.is_none());
    session.process_frame(&regions, at(14));
    assert_eq!(session.phase(), Phase::Idle);
    session.process_frame(&regions, at(15));
    assert_eq!(session.phase(), Phase::Detected);
}

#[test]
fn uncalibrated_mapper_still_plans_without_target() {
    let mut session = PickSession::new(&PickConfig::default()).expect("defaults are valid");
    session.process_frame(&[ring_region([320.0, 240.0], 60.0, 30.0, 0.0)], Instant::now());
    let plan = session.plan_for(0, 0).expect("ring has candidates");
    assert!(plan.target.is_none());
    assert!(plan.sensor_probe.is_none());
    // no depth map: height falls back to zero and Z to the floor
    assert_eq!(plan.height_mm, 0.0);
    assert_eq!(plan.z, -64.0);
}

#[test]
fn manual_mode_never_commits() {
    let mut session = session_with_depth();
    session.set_auto_mode(false);
    let regions = [ring_region([320.0, 240.0], 60.0, 30.0, 0.0)];
    let t0 = Instant::now();
    for i in 0..20u32 {
        let report = session.process_frame(&regions, t0 + Duration::from_millis(250) * i);
        assert!(report.commit.is_none());
        assert_eq!(report.phase, Phase::Idle);
    }
}

#[test]
fn candidate_override_is_used_on_commit() {
    let mut session = session_with_depth();
    let regions = [ring_region([320.0, 240.0], 60.0, 30.0, 0.0)];
    let t0 = Instant::now();
    session.process_frame(&regions, t0);
    assert!(session.select_candidate(2));
    assert!(!session.select_candidate(10));

    let mut commit = None;
    for i in 1..12u32 {
        let report = session.process_frame(&regions, t0 + Duration::from_millis(250) * i);
        assert_eq!(report.selected_rank, 2);
        commit = commit.or(report.commit);
    }
    let plan = commit.expect("commit");
    let third = session.objects()[0].candidates[2];
    assert_eq!(plan.candidate, third);
}

#[test]
fn range_reading_without_pick_leaves_height_alone() {
    let mut session = session_with_depth();
    let regions = [ring_region([320.0, 240.0], 60.0, 30.0, 0.0)];
    let t0 = Instant::now();
    let before = session.process_frame(&regions, t0).tracked_height_mm;
    assert!(before.is_some());

    assert!(session.apply_range_reading(110.0).is_none());
    let after = session
        .process_frame(&regions, t0 + Duration::from_millis(250))
        .tracked_height_mm;
    assert_eq!(after, before);
    assert_eq!(session.height_estimator().history_len(), 2);
}

#[test]
fn uniform_mode_reuses_the_latest_depth_map() {
    let mut session = with_depth(&uniform_config());
    let regions = [ring_region([320.0, 240.0], 60.0, 30.0, 0.0)];
    let t0 = Instant::now();

    let frames = 5u32;
    let mut last = None;
    for i in 0..frames {
        let report = session.process_frame(&regions, t0 + Duration::from_millis(100) * i);
        assert_eq!(report.depth_age_frames, Some(i as u64));
        last = Some(report);
    }
    let report = last.expect("frames ran");
    assert_eq!(report.depth_age_frames, Some(frames as u64 - 1));
    let cands = &report.objects[0].candidates;
    assert!(!cands.is_empty());
    assert!(cands.iter().all(|c| c.kind == GraspKind::DepthUniform && c.score > 0.0));

    // a fresh map restarts the age count
    session.submit_depth(DepthMap::filled(640, 480, TOP));
    let report = session.process_frame(&regions, t0 + Duration::from_millis(100) * frames);
    assert_eq!(report.depth_age_frames, Some(0));
}

#[test]
fn uniform_mode_never_commits_without_depth_under_the_object() {
    let mut session = PickSession::new(&uniform_config()).expect("valid config");
    // map smaller than the camera frame; the ring lies outside it
    session.submit_depth(DepthMap::filled(100, 100, TOP));
    let regions = [ring_region([320.0, 240.0], 60.0, 30.0, 0.0)];
    let t0 = Instant::now();
    for i in 0..20u32 {
        let report = session.process_frame(&regions, t0 + Duration::from_millis(250) * i);
        assert!(report.objects[0].candidates.is_empty());
        assert!(report.commit.is_none());
        assert_eq!(report.phase, Phase::Idle);
    }
}
