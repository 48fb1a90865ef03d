//! Replays a scene through a pick session and writes the frame reports.
//!
//! Usage: `pick_demo [config.json]`. Without a config, a synthetic ring
//! resting at the frame centre is replayed with default calibration.
use grasp_pick::config::demo::{self as cfg, PickDemoConfig, Scene, SceneFrame};
use grasp_pick::image::io::{load_depth_image, write_json_file};
use grasp_pick::image::{DepthMap, ImageView};
use grasp_pick::types::{PixelRect, Region};
use grasp_pick::{FrameReport, PickConfig, PickOutcome, PickSession};
use log::info;
use std::env;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let (config, scene, depth, floor) = match env::args().nth(1) {
        Some(path) => load_inputs(Path::new(&path))?,
        None => synthetic_inputs(),
    };

    let mut session = PickSession::new(&config.pick)?;
    if let Some(floor) = &floor {
        session
            .calibrate_floor(floor)
            .ok_or("Floor calibration found no finite depth samples")?;
    }
    if let Some(depth) = depth {
        let (lo, hi) = depth_range(&depth);
        info!("depth map {}x{} range [{lo:.3}, {hi:.3}]", depth.width(), depth.height());
        session.submit_depth(depth);
    }

    let t0 = Instant::now();
    let dt = Duration::from_secs_f64(config.frame_interval_sec.max(0.0));
    let mut reports: Vec<FrameReport> = Vec::with_capacity(scene.frames.len());
    let mut pick_frames_left: Option<usize> = None;
    let mut picks = 0usize;

    for (i, frame) in scene.frames.iter().enumerate() {
        let now = t0 + dt * i as u32;
        let report = session.process_frame(&frame.regions, now);
        if let Some(plan) = &report.commit {
            picks += 1;
            match &plan.target {
                Some(t) => info!(
                    "frame {i}: pick at x={:.1} y={:.1} z={:.1} r={:.1}, open {} / grip {}",
                    t.x, t.y, t.z, t.r, plan.open.angle, plan.grip.angle
                ),
                None => info!("frame {i}: pick committed without workspace target"),
            }
            pick_frames_left = Some(config.pick_duration_frames);
        }
        let in_flight = session.active_plan().is_some();
        if let (Some(reading), true) = (frame.range_reading_mm, in_flight) {
            if let Some(plan) = session.apply_range_reading(reading) {
                info!("frame {i}: range reading {reading:.1} mm -> z={:.1}", plan.z);
            }
        }
        reports.push(report);

        pick_frames_left = match pick_frames_left {
            Some(0) => {
                session.complete_pick(PickOutcome::Succeeded, now);
                let release = session.release_gripper();
                info!("frame {i}: pick complete, release to {}", release.angle);
                None
            }
            Some(n) => Some(n - 1),
            None => None,
        };
    }

    println!(
        "frames={} picks={} final_phase={:?}",
        reports.len(),
        picks,
        session.phase()
    );
    let path = config.output.report_path();
    write_json_file(&path, &reports)?;
    println!("Frame reports written to {}", path.display());
    Ok(())
}

type Inputs = (PickDemoConfig, Scene, Option<DepthMap>, Option<DepthMap>);

fn load_inputs(path: &Path) -> Result<Inputs, String> {
    let config = cfg::load_config(path)?;
    let scene = match &config.scene {
        Some(p) => cfg::load_scene(p)?,
        None => synthetic_scene(),
    };
    let depth = config
        .depth
        .as_ref()
        .map(|d| load_depth_image(&d.path, d.scale))
        .transpose()?;
    let floor = config
        .floor_depth
        .as_ref()
        .map(|d| load_depth_image(&d.path, d.scale))
        .transpose()?;
    Ok((config, scene, depth, floor))
}

fn synthetic_inputs() -> Inputs {
    let config = PickDemoConfig {
        scene: None,
        depth: None,
        floor_depth: None,
        frame_interval_sec: 0.1,
        pick_duration_frames: 10,
        pick: PickConfig::default(),
        output: cfg::DemoOutputConfig {
            dir: PathBuf::from("out"),
            report_json: PathBuf::from("pick_report.json"),
        },
    };
    let floor = DepthMap::filled(640, 480, 0.40);
    let mut depth = floor.clone();
    depth.fill_rect(&PixelRect::new(260.0, 180.0, 120.0, 120.0), 0.75);
    (config, synthetic_scene(), Some(depth), Some(floor))
}

/// A ring of outer radius 60 px and hole radius 30 px at the frame centre,
/// seen for 12 s at 10 fps.
fn synthetic_scene() -> Scene {
    let circle = |r: f32| -> Vec<[f32; 2]> {
        (0..96)
            .map(|i| {
                let t = i as f32 / 96.0 * std::f32::consts::TAU;
                [320.0 + r * t.cos(), 240.0 + r * t.sin()]
            })
            .collect()
    };
    let region = Region {
        bbox: PixelRect::new(260.0, 180.0, 120.0, 120.0),
        outer: circle(60.0),
        hole: Some(circle(30.0)),
    };
    Scene {
        frames: (0..120)
            .map(|_| SceneFrame {
                regions: vec![region.clone()],
                range_reading_mm: None,
            })
            .collect(),
    }
}

fn depth_range(depth: &DepthMap) -> (f32, f32) {
    depth
        .rows()
        .flatten()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}
