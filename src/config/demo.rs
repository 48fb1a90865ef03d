//! Configuration of the `pick_demo` binary: a recorded scene replayed
//! through a [`PickSession`](crate::session::PickSession).
use super::bundle::PickConfig;
use crate::types::Region;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct PickDemoConfig {
    /// Scene file with per-frame regions. Without one a synthetic scene is used.
    #[serde(default)]
    pub scene: Option<PathBuf>,
    /// Depth image handed to the session before the first frame.
    #[serde(default)]
    pub depth: Option<DepthInput>,
    /// Empty-workspace depth image used for floor calibration.
    #[serde(default)]
    pub floor_depth: Option<DepthInput>,
    #[serde(default = "default_frame_interval")]
    pub frame_interval_sec: f64,
    /// Frames a committed pick stays in flight before completion is reported.
    #[serde(default = "default_pick_frames")]
    pub pick_duration_frames: usize,
    #[serde(default)]
    pub pick: PickConfig,
    pub output: DemoOutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct DepthInput {
    pub path: PathBuf,
    /// Multiplier applied to raw pixel values.
    #[serde(default = "default_depth_scale")]
    pub scale: f32,
}

#[derive(Debug, Deserialize)]
pub struct DemoOutputConfig {
    pub dir: PathBuf,
    #[serde(default = "default_report_name")]
    pub report_json: PathBuf,
}

impl DemoOutputConfig {
    pub fn report_path(&self) -> PathBuf {
        resolve_path(&self.dir, &self.report_json)
    }
}

/// One recorded frame of detector output.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SceneFrame {
    #[serde(default)]
    pub regions: Vec<Region>,
    /// Rangefinder reading taken during this frame, if any.
    #[serde(default)]
    pub range_reading_mm: Option<f32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Scene {
    pub frames: Vec<SceneFrame>,
}

fn default_frame_interval() -> f64 {
    0.1
}

fn default_pick_frames() -> usize {
    10
}

fn default_depth_scale() -> f32 {
    1.0 / 255.0
}

fn default_report_name() -> PathBuf {
    PathBuf::from("pick_report.json")
}

pub fn load_config(path: &Path) -> Result<PickDemoConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let mut config: PickDemoConfig = serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    config
        .pick
        .validate()
        .map_err(|e| format!("Invalid config {}: {e}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    if let Some(scene) = config.scene.as_mut() {
        *scene = resolve_path(base, scene);
    }
    for input in [config.depth.as_mut(), config.floor_depth.as_mut()]
        .into_iter()
        .flatten()
    {
        input.path = resolve_path(base, &input.path);
    }
    Ok(config)
}

pub fn load_scene(path: &Path) -> Result<Scene, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read scene {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse scene {}: {e}", path.display()))
}

fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
