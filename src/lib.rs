#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod autopick;
pub mod config;
pub mod diagnostics;
pub mod grasp;
pub mod session;
pub mod types;

// Building blocks, public for tools and tests.
pub mod angle;
pub mod coords;
pub mod gripper;
pub mod height;
pub mod image;
pub mod shape;

// --- High-level re-exports -------------------------------------------------

pub use crate::autopick::{AutoPickStateMachine, Phase, PickOutcome};
pub use crate::config::PickConfig;
pub use crate::coords::CoordinateMapper;
pub use crate::diagnostics::FrameReport;
pub use crate::grasp::GraspGenerator;
pub use crate::gripper::GripperCalibration;
pub use crate::height::HeightEstimator;
pub use crate::session::{PickPlan, PickSession};
pub use crate::shape::ShapeAnalyzer;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use grasp_pick::prelude::*;
/// use std::time::Instant;
///
/// # fn main() -> Result<(), String> {
/// let mut session = PickSession::new(&PickConfig::default())?;
/// let regions: Vec<Region> = Vec::new();
/// let report = session.process_frame(&regions, Instant::now());
/// println!("phase={:?} objects={}", report.phase, report.objects.len());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::DepthMap;
    pub use crate::types::{DetectedObject, GraspCandidate, PixelRect, Region};
    pub use crate::{FrameReport, Phase, PickConfig, PickOutcome, PickPlan, PickSession};
}
