use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in pixel space: top-left corner plus size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Tight bounds of a point set. `None` for an empty set.
    pub fn from_points(points: &[[f32; 2]]) -> Option<Self> {
        let first = points.first()?;
        let (mut x0, mut y0, mut x1, mut y1) = (first[0], first[1], first[0], first[1]);
        for p in &points[1..] {
            x0 = x0.min(p[0]);
            y0 = y0.min(p[1]);
            x1 = x1.max(p[0]);
            y1 = y1.max(p[1]);
        }
        Some(Self::new(x0, y0, x1 - x0, y1 - y0))
    }

    pub fn center(&self) -> [f32; 2] {
        [self.x + 0.5 * self.width, self.y + 0.5 * self.height]
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn contains(&self, p: [f32; 2]) -> bool {
        p[0] >= self.x
            && p[0] < self.x + self.width
            && p[1] >= self.y
            && p[1] < self.y + self.height
    }
}

/// Minimum-area rectangle in pixel space.
///
/// `width` is measured along the direction `angle_deg`, `height` along the
/// perpendicular direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrientedRect {
    pub center: [f32; 2],
    pub width: f32,
    pub height: f32,
    pub angle_deg: f32,
}

impl OrientedRect {
    /// Axis-aligned oriented rectangle covering `rect`.
    pub fn from_axis_aligned(rect: &PixelRect) -> Self {
        Self {
            center: rect.center(),
            width: rect.width.max(0.0),
            height: rect.height.max(0.0),
            angle_deg: 0.0,
        }
    }

    pub fn short_side(&self) -> f32 {
        self.width.min(self.height)
    }

    pub fn long_side(&self) -> f32 {
        self.width.max(self.height)
    }

    /// Long side over short side; infinite for a zero-width rectangle.
    pub fn aspect_ratio(&self) -> f32 {
        let short = self.short_side();
        if short <= f32::EPSILON {
            f32::INFINITY
        } else {
            self.long_side() / short
        }
    }

    /// Direction (degrees) along which the short side runs.
    pub fn short_side_angle_deg(&self) -> f32 {
        if self.width <= self.height {
            self.angle_deg
        } else {
            self.angle_deg + 90.0
        }
    }
}

/// One segmented region handed over by the external detector.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub bbox: PixelRect,
    /// Outer boundary, ordered.
    #[serde(default)]
    pub outer: Vec<[f32; 2]>,
    /// Largest hole boundary, ordered.
    #[serde(default)]
    pub hole: Option<Vec<[f32; 2]>>,
}

/// Shape tag assigned by the shape analyzer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeClass {
    Ring,
    Solid,
}

/// One perceived object in a frame. Built fresh every frame, never mutated.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedObject {
    pub bounding_box: PixelRect,
    pub oriented_rect: OrientedRect,
    pub outer_contour: Vec<[f32; 2]>,
    pub inner_contour: Option<Vec<[f32; 2]>>,
    pub area: f32,
    pub hole_area_ratio: f32,
    pub circularity: f32,
    pub center: [f32; 2],
    pub shape: ShapeClass,
    /// True when the contour was unusable and only the bounding box is known.
    pub degenerate: bool,
}

/// Rule that produced a grasp candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GraspKind {
    /// Narrow side of an elongated object.
    NarrowSide,
    /// Long side of an elongated object, offered as an alternative.
    LongSide,
    /// Wall of a ring-shaped object.
    RingEdge,
    /// Minor principal axis of a solid object.
    PcaSolid,
    /// Shorter side of the oriented bounding rectangle.
    FallbackRect,
    /// Depth-uniformity scored line through a bounding box.
    DepthUniform,
}

/// One proposed grip.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraspCandidate {
    /// Pixel where the jaws close.
    pub center_px: [f32; 2],
    /// Closing direction in the image, in (−90, 90].
    pub approach_angle_deg: f32,
    pub aperture_mm: f32,
    /// Quality in [0, 1].
    pub score: f32,
    pub kind: GraspKind,
    /// Point for independent height sensing, away from the grip line.
    pub sensor_point_px: [f32; 2],
}

/// Target pose in the robot workspace frame (millimetres, degrees).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspacePose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub r: f64,
}
