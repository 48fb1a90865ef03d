//! Shape analysis of detector regions.
//!
//! Turns a raw region (outer contour, optional hole contour, bounding box)
//! into a [`DetectedObject`]: oriented rectangle, area, hole ratio,
//! circularity and a ring/solid tag.
//!
//! Ring test: `hole_ratio = hole_area / outer_area` must fall inside
//! `[hole_ratio_min, hole_ratio_max]` and the outer circularity
//! `4π·A / P²` must reach `circularity_min`. Both bands are calibration,
//! re-tuned per physical setup.
//!
//! Degenerate regions (too few contour points, zero area) are reported as
//! solid with the bounding box as their only geometry.

pub mod axes;
pub mod contour;

use crate::types::{DetectedObject, OrientedRect, PixelRect, Region, ShapeClass};
use log::debug;
use serde::Deserialize;

/// Thresholds used by the shape analyzer.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ShapeParams {
    pub hole_ratio_min: f32,
    pub hole_ratio_max: f32,
    pub circularity_min: f32,
    /// Regions below this area (px²) are dropped by [`ShapeAnalyzer::analyze_all`].
    pub min_object_area: f32,
    /// Regions above this area (px²) are dropped by [`ShapeAnalyzer::analyze_all`].
    pub max_object_area: f32,
    /// Contours with fewer points are treated as degenerate.
    pub min_contour_points: usize,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            hole_ratio_min: 0.10,
            hole_ratio_max: 0.70,
            circularity_min: 0.5,
            min_object_area: 800.0,
            max_object_area: 50_000.0,
            min_contour_points: 5,
        }
    }
}

impl ShapeParams {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.hole_ratio_min)
            || !(0.0..=1.0).contains(&self.hole_ratio_max)
            || self.hole_ratio_min > self.hole_ratio_max
        {
            return Err(format!(
                "shape: hole ratio band [{}, {}] must be an ordered sub-range of [0, 1]",
                self.hole_ratio_min, self.hole_ratio_max
            ));
        }
        if !(0.0..=1.0).contains(&self.circularity_min) {
            return Err(format!(
                "shape: circularity_min {} must lie in [0, 1]",
                self.circularity_min
            ));
        }
        if self.min_object_area.is_nan()
            || self.min_object_area < 0.0
            || self.min_object_area > self.max_object_area
        {
            return Err(format!(
                "shape: object area band [{}, {}] is invalid",
                self.min_object_area, self.max_object_area
            ));
        }
        Ok(())
    }
}

/// Classifies detector regions and extracts their geometry.
#[derive(Clone, Debug, Default)]
pub struct ShapeAnalyzer {
    params: ShapeParams,
}

impl ShapeAnalyzer {
    pub fn new(params: ShapeParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ShapeParams {
        &self.params
    }

    /// Analyzes every region and keeps those inside the configured area band.
    pub fn analyze_all(&self, regions: &[Region]) -> Vec<DetectedObject> {
        regions
            .iter()
            .map(|r| self.analyze(r))
            .filter(|obj| {
                let keep = obj.area >= self.params.min_object_area
                    && obj.area <= self.params.max_object_area;
                if !keep {
                    debug!(
                        "ShapeAnalyzer: dropping region at ({:.1}, {:.1}) area={:.1}",
                        obj.center[0], obj.center[1], obj.area
                    );
                }
                keep
            })
            .collect()
    }

    /// Analyzes a single region. Never fails: degenerate input falls back to
    /// the bounding box.
    pub fn analyze(&self, region: &Region) -> DetectedObject {
        let outer = &region.outer;
        let outer_area = contour::polygon_area(outer);
        if outer.len() < self.params.min_contour_points || outer_area <= f32::EPSILON {
            return self.degenerate(region);
        }

        let bounding_box = PixelRect::from_points(outer).unwrap_or(region.bbox);
        let hull = contour::convex_hull(outer);
        let oriented_rect = contour::min_area_rect(&hull)
            .unwrap_or_else(|| OrientedRect::from_axis_aligned(&bounding_box));
        let perimeter = contour::perimeter(outer);
        let circularity = contour::circularity(outer_area, perimeter);
        let center = contour::centroid(outer).unwrap_or_else(|| bounding_box.center());

        let inner_contour = region.hole.as_ref().filter(|h| h.len() >= 3).cloned();
        let hole_area = inner_contour
            .as_deref()
            .map(contour::polygon_area)
            .unwrap_or(0.0);
        let hole_area_ratio = hole_area / outer_area;

        let is_ring = inner_contour.is_some()
            && hole_area_ratio >= self.params.hole_ratio_min
            && hole_area_ratio <= self.params.hole_ratio_max
            && circularity >= self.params.circularity_min;
        let shape = if is_ring {
            ShapeClass::Ring
        } else {
            ShapeClass::Solid
        };
        debug!(
            "ShapeAnalyzer: area={:.1} hole_ratio={:.3} circularity={:.3} -> {:?}",
            outer_area, hole_area_ratio, circularity, shape
        );

        DetectedObject {
            bounding_box,
            oriented_rect,
            outer_contour: outer.clone(),
            inner_contour,
            area: outer_area,
            hole_area_ratio,
            circularity,
            center,
            shape,
            degenerate: false,
        }
    }

    fn degenerate(&self, region: &Region) -> DetectedObject {
        let bbox = if region.bbox.area() > 0.0 {
            region.bbox
        } else {
            PixelRect::from_points(&region.outer).unwrap_or(region.bbox)
        };
        debug!(
            "ShapeAnalyzer: degenerate contour ({} points), using bounding box {:?}",
            region.outer.len(),
            bbox
        );
        DetectedObject {
            bounding_box: bbox,
            oriented_rect: OrientedRect::from_axis_aligned(&bbox),
            outer_contour: region.outer.clone(),
            inner_contour: None,
            area: bbox.area(),
            hole_area_ratio: 0.0,
            circularity: 0.0,
            center: bbox.center(),
            shape: ShapeClass::Solid,
            degenerate: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(cx: f32, cy: f32, r: f32, n: usize) -> Vec<[f32; 2]> {
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32 * std::f32::consts::TAU;
                [cx + r * t.cos(), cy + r * t.sin()]
            })
            .collect()
    }

    fn region(outer: Vec<[f32; 2]>, hole: Option<Vec<[f32; 2]>>) -> Region {
        let bbox = PixelRect::from_points(&outer).unwrap_or_default();
        Region { bbox, outer, hole }
    }

    #[test]
    fn annulus_is_ring() {
        let analyzer = ShapeAnalyzer::default();
        let obj = analyzer.analyze(&region(
            circle(100.0, 100.0, 40.0, 64),
            Some(circle(100.0, 100.0, 20.0, 64)),
        ));
        assert_eq!(obj.shape, ShapeClass::Ring);
        assert!((obj.hole_area_ratio - 0.25).abs() < 0.01);
        assert!((obj.center[0] - 100.0).abs() < 1e-2);
    }

    #[test]
    fn thin_hole_is_solid() {
        let analyzer = ShapeAnalyzer::default();
        let obj = analyzer.analyze(&region(
            circle(100.0, 100.0, 40.0, 64),
            Some(circle(100.0, 100.0, 5.0, 32)),
        ));
        assert_eq!(obj.shape, ShapeClass::Solid);
    }

    #[test]
    fn square_without_hole_is_solid() {
        let analyzer = ShapeAnalyzer::default();
        let sq = vec![[0.0, 0.0], [10.0, 0.0], [20.0, 0.0], [20.0, 20.0], [0.0, 20.0]];
        let obj = analyzer.analyze(&region(sq, None));
        assert_eq!(obj.shape, ShapeClass::Solid);
        assert!(!obj.degenerate);
        assert!((obj.area - 400.0).abs() < 1e-3);
    }

    #[test]
    fn degenerate_contour_falls_back_to_bbox() {
        let analyzer = ShapeAnalyzer::default();
        let r = Region {
            bbox: PixelRect::new(10.0, 20.0, 30.0, 40.0),
            outer: vec![[10.0, 20.0], [40.0, 60.0]],
            hole: None,
        };
        let obj = analyzer.analyze(&r);
        assert!(obj.degenerate);
        assert_eq!(obj.shape, ShapeClass::Solid);
        assert_eq!(obj.center, [25.0, 40.0]);
        assert_eq!(obj.oriented_rect.angle_deg, 0.0);
        assert_eq!(obj.area, 1200.0);
    }

    #[test]
    fn analyze_all_applies_area_band() {
        let analyzer = ShapeAnalyzer::default();
        let regions = vec![
            region(circle(50.0, 50.0, 5.0, 32), None),
            region(circle(200.0, 200.0, 30.0, 64), None),
        ];
        let objs = analyzer.analyze_all(&regions);
        assert_eq!(objs.len(), 1);
        assert!((objs[0].center[0] - 200.0).abs() < 1e-2);
    }

    #[test]
    fn inverted_bands_fail_validation() {
        let params = ShapeParams {
            hole_ratio_min: 0.8,
            hole_ratio_max: 0.2,
            ..Default::default()
        };
        assert!(params.validate().is_err());
        assert!(ShapeParams::default().validate().is_ok());
    }
}
