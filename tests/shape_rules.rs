mod common;

use common::synthetic::{ring_region, rotated_rect_region};
use grasp_pick::angle::grasp_angle_difference;
use grasp_pick::grasp::GraspParams;
use grasp_pick::types::{GraspKind, ShapeClass};
use grasp_pick::{GraspGenerator, ShapeAnalyzer};

#[test]
fn ring_classification_ignores_rotation() {
    let analyzer = ShapeAnalyzer::default();
    let generator = GraspGenerator::new(GraspParams::default());
    let mut apertures = Vec::new();
    let mut hole_ratios = Vec::new();
    let mut circularities = Vec::new();
    for phase in [0.0f32, 7.5, 22.0, 45.0, 80.0] {
        let obj = analyzer.analyze(&ring_region([200.0, 150.0], 50.0, 25.0, phase));
        assert_eq!(obj.shape, ShapeClass::Ring, "phase {phase}");
        hole_ratios.push(obj.hole_area_ratio);
        circularities.push(obj.circularity);
        let cands = generator.generate_candidates(&obj);
        assert_eq!(cands.len(), 4);
        assert!(cands.iter().all(|c| c.kind == GraspKind::RingEdge));
        apertures.push(cands[0].aperture_mm);
    }
    assert!(spread(&apertures) < 0.5, "apertures vary with rotation: {apertures:?}");
    assert!(spread(&hole_ratios) < 1e-3, "hole ratios: {hole_ratios:?}");
    assert!(spread(&circularities) < 1e-3, "circularities: {circularities:?}");
}

fn spread(values: &[f32]) -> f32 {
    let (lo, hi) = values
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    hi - lo
}

#[test]
fn bar_is_gripped_across_its_narrow_side() {
    let analyzer = ShapeAnalyzer::default();
    let generator = GraspGenerator::new(GraspParams::default());
    for angle in [0.0f32, 30.0, 60.0, 95.0, 150.0] {
        let obj = analyzer.analyze(&rotated_rect_region([300.0, 200.0], 120.0, 30.0, angle));
        assert_eq!(obj.shape, ShapeClass::Solid);
        let cands = generator.generate_candidates(&obj);
        let best = cands.first().expect("bar fits the gripper");
        assert_eq!(best.kind, GraspKind::NarrowSide);
        assert!((best.aperture_mm - 30.0 / 2.7703).abs() < 0.5, "aperture {}", best.aperture_mm);
        assert!(
            grasp_angle_difference(best.approach_angle_deg, angle + 90.0) < 2.0,
            "angle {angle}: got {}",
            best.approach_angle_deg
        );
    }
}

#[test]
fn oversized_object_has_no_candidates() {
    let analyzer = ShapeAnalyzer::default();
    let generator = GraspGenerator::new(GraspParams::default());
    // 200 px is about 72 mm on both sides
    let obj = analyzer.analyze(&rotated_rect_region([300.0, 240.0], 200.0, 200.0, 10.0));
    assert!(generator.generate_candidates(&obj).is_empty());
}
