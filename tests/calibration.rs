use grasp_pick::coords::{Homography, MapperParams};
use grasp_pick::height::HeightParams;
use grasp_pick::image::DepthMap;
use grasp_pick::types::PixelRect;
use grasp_pick::{CoordinateMapper, GripperCalibration, HeightEstimator};

fn reference_homography() -> Homography {
    Homography::from_rows([
        [0.231, -0.012, -71.5],
        [0.009, 0.226, 148.2],
        [0.000_02, -0.000_01, 1.0],
    ])
    .expect("well-conditioned")
}

#[test]
fn fitted_homography_round_trips_pixels() {
    let truth = reference_homography();
    let src: Vec<[f64; 2]> = [
        [40.0, 30.0],
        [600.0, 35.0],
        [610.0, 450.0],
        [35.0, 440.0],
        [320.0, 240.0],
        [160.0, 360.0],
    ]
    .to_vec();
    let dst: Vec<[f64; 2]> = src
        .iter()
        .map(|&p| truth.project(p).expect("finite"))
        .collect();

    let fitted = Homography::fit(&src, &dst).expect("fit");
    let rmse = fitted.reprojection_rmse(&src, &dst).expect("rmse");
    assert!(rmse < 1e-6, "rmse={rmse}");

    let mut mapper = CoordinateMapper::new(&MapperParams::default());
    assert!(!mapper.is_calibrated());
    mapper.set_homography(fitted);
    for px in [[12.0f32, 400.0], [320.0, 240.0], [633.0, 17.0]] {
        let ws = mapper.pixel_to_workspace(px).expect("calibrated");
        let back = mapper.workspace_to_pixel(ws).expect("invertible");
        assert!((back[0] - px[0]).abs() < 1e-2 && (back[1] - px[1]).abs() < 1e-2);
    }
}

#[test]
fn fit_rejects_too_few_or_collinear_points() {
    let line: Vec<[f64; 2]> = (0..6).map(|i| [i as f64 * 10.0, i as f64 * 5.0]).collect();
    assert!(Homography::fit(&line, &line).is_err());
    assert!(Homography::fit(&line[..3], &line[..3]).is_err());
}

#[test]
fn height_converges_and_damps_outliers() {
    let mut est = HeightEstimator::new(HeightParams {
        vertical_scale: 50.0,
        ..Default::default()
    });
    assert_eq!(est.calibrate_floor(&DepthMap::filled(90, 90, 100.0)), Some(100.0));

    let bbox = PixelRect::new(20.0, 20.0, 40.0, 40.0);
    let steady = DepthMap::filled(90, 90, 102.0);
    for _ in 0..3 {
        assert!((est.estimate_height(&steady, &bbox) - 100.0).abs() < 1e-3);
    }
    // one frame with the whole object reading far too high
    let spike = DepthMap::filled(90, 90, 150.0);
    let h = est.estimate_height(&spike, &bbox);
    assert!((h - 100.0).abs() < 1e-3, "spike leaked into estimate: {h}");
    assert!((est.estimate_height(&steady, &bbox) - 100.0).abs() < 1e-3);

    est.reset_history();
    assert_eq!(est.history_len(), 0);
}

#[test]
fn actuator_angle_never_increases_with_width() {
    let gripper = GripperCalibration::default();
    let mut prev = gripper.width_to_actuator(0.0);
    for i in 1..=108 {
        let angle = gripper.width_to_actuator(i as f32 * 0.5);
        assert!(angle <= prev, "width {} mm: {} > {}", i as f32 * 0.5, angle, prev);
        prev = angle;
    }
    assert_eq!(gripper.width_to_actuator(54.0), 22.0);
}
