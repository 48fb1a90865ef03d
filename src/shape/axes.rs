//! Principal-axis geometry of a point set via the 2×2 covariance matrix.
use super::contour::vertex_mean;
use nalgebra::{Matrix2, SymmetricEigen};

/// Principal axes of a point cloud.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrincipalAxes {
    pub mean: [f32; 2],
    /// Unit eigenvector of the larger eigenvalue.
    pub major: [f32; 2],
    /// Unit eigenvector of the smaller eigenvalue.
    pub minor: [f32; 2],
    pub major_variance: f32,
    pub minor_variance: f32,
}

impl PrincipalAxes {
    /// Extent of `pts` projected onto `dir` through the mean: `(min, max)`.
    pub fn extent_along(&self, pts: &[[f32; 2]], dir: [f32; 2]) -> (f32, f32) {
        pts.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| {
            let t = (p[0] - self.mean[0]) * dir[0] + (p[1] - self.mean[1]) * dir[1];
            (lo.min(t), hi.max(t))
        })
    }

    /// Width of `pts` across the minor axis.
    pub fn minor_extent(&self, pts: &[[f32; 2]]) -> f32 {
        let (lo, hi) = self.extent_along(pts, self.minor);
        (hi - lo).max(0.0)
    }
}

/// Computes the principal axes of `pts`.
///
/// Returns `None` for fewer than two points or when the covariance is
/// ill-conditioned (all points coincide, or non-finite input).
pub fn principal_axes(pts: &[[f32; 2]]) -> Option<PrincipalAxes> {
    if pts.len() < 2 {
        return None;
    }
    let mean = vertex_mean(pts)?;
    let (mut sxx, mut sxy, mut syy) = (0.0f64, 0.0f64, 0.0f64);
    for p in pts {
        let dx = (p[0] - mean[0]) as f64;
        let dy = (p[1] - mean[1]) as f64;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    let denom = (pts.len() - 1) as f64;
    let cov = Matrix2::new(sxx / denom, sxy / denom, sxy / denom, syy / denom);
    if !cov.iter().all(|v| v.is_finite()) {
        return None;
    }

    let eig = SymmetricEigen::new(cov);
    let (i_major, i_minor) = if eig.eigenvalues[0] >= eig.eigenvalues[1] {
        (0, 1)
    } else {
        (1, 0)
    };
    let major_var = eig.eigenvalues[i_major];
    if major_var.is_nan() || major_var <= 1e-12 {
        return None;
    }
    let major = eig.eigenvectors.column(i_major);
    let minor = eig.eigenvectors.column(i_minor);
    Some(PrincipalAxes {
        mean,
        major: [major[0] as f32, major[1] as f32],
        minor: [minor[0] as f32, minor[1] as f32],
        major_variance: major_var as f32,
        minor_variance: eig.eigenvalues[i_minor].max(0.0) as f32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elongated_cloud_major_axis_follows_long_direction() {
        // 40 × 10 rectangle outline tilted by 45 degrees
        let (s, c) = 45f32.to_radians().sin_cos();
        let mut pts = Vec::new();
        for i in 0..=40 {
            for &y in &[-5.0f32, 5.0] {
                let x = i as f32 - 20.0;
                pts.push([x * c - y * s, x * s + y * c]);
            }
        }
        let axes = principal_axes(&pts).unwrap();
        let dot = (axes.major[0] * c + axes.major[1] * s).abs();
        assert!(dot > 0.99, "major axis misaligned, |cos|={dot}");
        let width = axes.minor_extent(&pts);
        assert!((width - 10.0).abs() < 1e-3, "width {width}");
    }

    #[test]
    fn coincident_points_are_ill_conditioned() {
        assert!(principal_axes(&[[3.0, 3.0]; 6]).is_none());
        assert!(principal_axes(&[[1.0, 2.0]]).is_none());
    }
}
