//! Planar homography between the image and the workspace plane.
//!
//! Fitting is an offline step: DLT over ≥4 pixel/workspace correspondences
//! with Hartley normalization, solved through the smallest eigenvector of
//! AᵀA. At runtime only [`Homography::project`] is used.

use nalgebra::{DMatrix, Matrix3, SymmetricEigen, Vector3};

const EPS: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub enum HomographyError {
    TooFewPoints { needed: usize, got: usize },
    LengthMismatch { src: usize, dst: usize },
    NonFinite,
    Singular(String),
}

impl std::fmt::Display for HomographyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewPoints { needed, got } => {
                write!(f, "too few points: need {}, got {}", needed, got)
            }
            Self::LengthMismatch { src, dst } => {
                write!(f, "point count mismatch: {} source vs {} destination", src, dst)
            }
            Self::NonFinite => write!(f, "matrix or points contain non-finite values"),
            Self::Singular(msg) => write!(f, "singular homography: {}", msg),
        }
    }
}

impl std::error::Error for HomographyError {}

/// Invertible 3×3 projective transform mapping pixels to workspace millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    m: Matrix3<f64>,
}

impl Homography {
    /// Wraps a row-major matrix, rejecting non-finite or singular input.
    pub fn from_rows(rows: [[f64; 3]; 3]) -> Result<Self, HomographyError> {
        let m = Matrix3::from_fn(|r, c| rows[r][c]);
        Self::from_matrix(m)
    }

    pub fn from_matrix(m: Matrix3<f64>) -> Result<Self, HomographyError> {
        if !m.iter().all(|v| v.is_finite()) {
            return Err(HomographyError::NonFinite);
        }
        let scale = m.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        if scale <= EPS || (m.determinant() / scale.powi(3)).abs() <= EPS {
            return Err(HomographyError::Singular("determinant is zero".into()));
        }
        Ok(Self { m })
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.m
    }

    /// Row-major copy of the matrix.
    pub fn to_rows(&self) -> [[f64; 3]; 3] {
        let m = &self.m;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }

    /// `H · [x, y, 1]ᵀ` followed by the perspective divide. `None` for points
    /// on the line at infinity.
    pub fn project(&self, p: [f64; 2]) -> Option<[f64; 2]> {
        let v = self.m * Vector3::new(p[0], p[1], 1.0);
        let w = v[2];
        if !w.is_finite() || w.abs() <= EPS {
            return None;
        }
        let out = [v[0] / w, v[1] / w];
        (out[0].is_finite() && out[1].is_finite()).then_some(out)
    }

    pub fn inverse(&self) -> Option<Homography> {
        let inv = self.m.try_inverse()?;
        let s = inv[(2, 2)];
        let inv = if s.abs() > EPS { inv / s } else { inv };
        Homography::from_matrix(inv).ok()
    }

    /// Fits `H` such that `dst ≈ project(H, src)`.
    pub fn fit(src: &[[f64; 2]], dst: &[[f64; 2]]) -> Result<Self, HomographyError> {
        if src.len() != dst.len() {
            return Err(HomographyError::LengthMismatch {
                src: src.len(),
                dst: dst.len(),
            });
        }
        let n = src.len();
        if n < 4 {
            return Err(HomographyError::TooFewPoints { needed: 4, got: n });
        }
        if !src.iter().chain(dst).all(|p| p[0].is_finite() && p[1].is_finite()) {
            return Err(HomographyError::NonFinite);
        }

        let (t_src, src_n) = normalize_points(src);
        let (t_dst, dst_n) = normalize_points(dst);

        let mut a = DMatrix::zeros(2 * n, 9);
        for i in 0..n {
            let (sx, sy) = (src_n[i][0], src_n[i][1]);
            let (dx, dy) = (dst_n[i][0], dst_n[i][1]);

            a[(2 * i, 3)] = -sx;
            a[(2 * i, 4)] = -sy;
            a[(2 * i, 5)] = -1.0;
            a[(2 * i, 6)] = dy * sx;
            a[(2 * i, 7)] = dy * sy;
            a[(2 * i, 8)] = dy;

            a[(2 * i + 1, 0)] = sx;
            a[(2 * i + 1, 1)] = sy;
            a[(2 * i + 1, 2)] = 1.0;
            a[(2 * i + 1, 6)] = -dx * sx;
            a[(2 * i + 1, 7)] = -dx * sy;
            a[(2 * i + 1, 8)] = -dx;
        }

        let ata = a.transpose() * &a;
        let eig = SymmetricEigen::new(ata);
        let mut order: Vec<usize> = (0..9).collect();
        order.sort_by(|&i, &j| eig.eigenvalues[i].abs().total_cmp(&eig.eigenvalues[j].abs()));
        // a second near-zero eigenvalue means the points do not pin down H
        let second = eig.eigenvalues[order[1]].abs();
        let largest = eig.eigenvalues[order[8]].abs();
        if second <= 1e-9 * largest.max(1.0) {
            return Err(HomographyError::Singular(
                "correspondences are degenerate (collinear or repeated)".into(),
            ));
        }
        let col = eig.eigenvectors.column(order[0]);
        let h_norm = Matrix3::new(
            col[0], col[1], col[2], col[3], col[4], col[5], col[6], col[7], col[8],
        );

        let t_dst_inv = t_dst
            .try_inverse()
            .ok_or_else(|| HomographyError::Singular("destination normalization".into()))?;
        let h = t_dst_inv * h_norm * t_src;
        let s = h[(2, 2)];
        let h = if s.abs() > EPS { h / s } else { h };
        Self::from_matrix(h)
    }

    /// Root-mean-square reprojection error over the correspondences.
    /// `None` if any source point projects to infinity or the slices are empty.
    pub fn reprojection_rmse(&self, src: &[[f64; 2]], dst: &[[f64; 2]]) -> Option<f64> {
        if src.is_empty() || src.len() != dst.len() {
            return None;
        }
        let mut sum = 0.0;
        for (s, d) in src.iter().zip(dst) {
            let p = self.project(*s)?;
            sum += (p[0] - d[0]).powi(2) + (p[1] - d[1]).powi(2);
        }
        Some((sum / src.len() as f64).sqrt())
    }
}

/// Translate the centroid to the origin and scale the mean distance to √2.
fn normalize_points(pts: &[[f64; 2]]) -> (Matrix3<f64>, Vec<[f64; 2]>) {
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p[1]).sum::<f64>() / n;
    let mean_dist = pts
        .iter()
        .map(|p| (p[0] - cx).hypot(p[1] - cy))
        .sum::<f64>()
        / n;
    let s = if mean_dist > EPS {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = pts.iter().map(|p| [s * (p[0] - cx), s * (p[1] - cy)]).collect();
    (t, normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> Homography {
        Homography::from_rows([
            [0.005_703_976, -0.326_529_916, 88.586_341_7],
            [-0.477_040_582, 0.015_355_047, 172.094_154_4],
            [-0.000_299_499, 0.000_187_282, 1.0],
        ])
        .unwrap()
    }

    #[test]
    fn fit_recovers_known_matrix() {
        let h = reference();
        let src: Vec<[f64; 2]> = vec![
            [50.0, 40.0],
            [600.0, 60.0],
            [580.0, 420.0],
            [70.0, 440.0],
            [320.0, 240.0],
        ];
        let dst: Vec<[f64; 2]> = src.iter().map(|p| h.project(*p).unwrap()).collect();
        let fit = Homography::fit(&src, &dst).unwrap();
        assert!(fit.reprojection_rmse(&src, &dst).unwrap() < 1e-6);
        let probe = [200.0, 300.0];
        let a = h.project(probe).unwrap();
        let b = fit.project(probe).unwrap();
        assert!((a[0] - b[0]).abs() < 1e-6 && (a[1] - b[1]).abs() < 1e-6);
    }

    #[test]
    fn inverse_round_trips() {
        let h = reference();
        let inv = h.inverse().unwrap();
        for p in [[10.0, 10.0], [320.0, 240.0], [630.0, 470.0]] {
            let q = inv.project(h.project(p).unwrap()).unwrap();
            assert!((q[0] - p[0]).abs() < 1e-6 && (q[1] - p[1]).abs() < 1e-6);
        }
    }

    #[test]
    fn too_few_and_mismatched_points_fail() {
        let pts = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        assert_eq!(
            Homography::fit(&pts, &pts),
            Err(HomographyError::TooFewPoints { needed: 4, got: 3 })
        );
        assert!(matches!(
            Homography::fit(&pts, &pts[..2]),
            Err(HomographyError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn collinear_points_are_rejected() {
        let src = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        assert!(Homography::fit(&src, &src).is_err());
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let rows = [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 0.0, 1.0]];
        assert!(Homography::from_rows(rows).is_err());
    }
}
