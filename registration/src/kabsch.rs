//! Planar Kabsch alignment: recover the rigid SE(2) transform that best
//! maps a set of correspondence points from `B` onto `A`.

use align_core::se2::Se2;
use align_core::LandmarkSummary;
use nalgebra::{Isometry2, Matrix2, Point2, Translation2, UnitComplex};

use crate::consistency::Candidate;

/// `None` on degenerate input: fewer than two points, or a collinear
/// support set for which rotation is not well determined.
pub fn recover_se2(a: &[LandmarkSummary], b: &[LandmarkSummary], correspondences: &[Candidate]) -> Option<Se2> {
    let n = correspondences.len();
    if n < 2 {
        return None;
    }

    let a_pts: Vec<Point2<f64>> = correspondences.iter().map(|c| xy(&a[c.a])).collect();
    let b_pts: Vec<Point2<f64>> = correspondences.iter().map(|c| xy(&b[c.b])).collect();

    let centroid_a = centroid(&a_pts);
    let centroid_b = centroid(&b_pts);

    let mut cov = Matrix2::zeros();
    for (pa, pb) in a_pts.iter().zip(&b_pts) {
        let da = pa - centroid_a;
        let db = pb - centroid_b;
        cov += da * db.transpose();
    }

    let svd = nalgebra::linalg::SVD::new(cov, true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;

    if svd.singular_values[1] < 1e-9 {
        // Support points are (near-)collinear: rotation about the shared
        // axis is unconstrained.
        return None;
    }

    let mut d = Matrix2::identity();
    if (u * v_t).determinant() < 0.0 {
        d[(1, 1)] = -1.0;
    }
    let rotation = u * d * v_t;

    let angle = rotation[(1, 0)].atan2(rotation[(0, 0)]);
    let unit_complex = UnitComplex::new(angle);
    let translation = centroid_a.coords - unit_complex * centroid_b.coords;

    let iso = Isometry2::from_parts(Translation2::from(translation), unit_complex);
    Some(Se2::from_isometry(&iso))
}

fn xy(l: &LandmarkSummary) -> Point2<f64> {
    Point2::new(l.position.x, l.position.y)
}

fn centroid(points: &[Point2<f64>]) -> Point2<f64> {
    let sum: nalgebra::Vector2<f64> = points.iter().map(|p| p.coords).sum();
    Point2::from(sum / points.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn lm(id: u64, x: f64, y: f64) -> LandmarkSummary {
        LandmarkSummary { id, position: Point3::new(x, y, 0.0), width: 0.3, height: 0.3 }
    }

    #[test]
    fn recovers_known_translation_and_rotation() {
        let truth = Se2::new(5.0, -2.0, 30f64.to_radians());
        let b = vec![lm(0, 0.0, 0.0), lm(1, 1.0, 0.0), lm(2, 0.0, 1.0)];
        let a: Vec<LandmarkSummary> = b
            .iter()
            .map(|l| {
                let p = truth.transform_point(Point2::new(l.position.x, l.position.y));
                LandmarkSummary { id: l.id, position: nalgebra::Point3::new(p.x, p.y, 0.0), ..*l }
            })
            .collect();
        let correspondences = vec![Candidate { a: 0, b: 0 }, Candidate { a: 1, b: 1 }, Candidate { a: 2, b: 2 }];
        let recovered = recover_se2(&a, &b, &correspondences).unwrap();
        assert_relative_eq!(recovered.x, truth.x, epsilon = 1e-6);
        assert_relative_eq!(recovered.y, truth.y, epsilon = 1e-6);
        assert_relative_eq!(recovered.psi, truth.psi, epsilon = 1e-6);
    }

    #[test]
    fn collinear_support_is_degenerate() {
        let a = vec![lm(0, 0.0, 0.0), lm(1, 1.0, 0.0), lm(2, 2.0, 0.0)];
        let b = a.clone();
        let correspondences = vec![Candidate { a: 0, b: 0 }, Candidate { a: 1, b: 1 }, Candidate { a: 2, b: 2 }];
        assert!(recover_se2(&a, &b, &correspondences).is_none());
    }

    #[test]
    fn single_point_is_degenerate() {
        let a = vec![lm(0, 0.0, 0.0)];
        let b = vec![lm(0, 1.0, 1.0)];
        let correspondences = vec![Candidate { a: 0, b: 0 }];
        assert!(recover_se2(&a, &b, &correspondences).is_none());
    }
}
