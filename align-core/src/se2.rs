//! SE(2) rigid transforms: the single currency every component above the
//! pose source speaks. Input 6-DoF poses are projected down to this type at
//! exactly one place ([`project_isometry3`]); nothing downstream ever
//! touches a third translation component or a roll/pitch term again.

use nalgebra::{Isometry2, Isometry3, Point2, Translation2, UnitComplex, Vector2};
use serde::{Deserialize, Serialize};

/// A rigid planar transform `(x, y, psi)`.
///
/// Composition follows the usual convention: `a.compose(b)` is "first apply
/// `b`, then `a`", i.e. `a ∘ b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Se2 {
    pub x: f64,
    pub y: f64,
    pub psi: f64,
}

impl Se2 {
    pub fn new(x: f64, y: f64, psi: f64) -> Self {
        Se2 { x, y, psi: wrap_angle(psi) }
    }

    pub fn identity() -> Self {
        Se2 { x: 0.0, y: 0.0, psi: 0.0 }
    }

    pub fn translation(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    pub fn to_isometry(self) -> Isometry2<f64> {
        Isometry2::from_parts(Translation2::new(self.x, self.y), UnitComplex::new(self.psi))
    }

    pub fn from_isometry(iso: &Isometry2<f64>) -> Self {
        let angle = iso.rotation.angle();
        Se2::new(iso.translation.x, iso.translation.y, angle)
    }

    /// `self ∘ other`
    pub fn compose(&self, other: &Se2) -> Se2 {
        Se2::from_isometry(&(self.to_isometry() * other.to_isometry()))
    }

    pub fn inverse(&self) -> Se2 {
        Se2::from_isometry(&self.to_isometry().inverse())
    }

    pub fn transform_point(&self, p: Point2<f64>) -> Point2<f64> {
        self.to_isometry() * p
    }

    /// Euclidean distance between translation components.
    pub fn translation_distance(&self, other: &Se2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Geodesic distance on the rotation, in `[0, pi]`.
    pub fn rotation_distance(&self, other: &Se2) -> f64 {
        wrap_angle(self.psi - other.psi).abs()
    }

    /// `translation_distance + rho * rotation_distance`, the metric TCAFF
    /// uses to associate candidates with tree leaves.
    pub fn weighted_distance(&self, other: &Se2, rho: f64) -> f64 {
        self.translation_distance(other) + rho * self.rotation_distance(other)
    }
}

/// Wrap an angle into `(-pi, pi]`.
pub fn wrap_angle(a: f64) -> f64 {
    let two_pi = std::f64::consts::TAU;
    let mut wrapped = (a + std::f64::consts::PI) % two_pi;
    if wrapped <= 0.0 {
        wrapped += two_pi;
    }
    wrapped - std::f64::consts::PI
}

/// Project a 6-DoF rigid pose onto the horizontal SE(2) plane: drop `z`,
/// keep the yaw component of the rotation. This is the single authoritative
/// 3D -> 2D reduction point in the whole system.
pub fn project_isometry3(iso: &Isometry3<f64>) -> Se2 {
    let t = iso.translation.vector;
    let (_roll, _pitch, yaw) = iso.rotation.euler_angles();
    Se2::new(t.x, t.y, yaw)
}
