//! Timestamped body-in-odom poses and the lookup/interpolation contract a
//! pose source must satisfy.

use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use thiserror::Error;

/// Logical time. The driver owns a monotonically increasing clock of this
/// type; nothing here assumes it is wall-clock seconds.
pub type Time = f64;

/// A single timestamped rigid pose, body-in-odom (`T_{o<-b}`).
#[derive(Debug, Clone)]
pub struct Pose {
    pub t: Time,
    pub isometry: Isometry3<f64>,
}

/// An external collaborator supplying poses on demand. Analogous to the
/// `pose(t)` function in the interface description: looking up a time with
/// no nearby sample is a typed, recoverable error, not a panic.
pub trait PoseSource {
    fn pose(&self, t: Time) -> Result<Isometry3<f64>, PoseLookupError>;
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("no pose data within tolerance of t={query_t}")]
pub struct PoseLookupError {
    pub query_t: Time,
}

/// Linearly interpolate translation and slerp rotation between the two
/// poses bracketing `t` in a time-sorted slice. Returns [`PoseLookupError`]
/// if `t` falls outside `[poses[0].t - tolerance, poses[last].t + tolerance]`
/// or `poses` is empty.
pub fn interpolate(poses: &[Pose], t: Time, tolerance: Time) -> Result<Isometry3<f64>, PoseLookupError> {
    if poses.is_empty() {
        return Err(PoseLookupError { query_t: t });
    }
    if t < poses[0].t - tolerance || t > poses[poses.len() - 1].t + tolerance {
        return Err(PoseLookupError { query_t: t });
    }
    if t <= poses[0].t {
        return Ok(poses[0].isometry);
    }
    let last = poses.len() - 1;
    if t >= poses[last].t {
        return Ok(poses[last].isometry);
    }

    // binary search for the bracketing pair
    let idx = match poses.binary_search_by(|p| p.t.partial_cmp(&t).unwrap()) {
        Ok(i) => return Ok(poses[i].isometry),
        Err(i) => i,
    };
    let a = &poses[idx - 1];
    let b = &poses[idx];
    let span = b.t - a.t;
    let frac = if span > 0.0 { (t - a.t) / span } else { 0.0 };

    let translation = Translation3::from(
        a.isometry.translation.vector.lerp(&b.isometry.translation.vector, frac),
    );
    let rotation: UnitQuaternion<f64> = a
        .isometry
        .rotation
        .slerp(&b.isometry.rotation, frac);
    Ok(Isometry3::from_parts(translation, rotation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn pose_at(t: Time, x: f64) -> Pose {
        Pose {
            t,
            isometry: Isometry3::translation(x, 0.0, 0.0),
        }
    }

    #[test]
    fn interpolates_linearly_between_samples() {
        let poses = vec![pose_at(0.0, 0.0), pose_at(2.0, 4.0)];
        let mid = interpolate(&poses, 1.0, 0.0).unwrap();
        assert_relative_eq!(mid.translation.vector, Vector3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn out_of_tolerance_is_an_error() {
        let poses = vec![pose_at(0.0, 0.0), pose_at(2.0, 4.0)];
        assert!(interpolate(&poses, 10.0, 0.5).is_err());
    }

    #[test]
    fn empty_source_is_an_error() {
        let poses: Vec<Pose> = vec![];
        assert!(interpolate(&poses, 0.0, 1.0).is_err());
    }
}
