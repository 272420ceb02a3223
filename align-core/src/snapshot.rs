//! The exchangeable, immutable summary a mapper hands to registration and to
//! neighboring robots.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::pose::Time;

/// A single confirmed landmark as seen from the outside: no covariance, no
/// observation history, just what registration needs to propose a
/// correspondence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LandmarkSummary {
    pub id: u64,
    /// Centroid in the owning robot's odometric frame. `z` is `0.0` for
    /// `dim == 4` mappers.
    pub position: Point3<f64>,
    pub width: f64,
    pub height: f64,
}

/// An immutable, consistent-cut view of a mapper's confirmed landmarks at a
/// single point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapSnapshot {
    pub t: Time,
    pub landmarks: Vec<LandmarkSummary>,
}

impl MapSnapshot {
    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}

/// An external collaborator exposing a neighbor's latest map snapshot by
/// name. Returns `None` when the neighbor has not published one yet (or has
/// gone quiet), which the driver treats as a transient input gap.
pub trait MapProvider {
    fn snapshot(&self, name: &str) -> Option<MapSnapshot>;
}
