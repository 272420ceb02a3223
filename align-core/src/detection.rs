//! Raw object detections as produced by an external detector, prior to any
//! association or filtering by the mapper.

use nalgebra::{DMatrix, Point3};

use crate::pose::Time;

/// One observation in the robot's camera frame.
#[derive(Debug, Clone)]
pub struct Detection {
    pub t: Time,
    pub position_camera: Point3<f64>,
    pub width: f64,
    pub height: f64,
    /// Per-detection measurement covariance, when the detector supplies one.
    /// When `None`, the mapper falls back to `R_el * I` from its config.
    pub measurement_noise: Option<DMatrix<f64>>,
}

/// An external collaborator supplying a frame of detections on demand.
pub trait DetectionSource {
    fn detections(&self, t: Time) -> Vec<Detection>;
}
