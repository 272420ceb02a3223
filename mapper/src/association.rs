//! Greedy, gated nearest-neighbor association between existing landmarks
//! and the current tick's transformed detections.

use nalgebra::Matrix2;

use crate::landmark::Landmark;

pub struct Assignment {
    /// Index into the `landmarks` slice, parallel output: for landmark `i`,
    /// which detection index (if any) it was matched to.
    pub landmark_to_detection: Vec<Option<usize>>,
    /// Detection indices not claimed by any landmark.
    pub unassigned_detections: Vec<usize>,
}

/// Gate candidate pairs by Mahalanobis distance on the landmark's (x,y)
/// covariance block, rank surviving candidates by Euclidean distance, and
/// assign greedily (smallest distance first, each landmark and detection
/// used at most once).
pub fn associate(landmarks: &[&Landmark], detections_xy: &[(f64, f64)], tau_local: f64) -> Assignment {
    let mut candidates: Vec<(usize, usize, f64)> = Vec::new();

    for (li, landmark) in landmarks.iter().enumerate() {
        let (lx, ly) = landmark.xy();
        let cov = landmark.covariance();
        let xy_cov = Matrix2::new(cov[(0, 0)], cov[(0, 1)], cov[(1, 0)], cov[(1, 1)]);
        let xy_cov_inv = xy_cov.try_inverse();

        for (di, &(dx, dy)) in detections_xy.iter().enumerate() {
            let delta = nalgebra::Vector2::new(dx - lx, dy - ly);
            let euclid = delta.norm();

            let mahalanobis = match &xy_cov_inv {
                Some(inv) => (delta.transpose() * inv * delta)[(0, 0)].max(0.0).sqrt(),
                None => euclid,
            };

            if mahalanobis <= tau_local {
                candidates.push((li, di, euclid));
            }
        }
    }

    candidates.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap());

    let mut landmark_used = vec![false; landmarks.len()];
    let mut detection_used = vec![false; detections_xy.len()];
    let mut landmark_to_detection = vec![None; landmarks.len()];

    for (li, di, _) in candidates {
        if !landmark_used[li] && !detection_used[di] {
            landmark_used[li] = true;
            detection_used[di] = true;
            landmark_to_detection[li] = Some(di);
        }
    }

    let unassigned_detections = (0..detections_xy.len()).filter(|di| !detection_used[*di]).collect();

    Assignment { landmark_to_detection, unassigned_detections }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::LandmarkArena;
    use nalgebra::{DMatrix, DVector};

    #[test]
    fn nearest_detection_wins_ties() {
        let mut arena = LandmarkArena::new();
        arena.insert(DVector::from_row_slice(&[0.0, 0.0, 1.0, 1.0]), DMatrix::identity(4, 4) * 10.0, 0.0);
        let landmarks: Vec<&Landmark> = arena.iter().collect();
        let detections = vec![(0.05, 0.0), (5.0, 5.0)];
        let assignment = associate(&landmarks, &detections, 1.0);
        assert_eq!(assignment.landmark_to_detection[0], Some(0));
        assert_eq!(assignment.unassigned_detections, vec![1]);
    }

    #[test]
    fn out_of_gate_detection_is_unassigned() {
        let mut arena = LandmarkArena::new();
        arena.insert(DVector::from_row_slice(&[0.0, 0.0, 1.0, 1.0]), DMatrix::identity(4, 4) * 0.01, 0.0);
        let landmarks: Vec<&Landmark> = arena.iter().collect();
        let detections = vec![(100.0, 100.0)];
        let assignment = associate(&landmarks, &detections, 1.0);
        assert_eq!(assignment.landmark_to_detection[0], None);
        assert_eq!(assignment.unassigned_detections, vec![0]);
    }
}
