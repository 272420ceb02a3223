//! Approximate maximum weighted clique via power iteration with projection
//! onto the non-negative orthant, repeated with masking to recover
//! additional clusters.

use nalgebra::DVector;

use crate::consistency::Candidate;

pub const POWER_ITER_TOL: f64 = 1e-6;
pub const POWER_ITER_MAX: usize = 100;

/// One recovered dense cluster: the indices into the candidate list that
/// form it, and the consensus score (mean of the cluster's consistency
/// values with the dominant eigenvector).
#[derive(Debug, Clone)]
pub struct Cluster {
    pub candidate_indices: Vec<usize>,
}

/// Run up to `max_repeats` rounds of power iteration on `m`, masking out
/// vertices already claimed by a previous cluster between rounds.
pub fn find_clusters(m: &nalgebra::DMatrix<f64>, num_objs_req: usize, max_repeats: u32) -> Vec<Cluster> {
    let n = m.nrows();
    if n == 0 {
        return Vec::new();
    }
    let mut alive: Vec<usize> = (0..n).collect();
    let mut clusters = Vec::new();

    for _ in 0..max_repeats {
        if alive.len() < num_objs_req {
            break;
        }
        let sub = submatrix(m, &alive);
        let u = dominant_dense_vector(&sub);
        let selected = select_inliers(&u);
        if selected.len() < num_objs_req {
            break;
        }
        let candidate_indices: Vec<usize> = selected.iter().map(|&i| alive[i]).collect();
        alive.retain(|idx| !candidate_indices.contains(idx));
        clusters.push(Cluster { candidate_indices });
    }
    clusters
}

fn submatrix(m: &nalgebra::DMatrix<f64>, indices: &[usize]) -> nalgebra::DMatrix<f64> {
    let n = indices.len();
    nalgebra::DMatrix::from_fn(n, n, |r, c| m[(indices[r], indices[c])])
}

/// Power iteration on `m` (assumed symmetric, non-negative) projecting the
/// iterate onto the non-negative orthant and renormalizing at each sweep.
fn dominant_dense_vector(m: &nalgebra::DMatrix<f64>) -> DVector<f64> {
    let n = m.nrows();
    let mut u = DVector::from_element(n, 1.0 / (n as f64).sqrt());
    for _ in 0..POWER_ITER_MAX {
        let mut next = m * &u;
        for x in next.iter_mut() {
            if *x < 0.0 {
                *x = 0.0;
            }
        }
        let norm = next.norm();
        if norm < f64::EPSILON {
            break;
        }
        next /= norm;
        let delta = (&next - &u).norm();
        u = next;
        if delta < POWER_ITER_TOL {
            break;
        }
    }
    u
}

/// Keep vertices whose weight is within an order of magnitude of the
/// strongest member of the cluster; sparse enough to exclude stragglers,
/// loose enough to keep a fully-consistent cluster intact.
fn select_inliers(u: &DVector<f64>) -> Vec<usize> {
    let max = u.iter().cloned().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return Vec::new();
    }
    let threshold = max * 0.1;
    (0..u.len()).filter(|&i| u[i] >= threshold).collect()
}

pub fn candidates_for_cluster(cluster: &Cluster, candidates: &[Candidate]) -> Vec<Candidate> {
    cluster.candidate_indices.iter().map(|&i| candidates[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    #[test]
    fn fully_consistent_block_forms_one_cluster() {
        let m = DMatrix::from_row_slice(3, 3, &[1.0, 0.95, 0.9, 0.95, 1.0, 0.92, 0.9, 0.92, 1.0]);
        let clusters = find_clusters(&m, 2, 1);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].candidate_indices.len(), 3);
    }

    #[test]
    fn empty_matrix_yields_no_clusters() {
        let m = DMatrix::<f64>::zeros(0, 0);
        assert!(find_clusters(&m, 2, 2).is_empty());
    }

    #[test]
    fn two_disjoint_blocks_recovered_with_repeats() {
        #[rustfmt::skip]
        let m = DMatrix::from_row_slice(4, 4, &[
            1.0, 0.95, 0.0, 0.0,
            0.95, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.9,
            0.0, 0.0, 0.9, 1.0,
        ]);
        let clusters = find_clusters(&m, 2, 2);
        assert_eq!(clusters.len(), 2);
    }
}
