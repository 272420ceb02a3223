//! Candidate association generation and the pairwise consistency matrix.

use align_core::LandmarkSummary;
use nalgebra::DMatrix;

use crate::config::RegistrationConfig;

/// A putative `(a, b)` correspondence between one landmark in each snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub a: usize,
    pub b: usize,
}

/// Build the bipartite candidate set, pruned by per-object geometric gates.
pub fn build_candidates(a: &[LandmarkSummary], b: &[LandmarkSummary], config: &RegistrationConfig) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for (ai, la) in a.iter().enumerate() {
        if la.width > config.max_obj_width {
            continue;
        }
        for (bi, lb) in b.iter().enumerate() {
            if lb.width > config.max_obj_width {
                continue;
            }
            if !sizes_compatible(la, lb, config) {
                continue;
            }
            candidates.push(Candidate { a: ai, b: bi });
        }
    }
    candidates
}

fn sizes_compatible(la: &LandmarkSummary, lb: &LandmarkSummary, config: &RegistrationConfig) -> bool {
    let width_gate = config.wh_scale_diff * la.width.min(lb.width);
    let height_gate = config.wh_scale_diff * la.height.min(lb.height);
    (la.width - lb.width).abs() <= width_gate
        && (la.height - lb.height).abs() <= height_gate
        && (la.height - lb.height).abs() <= config.h_diff
}

/// `M[i][j]` is the geometric compatibility of candidates `i` and `j`: how
/// well the pairwise distance `|a_i - a_j|` in `A` agrees with `|b_i - b_j|`
/// in `B` under a rigid transform. Diagonal entries are `1`.
pub fn consistency_matrix(
    a: &[LandmarkSummary],
    b: &[LandmarkSummary],
    candidates: &[Candidate],
    config: &RegistrationConfig,
) -> DMatrix<f64> {
    let n = candidates.len();
    let mut m = DMatrix::<f64>::zeros(n, n);
    for i in 0..n {
        m[(i, i)] = 1.0;
        for j in (i + 1)..n {
            let score = pair_score(a, b, &candidates[i], &candidates[j], config);
            m[(i, j)] = score;
            m[(j, i)] = score;
        }
    }
    m
}

fn pair_score(
    a: &[LandmarkSummary],
    b: &[LandmarkSummary],
    c1: &Candidate,
    c2: &Candidate,
    config: &RegistrationConfig,
) -> f64 {
    // Two candidates sharing a landmark on either side cannot both be true
    // simultaneously under a one-to-one correspondence.
    if c1.a == c2.a || c1.b == c2.b {
        return 0.0;
    }
    let d_a = xy_dist(&a[c1.a], &a[c2.a]);
    let d_b = xy_dist(&b[c1.b], &b[c2.b]);
    let diff = d_a - d_b;
    if diff.abs() >= config.clipper_epsilon {
        return 0.0;
    }
    (-(diff * diff) / (config.clipper_sigma * config.clipper_sigma)).exp()
}

fn xy_dist(p: &LandmarkSummary, q: &LandmarkSummary) -> f64 {
    ((p.position.x - q.position.x).powi(2) + (p.position.y - q.position.y).powi(2)).sqrt()
}
