//! Pairwise geometric registration (component G): a stateless solver that,
//! given two landmark snapshots with unknown correspondences, proposes one
//! or more ranked SE(2) alignments.
//!
//! Pure function of its inputs: identical snapshots and config produce
//! identical candidates, up to floating-point tolerance. Carries no state
//! of its own and defines no crate-local error type — every failure mode
//! (too few points, collinear support, no consistent cluster) degrades to
//! "return fewer candidates", never a propagated error.

pub mod clipper;
pub mod config;
pub mod consistency;
pub mod kabsch;

pub use config::{ConfigError, RegistrationConfig};

use align_core::{LandmarkSummary, Se2};

/// Run the full registration pipeline and return candidates sorted by
/// descending score. Empty on either input, or with no surviving cluster,
/// yields an empty result.
pub fn register(a: &[LandmarkSummary], b: &[LandmarkSummary], config: &RegistrationConfig) -> Vec<(Se2, f64)> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let candidates = consistency::build_candidates(a, b, config);
    if candidates.len() < config.num_objs_req {
        return Vec::new();
    }

    let m = consistency::consistency_matrix(a, b, &candidates, config);
    let clusters = clipper::find_clusters(&m, config.num_objs_req, config.clipper_mult_repeats);

    let max_n = a.len().max(b.len()) as f64;
    let mut results = Vec::new();
    for cluster in &clusters {
        let correspondences = clipper::candidates_for_cluster(cluster, &candidates);
        let support = correspondences.len();
        if support < config.num_objs_req {
            continue;
        }
        let Some(transform) = kabsch::recover_se2(a, b, &correspondences) else {
            tracing::debug!(support, "discarding degenerate Kabsch cluster");
            continue;
        };
        let score = (support as f64 / max_n).min(config.max_opt_fraction);
        results.push((transform, score));
    }

    results.sort_by(|x, y| y.1.partial_cmp(&x.1).unwrap());
    results
}
