//! Per-neighbor temporal filter: consumes one registration output per
//! alignment tick and turns a stream of ambiguous candidate transforms into
//! at most one stable estimate, or an explicit "unknown".

use align_core::se2::Se2;

use crate::config::TcaffConfig;
use crate::tree::{HypothesisTree, NodeId};

/// Maximum weighted SE(2) distance at which a candidate is considered a
/// match to a leaf's predicted transform. Not itself a configuration key;
/// the sliding window and promotion tolerance already bound how far a
/// hypothesis can wander, so a single generous constant is enough to keep
/// association from fragmenting a genuinely-tracking leaf into a spurious
/// branch on measurement noise alone.
const ASSOCIATION_TOLERANCE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeState {
    pub exploratory_leaves: usize,
    pub exploratory_max_depth: u32,
    pub main_leaves: usize,
    pub main_max_depth: u32,
}

pub struct TcaffManager {
    config: TcaffConfig,
    exploratory: HypothesisTree,
    main: HypothesisTree,
    irresolvable_steps: u32,
}

impl TcaffManager {
    pub fn new(config: TcaffConfig) -> Result<Self, crate::config::ConfigError> {
        config.validate()?;
        Ok(Self { config, exploratory: HypothesisTree::new(), main: HypothesisTree::new(), irresolvable_steps: 0 })
    }

    pub fn tree_state(&self) -> TreeState {
        TreeState {
            exploratory_leaves: self.exploratory.leaf_count(),
            exploratory_max_depth: self.exploratory.max_depth(),
            main_leaves: self.main.leaf_count(),
            main_max_depth: self.main.max_depth(),
        }
    }

    /// Advance both trees by one alignment tick and return the filter's
    /// output: `Some(transform)` when the main tree has converged to a
    /// single hypothesis, `None` (bottom) otherwise.
    pub fn tick(&mut self, candidates: &[(Se2, f64)]) -> Option<Se2> {
        let mut consumed = vec![false; candidates.len()];

        // The main tree tracks one converged hypothesis per leaf; only the
        // leaf count, not the per-tick branching factor, is configurable.
        let main_leaves = Self::expand_tree(
            &mut self.main,
            candidates,
            &mut consumed,
            1,
            self.config.rho,
            self.config.prob_no_match,
        );
        self.main.set_leaves(main_leaves);
        self.main.prune(self.config.window_len, self.config.max_no_match_streak());
        Self::enforce_cap(&mut self.main, self.config.max_branch_main);

        let exploratory_leaves = Self::expand_tree(
            &mut self.exploratory,
            candidates,
            &mut consumed,
            self.config.exploring_branching_factor,
            self.config.rho,
            self.config.prob_no_match,
        );
        self.exploratory.set_leaves(exploratory_leaves);
        self.exploratory.prune(self.config.window_len, self.config.max_no_match_streak());
        Self::enforce_cap(&mut self.exploratory, self.config.max_branch_exp);

        for (i, &(transform, _)) in candidates.iter().enumerate() {
            if !consumed[i] {
                self.exploratory.spawn_root(transform);
            }
        }

        self.try_promote();

        self.emit()
    }

    /// Expand every current leaf of `tree`: match it against up to
    /// `branching_factor` nearby unconsumed candidates, or admit a
    /// no-match virtual child when nothing is within tolerance. Each child's
    /// cumulative weight folds in `prob_no_match` as the prior probability
    /// of the no-match branch, and `(1 - prob_no_match) * score` for a
    /// matched branch, so a leaf's weight reflects how much real, scored
    /// support (versus assumed absence) its history carries.
    fn expand_tree(
        tree: &mut HypothesisTree,
        candidates: &[(Se2, f64)],
        consumed: &mut [bool],
        branching_factor: u32,
        rho: f64,
        prob_no_match: f64,
    ) -> Vec<NodeId> {
        let leaves: Vec<NodeId> = tree.leaves().to_vec();
        let mut next_leaves = Vec::new();

        for leaf in leaves {
            let predicted = tree.transform(leaf);
            let mut matches: Vec<(usize, f64)> = candidates
                .iter()
                .enumerate()
                .filter_map(|(i, &(t, _))| {
                    let dist = predicted.weighted_distance(&t, rho);
                    (dist <= ASSOCIATION_TOLERANCE).then_some((i, dist))
                })
                .collect();
            matches.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
            matches.truncate(branching_factor.max(1) as usize);

            if matches.is_empty() {
                let child = tree.extend(leaf, predicted, true, prob_no_match);
                next_leaves.push(child);
            } else {
                for (i, _) in matches {
                    consumed[i] = true;
                    let score = candidates[i].1;
                    let child = tree.extend(leaf, candidates[i].0, false, (1.0 - prob_no_match) * score);
                    next_leaves.push(child);
                }
            }
        }

        next_leaves
    }

    /// Keep at most `cap` leaves, preferring the highest cumulative weight
    /// (i.e. the hypotheses best supported by scored matches rather than
    /// assumed no-match steps).
    fn enforce_cap(tree: &mut HypothesisTree, cap: u32) {
        let mut leaves: Vec<NodeId> = tree.leaves().to_vec();
        if leaves.len() <= cap as usize {
            return;
        }
        leaves.sort_by(|&a, &b| tree.weight(b).partial_cmp(&tree.weight(a)).unwrap());
        leaves.truncate(cap as usize);
        tree.set_leaves(leaves);
    }

    /// Promote an exploratory path of sustained, mutually-consistent support
    /// to the main tree, replacing whatever main tree existed.
    /// Promote only when exactly one exploratory leaf has sustained,
    /// self-consistent support: a symmetric map yielding several equally
    /// plausible candidates must stay ambiguous until all but one drop out.
    fn try_promote(&mut self) {
        let tolerance = self.config.promotion_tolerance();
        let mut qualifying: Vec<Se2> = Vec::new();
        for &leaf in self.exploratory.leaves() {
            if self.exploratory.no_match_streak(leaf) != 0 {
                continue;
            }
            let path = self.exploratory.path_to(leaf);
            if (path.len() as u32) < self.config.main_tree_obj_req {
                continue;
            }
            let consistent = path.windows(2).all(|pair| {
                let a = self.exploratory.transform(pair[0]);
                let b = self.exploratory.transform(pair[1]);
                a.weighted_distance(&b, self.config.rho) < tolerance
            });
            if consistent {
                qualifying.push(self.exploratory.transform(leaf));
            }
        }
        if let [transform] = qualifying[..] {
            self.main.clear();
            self.main.spawn_root(transform);
            self.exploratory.clear();
            self.irresolvable_steps = 0;
        }
    }

    fn emit(&mut self) -> Option<Se2> {
        match self.main.leaf_count() {
            0 => None,
            1 => {
                self.irresolvable_steps = 0;
                Some(self.main.transform(self.main.leaves()[0]))
            }
            _ => {
                self.irresolvable_steps += 1;
                if self.irresolvable_steps > self.config.steps_before_main_tree_deletion {
                    tracing::info!("main tree deleted after sustained hypothesis collapse");
                    self.main.clear();
                    self.irresolvable_steps = 0;
                }
                None
            }
        }
    }
}
