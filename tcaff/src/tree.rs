//! Arena-backed multi-hypothesis tree: nodes live in a flat `Vec` addressed
//! by parent index rather than pointer-linked. Pruning is a mark-and-sweep
//! over the node arena itself: surviving leaves mark their ancestors
//! reachable, and everything else is dropped from the arena and the ids
//! remapped, so a long-lived tree's node count tracks its live depth and
//! branching, not the number of ticks it has run for.

use align_core::se2::Se2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    transform: Se2,
    depth: u32,
    no_match_streak: u32,
    /// Product of this path's per-step branch probabilities: `prob_no_match`
    /// for a virtual no-match step, `(1 - prob_no_match) * score` for a
    /// step that matched a registration candidate of that score.
    weight: f64,
}

#[derive(Debug, Default)]
pub struct HypothesisTree {
    nodes: Vec<Node>,
    leaves: Vec<NodeId>,
}

impl HypothesisTree {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), leaves: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    pub fn transform(&self, id: NodeId) -> Se2 {
        self.nodes[id.0].transform
    }

    pub fn depth(&self, id: NodeId) -> u32 {
        self.nodes[id.0].depth
    }

    pub fn no_match_streak(&self, id: NodeId) -> u32 {
        self.nodes[id.0].no_match_streak
    }

    /// Cumulative branch-probability weight of the path to `id`: low for a
    /// chain leaning on repeated no-match admissions, high for one
    /// reinforced every tick by a strong registration score.
    pub fn weight(&self, id: NodeId) -> f64 {
        self.nodes[id.0].weight
    }

    pub fn max_depth(&self) -> u32 {
        self.leaves.iter().map(|&l| self.depth(l)).max().unwrap_or(0)
    }

    /// Start a brand-new hypothesis at depth zero.
    pub fn spawn_root(&mut self, transform: Se2) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { parent: None, transform, depth: 0, no_match_streak: 0, weight: 1.0 });
        self.leaves.push(id);
        id
    }

    /// Append a child of `parent` carrying `transform`. `branch_prob` is the
    /// probability mass of this particular branch at this step: pass
    /// `prob_no_match` for a virtual "nothing observed this tick" child (the
    /// streak increments instead of resetting), or `(1 - prob_no_match) *
    /// score` for a child matched to a registration candidate of that score.
    pub fn extend(&mut self, parent: NodeId, transform: Se2, no_match: bool, branch_prob: f64) -> NodeId {
        let parent_node = &self.nodes[parent.0];
        let streak = if no_match { parent_node.no_match_streak + 1 } else { 0 };
        let depth = parent_node.depth + 1;
        let weight = parent_node.weight * branch_prob;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { parent: Some(parent), transform, depth, no_match_streak: streak, weight });
        id
    }

    /// Replace the active leaf set wholesale (used after a tick's expansion
    /// pass has computed the new frontier).
    pub fn set_leaves(&mut self, leaves: Vec<NodeId>) {
        self.leaves = leaves;
    }

    /// Drop any leaf whose depth exceeds `window_len`, or whose no-match
    /// streak exceeds `max_no_match_streak`, then compact the node arena
    /// down to exactly the nodes reachable from the surviving leaves so a
    /// long-lived tree doesn't grow one entry per tick forever.
    pub fn prune(&mut self, window_len: u32, max_no_match_streak: u32) {
        self.leaves.retain(|&id| {
            let node = &self.nodes[id.0];
            node.depth <= window_len && node.no_match_streak <= max_no_match_streak
        });
        self.compact();
    }

    /// Rebuild `nodes` keeping only ancestors of the current leaves,
    /// remapping every surviving `NodeId` in place. Parents always precede
    /// children in `nodes` (append-only), so a single forward pass suffices.
    fn compact(&mut self) {
        let mut reachable = vec![false; self.nodes.len()];
        for &leaf in &self.leaves {
            let mut current = Some(leaf);
            while let Some(id) = current {
                if reachable[id.0] {
                    break;
                }
                reachable[id.0] = true;
                current = self.nodes[id.0].parent;
            }
        }

        let mut remap = vec![None; self.nodes.len()];
        let mut new_nodes = Vec::with_capacity(self.nodes.len());
        for (old_idx, node) in self.nodes.iter().enumerate() {
            if !reachable[old_idx] {
                continue;
            }
            let new_id = NodeId(new_nodes.len());
            remap[old_idx] = Some(new_id);
            let parent = node.parent.map(|p| remap[p.0].expect("parent compacted before child"));
            new_nodes.push(Node {
                parent,
                transform: node.transform,
                depth: node.depth,
                no_match_streak: node.no_match_streak,
                weight: node.weight,
            });
        }

        self.leaves = self.leaves.iter().map(|id| remap[id.0].expect("leaf is reachable")).collect();
        self.nodes = new_nodes;
    }

    /// Path from root to `leaf`, inclusive, root first.
    pub fn path_to(&self, leaf: NodeId) -> Vec<NodeId> {
        let mut path = vec![leaf];
        let mut current = leaf;
        while let Some(parent) = self.nodes[current.0].parent {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Drop everything: used when a tree is promoted away or deleted.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.leaves.clear();
    }
}
