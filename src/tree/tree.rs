//! Fixed-depth regression tree grown level by level.

use crate::config::Config;
use crate::core::constants::{HESSIAN_EPSILON, MAX_TREE_DEPTH, ROOT_NODE};
use crate::core::error::{CartError, Result};
use crate::core::types::{FeatureIndex, Hist, NodeIndex, Score};
use crate::dataset::Dataset;
use crate::tree::node::TreeNode;
use crate::tree::split::{leaf_totals, search_level, LevelDefenders, Location, Meta};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A regression tree stored as an implicit heap of `2^(max_depth+1)` nodes.
///
/// Slot 0 is unused; the root is node 1 and node `k` has children `2k` and
/// `2k+1`. Nodes on the last level never split, so every walk from the root
/// stops inside the array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    max_depth: usize,
    nodes: Vec<TreeNode>,
}

impl Tree {
    /// Creates an unfitted tree shaped by `config.max_depth`.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_nodes(config.max_depth))
    }

    /// Creates an unfitted tree of the given depth.
    pub fn with_depth(max_depth: usize) -> Result<Self> {
        if max_depth < 1 || max_depth > MAX_TREE_DEPTH {
            return Err(CartError::invalid_parameter(
                "max_depth",
                max_depth.to_string(),
                format!("must be in range [1, {}]", MAX_TREE_DEPTH),
            ));
        }
        Ok(Self::with_nodes(max_depth))
    }

    fn with_nodes(max_depth: usize) -> Self {
        let nodes = (0..1u32 << (max_depth + 1)).map(TreeNode::new).collect();
        Tree { max_depth, nodes }
    }

    /// Number of split levels.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// All node slots, indexed by heap index.
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Node at heap index `idx`.
    pub fn node(&self, idx: NodeIndex) -> Option<&TreeNode> {
        self.nodes.get(idx as usize).filter(|_| idx >= ROOT_NODE)
    }

    /// Root node.
    pub fn root(&self) -> &TreeNode {
        &self.nodes[ROOT_NODE as usize]
    }

    /// Number of nodes that split.
    pub fn num_splits(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_terminal()).count()
    }

    /// Heap indices of the terminal nodes reachable from the root.
    pub fn leaf_indices(&self) -> Vec<NodeIndex> {
        let mut leaves = Vec::new();
        let mut stack = vec![ROOT_NODE];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx as usize];
            if node.is_terminal() {
                leaves.push(idx);
            } else {
                stack.push(node.right_child());
                stack.push(node.left_child());
            }
        }
        leaves
    }

    /// Grow the tree against `residuals` and return each instance's leaf output.
    ///
    /// Any earlier fit is discarded.
    pub fn fit(&mut self, dataset: &Dataset, residuals: &[Score]) -> Result<Vec<Score>> {
        if residuals.len() != dataset.nr_instance() {
            return Err(CartError::dimension_mismatch(
                format!("instances: {}", dataset.nr_instance()),
                format!("residuals: {}", residuals.len()),
            ));
        }

        *self = Self::with_nodes(self.max_depth);
        let mut locations: Vec<Location> = residuals.iter().map(|&r| Location::new(r)).collect();

        for depth in 0..self.max_depth {
            let offset: NodeIndex = 1 << depth;
            let nr_leaf = offset as usize;

            let metas = leaf_totals(&locations, offset, nr_leaf);
            if metas.iter().all(|m| m.n == 0) {
                log::debug!("level {}: no live leaves", depth);
                break;
            }

            let defenders = search_level(dataset, &locations, &metas, offset);
            let nr_split = self.select_splits(dataset, &metas, &defenders, offset);
            log::debug!(
                "level {}: {} of {} live leaves split",
                depth,
                nr_split,
                metas.iter().filter(|m| m.n > 0).count()
            );

            self.repartition(dataset, &mut locations);
        }

        self.assign_gammas(&locations);

        Ok(locations
            .iter()
            .map(|l| self.nodes[l.tnode_idx as usize].gamma)
            .collect())
    }

    /// Pick each leaf's best split; forward, backward, then sparse, first
    /// strictly better candidate wins.
    fn select_splits(
        &mut self,
        dataset: &Dataset,
        metas: &[Meta],
        defenders: &LevelDefenders,
        offset: NodeIndex,
    ) -> usize {
        let nr_field = dataset.nr_field();
        let mut nr_split = 0;

        for (f, meta) in metas.iter().enumerate() {
            let Some(baseline) = meta.baseline() else {
                continue;
            };

            let mut best_ese = baseline;
            let mut best: Option<(FeatureIndex, f32)> = None;

            for j in 0..nr_field {
                for candidate in [defenders.forward(f, j), defenders.backward(f, j)] {
                    if candidate.ese > best_ese {
                        best_ese = candidate.ese;
                        best = Some((j, candidate.threshold));
                    }
                }
            }
            for j in 0..dataset.nr_sparse_field() {
                let candidate = defenders.sparse(f, j);
                if candidate.ese > best_ese {
                    best_ese = candidate.ese;
                    best = Some((nr_field + j, candidate.threshold));
                }
            }

            if let Some((feature, threshold)) = best {
                self.nodes[offset as usize + f].set_split(feature, threshold);
                nr_split += 1;
            }
        }

        nr_split
    }

    /// Move every live instance to the child its leaf routes it to.
    fn repartition(&self, dataset: &Dataset, locations: &mut [Location]) {
        let nr_field = dataset.nr_field();
        let nodes = &self.nodes;

        locations
            .par_iter_mut()
            .enumerate()
            .filter(|(_, location)| !location.shrinked)
            .for_each(|(i, location)| {
                let node = &nodes[location.tnode_idx as usize];
                match node.feature {
                    None => location.shrinked = true,
                    Some(feature) if feature < nr_field => {
                        location.tnode_idx = node.route(dataset.dense_value(i, feature));
                    }
                    Some(feature) => {
                        let present = dataset.has_sparse(i, (feature - nr_field) as u32);
                        location.tnode_idx = node.route(if present { 1.0 } else { 0.0 });
                    }
                }
            });
    }

    /// Newton step per node: `Σr / Σ|r|(1-|r|)` over the instances settled there.
    fn assign_gammas(&mut self, locations: &[Location]) {
        let mut sums: Vec<(Hist, Hist)> = vec![(0.0, 0.0); self.nodes.len()];
        for location in locations {
            let r = location.r as Hist;
            let slot = &mut sums[location.tnode_idx as usize];
            slot.0 += r;
            slot.1 += r.abs() * (1.0 - r.abs());
        }

        for (node, (numerator, denominator)) in self.nodes.iter_mut().zip(sums) {
            node.gamma = if denominator <= HESSIAN_EPSILON {
                if numerator != 0.0 {
                    log::trace!("node {}: negligible hessian, gamma set to 0", node.idx);
                }
                0.0
            } else {
                (numerator / denominator) as Score
            };
        }
    }

    /// Walk from the root and return the terminal node reached with its output.
    ///
    /// Entries missing from `x` read as `0.0`.
    pub fn predict(&self, x: &[f32]) -> (NodeIndex, Score) {
        let mut idx = ROOT_NODE;
        loop {
            let node = &self.nodes[idx as usize];
            match node.feature {
                None => return (idx, node.gamma),
                Some(feature) => {
                    idx = node.route(x.get(feature).copied().unwrap_or(0.0));
                }
            }
        }
    }

    /// Checks the heap layout a deserialized tree must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth < 1 || self.max_depth > MAX_TREE_DEPTH {
            return Err(CartError::serialization(format!(
                "tree depth {} out of range",
                self.max_depth
            )));
        }

        let expected = 1usize << (self.max_depth + 1);
        if self.nodes.len() != expected {
            return Err(CartError::serialization(format!(
                "tree of depth {} needs {} nodes, found {}",
                self.max_depth,
                expected,
                self.nodes.len()
            )));
        }

        let first_bottom = 1usize << self.max_depth;
        for (i, node) in self.nodes.iter().enumerate() {
            if node.idx as usize != i {
                return Err(CartError::serialization(format!(
                    "node in slot {} claims index {}",
                    i, node.idx
                )));
            }
            if !node.is_terminal() && (i < ROOT_NODE as usize || i >= first_bottom) {
                return Err(CartError::serialization(format!(
                    "node {} splits but has no children slots",
                    i
                )));
            }
        }

        Ok(())
    }

    /// Serializes the tree to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            CartError::serialization(format!("JSON serialization failed: {}", e))
        })
    }

    /// Restores a tree from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let tree: Tree = serde_json::from_str(json).map_err(|e| {
            CartError::serialization(format!("JSON deserialization failed: {}", e))
        })?;
        tree.validate()?;
        Ok(tree)
    }

    /// Returns a textual representation of the reachable tree.
    pub fn to_string_representation(&self) -> String {
        let mut result = String::new();
        self.render(ROOT_NODE, "", true, &mut result);
        result
    }

    fn render(&self, idx: NodeIndex, prefix: &str, is_last: bool, result: &mut String) {
        let node = &self.nodes[idx as usize];
        let branch = if is_last { "└── " } else { "├── " };
        result.push_str(&format!("{}{}{}\n", prefix, branch, node));

        if !node.is_terminal() {
            let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
            self.render(node.left_child(), &child_prefix, false, result);
            self.render(node.right_child(), &child_prefix, true, result);
        }
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tree(depth={}, splits={}, leaves={})",
            self.max_depth,
            self.num_splits(),
            self.leaf_indices().len()
        )
    }
}
