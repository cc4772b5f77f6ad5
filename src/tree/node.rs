//! Tree node stored in the implicit heap of a [`crate::Tree`].

use crate::core::types::{FeatureIndex, NodeIndex, Score};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A node of the heap-ordered tree. Children of node `k` are `2k` and `2k+1`.
///
/// `feature` indexes the flattened feature space: values below the number of
/// dense fields are dense fields, the rest are sparse fields offset by that
/// count. `None` marks a terminal node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Own heap index; the leaf id reported to callers
    pub idx: NodeIndex,
    /// Split feature, or `None` for a terminal node
    pub feature: Option<FeatureIndex>,
    /// Values below the threshold route left
    pub threshold: f32,
    /// Leaf output, meaningful once the node is terminal
    pub gamma: Score,
}

impl TreeNode {
    /// Creates an unsplit node at heap index `idx`.
    pub fn new(idx: NodeIndex) -> Self {
        TreeNode {
            idx,
            feature: None,
            threshold: 0.0,
            gamma: 0.0,
        }
    }

    /// Returns true if this node does not split.
    pub fn is_terminal(&self) -> bool {
        self.feature.is_none()
    }

    /// Heap index of the left child.
    pub fn left_child(&self) -> NodeIndex {
        2 * self.idx
    }

    /// Heap index of the right child.
    pub fn right_child(&self) -> NodeIndex {
        2 * self.idx + 1
    }

    /// Depth of this node; the root is at depth 0.
    pub fn depth(&self) -> u32 {
        self.idx.max(1).ilog2()
    }

    /// Child an instance with feature value `value` is routed to.
    pub fn route(&self, value: f32) -> NodeIndex {
        if value < self.threshold {
            self.left_child()
        } else {
            self.right_child()
        }
    }

    pub(crate) fn set_split(&mut self, feature: FeatureIndex, threshold: f32) {
        self.feature = Some(feature);
        self.threshold = threshold;
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.feature {
            Some(feature) => write!(
                f,
                "Node {} [f{} < {}]",
                self.idx, feature, self.threshold
            ),
            None => write!(f, "Leaf {} (gamma={:.6})", self.idx, self.gamma),
        }
    }
}
