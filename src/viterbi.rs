//! Viterbi reconstruction results kept for reporting.
//!
//! Per-node arrays are indexed `[node][family]`. Reconstructed family sizes
//! exist only for branch nodes and are indexed by branch ordinal
//! (`node_id / 2`), p-value arrays by node id.

use crate::format::{ColumnSchema, NOT_COMPUTED};
use crate::tree::NodeId;

/// Expansion/no-change/decrease counts for one node position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeChange {
    pub expand: i32,
    pub remain: i32,
    pub decrease: i32,
}

impl NodeChange {
    /// All three counts unknown.
    pub const UNKNOWN: NodeChange = NodeChange { expand: -1, remain: -1, decrease: -1 };
}

impl Default for NodeChange {
    fn default() -> Self {
        NodeChange::UNKNOWN
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViterbiParameters {
    pub num_nodes: usize,
    /// Reconstructed size per branch ordinal and family.
    pub node_family_sizes: Vec<Vec<i32>>,
    /// Branch p-value per node and family, `-1` when not applicable.
    pub viterbi_pvalues: Vec<Vec<f64>>,
    /// Branch-cutting p-values, present only when branch cutting ran or was loaded.
    pub cut_pvalues: Option<Vec<Vec<f64>>>,
    /// Family-wide p-value per family.
    pub maximum_pvalues: Vec<f64>,
    /// Average expansion per node position, read in pairs.
    pub average_expansion: Vec<f64>,
    pub expand_remain_decrease: Vec<NodeChange>,
}

impl ViterbiParameters {
    /// Drop every stored result and record a new node count.
    pub fn clear(&mut self, num_nodes: usize) {
        *self = ViterbiParameters { num_nodes, ..Default::default() };
    }

    /// Size every per-family array in one pass.
    ///
    /// Aggregate node statistics already loaded are kept; they only grow.
    pub fn allocate(&mut self, num_nodes: usize, num_families: usize, schema: ColumnSchema) {
        self.num_nodes = num_nodes;
        self.node_family_sizes = vec![vec![0; num_families]; num_nodes];
        self.viterbi_pvalues = vec![vec![NOT_COMPUTED; num_families]; num_nodes];
        self.maximum_pvalues = vec![0.0; num_families];
        self.cut_pvalues = schema
            .has_cut_pvalues()
            .then(|| vec![vec![NOT_COMPUTED; num_families]; num_nodes]);
        self.grow_node_statistics(num_nodes);
    }

    /// Grow the aggregate statistics to `len` entries, filling with the sentinel.
    pub fn grow_node_statistics(&mut self, len: usize) {
        if self.average_expansion.len() < len {
            self.average_expansion.resize(len, NOT_COMPUTED);
        }
        if self.expand_remain_decrease.len() < len {
            self.expand_remain_decrease.resize(len, NodeChange::UNKNOWN);
        }
    }

    /// Branch cutting never applies to the root.
    pub fn force_root_cut(&mut self, root: NodeId) {
        if let Some(row) = self.cut_pvalues.as_mut().and_then(|cut| cut.get_mut(root)) {
            row.fill(NOT_COMPUTED);
        }
    }

    pub fn num_families(&self) -> usize {
        self.maximum_pvalues.len()
    }

    pub fn node_family_size(&self, ordinal: usize, family: usize) -> i32 {
        cell(&self.node_family_sizes, ordinal, family).unwrap_or(0)
    }

    pub fn viterbi_pvalue(&self, node: NodeId, family: usize) -> f64 {
        cell(&self.viterbi_pvalues, node, family).unwrap_or(NOT_COMPUTED)
    }

    pub fn maximum_pvalue(&self, family: usize) -> f64 {
        self.maximum_pvalues.get(family).copied().unwrap_or(NOT_COMPUTED)
    }

    pub fn cut_pvalue(&self, node: NodeId, family: usize) -> Option<f64> {
        self.cut_pvalues.as_ref().map(|cut| cell(cut, node, family).unwrap_or(NOT_COMPUTED))
    }
}

pub(crate) fn cell<T: Copy>(matrix: &[Vec<T>], node: usize, family: usize) -> Option<T> {
    matrix.get(node).and_then(|row| row.get(family)).copied()
}

pub(crate) fn set_cell<T>(matrix: &mut [Vec<T>], node: usize, family: usize, value: T) {
    if let Some(slot) = matrix.get_mut(node).and_then(|row| row.get_mut(family)) {
        *slot = value;
    }
}
