//! CAFE view of a phylogenetic tree.
//!
//! # Overview
//! Newick text is parsed with `phylotree` and copied into a flat arena whose
//! node ids are the **in-order traversal position** of each node:
//!
//! ```text
//!          root(3)
//!         /       \
//!      AB(1)      C(4)
//!     /    \
//!   A(0)   B(2)
//! ```
//!
//! For a binary tree this puts every leaf on an even id and every branch
//! node on an odd id. Reports rely on that: species counts live on even
//! positions, reconstructed ancestral sizes on odd positions, and p-values
//! are grouped two node positions at a time.
//!
//! # Labels
//! Family trees written in a report carry the family size in the label,
//! `name_size` (branch nodes are usually unnamed, `_size`). The size is
//! always the integer after the last `_`.

use crate::error::{ReportError, Result};
use phylotree::tree::Tree as PhyloTree;
use std::borrow::Cow;
use std::collections::HashMap;

/// In-order position of a node in a [`CafeTree`].
pub type NodeId = usize;

/// A node of a [`CafeTree`].
#[derive(Debug, Clone, PartialEq)]
pub struct CafeNode {
    /// In-order position of this node.
    pub id: NodeId,
    /// Taxon or clade label, without any family size suffix.
    pub name: Option<String>,
    /// Parent node (None for the root).
    pub parent: Option<NodeId>,
    /// Children, left to right.
    pub children: Vec<NodeId>,
    /// Length of the branch leading to this node.
    pub branch_length: Option<f64>,
    /// Family size read from a `name_size` label (0 when absent).
    pub family_size: i32,
}

impl CafeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Range of family sizes the birth-death model is evaluated over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilySizeRange {
    pub min: i32,
    pub max: i32,
    pub root_min: i32,
    pub root_max: i32,
}

impl Default for FamilySizeRange {
    fn default() -> Self {
        FamilySizeRange { min: 0, max: 1, root_min: 1, root_max: 2 }
    }
}

impl FamilySizeRange {
    /// Derive a range wide enough for the largest observed species count.
    pub fn from_max_observed(max_size: i32) -> Self {
        FamilySizeRange {
            min: 0,
            max: max_size.saturating_add((max_size / 5).max(50)),
            root_min: 1,
            root_max: ((max_size as f64 * 1.25).round() as i32).max(30),
        }
    }
}

/// Binary rooted tree numbered in CAFE's in-order convention.
#[derive(Debug, Clone)]
pub struct CafeTree {
    nodes: Vec<CafeNode>,
    root: NodeId,
}

impl CafeTree {
    /// Parse a newick string, keeping node labels verbatim.
    ///
    /// # Errors
    /// Returns [`ReportError::Tree`] when the text is not valid newick or a
    /// branch node does not have exactly two children.
    pub fn from_newick(newick: &str) -> Result<Self> {
        Self::parse(newick, false)
    }

    /// Parse a family tree whose labels carry a `_size` suffix.
    pub fn from_family_newick(newick: &str) -> Result<Self> {
        Self::parse(newick, true)
    }

    fn parse(newick: &str, sized_labels: bool) -> Result<Self> {
        let text = newick.trim();
        if !text.starts_with('(') {
            return Err(ReportError::Tree(format!("not a newick tree: '{text}'")));
        }
        // phylotree wants the closing semicolon; report lines omit it
        let text: Cow<'_, str> = if text.ends_with(';') {
            Cow::Borrowed(text)
        } else {
            Cow::Owned(format!("{text};"))
        };
        let phylo = PhyloTree::from_newick(&text)
            .map_err(|e| ReportError::Tree(format!("cannot parse '{}': {e}", newick.trim())))?;
        let phylo_root = phylo.get_root().map_err(tree_error)?;

        let mut order = Vec::new();
        collect_inorder(&phylo, phylo_root, &mut order)?;
        let position: HashMap<usize, NodeId> =
            order.iter().enumerate().map(|(pos, &pid)| (pid, pos)).collect();

        let mut nodes = Vec::with_capacity(order.len());
        for (pos, pid) in order.iter().enumerate() {
            let node = phylo.get(pid).map_err(tree_error)?;
            if !node.children.is_empty() && node.children.len() != 2 {
                return Err(ReportError::Tree(format!(
                    "node {pos} has {} children; only binary trees are supported",
                    node.children.len()
                )));
            }
            let label = node.name.as_deref().filter(|s| !s.is_empty());
            let (name, family_size) = if sized_labels {
                split_family_label(label)
            } else {
                (label.map(str::to_string), 0)
            };
            nodes.push(CafeNode {
                id: pos,
                name,
                parent: None,
                children: node.children.iter().map(|c| position[c]).collect(),
                branch_length: node.parent_edge,
                family_size,
            });
        }

        for pos in 0..nodes.len() {
            for child in nodes[pos].children.clone() {
                nodes[child].parent = Some(pos);
            }
        }

        Ok(CafeTree { nodes, root: position[&phylo_root] })
    }

    /// Number of nodes (leaves and branch nodes).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&CafeNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[CafeNode] {
        &self.nodes
    }

    /// Leaves in in-order (even ids for a binary tree).
    pub fn leaves(&self) -> impl Iterator<Item = &CafeNode> {
        self.nodes.iter().filter(|n| n.is_leaf())
    }

    /// Family sizes stored on the nodes, indexed by node id.
    pub fn family_sizes(&self) -> Vec<i32> {
        self.nodes.iter().map(|n| n.family_size).collect()
    }

    /// Plain newick with branch lengths, no trailing `;`.
    pub fn to_newick(&self) -> String {
        self.write(true, |node, buf| {
            if let Some(name) = &node.name {
                buf.push_str(name);
            }
        })
    }

    /// Newick where every label is `name_size`, sizes indexed by node id.
    pub fn to_family_newick(&self, sizes: &[i32]) -> String {
        self.write(true, |node, buf| {
            if let Some(name) = &node.name {
                buf.push_str(name);
            }
            buf.push('_');
            buf.push_str(&sizes.get(node.id).copied().unwrap_or(0).to_string());
        })
    }

    /// Newick annotated with node ids (`name<id>`), without branch lengths.
    pub fn to_id_newick(&self) -> String {
        self.write(false, |node, buf| {
            if let Some(name) = &node.name {
                buf.push_str(name);
            }
            buf.push('<');
            buf.push_str(&node.id.to_string());
            buf.push('>');
        })
    }

    fn write<F>(&self, lengths: bool, label: F) -> String
    where
        F: Fn(&CafeNode, &mut String),
    {
        let mut buf = String::new();
        self.write_subtree(self.root, lengths, &label, &mut buf);
        buf
    }

    fn write_subtree<F>(&self, id: NodeId, lengths: bool, label: &F, buf: &mut String)
    where
        F: Fn(&CafeNode, &mut String),
    {
        let node = &self.nodes[id];
        if !node.children.is_empty() {
            buf.push('(');
            for (i, &child) in node.children.iter().enumerate() {
                if i > 0 {
                    buf.push(',');
                }
                self.write_subtree(child, lengths, label, buf);
            }
            buf.push(')');
        }
        label(node, buf);
        if lengths {
            if let Some(len) = node.branch_length {
                buf.push(':');
                buf.push_str(&len.to_string());
            }
        }
    }
}

fn tree_error(e: phylotree::tree::TreeError) -> ReportError {
    ReportError::Tree(e.to_string())
}

/// Left subtree, node, then the remaining subtrees.
fn collect_inorder(tree: &PhyloTree, id: usize, order: &mut Vec<usize>) -> Result<()> {
    let node = tree.get(&id).map_err(tree_error)?;
    match node.children.split_first() {
        None => order.push(id),
        Some((first, rest)) => {
            collect_inorder(tree, *first, order)?;
            order.push(id);
            for child in rest {
                collect_inorder(tree, *child, order)?;
            }
        }
    }
    Ok(())
}

fn split_family_label(label: Option<&str>) -> (Option<String>, i32) {
    let Some(label) = label else {
        return (None, 0);
    };
    match label.rsplit_once('_') {
        Some((name, size)) => match size.parse::<i32>() {
            Ok(size) => ((!name.is_empty()).then(|| name.to_string()), size),
            Err(_) => (Some(label.to_string()), 0),
        },
        None => (Some(label.to_string()), 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inorder_numbering() {
        let tree = CafeTree::from_newick("((A:1,B:1):2,C:3)").unwrap();
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.root(), 3);

        let names: Vec<_> = tree.nodes().iter().map(|n| n.name.clone()).collect();
        assert_eq!(names[0].as_deref(), Some("A"));
        assert_eq!(names[2].as_deref(), Some("B"));
        assert_eq!(names[4].as_deref(), Some("C"));

        // leaves on even ids, branch nodes on odd ids
        for node in tree.nodes() {
            assert_eq!(node.is_leaf(), node.id % 2 == 0, "node {}", node.id);
        }
        assert_eq!(tree.node(1).unwrap().children, vec![0, 2]);
        assert_eq!(tree.node(3).unwrap().children, vec![1, 4]);
        assert_eq!(tree.node(0).unwrap().parent, Some(1));
        assert_eq!(tree.node(3).unwrap().parent, None);
    }

    #[test]
    fn test_writers() {
        let tree = CafeTree::from_newick("((A:1,B:1):2,C:3);").unwrap();
        assert_eq!(tree.to_newick(), "((A:1,B:1):2,C:3)");
        assert_eq!(tree.to_id_newick(), "((A<0>,B<2>)<1>,C<4>)<3>");
        assert_eq!(
            tree.to_family_newick(&[3, 4, 5, 6, 7]),
            "((A_3:1,B_5:1)_4:2,C_7:3)_6"
        );
    }

    #[test]
    fn test_family_labels() {
        let tree = CafeTree::from_family_newick("((chimp_3:6,human_12:6)_4:81,mouse_0:87)_9").unwrap();
        assert_eq!(tree.family_sizes(), vec![3, 4, 12, 9, 0]);
        assert_eq!(tree.node(0).unwrap().name.as_deref(), Some("chimp"));
        assert_eq!(tree.node(1).unwrap().name, None);
        assert_eq!(tree.to_family_newick(&tree.family_sizes()), "((chimp_3:6,human_12:6)_4:81,mouse_0:87)_9");
    }

    #[test]
    fn test_label_without_size() {
        assert_eq!(split_family_label(Some("sp_x")), (Some("sp_x".to_string()), 0));
        assert_eq!(split_family_label(Some("_7")), (None, 7));
        assert_eq!(split_family_label(None), (None, 0));
    }

    #[test]
    fn test_rejects_multifurcation() {
        let err = CafeTree::from_newick("(A,B,C)").unwrap_err();
        assert!(matches!(err, ReportError::Tree(_)));
    }

    #[test]
    fn test_rejects_text_without_parentheses() {
        for text in ["", "   ", "A", "garbage", ";"] {
            assert!(matches!(CafeTree::from_newick(text), Err(ReportError::Tree(_))), "{text:?}");
            assert!(matches!(CafeTree::from_family_newick(text), Err(ReportError::Tree(_))), "{text:?}");
        }
    }

    #[test]
    fn test_family_size_range() {
        assert_eq!(FamilySizeRange::default(), FamilySizeRange { min: 0, max: 1, root_min: 1, root_max: 2 });
        let small = FamilySizeRange::from_max_observed(12);
        assert_eq!(small, FamilySizeRange { min: 0, max: 62, root_min: 1, root_max: 30 });
        let large = FamilySizeRange::from_max_observed(400);
        assert_eq!(large, FamilySizeRange { min: 0, max: 480, root_min: 1, root_max: 500 });
        let huge = FamilySizeRange::from_max_observed(i32::MAX);
        assert_eq!(huge.max, i32::MAX);
        assert_eq!(huge.root_max, i32::MAX);
    }
}
