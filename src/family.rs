//! Gene families and their per-species counts.

use crate::tree::{CafeTree, NodeId};

/// One gene family.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyItem {
    pub id: String,
    pub description: Option<String>,
    /// Count per species, in the collection's species order.
    pub count: Vec<i32>,
    /// Family-specific lambda override.
    pub lambda: Option<Vec<f64>>,
    /// Cached maximum likelihood, None until computed.
    pub max_likelihood: Option<f64>,
    /// Reference family index, None when unset.
    pub reference: Option<usize>,
}

impl FamilyItem {
    pub fn new(id: impl Into<String>, count: Vec<i32>) -> Self {
        FamilyItem {
            id: id.into(),
            description: None,
            count,
            lambda: None,
            max_likelihood: None,
            reference: None,
        }
    }
}

/// A collection of families sharing one species list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Family {
    /// Species names, one per count column.
    pub species: Vec<String>,
    /// Tree node id holding each species.
    pub index: Vec<NodeId>,
    pub items: Vec<FamilyItem>,
}

impl Family {
    /// Empty collection whose species are the leaves of `tree`, in tree order.
    pub fn from_tree_leaves(tree: &CafeTree) -> Self {
        let (species, index) = tree
            .leaves()
            .map(|leaf| (leaf.name.clone().unwrap_or_default(), leaf.id))
            .unzip();
        Family { species, index, items: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Per-node family sizes for family `i`: species counts on their leaves,
    /// zero elsewhere.
    ///
    /// # Panics
    /// Panics if `i` is out of range.
    pub fn node_sizes(&self, i: usize, num_nodes: usize) -> Vec<i32> {
        let mut sizes = vec![0; num_nodes];
        for (&node, &count) in self.index.iter().zip(&self.items[i].count) {
            if let Some(slot) = sizes.get_mut(node) {
                *slot = count;
            }
        }
        sizes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_from_leaves() {
        let tree = CafeTree::from_newick("((chimp:6,human:6):81,mouse:87)").unwrap();
        let family = Family::from_tree_leaves(&tree);
        assert_eq!(family.species, vec!["chimp", "human", "mouse"]);
        assert_eq!(family.index, vec![0, 2, 4]);
        assert!(family.is_empty());
    }

    #[test]
    fn test_node_sizes_follow_index() {
        let mut family = Family {
            species: vec!["a".into(), "b".into(), "c".into()],
            index: vec![4, 0, 2],
            items: Vec::new(),
        };
        family.items.push(FamilyItem::new("F1", vec![7, 8, 9]));
        assert_eq!(family.node_sizes(0, 5), vec![8, 0, 9, 0, 7]);
    }
}
