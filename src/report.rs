//! In-memory report built from an analysis run.
//!
//! A [`Report`] is a value snapshot: it copies every string and number it
//! needs out of the [`AnalysisRun`] and is rendered once, as text or HTML,
//! through [`crate::render`].

use crate::analysis::AnalysisRun;
use crate::family::Family;
use crate::format::{ColumnSchema, NOT_COMPUTED};
use crate::render::{HtmlWriter, ReportWriter, TextWriter, render};
use crate::tree::{CafeTree, NodeId};
use crate::viterbi::{NodeChange, ViterbiParameters, cell};
use std::io::{self, Write};

/// One formatted family row.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyLineItem {
    /// Display id of the family.
    pub node_id: String,
    /// Family tree with `name_size` labels, reconstructed sizes on branch nodes.
    pub tree: String,
    pub max_p_value: f64,
    /// Branch p-values, two node positions per pair.
    pub pvalues: Vec<(f64, f64)>,
    /// Per-node cut p-values; empty when branch cutting is absent.
    pub cut_pvalues: Vec<f64>,
    /// Per-node likelihood ratios; empty when the test is absent.
    pub likelihood_ratios: Vec<f64>,
}

impl FamilyLineItem {
    /// Build the row for family `i`.
    ///
    /// `i` must index both `family` and the per-family viterbi arrays.
    pub fn new(
        family: &Family,
        tree: &CafeTree,
        likelihood_ratios: Option<&[Vec<f64>]>,
        viterbi: &ViterbiParameters,
        i: usize,
        node_id: impl Into<String>,
    ) -> Self {
        let mut sizes = family.node_sizes(i, tree.len());
        for j in (1..tree.len()).step_by(2) {
            sizes[j] = viterbi.node_family_size(j / 2, i);
        }

        let pvalues = (0..viterbi.num_nodes / 2)
            .map(|b| (viterbi.viterbi_pvalue(2 * b, i), viterbi.viterbi_pvalue(2 * b + 1, i)))
            .collect();

        let cut_pvalues = match viterbi.cut_pvalues {
            Some(_) => (0..viterbi.num_nodes)
                .filter_map(|b| viterbi.cut_pvalue(b, i))
                .collect(),
            None => Vec::new(),
        };

        let likelihood_ratios = likelihood_ratios
            .map(|ratios| {
                (0..tree.len())
                    .map(|b| cell(ratios, b, i).unwrap_or(NOT_COMPUTED))
                    .collect()
            })
            .unwrap_or_default();

        FamilyLineItem {
            node_id: node_id.into(),
            tree: tree.to_family_newick(&sizes),
            max_p_value: viterbi.maximum_pvalue(i),
            pvalues,
            cut_pvalues,
            likelihood_ratios,
        }
    }
}

/// Everything a rendered report shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub tree: String,
    pub lambdas: Vec<f64>,
    pub lambda_tree: Option<String>,
    /// Tree annotated with node ids, for reading the legends.
    pub id_tree: String,
    /// Children of every branch node, in branch-node order.
    pub node_pairs: Vec<(NodeId, NodeId)>,
    pub average_expansion: Vec<f64>,
    pub changes: Vec<NodeChange>,
    pub family_line_items: Vec<FamilyLineItem>,
    /// Node index order of the branch-cutting and likelihood-ratio columns.
    pub branch_cutting_output_format: Vec<usize>,
}

impl Report {
    pub fn new(run: &AnalysisRun) -> Self {
        let tree = &run.tree;

        let node_pairs = (1..tree.len())
            .step_by(2)
            .filter_map(|b| match tree.node(b)?.children.as_slice() {
                [left, right, ..] => Some((*left, *right)),
                _ => None,
            })
            .collect();

        let family_line_items = run
            .family
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                FamilyLineItem::new(
                    &run.family,
                    tree,
                    run.likelihood_ratios.as_deref(),
                    &run.viterbi,
                    i,
                    item.id.clone(),
                )
            })
            .collect();

        Report {
            tree: tree.to_newick(),
            lambdas: run.lambdas.clone(),
            lambda_tree: run.lambda_tree.as_ref().map(CafeTree::to_newick),
            id_tree: tree.to_id_newick(),
            node_pairs,
            average_expansion: run.viterbi.average_expansion.clone(),
            changes: run.viterbi.expand_remain_decrease.clone(),
            family_line_items,
            branch_cutting_output_format: (0..tree.len()).collect(),
        }
    }

    /// Optional columns, decided by the first family line item.
    pub fn column_schema(&self) -> ColumnSchema {
        match self.family_line_items.first() {
            Some(first) => ColumnSchema::new(!first.cut_pvalues.is_empty(), !first.likelihood_ratios.is_empty()),
            None => ColumnSchema::None,
        }
    }

    pub fn write_text<W: Write>(&self, out: W) -> io::Result<()> {
        self.write_with(&mut TextWriter::new(out))
    }

    pub fn write_html<W: Write>(&self, out: W) -> io::Result<()> {
        self.write_with(&mut HtmlWriter::new(out))
    }

    fn write_with<R: ReportWriter>(&self, writer: &mut R) -> io::Result<()> {
        render(self, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::FamilyItem;

    fn sample_run() -> AnalysisRun {
        let tree = CafeTree::from_newick("((A:1,B:1):2,C:3)").unwrap();
        let mut family = Family::from_tree_leaves(&tree);
        family.items.push(FamilyItem::new("F1", vec![3, 5, 7]));
        family.items.push(FamilyItem::new("F2", vec![0, 1, 2]));
        let mut run = AnalysisRun::new(tree, family);
        run.set_lambdas(vec![0.01]);
        run.viterbi.allocate(5, 2, ColumnSchema::None);
        run.viterbi.node_family_sizes[0] = vec![4, 1];
        run.viterbi.node_family_sizes[1] = vec![6, 2];
        run.viterbi.viterbi_pvalues[0] = vec![0.5, 0.25];
        run.viterbi.viterbi_pvalues[1] = vec![0.75, 0.125];
        run.viterbi.maximum_pvalues = vec![0.05, 0.9];
        run
    }

    #[test]
    fn test_family_line_item() {
        let run = sample_run();
        let item = FamilyLineItem::new(&run.family, &run.tree, None, &run.viterbi, 0, "F1");
        assert_eq!(item.node_id, "F1");
        assert_eq!(item.tree, "((A_3:1,B_5:1)_4:2,C_7:3)_6");
        assert_eq!(item.max_p_value, 0.05);
        assert_eq!(item.pvalues, vec![(0.5, 0.75), (NOT_COMPUTED, NOT_COMPUTED)]);
        assert!(item.cut_pvalues.is_empty());
        assert!(item.likelihood_ratios.is_empty());
    }

    #[test]
    fn test_optional_vectors_copied_per_family() {
        let mut run = sample_run();
        run.viterbi.cut_pvalues = Some(vec![vec![0.1, 0.2]; 5]);
        run.likelihood_ratios = Some(vec![vec![1.5, 2.5]; 5]);
        let item = FamilyLineItem::new(
            &run.family,
            &run.tree,
            run.likelihood_ratios.as_deref(),
            &run.viterbi,
            1,
            "F2",
        );
        assert_eq!(item.cut_pvalues, vec![0.2; 5]);
        assert_eq!(item.likelihood_ratios, vec![2.5; 5]);
    }

    #[test]
    fn test_report_header_fields() {
        let report = Report::new(&sample_run());
        assert_eq!(report.tree, "((A:1,B:1):2,C:3)");
        assert_eq!(report.id_tree, "((A<0>,B<2>)<1>,C<4>)<3>");
        assert_eq!(report.node_pairs, vec![(0, 2), (1, 4)]);
        assert_eq!(report.lambda_tree, None);
        assert_eq!(report.branch_cutting_output_format, vec![0, 1, 2, 3, 4]);
        let ids: Vec<_> = report.family_line_items.iter().map(|f| f.node_id.as_str()).collect();
        assert_eq!(ids, vec!["F1", "F2"]);
        assert_eq!(report.column_schema(), ColumnSchema::None);
    }

    #[test]
    fn test_schema_follows_first_item() {
        let mut run = sample_run();
        run.viterbi.cut_pvalues = Some(vec![vec![0.1, 0.2]; 5]);
        assert_eq!(Report::new(&run).column_schema(), ColumnSchema::CutOnly);
        run.likelihood_ratios = Some(vec![vec![1.0, 1.0]; 5]);
        assert_eq!(Report::new(&run).column_schema(), ColumnSchema::Both);
    }
}
