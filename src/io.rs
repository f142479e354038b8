use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use log::{debug, warn};

use crate::analysis::AnalysisRun;
use crate::error::{ReportError, Result};
use crate::family::{Family, FamilyItem};
use crate::format::{ColumnSchema, NOT_COMPUTED};
use crate::tree::{CafeTree, FamilySizeRange};
use crate::viterbi::{NodeChange, set_cell};

/// Read a `.cafe` report written by [`crate::report::Report::write_text`].
///
/// Paths ending in `.gz` are decompressed on the fly.
pub fn read_report<P: AsRef<Path>>(path: P) -> Result<AnalysisRun> {
    let p = path.as_ref();
    let file = File::open(p).map_err(|source| ReportError::Open { path: p.to_path_buf(), source })?;
    let is_gz = p.to_string_lossy().ends_with(".gz");

    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    parse_report(reader)
}

/// Metadata collected from the lines before the family table.
#[derive(Default)]
struct Header {
    tree: Option<CafeTree>,
    lambda_tree: Option<CafeTree>,
    lambdas: Vec<f64>,
    average_expansion: Vec<f64>,
    changes: Vec<NodeChange>,
}

impl Header {
    fn apply(&mut self, line_no: usize, line: &str) -> Result<()> {
        let Some((key, data)) = line.split_once(':') else {
            return Err(ReportError::Format { line_no, line: line.to_string() });
        };
        let key = key.trim().to_ascii_lowercase();
        let data = data.trim_end();

        if key == "tree" {
            self.tree = Some(CafeTree::from_newick(data)?);
        } else if key.starts_with("lambda tree") {
            self.lambda_tree = Some(CafeTree::from_newick(data.trim())?);
        } else if key.starts_with("lambda") {
            self.lambdas = tab_cells(data).map(scan_value).collect();
        } else if key.starts_with("average") {
            let cells: Vec<&str> = tab_cells(data).collect();
            self.average_expansion = vec![NOT_COMPUTED; cells.len() * 2];
            for (i, cell) in cells.iter().enumerate() {
                let (a, b) = scan_cell_pair(cell, NOT_COMPUTED);
                self.average_expansion[2 * i] = a;
                self.average_expansion[2 * i + 1] = b;
            }
        } else if key.starts_with("expansion") {
            self.apply_changes(data, |c, v| c.expand = v);
        } else if key.trim_start_matches('n').starts_with("remain") {
            self.apply_changes(data, |c, v| c.remain = v);
        } else if key.trim_start_matches('n').starts_with("decrease") {
            self.apply_changes(data, |c, v| c.decrease = v);
        } else {
            debug!("skipping report line {line_no}: {key}");
        }
        Ok(())
    }

    fn apply_changes<F>(&mut self, data: &str, set: F)
    where
        F: Fn(&mut NodeChange, i32),
    {
        let cells: Vec<&str> = tab_cells(data).collect();
        if self.changes.len() < cells.len() * 2 {
            self.changes.resize(cells.len() * 2, NodeChange::UNKNOWN);
        }
        for (i, cell) in cells.iter().enumerate() {
            let (a, b) = scan_cell_pair(cell, -1);
            set(&mut self.changes[2 * i], a);
            set(&mut self.changes[2 * i + 1], b);
        }
    }
}

/// Rebuild an analysis run from report text.
///
/// Header lines are read up to the quoted family-table header, whose width
/// decides the [`ColumnSchema`]. All family rows are then buffered and
/// parsed against arrays sized once for the final row count.
///
/// # Errors
/// A header line without `:` is a [`ReportError::Format`] naming that line.
/// Nothing is returned on error.
pub fn parse_report<R: BufRead>(reader: R) -> Result<AnalysisRun> {
    let mut lines = reader.lines().enumerate();
    let mut header = Header::default();
    let mut schema = ColumnSchema::None;

    for (idx, line) in lines.by_ref() {
        let line = line?;
        if line.starts_with('\'') {
            schema = ColumnSchema::from_header(&line);
            break;
        }
        header.apply(idx + 1, &line)?;
    }

    let rows: Vec<String> = lines
        .map(|(_, line)| line)
        .filter(|line| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
        .collect::<std::io::Result<_>>()?;

    let Some(tree) = header.tree else {
        return Err(ReportError::InvalidInput("report has no 'Tree:' line".to_string()));
    };
    let num_nodes = tree.len();
    let num_families = rows.len();
    debug!("loading {num_families} families over {num_nodes} nodes ({schema:?})");

    let family = Family::from_tree_leaves(&tree);
    let mut run = AnalysisRun::new(tree, family);
    run.lambda_tree = header.lambda_tree;
    run.set_lambdas(header.lambdas);
    run.viterbi.average_expansion = header.average_expansion;
    run.viterbi.expand_remain_decrease = header.changes;
    run.viterbi.allocate(num_nodes, num_families, schema);
    if schema.has_likelihood_ratios() {
        run.likelihood_ratios = Some(vec![vec![NOT_COMPUTED; num_families]; num_nodes]);
    }

    let root = run.tree.root();
    let mut max_size = 0;
    for (i, row) in rows.iter().enumerate() {
        let fields: Vec<&str> = row.split('\t').collect();
        let field = |k: usize| fields.get(k).copied().unwrap_or("");
        let id = field(0);

        let family_tree = CafeTree::from_family_newick(field(1))
            .map_err(|e| ReportError::Tree(format!("family {id}: {e}")))?;
        let sizes = family_tree.family_sizes();
        let count: Vec<i32> = sizes.iter().step_by(2).copied().collect();
        max_size = count.iter().copied().fold(max_size, i32::max);
        for j in (1..sizes.len()).step_by(2) {
            set_cell(&mut run.viterbi.node_family_sizes, j / 2, i, sizes[j]);
        }

        run.viterbi.maximum_pvalues[i] = scan_value(field(2));
        for (b, (p0, p1)) in scan_pvalue_pairs(field(3)).into_iter().enumerate() {
            set_cell(&mut run.viterbi.viterbi_pvalues, 2 * b, i, p0);
            set_cell(&mut run.viterbi.viterbi_pvalues, 2 * b + 1, i, p1);
        }

        if let (Some(col), Some(cut)) = (schema.cut_column(), run.viterbi.cut_pvalues.as_mut()) {
            load_node_list(field(col), cut, i);
            set_cell(cut, root, i, NOT_COMPUTED);
        }
        if let (Some(col), Some(ratios)) = (schema.likelihood_column(), run.likelihood_ratios.as_mut()) {
            load_node_list(field(col), ratios, i);
        }

        run.family.items.push(FamilyItem::new(id, count));
    }

    run.set_family_size(FamilySizeRange::from_max_observed(max_size));
    Ok(run)
}

fn tab_cells(data: &str) -> impl Iterator<Item = &str> {
    data.split('\t').map(str::trim).filter(|cell| !cell.is_empty())
}

/// Strip one level of enclosing parentheses.
fn strip_parens(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix('(').and_then(|t| t.strip_suffix(')')).unwrap_or(text)
}

/// A real number, `-` for the sentinel.
///
/// Unreadable text becomes 0, matching what earlier readers of this format did.
fn scan_value(text: &str) -> f64 {
    let text = text.trim();
    if text == "-" {
        return NOT_COMPUTED;
    }
    text.parse().unwrap_or_else(|_| {
        warn!("cannot read a number from '{text}', using 0");
        0.0
    })
}

/// `(a,b)` aggregate cell; unreadable halves keep `unknown`.
fn scan_cell_pair<T: std::str::FromStr + Copy>(cell: &str, unknown: T) -> (T, T) {
    let read = |s: &str| s.trim().parse().unwrap_or(unknown);
    match strip_parens(cell).split_once(',') {
        Some((a, b)) => (read(a), read(b)),
        None => (unknown, unknown),
    }
}

/// `((a,b),(-,-),...)` into value pairs.
fn scan_pvalue_pairs(text: &str) -> Vec<(f64, f64)> {
    strip_parens(text)
        .split(')')
        .filter_map(|chunk| chunk.split_once('(').map(|(_, pair)| pair))
        .map(|pair| match pair.split_once(',') {
            Some((a, b)) => (scan_value(a), scan_value(b)),
            None => (scan_value(pair), NOT_COMPUTED),
        })
        .collect()
}

/// `(a,b,-,...)` into column `family` of a node-major matrix.
fn load_node_list(text: &str, matrix: &mut [Vec<f64>], family: usize) {
    let inner = strip_parens(text);
    if inner.is_empty() {
        return;
    }
    for (node, value) in inner.split(',').enumerate() {
        set_cell(matrix, node, family, scan_value(value));
    }
}
