//! Report serialization.
//!
//! [`render`] walks a [`Report`] once and emits [`Field`] events in file
//! order. [`TextWriter`] turns them into the flat `.cafe` format that
//! [`crate::io::parse_report`] reads back; [`HtmlWriter`] turns them into a
//! standalone HTML page. Both writers receive the same [`ColumnSchema`], so
//! they always agree on which optional columns exist.

use crate::format::{ColumnSchema, format_pair, format_pvalue_pairs, format_value_list};
use crate::report::{FamilyLineItem, Report};
use itertools::Itertools;
use std::io::{self, Write};

/// Aggregate statistic rows, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    AverageExpansion,
    Expansion,
    Remain,
    Decrease,
}

impl Statistic {
    pub const ALL: [Statistic; 4] = [
        Statistic::AverageExpansion,
        Statistic::Expansion,
        Statistic::Remain,
        Statistic::Decrease,
    ];

    /// Line key in the text format (text before the `:`).
    pub fn text_key(self) -> &'static str {
        match self {
            Statistic::AverageExpansion => "Average Expansion",
            Statistic::Expansion => "Expansion ",
            Statistic::Remain => "nRemain ",
            Statistic::Decrease => "nDecrease ",
        }
    }

    pub fn html_label(self) -> &'static str {
        match self {
            Statistic::AverageExpansion => "Average Expansion",
            Statistic::Expansion => "Expanded",
            Statistic::Remain => "Remained Same",
            Statistic::Decrease => "Decreased",
        }
    }

    /// `(a,b)` cells, one per node pair.
    fn cells(self, report: &Report) -> Vec<String> {
        let changes = &report.changes;
        match self {
            Statistic::AverageExpansion => report
                .average_expansion
                .chunks_exact(2)
                .map(|p| format_pair(p[0], p[1]))
                .collect(),
            Statistic::Expansion => changes.chunks_exact(2).map(|p| format_pair(p[0].expand, p[1].expand)).collect(),
            Statistic::Remain => changes.chunks_exact(2).map(|p| format_pair(p[0].remain, p[1].remain)).collect(),
            Statistic::Decrease => changes
                .chunks_exact(2)
                .map(|p| format_pair(p[0].decrease, p[1].decrease))
                .collect(),
        }
    }
}

/// One piece of report content.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<'a> {
    Tree(&'a str),
    Lambdas(&'a [f64]),
    LambdaTree(&'a str),
    IdTree(&'a str),
    NodePairs(&'a [(usize, usize)]),
    BranchCuttingOrder(&'a [usize]),
    Statistic(Statistic, Vec<String>),
    FamilyHeader(ColumnSchema),
    Family(&'a FamilyLineItem, ColumnSchema),
}

/// Consumer of [`Field`] events.
pub trait ReportWriter {
    fn begin(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn field(&mut self, field: Field<'_>) -> io::Result<()>;

    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Emit every field of `report`, in file order.
pub fn render<W: ReportWriter + ?Sized>(report: &Report, out: &mut W) -> io::Result<()> {
    let schema = report.column_schema();

    out.begin()?;
    out.field(Field::Tree(&report.tree))?;
    out.field(Field::Lambdas(&report.lambdas))?;
    if let Some(lambda_tree) = report.lambda_tree.as_deref().filter(|t| !t.is_empty()) {
        out.field(Field::LambdaTree(lambda_tree))?;
    }
    out.field(Field::IdTree(&report.id_tree))?;
    out.field(Field::NodePairs(&report.node_pairs))?;
    out.field(Field::BranchCuttingOrder(&report.branch_cutting_output_format))?;
    for stat in Statistic::ALL {
        out.field(Field::Statistic(stat, stat.cells(report)))?;
    }
    out.field(Field::FamilyHeader(schema))?;
    for item in &report.family_line_items {
        out.field(Field::Family(item, schema))?;
    }
    out.finish()
}

/// Flat tab-delimited `.cafe` text.
pub struct TextWriter<W: Write> {
    out: W,
}

impl<W: Write> TextWriter<W> {
    pub fn new(out: W) -> Self {
        TextWriter { out }
    }
}

impl<W: Write> ReportWriter for TextWriter<W> {
    fn field(&mut self, field: Field<'_>) -> io::Result<()> {
        let out = &mut self.out;
        match field {
            Field::Tree(tree) => writeln!(out, "Tree:{tree}"),
            Field::Lambdas(lambdas) => {
                write!(out, "Lambda:")?;
                for lambda in lambdas {
                    write!(out, "\t{lambda}")?;
                }
                writeln!(out)
            }
            Field::LambdaTree(tree) => writeln!(out, "Lambda tree:\t{tree}"),
            Field::IdTree(tree) => writeln!(out, "# IDs of nodes:{tree}"),
            Field::NodePairs(pairs) => {
                write!(
                    out,
                    "# Output format for: ' Average Expansion', 'Expansions', 'No Change', 'Contractions', and 'Branch-specific P-values' = (node ID, node ID): "
                )?;
                for (a, b) in pairs {
                    write!(out, "({a},{b}) ")?;
                }
                writeln!(out)
            }
            Field::BranchCuttingOrder(order) => writeln!(
                out,
                "# Output format for 'Branch cutting P-values' and 'Likelihood Ratio Test': ({})",
                order.iter().join(", ")
            ),
            Field::Statistic(stat, cells) => {
                write!(out, "{}:", stat.text_key())?;
                for cell in cells {
                    write!(out, "\t{cell}")?;
                }
                writeln!(out)
            }
            Field::FamilyHeader(schema) => {
                writeln!(out, "{}", schema.labels().iter().map(|l| format!("'{l}'")).join("\t"))
            }
            Field::Family(item, schema) => {
                write!(
                    out,
                    "{}\t{}\t{}\t({})",
                    item.node_id,
                    item.tree,
                    item.max_p_value,
                    format_pvalue_pairs(&item.pvalues)
                )?;
                if schema.has_cut_pvalues() {
                    write!(out, "\t{}", format_value_list(&item.cut_pvalues))?;
                }
                if schema.has_likelihood_ratios() {
                    write!(out, "\t{}", format_value_list(&item.likelihood_ratios))?;
                }
                writeln!(out)
            }
        }
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Standalone HTML page.
pub struct HtmlWriter<W: Write> {
    out: W,
}

impl<W: Write> HtmlWriter<W> {
    pub fn new(out: W) -> Self {
        HtmlWriter { out }
    }
}

impl<W: Write> ReportWriter for HtmlWriter<W> {
    fn begin(&mut self) -> io::Result<()> {
        write!(
            self.out,
            "<!DOCTYPE html><html><head><meta charset=\"UTF-8\">\
             <title>Cafe Report</title><style>table, th, td{{ border: 1px solid black;}}</style></head><body>\
             <h1>Cafe Report</h1>"
        )
    }

    fn field(&mut self, field: Field<'_>) -> io::Result<()> {
        let out = &mut self.out;
        match field {
            Field::Tree(tree) => write!(out, "<h3>Input tree</h3><p>{}</p>", html_escape(tree)),
            Field::Lambdas(lambdas) => {
                write!(out, "<h3>Lambda values</h3><ol>")?;
                for lambda in lambdas {
                    write!(out, "<li>{lambda}</li>")?;
                }
                write!(out, "</ol>")
            }
            Field::LambdaTree(tree) => write!(out, "<h3>Lambda tree</h3><p>{}</p>", html_escape(tree)),
            Field::IdTree(tree) => write!(out, "<h3>ID tree</h3><p>{}</p>", html_escape(tree)),
            Field::NodePairs(pairs) => {
                write!(out, "<h3>Family Change Summary</h3><table><tr><th>Node Pairs</th>")?;
                for (a, b) in pairs {
                    write!(out, "<th>({a},{b})</th>")?;
                }
                write!(out, "</tr>")
            }
            // the page lists node ids in the ID tree instead
            Field::BranchCuttingOrder(_) => Ok(()),
            Field::Statistic(stat, cells) => {
                write!(out, "<tr><td>{}</td>", stat.html_label())?;
                for cell in cells {
                    write!(out, "<td>{cell}</td>")?;
                }
                write!(out, "</tr>")
            }
            Field::FamilyHeader(schema) => {
                write!(out, "</table><h3>Families</h3><table><tr>")?;
                for label in schema.labels() {
                    write!(out, "<th>{label}</th>")?;
                }
                write!(out, "</tr>")
            }
            Field::Family(item, schema) => {
                write!(
                    out,
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td>",
                    html_escape(&item.node_id),
                    html_escape(&item.tree),
                    item.max_p_value,
                    format_pvalue_pairs(&item.pvalues)
                )?;
                if schema.has_cut_pvalues() {
                    write!(out, "<td>{}</td>", format_value_list(&item.cut_pvalues))?;
                }
                if schema.has_likelihood_ratios() {
                    write!(out, "<td>{}</td>", format_value_list(&item.likelihood_ratios))?;
                }
                write!(out, "</tr>")
            }
        }
    }

    fn finish(&mut self) -> io::Result<()> {
        write!(self.out, "</table></body></html>")?;
        self.out.flush()
    }
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
