//! Field formatting shared by the text and HTML renderers.
//!
//! Reports use `-1` as the "not computed" sentinel. Wherever a statistic
//! may be missing (cut p-values, likelihood ratios, branch p-value pairs)
//! the sentinel is written as a dash so it can never be confused with a
//! computed zero.

use itertools::Itertools;
use std::fmt;

/// Sentinel for "not computed / not applicable".
pub const NOT_COMPUTED: f64 = -1.0;

/// Fixed family-table columns, in order.
pub const FAMILY_COLUMNS: [&str; 4] = ["ID", "Newick", "Family-wide P-value", "Viterbi P-values"];
pub const CUT_PVALUE_COLUMN: &str = "cut P-value";
pub const LIKELIHOOD_RATIO_COLUMN: &str = "Likelihood Ratio";

/// Displays a real number, or `-` for the sentinel.
#[derive(Debug, Clone, Copy)]
pub struct OrDash(pub f64);

impl fmt::Display for OrDash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == NOT_COMPUTED {
            f.write_str("-")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// `(a,b,-,c)`: a per-node vector with sentinels dashed.
pub fn format_value_list(values: &[f64]) -> String {
    format!("({})", values.iter().map(|&v| OrDash(v)).join(","))
}

/// `(a,b)`, or `(-,-)` when the first value is negative.
pub fn format_pvalue_pair(pair: (f64, f64)) -> String {
    if pair.0 < 0.0 {
        "(-,-)".to_string()
    } else {
        format!("({},{})", pair.0, pair.1)
    }
}

/// Branch p-value pairs joined by commas, without the enclosing parentheses.
pub fn format_pvalue_pairs(pairs: &[(f64, f64)]) -> String {
    pairs.iter().map(|&p| format_pvalue_pair(p)).join(",")
}

/// Raw `(a,b)` pair used by the aggregate statistics lines.
pub fn format_pair<T: fmt::Display>(a: T, b: T) -> String {
    format!("({a},{b})")
}

/// Which optional family columns a report carries.
///
/// Decided once (from the first family line item when writing, from the
/// header row when reading) and shared by every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnSchema {
    #[default]
    None,
    CutOnly,
    LikelihoodOnly,
    Both,
}

impl ColumnSchema {
    pub fn new(cut_pvalues: bool, likelihood_ratios: bool) -> Self {
        match (cut_pvalues, likelihood_ratios) {
            (false, false) => ColumnSchema::None,
            (true, false) => ColumnSchema::CutOnly,
            (false, true) => ColumnSchema::LikelihoodOnly,
            (true, true) => ColumnSchema::Both,
        }
    }

    /// Infer the schema from the family-table header row.
    ///
    /// Four fields carry no optional column and six carry both. Any other
    /// width carries exactly one, named by the fifth field.
    pub fn from_header(line: &str) -> Self {
        let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
        match fields.len() {
            4 => ColumnSchema::None,
            6 => ColumnSchema::Both,
            _ => {
                let is_cut = fields.get(4).is_some_and(|label| {
                    label.trim().trim_start_matches('\'').to_ascii_lowercase().starts_with("cut")
                });
                if is_cut {
                    ColumnSchema::CutOnly
                } else {
                    ColumnSchema::LikelihoodOnly
                }
            }
        }
    }

    pub fn has_cut_pvalues(self) -> bool {
        matches!(self, ColumnSchema::CutOnly | ColumnSchema::Both)
    }

    pub fn has_likelihood_ratios(self) -> bool {
        matches!(self, ColumnSchema::LikelihoodOnly | ColumnSchema::Both)
    }

    /// Row field index of the cut p-values.
    pub fn cut_column(self) -> Option<usize> {
        self.has_cut_pvalues().then_some(4)
    }

    /// Row field index of the likelihood ratios (shifted right by the cut column).
    pub fn likelihood_column(self) -> Option<usize> {
        match self {
            ColumnSchema::LikelihoodOnly => Some(4),
            ColumnSchema::Both => Some(5),
            _ => None,
        }
    }

    /// Column labels, fixed columns first.
    pub fn labels(self) -> Vec<&'static str> {
        let mut labels = FAMILY_COLUMNS.to_vec();
        if self.has_cut_pvalues() {
            labels.push(CUT_PVALUE_COLUMN);
        }
        if self.has_likelihood_ratios() {
            labels.push(LIKELIHOOD_RATIO_COLUMN);
        }
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_renders_as_dash() {
        assert_eq!(OrDash(NOT_COMPUTED).to_string(), "-");
        assert_eq!(OrDash(0.0).to_string(), "0");
        assert_eq!(OrDash(0.25).to_string(), "0.25");
        assert_eq!(format_value_list(&[0.5, -1.0, 0.0]), "(0.5,-,0)");
        assert_eq!(format_value_list(&[]), "()");
    }

    #[test]
    fn test_pvalue_pairs() {
        assert_eq!(format_pvalue_pair((0.1, 0.2)), "(0.1,0.2)");
        assert_eq!(format_pvalue_pair((-1.0, 0.3)), "(-,-)");
        assert_eq!(format_pvalue_pairs(&[(0.5, 1.0), (-1.0, -1.0)]), "(0.5,1),(-,-)");
        assert_eq!(format_pair(3, -1), "(3,-1)");
    }

    #[test]
    fn test_schema_from_header_width() {
        let base = "'ID'\t'Newick'\t'Family-wide P-value'\t'Viterbi P-values'";
        assert_eq!(ColumnSchema::from_header(base), ColumnSchema::None);
        assert_eq!(
            ColumnSchema::from_header(&format!("{base}\t'cut P-value'\t'Likelihood Ratio'")),
            ColumnSchema::Both
        );
        assert_eq!(ColumnSchema::from_header(&format!("{base}\t'cut P-value'")), ColumnSchema::CutOnly);
        assert_eq!(ColumnSchema::from_header(&format!("{base}\t'Cut P-value'\r")), ColumnSchema::CutOnly);
        assert_eq!(
            ColumnSchema::from_header(&format!("{base}\t'Likelihood Ratio'")),
            ColumnSchema::LikelihoodOnly
        );
    }

    #[test]
    fn test_column_indices() {
        assert_eq!(ColumnSchema::None.cut_column(), None);
        assert_eq!(ColumnSchema::None.likelihood_column(), None);
        assert_eq!(ColumnSchema::CutOnly.cut_column(), Some(4));
        assert_eq!(ColumnSchema::LikelihoodOnly.likelihood_column(), Some(4));
        assert_eq!(ColumnSchema::Both.cut_column(), Some(4));
        assert_eq!(ColumnSchema::Both.likelihood_column(), Some(5));
        assert_eq!(ColumnSchema::Both.labels().len(), 6);
        assert_eq!(ColumnSchema::new(false, true), ColumnSchema::LikelihoodOnly);
    }
}
