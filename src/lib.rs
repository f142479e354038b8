//! Crate root: lightweight module orchestration and public re-exports.
//!
//! Modules:
//! - `tree`: CAFE tree model (in-order node ids, newick readers/writers).
//! - `family`: gene families and per-species counts.
//! - `viterbi`: reconstructed sizes, branch p-values and change statistics.
//! - `analysis`: analysis-run context and the statistical engine trait.
//! - `format`: value formatting and the optional-column schema.
//! - `report`: family line items and the in-memory report.
//! - `render`: text and HTML writers over report field events.
//! - `io`: reading `.cafe` reports back into an analysis run.
//! - `driver`: report options and the report command.

pub mod analysis;
pub mod driver;
pub mod error;
pub mod family;
pub mod format;
pub mod io;
pub mod render;
pub mod report;
pub mod tree;
pub mod viterbi;

// Re-export frequently used types & functions
pub use analysis::{AnalysisEngine, AnalysisRun, SavedStateEngine};
pub use driver::{ReportOptions, do_report};
pub use error::{ReportError, Result};
pub use io::{parse_report, read_report};
pub use report::{FamilyLineItem, Report};
pub use tree::CafeTree;
