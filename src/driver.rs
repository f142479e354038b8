//! Report generation entry point.
//!
//! Turns a report command (`<name> [html] [branchcutting] [likelihood] [lh2] [save]`)
//! into the statistical work it needs and writes `<name>.cafe` or `<name>.html`.

use crate::analysis::{AnalysisEngine, AnalysisRun};
use crate::error::{ReportError, Result};
use crate::report::Report;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Options of one report command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Output file name without extension.
    pub name: String,
    pub html: bool,
    pub branch_cutting: bool,
    pub likelihood: bool,
    /// Two-lambda-tree comparison instead of a report.
    pub lh2: bool,
    /// Re-serialize the current state without computing anything.
    pub just_save: bool,
}

impl ReportOptions {
    /// Parse `name [flag...]`. Flags are case-insensitive and unknown ones
    /// are ignored; `save` cancels the statistical flags and ends the scan.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        let (name, flags) = tokens
            .split_first()
            .ok_or_else(|| ReportError::InvalidInput("report needs an output name".to_string()))?;

        let mut options = ReportOptions { name: name.as_ref().to_string(), ..Default::default() };
        for flag in flags {
            let flag = flag.as_ref();
            if flag.eq_ignore_ascii_case("html") {
                options.html = true;
            } else if flag.eq_ignore_ascii_case("branchcutting") {
                options.branch_cutting = true;
            } else if flag.eq_ignore_ascii_case("likelihood") {
                options.likelihood = true;
            } else if flag.eq_ignore_ascii_case("lh2") {
                options.lh2 = true;
            } else if flag.eq_ignore_ascii_case("save") {
                options.branch_cutting = false;
                options.likelihood = false;
                options.lh2 = false;
                options.just_save = true;
                break;
            }
        }
        Ok(options)
    }

    pub fn output_path(&self) -> PathBuf {
        let ext = if self.html { "html" } else { "cafe" };
        PathBuf::from(format!("{}.{ext}", self.name))
    }
}

/// Run the work `options` asks for and write the report.
///
/// Returns the path of the file written. In `lh2` mode the file is created
/// but left to the comparison routine.
pub fn do_report<E: AnalysisEngine + ?Sized>(
    run: &mut AnalysisRun,
    engine: &mut E,
    options: &ReportOptions,
) -> Result<PathBuf> {
    if !options.just_save {
        run.viterbi.clear(run.tree.len());
    }

    let path = options.output_path();
    let file = File::create(&path).map_err(|source| ReportError::Create { path: path.clone(), source })?;
    let mut out = BufWriter::new(file);

    if !options.just_save && !run.cache.is_populated() {
        let distributions = engine.build_conditional_cache(run)?;
        run.cache.populate(distributions);
    }

    if options.branch_cutting || options.likelihood {
        engine.viterbi(run)?;
        if options.branch_cutting {
            engine.branch_cutting(run)?;
            run.viterbi.force_root_cut(run.tree.root());
        }
        if options.likelihood {
            engine.likelihood_ratio_test(run)?;
        }
        write_report(run, options, &mut out)?;
    } else if options.lh2 {
        engine.compare_lambda_trees(run)?;
    } else {
        if !options.just_save {
            engine.viterbi(run)?;
        }
        write_report(run, options, &mut out)?;
    }

    out.flush()?;
    info!("Report done: {}", path.display());
    Ok(path)
}

fn write_report<W: Write>(run: &AnalysisRun, options: &ReportOptions, out: W) -> Result<()> {
    info!("Building report: {}", options.name);
    let report = Report::new(run);
    if options.html {
        report.write_html(out)?;
    } else {
        report.write_text(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens() {
        let opts = ReportOptions::from_tokens(&["out", "HTML", "BranchCutting", "likelihood"]).unwrap();
        assert_eq!(opts.name, "out");
        assert!(opts.html && opts.branch_cutting && opts.likelihood);
        assert!(!opts.lh2 && !opts.just_save);
        assert_eq!(opts.output_path(), PathBuf::from("out.html"));
    }

    #[test]
    fn test_save_overrides_statistics() {
        let opts = ReportOptions::from_tokens(&["out", "lh2", "branchcutting", "SAVE", "likelihood"]).unwrap();
        assert!(opts.just_save);
        assert!(!opts.branch_cutting && !opts.likelihood && !opts.lh2);
        assert_eq!(opts.output_path(), PathBuf::from("out.cafe"));

        let opts = ReportOptions::from_tokens(&["out", "html", "save"]).unwrap();
        assert!(opts.html && opts.just_save);
    }

    #[test]
    fn test_unknown_flags_ignored() {
        let opts = ReportOptions::from_tokens(&["run1", "verbose"]).unwrap();
        assert_eq!(opts, ReportOptions { name: "run1".to_string(), ..Default::default() });
    }

    #[test]
    fn test_empty_tokens() {
        let empty: [&str; 0] = [];
        assert!(matches!(ReportOptions::from_tokens(&empty), Err(ReportError::InvalidInput(_))));
    }
}
