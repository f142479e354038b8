//! Analysis-run context and the statistical collaborators reports depend on.
//!
//! The birth-death likelihood, Viterbi reconstruction, branch cutting and
//! likelihood-ratio tests are not computed here. They are reached through
//! [`AnalysisEngine`], which reads and fills the [`AnalysisRun`] it is given.

use crate::error::{ReportError, Result};
use crate::family::Family;
use crate::tree::{CafeTree, FamilySizeRange};
use crate::viterbi::ViterbiParameters;

/// Conditional family-size distributions, built lazily once per parameter set.
#[derive(Debug, Clone, Default)]
pub struct ConditionalCache {
    distributions: Vec<Vec<f64>>,
}

impl ConditionalCache {
    pub fn is_populated(&self) -> bool {
        !self.distributions.is_empty()
    }

    pub fn populate(&mut self, distributions: Vec<Vec<f64>>) {
        self.distributions = distributions;
    }

    pub fn clear(&mut self) {
        self.distributions.clear();
    }

    pub fn distributions(&self) -> &[Vec<f64>] {
        &self.distributions
    }
}

/// Everything one analysis run owns; outlives any single report.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub tree: CafeTree,
    pub lambdas: Vec<f64>,
    pub lambda_tree: Option<CafeTree>,
    pub family: Family,
    pub viterbi: ViterbiParameters,
    /// Likelihood ratio per node and family, when the test ran or was loaded.
    pub likelihood_ratios: Option<Vec<Vec<f64>>>,
    pub family_size: FamilySizeRange,
    pub cache: ConditionalCache,
}

impl AnalysisRun {
    pub fn new(tree: CafeTree, family: Family) -> Self {
        AnalysisRun {
            tree,
            lambdas: Vec::new(),
            lambda_tree: None,
            family,
            viterbi: ViterbiParameters::default(),
            likelihood_ratios: None,
            family_size: FamilySizeRange::default(),
            cache: ConditionalCache::default(),
        }
    }

    /// Replace the model rates; cached distributions no longer apply.
    pub fn set_lambdas(&mut self, lambdas: Vec<f64>) {
        self.lambdas = lambdas;
        self.cache.clear();
    }

    /// Rebind the family size range; cached distributions no longer apply.
    pub fn set_family_size(&mut self, range: FamilySizeRange) {
        self.family_size = range;
        self.cache.clear();
    }
}

/// The statistical routines a report can request.
pub trait AnalysisEngine {
    /// Compute the conditional distributions for the current parameters.
    fn build_conditional_cache(&mut self, run: &AnalysisRun) -> Result<Vec<Vec<f64>>>;

    /// Fill `run.viterbi` with reconstructed sizes, branch p-values and
    /// aggregate change statistics.
    fn viterbi(&mut self, run: &mut AnalysisRun) -> Result<()>;

    /// Fill `run.viterbi.cut_pvalues`.
    fn branch_cutting(&mut self, run: &mut AnalysisRun) -> Result<()>;

    /// Fill `run.likelihood_ratios`.
    fn likelihood_ratio_test(&mut self, run: &mut AnalysisRun) -> Result<()>;

    /// Compare two lambda trees; writes its own output.
    fn compare_lambda_trees(&mut self, run: &mut AnalysisRun) -> Result<()>;
}

/// Engine for runs restored from a saved report: it can only re-serialize.
#[derive(Debug, Clone, Copy, Default)]
pub struct SavedStateEngine;

impl SavedStateEngine {
    fn refuse<T>(what: &str) -> Result<T> {
        Err(ReportError::Unsupported(format!(
            "{what} is not available for a run restored from a saved report"
        )))
    }
}

impl AnalysisEngine for SavedStateEngine {
    fn build_conditional_cache(&mut self, _run: &AnalysisRun) -> Result<Vec<Vec<f64>>> {
        Self::refuse("conditional distribution cache")
    }

    fn viterbi(&mut self, _run: &mut AnalysisRun) -> Result<()> {
        Self::refuse("viterbi reconstruction")
    }

    fn branch_cutting(&mut self, _run: &mut AnalysisRun) -> Result<()> {
        Self::refuse("branch cutting")
    }

    fn likelihood_ratio_test(&mut self, _run: &mut AnalysisRun) -> Result<()> {
        Self::refuse("likelihood ratio test")
    }

    fn compare_lambda_trees(&mut self, _run: &mut AnalysisRun) -> Result<()> {
        Self::refuse("lambda tree comparison")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run() -> AnalysisRun {
        let tree = CafeTree::from_newick("((A:1,B:1):2,C:3)").unwrap();
        let family = Family::from_tree_leaves(&tree);
        AnalysisRun::new(tree, family)
    }

    #[test]
    fn test_parameter_changes_invalidate_cache() {
        let mut run = run();
        run.cache.populate(vec![vec![0.5, 0.5]]);
        assert!(run.cache.is_populated());
        run.set_lambdas(vec![0.01]);
        assert!(!run.cache.is_populated());

        run.cache.populate(vec![vec![1.0]]);
        run.set_family_size(FamilySizeRange::from_max_observed(10));
        assert!(!run.cache.is_populated());
    }

    #[test]
    fn test_saved_state_engine_refuses() {
        let mut run = run();
        let mut engine = SavedStateEngine;
        assert!(matches!(engine.viterbi(&mut run), Err(ReportError::Unsupported(_))));
        assert!(matches!(engine.build_conditional_cache(&run), Err(ReportError::Unsupported(_))));
    }
}
