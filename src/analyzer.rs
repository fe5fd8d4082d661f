use crate::error::{LakeError, Result};
use crate::mdps::mdp::Mdp;
use crate::mdps::mdp_simulator::{EpisodeSimulator, TerminalKind, TrialResult};
use crate::policies::Policy;
use itertools::Itertools;
use rand::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Discount factor, within `[0, 1]`.
    pub gamma: f64,

    /// Trials that have not absorbed after this many steps end as `StepLimit`.
    pub step_limit: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            step_limit: 100,
        }
    }
}

impl AnalyzerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config = serde_json::from_str::<Self>(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_gamma(self, gamma: f64) -> Self {
        Self { gamma, ..self }
    }

    pub fn validate(&self) -> Result<()> {
        if (0.0..=1.0).contains(&self.gamma) {
            Ok(())
        } else {
            Err(LakeError::InvalidDiscount(self.gamma))
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub n_trials: usize,
    pub mean_utility: f64,
    /// Population variance.
    pub utility_variance: f64,
    pub p_goal: f64,
    pub p_hole: f64,
    pub p_none: f64,
    pub mean_length: f64,
}

impl EvaluationSummary {
    /// All zeros for an empty batch.
    pub fn from_trials(trials: &[TrialResult]) -> Self {
        if trials.is_empty() {
            return Self::default();
        }

        let n = trials.len() as f64;
        let mean_utility = trials.iter().map(|t| t.utility).sum::<f64>() / n;
        let utility_variance = trials
            .iter()
            .map(|t| (t.utility - mean_utility).powi(2))
            .sum::<f64>()
            / n;
        let mean_length = trials.iter().map(|t| t.length as f64).sum::<f64>() / n;

        let counts = trials.iter().map(|t| t.terminal).counts();
        let p = |k: TerminalKind| counts.get(&k).copied().unwrap_or_default() as f64 / n;

        Self {
            n_trials: trials.len(),
            mean_utility,
            utility_variance,
            p_goal: p(TerminalKind::Goal),
            p_hole: p(TerminalKind::Hole),
            p_none: p(TerminalKind::StepLimit),
            mean_length,
        }
    }
}

/// Monte-Carlo estimate of a policy's discounted utility.
///
/// Trial `i` of a batch is seeded with `base_seed + i`; the outcome of a trial depends on
/// its seed alone, so batches are reproducible bit for bit and may run in any order.
pub struct UtilityAnalyzer<'m, M> {
    mdp: &'m M,
    config: AnalyzerConfig,
}

impl<'m, M: Mdp> UtilityAnalyzer<'m, M> {
    pub fn new(mdp: &'m M, config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { mdp, config })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn simulator(&self) -> EpisodeSimulator<'m, M> {
        EpisodeSimulator::new(self.mdp, self.config.gamma, self.config.step_limit)
    }

    pub fn run_trial<P, F>(&self, make_policy: F, seed: u64) -> Result<TrialResult>
    where
        F: FnOnce(&'m M, StdRng) -> P,
        P: Policy,
    {
        self.simulator().run_trial(make_policy, seed)
    }

    pub fn evaluate<P, F>(
        &self,
        make_policy: F,
        n_trials: usize,
        base_seed: u64,
    ) -> Result<EvaluationSummary>
    where
        F: Fn(&'m M, StdRng) -> P,
        P: Policy,
    {
        let sim = self.simulator();
        let trials = (0..n_trials)
            .map(|i| sim.run_trial(&make_policy, trial_seed(base_seed, i)))
            .collect::<Result<Vec<_>>>()?;

        Ok(self.summarize(&trials, base_seed))
    }

    /// [`Self::evaluate`] on the rayon pool. Returns the same summary.
    pub fn evaluate_par<P, F>(
        &self,
        make_policy: F,
        n_trials: usize,
        base_seed: u64,
    ) -> Result<EvaluationSummary>
    where
        M: Sync,
        F: Fn(&'m M, StdRng) -> P + Sync,
        P: Policy,
    {
        let sim = self.simulator();
        let trials = (0..n_trials)
            .into_par_iter()
            .map(|i| sim.run_trial(&make_policy, trial_seed(base_seed, i)))
            .collect::<Result<Vec<_>>>()?;

        Ok(self.summarize(&trials, base_seed))
    }

    fn summarize(&self, trials: &[TrialResult], base_seed: u64) -> EvaluationSummary {
        let summary = EvaluationSummary::from_trials(trials);
        info!(
            base_seed,
            gamma = self.config.gamma,
            n_trials = summary.n_trials,
            mean_utility = summary.mean_utility,
            p_goal = summary.p_goal,
            p_hole = summary.p_hole,
            "evaluation finished"
        );
        summary
    }
}

fn trial_seed(base_seed: u64, i: usize) -> u64 {
    base_seed.wrapping_add(i as u64)
}
