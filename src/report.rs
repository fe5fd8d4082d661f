use crate::analyzer::{AnalyzerConfig, EvaluationSummary, UtilityAnalyzer};
use crate::envs::frozen_lake::LakeMdp;
use crate::error::Result;
use crate::policies::{CustomPolicy, RandomPolicy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::info;

pub const DEFAULT_GAMMAS: [f64; 3] = [0.5, 0.9, 1.0];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Random,
    Custom,
    Tie,
}

impl Winner {
    /// Higher mean utility wins.
    pub fn pick(random: &EvaluationSummary, custom: &EvaluationSummary) -> Self {
        match random.mean_utility.partial_cmp(&custom.mean_utility) {
            Some(Ordering::Greater) => Winner::Random,
            Some(Ordering::Less) => Winner::Custom,
            _ => Winner::Tie,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GammaComparison {
    pub random: EvaluationSummary,
    pub custom: EvaluationSummary,
    pub winner: Winner,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub n_trials: usize,
    pub base_seed: u64,
    /// Keyed by the discount factor written as a decimal, e.g. `"1.0"`.
    pub gammas: BTreeMap<String, GammaComparison>,
}

/// Evaluates [`RandomPolicy`] and [`CustomPolicy`] on `mdp` once per discount factor.
/// Everything but the discount factor comes from `config`.
pub fn compare(
    mdp: &LakeMdp,
    config: AnalyzerConfig,
    gammas: &[f64],
    n_trials: usize,
    base_seed: u64,
) -> Result<Report> {
    let mut report = Report {
        n_trials,
        base_seed,
        gammas: BTreeMap::new(),
    };

    for &gamma in gammas {
        let analyzer = UtilityAnalyzer::new(mdp, config.with_gamma(gamma))?;
        let random = analyzer.evaluate_par(RandomPolicy::new, n_trials, base_seed)?;
        let custom = analyzer.evaluate_par(CustomPolicy::new, n_trials, base_seed)?;
        let winner = Winner::pick(&random, &custom);
        info!(gamma, ?winner, "compared policies");

        report.gammas.insert(
            format!("{gamma:?}"),
            GammaComparison {
                random,
                custom,
                winner,
            },
        );
    }

    Ok(report)
}
