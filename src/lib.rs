extern crate rand;
extern crate serde;
extern crate serde_json;

pub mod analyzer;
pub mod envs;
pub mod error;
pub mod mdps;
pub mod policies;
pub mod report;

pub use analyzer::{AnalyzerConfig, EvaluationSummary, UtilityAnalyzer};
pub use envs::frozen_lake::{Cell, LakeMdp, DEFAULT_MAP};
pub use error::{LakeError, Result};
pub use mdps::mdp::{Action, Mdp, Outcome, Position, State};
pub use mdps::mdp_simulator::{EpisodeEvent, EpisodeSimulator, TerminalKind, TrialResult};
pub use policies::{CustomPolicy, Policy, RandomPolicy};
pub use report::{compare, GammaComparison, Report, Winner, DEFAULT_GAMMAS};
