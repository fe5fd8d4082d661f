use super::mdp::{Action, Mdp, State};
use crate::error::{LakeError, Result};
use crate::policies::Policy;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub trait Weighted<S> {
    fn s(&self) -> S;

    fn p(&self) -> f64;
}

pub fn pick_next<T, S>(rng: &mut StdRng, ts: &[T]) -> Result<S>
where
    T: Weighted<S>,
{
    let dist = WeightedIndex::new(ts.iter().map(|item| item.p()))?;
    Ok(ts[dist.sample(rng)].s())
}

/// Why an episode ended. `StepLimit` also covers a terminal entered with zero reward,
/// which the standard lake rewards never produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalKind {
    Goal,
    Hole,
    #[serde(rename = "none")]
    StepLimit,
}

impl TerminalKind {
    pub fn from_entry_reward(r: f64) -> Self {
        if r > 0. {
            TerminalKind::Goal
        } else if r < 0. {
            TerminalKind::Hole
        } else {
            TerminalKind::StepLimit
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub utility: f64,
    pub length: usize,
    pub terminal: TerminalKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeEvent {
    pub s: State,
    pub a: Action,
    pub r: f64,
}

/// Runs single trials of a policy against an MDP.
///
/// A trial seeded with `seed` builds its policy on `StdRng::seed_from_u64(seed)` and samples
/// the environment with `StdRng::seed_from_u64(seed + 1)`, so swapping the policy never
/// shifts the environment's draws.
pub struct EpisodeSimulator<'m, M> {
    mdp: &'m M,
    gamma: f64,
    step_limit: usize,
}

impl<'m, M: Mdp> EpisodeSimulator<'m, M> {
    pub fn new(mdp: &'m M, gamma: f64, step_limit: usize) -> Self {
        Self {
            mdp,
            gamma,
            step_limit,
        }
    }

    pub fn run_trial<P, F>(&self, make_policy: F, seed: u64) -> Result<TrialResult>
    where
        F: FnOnce(&'m M, StdRng) -> P,
        P: Policy,
    {
        self.run(make_policy, seed, None)
    }

    /// Same as [`Self::run_trial`], also returning every (state, action, reward) taken.
    pub fn trace<P, F>(
        &self,
        make_policy: F,
        seed: u64,
    ) -> Result<(TrialResult, Vec<EpisodeEvent>)>
    where
        F: FnOnce(&'m M, StdRng) -> P,
        P: Policy,
    {
        let mut ep = vec![];
        let ret = self.run(make_policy, seed, Some(&mut ep))?;
        Ok((ret, ep))
    }

    fn run<P, F>(
        &self,
        make_policy: F,
        seed: u64,
        mut ep: Option<&mut Vec<EpisodeEvent>>,
    ) -> Result<TrialResult>
    where
        F: FnOnce(&'m M, StdRng) -> P,
        P: Policy,
    {
        let mut policy = make_policy(self.mdp, StdRng::seed_from_u64(seed));
        let rng = &mut StdRng::seed_from_u64(seed.wrapping_add(1));

        let mut s = self.mdp.start_state();
        let mut utility = 0.;
        let mut df = 1.;
        let mut length = 0;
        let mut terminal = TerminalKind::StepLimit;

        while length < self.step_limit {
            let a = policy.decide(&s)?;
            if !self.mdp.legal_actions(&s)?.contains(&a) {
                return Err(LakeError::IllegalAction { state: s, action: a });
            }

            let (next, r) = self.mdp.step(&s, a, rng)?;
            utility += df * r;
            length += 1;
            if let Some(ep) = ep.as_mut() {
                ep.push(EpisodeEvent { s, a, r });
            }

            if self.mdp.is_terminal(&next)? {
                terminal = TerminalKind::from_entry_reward(r);
                break;
            }

            s = next;
            df *= self.gamma;
        }

        debug!(seed, length, ?terminal, utility, "trial finished");
        Ok(TrialResult {
            utility,
            length,
            terminal,
        })
    }
}
