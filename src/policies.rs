use crate::envs::frozen_lake::{Cell, LakeMdp};
use crate::error::{LakeError, Result};
use crate::mdps::mdp::{Action, Mdp, State};
use rand::prelude::*;

/// Decision strategy. A fresh instance is built for every trial from the world and the
/// trial's policy stream.
pub trait Policy {
    fn decide(&mut self, s: &State) -> Result<Action>;
}

/// Uniform over legal actions.
pub struct RandomPolicy<'m, M> {
    mdp: &'m M,
    rng: StdRng,
}

impl<'m, M: Mdp> RandomPolicy<'m, M> {
    pub fn new(mdp: &'m M, rng: StdRng) -> Self {
        Self { mdp, rng }
    }
}

impl<M: Mdp> Policy for RandomPolicy<'_, M> {
    fn decide(&mut self, s: &State) -> Result<Action> {
        self.mdp
            .legal_actions(s)?
            .choose(&mut self.rng)
            .copied()
            .ok_or(LakeError::NoLegalAction(*s))
    }
}

/// Heads for the bottom right without stepping into a hole on purpose:
/// Down unless the cell below is a hole, else Right unless the cell to the right is a hole,
/// else the first legal action. Only intended cells are looked at, slips are ignored.
pub struct CustomPolicy<'m> {
    mdp: &'m LakeMdp,
}

impl<'m> CustomPolicy<'m> {
    /// The stream is accepted for a uniform constructor and left unused.
    pub fn new(mdp: &'m LakeMdp, _rng: StdRng) -> Self {
        Self { mdp }
    }

    fn safe(&self, s: &State, dir: Action) -> bool {
        s.position()
            .and_then(|p| p.offset(dir))
            .and_then(|t| self.mdp.cell(t))
            .is_some_and(|c| c != Cell::Hole)
    }
}

impl Policy for CustomPolicy<'_> {
    fn decide(&mut self, s: &State) -> Result<Action> {
        let legal = self.mdp.legal_actions(s)?;

        [Action::Down, Action::Right]
            .into_iter()
            .find(|a| legal.contains(a) && self.safe(s, *a))
            .or_else(|| legal.first().copied())
            .ok_or(LakeError::NoLegalAction(*s))
    }
}
