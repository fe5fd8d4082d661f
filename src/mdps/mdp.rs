use super::mdp_simulator::{pick_next, Weighted};
use crate::error::Result;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Neighbour one step towards `dir`, `None` when it would cross row/col 0.
    /// The upper bounds are checked by the world.
    pub fn offset(&self, dir: Action) -> Option<Position> {
        let (dr, dc) = dir.delta();
        Some(Position {
            row: self.row.checked_add_signed(dr)?,
            col: self.col.checked_add_signed(dc)?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    Position(Position),

    /// Sink entered one step after a terminal cell. Never a grid position.
    Absorbing,
}

impl State {
    pub fn at(row: usize, col: usize) -> Self {
        State::Position(Position::new(row, col))
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            State::Position(p) => Some(*p),
            State::Absorbing => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Up,
    Right,
    Down,
    Left,

    /// The single no-op action of terminal and absorbing states.
    Absorb,
}

impl Action {
    pub const DIRECTIONS: [Action; 4] = [Action::Up, Action::Right, Action::Down, Action::Left];

    /// Unit (row, col) offset. `Absorb` does not move.
    pub fn delta(&self) -> (isize, isize) {
        match self {
            Action::Up => (-1, 0),
            Action::Right => (0, 1),
            Action::Down => (1, 0),
            Action::Left => (0, -1),
            Action::Absorb => (0, 0),
        }
    }

    /// The two directions at 90° an intended move can slip into.
    pub fn laterals(&self) -> [Action; 2] {
        match self {
            Action::Up => [Action::Left, Action::Right],
            Action::Down => [Action::Right, Action::Left],
            Action::Left => [Action::Down, Action::Up],
            Action::Right => [Action::Up, Action::Down],
            Action::Absorb => [Action::Absorb, Action::Absorb],
        }
    }
}

/// One entry of a transition distribution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub next_state: State,
    pub probability: f64,
    pub reward: f64,
}

impl Weighted<(State, f64)> for Outcome {
    fn s(&self) -> (State, f64) {
        (self.next_state, self.reward)
    }

    fn p(&self) -> f64 {
        self.probability
    }
}

/// Markov Decision Process - Sutton & Barto 2018.
pub trait Mdp {
    fn start_state(&self) -> State;

    fn legal_actions(&self, s: &State) -> Result<Vec<Action>>;

    /// Reward for moving into `s`.
    fn entry_reward(&self, s: &State) -> Result<f64>;

    fn transition(&self, s: &State, a: Action) -> Result<Vec<Outcome>>;

    fn is_absorbed(&self, s: &State) -> bool {
        matches!(s, State::Absorbing)
    }

    /// True when the only legal action left is `Absorb`.
    fn is_terminal(&self, s: &State) -> Result<bool> {
        Ok(self.legal_actions(s)? == [Action::Absorb])
    }

    fn step(&self, s: &State, a: Action, rng: &mut StdRng) -> Result<(State, f64)> {
        let outcomes = self.transition(s, a)?;
        pick_next(rng, &outcomes)
    }
}
