use crate::error::{LakeError, Result};
use crate::mdps::mdp::{Action, Mdp, Outcome, Position, State};
use itertools::iproduct;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::once;
use tracing::warn;

pub const LIVING_REWARD: f64 = 0.1;
pub const HOLE_REWARD: f64 = -1.0;
pub const GOAL_REWARD: f64 = 1.0;

/// Probability that the intended direction is taken.
pub const INTENDED_P: f64 = 0.8;
/// Probability of each of the two lateral slips.
pub const SLIP_P: f64 = 0.1;

const TOLERANCE: f64 = 1e-9;

pub const DEFAULT_MAP: [&str; 4] = ["SFFF", "FHFH", "FFFH", "HFFG"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Start,
    Frozen,
    Hole,
    Goal,
}

impl Cell {
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            'S' => Some(Cell::Start),
            'F' => Some(Cell::Frozen),
            'H' => Some(Cell::Hole),
            'G' => Some(Cell::Goal),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Cell::Start => 'S',
            Cell::Frozen => 'F',
            Cell::Hole => 'H',
            Cell::Goal => 'G',
        }
    }

    pub fn entry_reward(&self) -> f64 {
        match self {
            Cell::Start | Cell::Frozen => LIVING_REWARD,
            Cell::Hole => HOLE_REWARD,
            Cell::Goal => GOAL_REWARD,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Cell::Hole | Cell::Goal)
    }
}

/// The slippery lake.
///
/// Rewards are paid on entering a cell. One step after entering a hole or the goal the
/// agent moves to [`State::Absorbing`], which only allows [`Action::Absorb`] and pays
/// nothing forever after.
#[derive(Clone, Debug)]
pub struct LakeMdp {
    cells: Vec<Vec<Cell>>,
    rows: usize,
    cols: usize,
    start: Position,
}

impl LakeMdp {
    pub fn new<I, R>(grid: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = char>,
    {
        let grid = grid
            .into_iter()
            .map(|r| r.into_iter().collect::<Vec<_>>())
            .collect::<Vec<_>>();

        let cols = grid.first().map_or(0, Vec::len);
        if cols == 0 {
            return Err(LakeError::EmptyGrid);
        }
        if let Some((row, r)) = grid.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(LakeError::JaggedGrid {
                row,
                expected: cols,
                found: r.len(),
            });
        }

        let count = |sym: char| grid.iter().flatten().filter(|&&c| c == sym).count();
        let starts = count('S');
        if starts != 1 {
            return Err(LakeError::StartCount(starts));
        }
        if count('G') == 0 {
            return Err(LakeError::NoGoal);
        }

        let cells = grid
            .iter()
            .enumerate()
            .map(|(row, r)| {
                r.iter()
                    .enumerate()
                    .map(|(col, &symbol)| {
                        Cell::from_symbol(symbol)
                            .ok_or(LakeError::UnknownCell { symbol, row, col })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let rows = cells.len();
        let start = iproduct!(0..rows, 0..cols)
            .map(|(row, col)| Position::new(row, col))
            .find(|p| cells[p.row][p.col] == Cell::Start)
            .ok_or(LakeError::StartCount(0))?;

        Ok(Self {
            cells,
            rows,
            cols,
            start,
        })
    }

    /// The standard 4x4 map.
    pub fn default_map() -> Result<Self> {
        Self::new(DEFAULT_MAP.map(str::chars))
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn cell(&self, p: Position) -> Option<Cell> {
        self.cells.get(p.row)?.get(p.col).copied()
    }

    /// Row-major iterator over every grid position.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        iproduct!(0..self.rows, 0..self.cols).map(|(row, col)| Position::new(row, col))
    }

    fn checked_cell(&self, p: Position) -> Result<Cell> {
        self.cell(p).ok_or(LakeError::OutOfBounds {
            row: p.row,
            col: p.col,
        })
    }

    /// Where a move in `dir` lands; leaving the grid bumps back to `p`.
    fn target(&self, p: Position, dir: Action) -> Position {
        p.offset(dir)
            .filter(|t| t.row < self.rows && t.col < self.cols)
            .unwrap_or(p)
    }

    fn absorb() -> Vec<Outcome> {
        vec![Outcome {
            next_state: State::Absorbing,
            probability: 1.,
            reward: 0.,
        }]
    }

    fn slip(&self, p: Position, a: Action) -> Result<Vec<Outcome>> {
        let candidates = once((a, INTENDED_P)).chain(a.laterals().map(|l| (l, SLIP_P)));

        let mut outcomes: Vec<Outcome> = Vec::with_capacity(3);
        for (dir, probability) in candidates {
            let next_state = State::Position(self.target(p, dir));
            match outcomes.iter_mut().find(|o| o.next_state == next_state) {
                Some(o) => o.probability += probability,
                None => outcomes.push(Outcome {
                    next_state,
                    probability,
                    reward: self.entry_reward(&next_state)?,
                }),
            }
        }

        let s = State::Position(p);
        let stay = Outcome {
            next_state: s,
            probability: 1.,
            reward: self.entry_reward(&s)?,
        };
        Ok(settle(outcomes, stay))
    }
}

/// Keeps `outcomes` if their mass adds up to one, otherwise collapses to `fallback`.
fn settle(outcomes: Vec<Outcome>, fallback: Outcome) -> Vec<Outcome> {
    let total = outcomes.iter().map(|o| o.probability).sum::<f64>();
    if (total - 1.).abs() > TOLERANCE {
        warn!(total, state = ?fallback.next_state, "degenerate distribution, using self-loop");
        return vec![fallback];
    }

    outcomes
}

impl Mdp for LakeMdp {
    fn start_state(&self) -> State {
        State::Position(self.start)
    }

    fn legal_actions(&self, s: &State) -> Result<Vec<Action>> {
        match s {
            State::Absorbing => Ok(vec![Action::Absorb]),
            State::Position(p) => {
                if self.checked_cell(*p)?.is_terminal() {
                    Ok(vec![Action::Absorb])
                } else {
                    Ok(Action::DIRECTIONS.to_vec())
                }
            }
        }
    }

    fn entry_reward(&self, s: &State) -> Result<f64> {
        match s {
            State::Absorbing => Ok(0.),
            State::Position(p) => Ok(self.checked_cell(*p)?.entry_reward()),
        }
    }

    fn transition(&self, s: &State, a: Action) -> Result<Vec<Outcome>> {
        let p = match s {
            State::Absorbing => return Ok(Self::absorb()),
            State::Position(p) => *p,
        };

        if self.checked_cell(p)?.is_terminal() {
            return Ok(Self::absorb());
        }
        if a == Action::Absorb {
            return Err(LakeError::IllegalAction {
                state: *s,
                action: a,
            });
        }

        self.slip(p, a)
    }
}

impl fmt::Display for LakeMdp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in &self.cells {
            let line = r.iter().map(Cell::symbol).collect::<String>();
            writeln!(f, "{line}")?;
        }

        Ok(())
    }
}
