use crate::mdps::mdp::{Action, State};
use rand::distributions::WeightedError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LakeError>;

#[derive(Error, Debug)]
pub enum LakeError {
    #[error("Grid has no cells.")]
    EmptyGrid,

    #[error("Jagged grid: row {row} has {found} cells, expected {expected}.")]
    JaggedGrid {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Grid must have exactly one start cell 'S', found {0}.")]
    StartCount(usize),

    #[error("Grid must have at least one goal cell 'G'.")]
    NoGoal,

    #[error("Unrecognized cell symbol '{symbol}' at ({row}, {col}).")]
    UnknownCell { symbol: char, row: usize, col: usize },

    /// Discount factor outside `[0, 1]`.
    #[error("Discount factor must be within [0, 1], got {0}.")]
    InvalidDiscount(f64),

    #[error("Invalid analyzer configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The action is not in the legal action set of the state.
    #[error("Action {action:?} is not legal in state {state:?}.")]
    IllegalAction { state: State, action: Action },

    #[error("Position ({row}, {col}) is outside the grid.")]
    OutOfBounds { row: usize, col: usize },

    #[error("No legal action in state {0:?}.")]
    NoLegalAction(State),

    #[error("Cannot sample from transition distribution: {0}")]
    Sampling(#[from] WeightedError),
}
