//! What the engine reports back: ordered resolution steps and terminal level events.

use crate::grid::{FruitKind, Grid, Position};
use crate::player::Achievement;
use crate::powerup::PowerUpKind;

/// One step of a resolution, in the order it happened. Renderers replay these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionStep {
    /// A cascade pass matched and cleared these cells.
    Cleared {
        positions: Vec<Position>,
        score_delta: u32,
        combo: u32,
    },
    /// A power-up removed these cells (no score).
    Removed {
        positions: Vec<Position>,
        power_up: PowerUpKind,
    },
    /// Cascade cap reached: these still-matching cells were removed without score.
    Stabilized { positions: Vec<Position> },
    /// Shuffle re-rolled every cell.
    Shuffled { grid: Grid },
    /// Gravity settled and new fruit landed; `grid` is the board afterwards.
    Refilled {
        fills: Vec<(Position, FruitKind)>,
        grid: Grid,
    },
}

/// A level-ending event. Emitted at most once per level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelEvent {
    LevelComplete {
        level: u32,
        score: u32,
        stars: u8,
        coins: u32,
    },
    GameOver {
        level: u32,
        score: u32,
        target: u32,
    },
}

/// Full account of one committed swap or power-up.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolution {
    pub steps: Vec<ResolutionStep>,
    pub score_delta: u32,
    pub final_score: u32,
    /// Cascade passes that matched.
    pub combo: u32,
    pub terminal: Option<LevelEvent>,
    pub unlocked: Vec<Achievement>,
}

impl Resolution {
    pub fn cleared_passes(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, ResolutionStep::Cleared { .. }))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Valid swap that made no match; reverted, no move spent.
    Rejected,
    Resolved(Resolution),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerUpOutcome {
    /// Waiting for a target cell.
    Armed(PowerUpKind),
    Hint(Position, Position),
    NoMovesAvailable,
    Resolved(Resolution),
}
