//! Power-ups: kinds, inventory, blast areas and the hint search.

use crate::grid::{Grid, Position};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    Hammer,
    Shuffle,
    Bomb,
    Hint,
}

impl PowerUpKind {
    pub const ALL: [Self; 4] = [Self::Hammer, Self::Shuffle, Self::Bomb, Self::Hint];

    /// Hammer and bomb wait for a target cell; shuffle and hint act at once.
    pub fn needs_target(self) -> bool {
        matches!(self, Self::Hammer | Self::Bomb)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Hammer => "hammer",
            Self::Shuffle => "shuffle",
            Self::Bomb => "bomb",
            Self::Hint => "hint",
        }
    }
}

impl fmt::Display for PowerUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Power-up counts. Counts only go below their current value through `take`,
/// which refuses at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Inventory {
    hammer: u32,
    shuffle: u32,
    bomb: u32,
    hint: u32,
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            hammer: 3,
            shuffle: 3,
            bomb: 2,
            hint: 5,
        }
    }
}

impl Inventory {
    pub fn empty() -> Self {
        Self {
            hammer: 0,
            shuffle: 0,
            bomb: 0,
            hint: 0,
        }
    }

    fn slot(&mut self, kind: PowerUpKind) -> &mut u32 {
        match kind {
            PowerUpKind::Hammer => &mut self.hammer,
            PowerUpKind::Shuffle => &mut self.shuffle,
            PowerUpKind::Bomb => &mut self.bomb,
            PowerUpKind::Hint => &mut self.hint,
        }
    }

    pub fn count(&self, kind: PowerUpKind) -> u32 {
        match kind {
            PowerUpKind::Hammer => self.hammer,
            PowerUpKind::Shuffle => self.shuffle,
            PowerUpKind::Bomb => self.bomb,
            PowerUpKind::Hint => self.hint,
        }
    }

    pub fn add(&mut self, kind: PowerUpKind, n: u32) {
        let slot = self.slot(kind);
        *slot = slot.saturating_add(n);
    }

    /// Use one. Returns false (and changes nothing) when none are left.
    pub fn take(&mut self, kind: PowerUpKind) -> bool {
        let slot = self.slot(kind);
        match slot.checked_sub(1) {
            Some(left) => {
                *slot = left;
                true
            }
            None => false,
        }
    }
}

/// Cells a targeted power-up removes when fired at `target`.
pub fn blast_area(kind: PowerUpKind, target: Position) -> Vec<Position> {
    if !target.in_bounds() {
        return Vec::new();
    }
    match kind {
        PowerUpKind::Hammer => vec![target],
        PowerUpKind::Bomb => target.neighborhood(1).collect(),
        PowerUpKind::Shuffle | PowerUpKind::Hint => Vec::new(),
    }
}

/// First swap that would produce a match, scanning row-major and trying the right
/// neighbour before the one below.
pub fn find_hint(grid: &Grid) -> Option<(Position, Position)> {
    let mut trial = *grid;
    for pos in Grid::positions() {
        for other in [pos.right(), pos.down()].into_iter().flatten() {
            trial.swap(pos, other);
            let hit = !trial.find_matches().is_empty();
            trial.swap(pos, other);
            if hit {
                return Some((pos, other));
            }
        }
    }
    None
}
