//! Grid: fruit kinds, positions, match detection, gravity and refill.

use crate::fruits::FruitSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const ROWS: usize = 8;
pub const COLS: usize = 8;

/// Shortest run (row or column) that counts as a match.
pub const MIN_RUN: usize = 3;

/// Re-roll rounds `Grid::deal` tries before falling back to `stabilize`.
const DEAL_REROLL_LIMIT: u32 = 100;

/// Draws `safe_kind` takes from the source before picking the first allowed kind.
const SAFE_DRAW_ATTEMPTS: u32 = 16;

/// Fruit kinds (tile types).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FruitKind {
    Apple,
    Orange,
    Grape,
    Strawberry,
    Kiwi,
    Lemon,
    Peach,
    Cherry,
}

impl FruitKind {
    pub const ALL: [Self; 8] = [
        Self::Apple,
        Self::Orange,
        Self::Grape,
        Self::Strawberry,
        Self::Kiwi,
        Self::Lemon,
        Self::Peach,
        Self::Cherry,
    ];

    /// Index 0..8, also the theme colour slot.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    /// Letter used by the text notation: `A` (apple) .. `H` (cherry).
    pub fn letter(self) -> char {
        char::from(b'A' + self as u8)
    }

    pub fn from_letter(c: char) -> Option<Self> {
        let offset = u32::from(c.to_ascii_uppercase()).checked_sub(u32::from('A'))?;
        Self::ALL.get(offset as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Apple => "apple",
            Self::Orange => "orange",
            Self::Grape => "grape",
            Self::Strawberry => "strawberry",
            Self::Kiwi => "kiwi",
            Self::Lemon => "lemon",
            Self::Peach => "peach",
            Self::Cherry => "cherry",
        }
    }
}

/// Cell coordinate; row 0 is the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    #[inline]
    pub fn in_bounds(self) -> bool {
        self.row < ROWS && self.col < COLS
    }

    /// True if `other` is one step away horizontally or vertically (never diagonally).
    pub fn is_adjacent(self, other: Self) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }

    pub fn right(self) -> Option<Self> {
        (self.col + 1 < COLS).then(|| Self::new(self.row, self.col + 1))
    }

    pub fn down(self) -> Option<Self> {
        (self.row + 1 < ROWS).then(|| Self::new(self.row + 1, self.col))
    }

    /// Square of side `2 * radius + 1` centred here, clipped to the grid, row-major.
    pub fn neighborhood(self, radius: usize) -> impl Iterator<Item = Self> {
        let rows = self.row.saturating_sub(radius)..=(self.row + radius).min(ROWS - 1);
        let cols = self.col.saturating_sub(radius)..=(self.col + radius).min(COLS - 1);
        rows.flat_map(move |row| cols.clone().map(move |col| Self::new(row, col)))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Single cell: a fruit, or empty while a cascade is being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Fruit(FruitKind),
}

impl Cell {
    #[inline]
    pub fn fruit(self) -> Option<FruitKind> {
        match self {
            Self::Fruit(kind) => Some(kind),
            Self::Empty => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridParseError {
    #[error("expected {ROWS} rows, found {0}")]
    RowCount(usize),
    #[error("row {row}: expected {COLS} cells, found {len}")]
    RowLength { row: usize, len: usize },
    #[error("row {row}, col {col}: unknown cell {ch:?}")]
    BadCell { row: usize, col: usize, ch: char },
}

/// The 8×8 board. rows[row][col]; row 0 is the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Grid {
    rows: [[Cell; COLS]; ROWS],
}

impl Grid {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every cell rolled from `source`, matches allowed.
    pub fn filled<F: FruitSource + ?Sized>(source: &mut F) -> Self {
        let mut grid = Self::empty();
        grid.fill_empty(source);
        grid
    }

    /// Fresh level grid: rolled, then matches cleared and re-rolled (no gravity, no score)
    /// until nothing lines up.
    pub fn deal<F: FruitSource + ?Sized>(source: &mut F) -> Self {
        let mut grid = Self::filled(source);
        for _ in 0..DEAL_REROLL_LIMIT {
            let matches = grid.find_matches();
            if matches.is_empty() {
                return grid;
            }
            grid.clear(&matches);
            grid.fill_empty(source);
        }
        log::debug!("deal still matching after {DEAL_REROLL_LIMIT} re-rolls, stabilizing");
        grid.stabilize(source);
        grid
    }

    /// All positions, row-major.
    pub fn positions() -> impl Iterator<Item = Position> {
        (0..ROWS).flat_map(|row| (0..COLS).map(move |col| Position::new(row, col)))
    }

    #[inline]
    pub fn get(&self, pos: Position) -> Option<Cell> {
        self.rows.get(pos.row).and_then(|row| row.get(pos.col)).copied()
    }

    #[inline]
    pub fn kind(&self, pos: Position) -> Option<FruitKind> {
        self.get(pos).and_then(Cell::fruit)
    }

    #[inline]
    pub fn set(&mut self, pos: Position, cell: Cell) {
        if let Some(slot) = self.rows.get_mut(pos.row).and_then(|row| row.get_mut(pos.col)) {
            *slot = cell;
        }
    }

    pub fn swap(&mut self, a: Position, b: Position) {
        if let (Some(ca), Some(cb)) = (self.get(a), self.get(b)) {
            self.set(a, cb);
            self.set(b, ca);
        }
    }

    pub fn clear<'a>(&mut self, positions: impl IntoIterator<Item = &'a Position>) {
        for &pos in positions {
            self.set(pos, Cell::Empty);
        }
    }

    pub fn empty_count(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|c| **c == Cell::Empty)
            .count()
    }

    /// No empty cells and no matches: the only state a level rests in.
    pub fn is_stable(&self) -> bool {
        self.empty_count() == 0 && self.find_matches().is_empty()
    }

    /// Every cell in a horizontal or vertical run of `MIN_RUN`+ identical fruit.
    /// Crossing runs share cells; each cell appears once.
    pub fn find_matches(&self) -> BTreeSet<Position> {
        let mut out = BTreeSet::new();
        for row in 0..ROWS {
            collect_runs((0..COLS).map(|col| Position::new(row, col)), self, &mut out);
        }
        for col in 0..COLS {
            collect_runs((0..ROWS).map(|row| Position::new(row, col)), self, &mut out);
        }
        out
    }

    /// Length of the longest run through `pos` if it held `kind` (neighbours as they are now).
    fn run_through(&self, pos: Position, kind: FruitKind) -> usize {
        let same = |row: usize, col: usize| self.kind(Position::new(row, col)) == Some(kind);
        let left = (0..pos.col).rev().take_while(|&c| same(pos.row, c)).count();
        let right = (pos.col + 1..COLS).take_while(|&c| same(pos.row, c)).count();
        let up = (0..pos.row).rev().take_while(|&r| same(r, pos.col)).count();
        let down = (pos.row + 1..ROWS).take_while(|&r| same(r, pos.col)).count();
        (left + right + 1).max(up + down + 1)
    }

    /// Gravity: each column compacts its fruit to the bottom, keeping their order.
    pub fn apply_gravity(&mut self) {
        for col in 0..COLS {
            let mut write = ROWS;
            for row in (0..ROWS).rev() {
                let cell = self.rows[row][col];
                if cell != Cell::Empty {
                    write -= 1;
                    if write != row {
                        self.rows[write][col] = cell;
                        self.rows[row][col] = Cell::Empty;
                    }
                }
            }
        }
    }

    /// Fill empty cells from `source`, row-major. Returns what landed where.
    pub fn fill_empty<F: FruitSource + ?Sized>(
        &mut self,
        source: &mut F,
    ) -> Vec<(Position, FruitKind)> {
        let mut fills = Vec::new();
        for pos in Self::positions() {
            if self.get(pos) == Some(Cell::Empty) {
                let kind = source.next_fruit();
                self.set(pos, Cell::Fruit(kind));
                fills.push((pos, kind));
            }
        }
        fills
    }

    /// Clear current matches in place (no gravity) and refill with kinds that cannot
    /// complete a run. Always ends match-free.
    pub fn stabilize<F: FruitSource + ?Sized>(&mut self, source: &mut F) -> Vec<(Position, FruitKind)> {
        let matches = self.find_matches();
        self.clear(&matches);
        let mut fills = Vec::new();
        for pos in Self::positions() {
            if self.get(pos) == Some(Cell::Empty) {
                let kind = self.safe_kind(pos, source);
                self.set(pos, Cell::Fruit(kind));
                fills.push((pos, kind));
            }
        }
        fills
    }

    /// A kind for `pos` that does not complete a run. At most four kinds are ruled out
    /// (two per axis), so one of the eight always fits.
    fn safe_kind<F: FruitSource + ?Sized>(&self, pos: Position, source: &mut F) -> FruitKind {
        for _ in 0..SAFE_DRAW_ATTEMPTS {
            let kind = source.next_fruit();
            if self.run_through(pos, kind) < MIN_RUN {
                return kind;
            }
        }
        FruitKind::ALL
            .into_iter()
            .find(|&k| self.run_through(pos, k) < MIN_RUN)
            .unwrap_or(FruitKind::Apple)
    }
}

/// Push every run of `MIN_RUN`+ identical fruit along `line` into `out`.
fn collect_runs(line: impl Iterator<Item = Position>, grid: &Grid, out: &mut BTreeSet<Position>) {
    let mut run: Vec<Position> = Vec::with_capacity(COLS.max(ROWS));
    let mut run_kind = None;
    for pos in line {
        let kind = grid.kind(pos);
        if kind.is_some() && kind == run_kind {
            run.push(pos);
            continue;
        }
        if run.len() >= MIN_RUN {
            out.extend(run.iter().copied());
        }
        run.clear();
        run.push(pos);
        run_kind = kind;
    }
    if run_kind.is_some() && run.len() >= MIN_RUN {
        out.extend(run);
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for cell in row {
                let ch = cell.fruit().map_or('.', FruitKind::letter);
                write!(f, "{ch}")?;
            }
        }
        Ok(())
    }
}

/// Letter notation: eight lines of eight cells, `A`..`H` for fruit, `.` for empty.
/// Surrounding whitespace and blank lines are ignored.
impl FromStr for Grid {
    type Err = GridParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        if lines.len() != ROWS {
            return Err(GridParseError::RowCount(lines.len()));
        }
        let mut grid = Self::empty();
        for (row, line) in lines.iter().enumerate() {
            let len = line.chars().count();
            if len != COLS {
                return Err(GridParseError::RowLength { row, len });
            }
            for (col, ch) in line.chars().enumerate() {
                let cell = match ch {
                    '.' => Cell::Empty,
                    _ => Cell::Fruit(
                        FruitKind::from_letter(ch).ok_or(GridParseError::BadCell { row, col, ch })?,
                    ),
                };
                grid.set(Position::new(row, col), cell);
            }
        }
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fruits::{ScriptedFruits, SeededFruits};

    const NO_MOVES: &str = "
        ABCDEFGH
        DEFGHABC
        GHABCDEF
        BCDEFGHA
        EFGHABCD
        HABCDEFG
        CDEFGHAB
        FGHABCDE";

    fn grid(s: &str) -> Grid {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let g = grid(NO_MOVES);
        assert_eq!(g.kind(Position::new(0, 0)), Some(FruitKind::Apple));
        assert_eq!(g.kind(Position::new(7, 7)), Some(FruitKind::Kiwi));
        let shown = g.to_string();
        assert_eq!(shown.lines().next(), Some("ABCDEFGH"));
        assert_eq!(grid(&shown), g);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("ABC".parse::<Grid>(), Err(GridParseError::RowCount(1)));
        let short = NO_MOVES.replacen("ABCDEFGH", "ABCDEFG", 1);
        assert_eq!(
            short.parse::<Grid>(),
            Err(GridParseError::RowLength { row: 0, len: 7 })
        );
        let bad = NO_MOVES.replacen("ABCDEFGH", "ABCDEFGZ", 1);
        assert_eq!(
            bad.parse::<Grid>(),
            Err(GridParseError::BadCell { row: 0, col: 7, ch: 'Z' })
        );
    }

    #[test]
    fn test_no_matches_in_pattern() {
        assert!(grid(NO_MOVES).find_matches().is_empty());
        assert!(grid(NO_MOVES).is_stable());
    }

    #[test]
    fn test_horizontal_and_vertical_runs() {
        let g = grid(
            "AAAABCDE
             BCDEFGHA
             CDEFGHAB
             DEFGHABC
             EFGHABCD
             FGHABCDE
             GHABCDEF
             HABCDEFG",
        );
        let m = g.find_matches();
        assert_eq!(m.len(), 4);
        assert!((0..4).all(|c| m.contains(&Position::new(0, c))));

        let mut v = grid(NO_MOVES);
        for row in 2..5 {
            v.set(Position::new(row, 7), Cell::Fruit(FruitKind::Cherry));
        }
        let m = v.find_matches();
        assert_eq!(m.len(), 3);
        assert!(m.contains(&Position::new(3, 7)));
    }

    #[test]
    fn test_crossing_runs_count_shared_cell_once() {
        let g = grid(
            "BCADEFGH
             CDAFGHBC
             AAAHBCDE
             BCDEFGHA
             CDEFGHAB
             DEFGHABC
             EFGHABCD
             FGHABCDE",
        );
        // Column 2 rows 0..3 and row 2 cols 0..3 share (2, 2).
        let m = g.find_matches();
        assert_eq!(m.len(), 5);
        assert!(m.contains(&Position::new(2, 2)));
    }

    #[test]
    fn test_empty_cells_never_match() {
        let mut g = grid(NO_MOVES);
        for col in 0..COLS {
            g.set(Position::new(0, col), Cell::Empty);
        }
        assert!(g.find_matches().is_empty());
        assert_eq!(g.empty_count(), COLS);
        assert!(!g.is_stable());
    }

    #[test]
    fn test_gravity_keeps_column_order() {
        let mut g = grid(NO_MOVES);
        // Column 0 top to bottom: A D G B E H C F; knock out rows 2 and 5.
        g.set(Position::new(2, 0), Cell::Empty);
        g.set(Position::new(5, 0), Cell::Empty);
        g.apply_gravity();
        let col: String = (0..ROWS)
            .map(|r| g.kind(Position::new(r, 0)).map_or('.', FruitKind::letter))
            .collect();
        assert_eq!(col, "..ADBECF");
        // Other columns untouched.
        assert_eq!(g.kind(Position::new(0, 1)), Some(FruitKind::Orange));
    }

    #[test]
    fn test_fill_empty_is_row_major() {
        let mut g = grid(NO_MOVES);
        g.set(Position::new(1, 4), Cell::Empty);
        g.set(Position::new(0, 6), Cell::Empty);
        let mut source = ScriptedFruits::from_letters("BC").unwrap();
        let fills = g.fill_empty(&mut source);
        assert_eq!(
            fills,
            vec![
                (Position::new(0, 6), FruitKind::Orange),
                (Position::new(1, 4), FruitKind::Grape),
            ]
        );
        assert_eq!(g.empty_count(), 0);
    }

    #[test]
    fn test_stabilize_always_match_free() {
        // A source that only ever offers apples.
        let mut apples = ScriptedFruits::from_letters("A").unwrap();
        let mut g = Grid::filled(&mut apples);
        assert_eq!(g.find_matches().len(), ROWS * COLS);
        g.stabilize(&mut apples);
        assert!(g.is_stable());
    }

    #[test]
    fn test_deal_is_match_free_across_seeds() {
        for seed in 0..200 {
            let mut source = SeededFruits::new(Some(seed));
            let g = Grid::deal(&mut source);
            assert!(g.is_stable(), "seed {seed} dealt a match:\n{g}");
        }
    }

    #[test]
    fn test_adjacency_and_neighborhood() {
        let p = Position::new(3, 3);
        assert!(p.is_adjacent(Position::new(3, 4)));
        assert!(p.is_adjacent(Position::new(2, 3)));
        assert!(!p.is_adjacent(Position::new(4, 4)));
        assert!(!p.is_adjacent(p));
        assert_eq!(p.neighborhood(1).count(), 9);
        assert_eq!(Position::new(0, 0).neighborhood(1).count(), 4);
        assert_eq!(Position::new(0, 4).neighborhood(1).count(), 6);
        assert_eq!(Position::new(7, 7).right(), None);
        assert_eq!(Position::new(7, 7).down(), None);
    }

    #[test]
    fn test_letters_round_trip() {
        for kind in FruitKind::ALL {
            assert_eq!(FruitKind::from_letter(kind.letter()), Some(kind));
        }
        assert_eq!(FruitKind::from_letter('z'), None);
        assert_eq!(FruitKind::from_letter('.'), None);
    }
}
