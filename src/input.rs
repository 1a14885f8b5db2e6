//! Key bindings (arrows or vim keys) and the cursor/select logic that turns two
//! selections into a swap.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fruitcrushtui::grid::{COLS, ROWS};
use fruitcrushtui::{Position, PowerUpKind};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Select,
    PowerUp(PowerUpKind),
    Cancel,
    Pause,
    Shop,
    Achievements,
    NextLevel,
    Restart,
    Quit,
    None,
}

/// Map key event to action. Arrows and hjkl both move the cursor.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Left | KeyCode::Char('h') => Action::Left,
        KeyCode::Right | KeyCode::Char('l') => Action::Right,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Select,
        KeyCode::Char('1') => Action::PowerUp(PowerUpKind::Hammer),
        KeyCode::Char('2') => Action::PowerUp(PowerUpKind::Shuffle),
        KeyCode::Char('3') => Action::PowerUp(PowerUpKind::Bomb),
        KeyCode::Char('4') => Action::PowerUp(PowerUpKind::Hint),
        KeyCode::Esc => Action::Cancel,
        KeyCode::Char('p' | 'P') => Action::Pause,
        KeyCode::Char('s' | 'S') => Action::Shop,
        KeyCode::Char('a' | 'A') => Action::Achievements,
        KeyCode::Char('n' | 'N') => Action::NextLevel,
        KeyCode::Char('r' | 'R') => Action::Restart,
        KeyCode::Char('q' | 'Q') => Action::Quit,
        _ => Action::None,
    }
}

/// What a select press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Selected(Position),
    Deselected,
    Swap(Position, Position),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub pos: Position,
    pub selected: Option<Position>,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            pos: Position::new(ROWS / 2, COLS / 2),
            selected: None,
        }
    }
}

impl Cursor {
    /// Move within the grid; stops at the edges.
    pub fn step(&mut self, action: Action) {
        let Position { row, col } = self.pos;
        self.pos = match action {
            Action::Up => Position::new(row.saturating_sub(1), col),
            Action::Down => Position::new((row + 1).min(ROWS - 1), col),
            Action::Left => Position::new(row, col.saturating_sub(1)),
            Action::Right => Position::new(row, (col + 1).min(COLS - 1)),
            _ => self.pos,
        };
    }

    /// First press selects; pressing again on the same cell deselects; on a neighbour it
    /// swaps; anywhere else it moves the selection there.
    pub fn select(&mut self) -> Selection {
        match self.selected {
            None => {
                self.selected = Some(self.pos);
                Selection::Selected(self.pos)
            }
            Some(first) if first == self.pos => {
                self.selected = None;
                Selection::Deselected
            }
            Some(first) if first.is_adjacent(self.pos) => {
                self.selected = None;
                Selection::Swap(first, self.pos)
            }
            Some(_) => {
                self.selected = Some(self.pos);
                Selection::Selected(self.pos)
            }
        }
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> Action {
        key_to_action(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_bindings() {
        assert_eq!(press(KeyCode::Char('h')), Action::Left);
        assert_eq!(press(KeyCode::Up), Action::Up);
        assert_eq!(press(KeyCode::Char(' ')), Action::Select);
        assert_eq!(press(KeyCode::Char('3')), Action::PowerUp(PowerUpKind::Bomb));
        assert_eq!(press(KeyCode::Esc), Action::Cancel);
        assert_eq!(press(KeyCode::Char('a')), Action::Achievements);
        assert_eq!(press(KeyCode::Char('x')), Action::None);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('h'), KeyModifiers::ALT)),
            Action::None
        );
    }

    #[test]
    fn test_cursor_stops_at_edges() {
        let mut c = Cursor {
            pos: Position::new(0, 7),
            selected: None,
        };
        c.step(Action::Up);
        c.step(Action::Right);
        assert_eq!(c.pos, Position::new(0, 7));
        c.step(Action::Down);
        c.step(Action::Left);
        assert_eq!(c.pos, Position::new(1, 6));
    }

    #[test]
    fn test_select_then_neighbour_swaps() {
        let mut c = Cursor::default();
        let start = c.pos;
        assert_eq!(c.select(), Selection::Selected(start));
        c.step(Action::Right);
        assert_eq!(c.select(), Selection::Swap(start, c.pos));
        assert_eq!(c.selected, None);
    }

    #[test]
    fn test_select_same_cell_deselects() {
        let mut c = Cursor::default();
        c.select();
        assert_eq!(c.select(), Selection::Deselected);
        assert_eq!(c.selected, None);
    }

    #[test]
    fn test_select_far_cell_moves_selection() {
        let mut c = Cursor::default();
        c.select();
        c.step(Action::Right);
        c.step(Action::Down);
        assert_eq!(c.select(), Selection::Selected(c.pos));
        assert_eq!(c.selected, Some(c.pos));
    }
}
