//! App: terminal init, main loop, key handling and step-by-step playback of resolutions.

use crate::Args;
use crate::input::{Action, Cursor, Selection, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, ClearFade, View};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use fruitcrushtui::analytics::{AnalyticsSink, JsonLinesSink, LogSink};
use fruitcrushtui::powerup::find_hint;
use fruitcrushtui::store::{JsonFileStore, MemoryStore, ProgressionStore};
use fruitcrushtui::{
    EngineError, ErrorKind, Grid, LevelEvent, LevelStatus, MatchEngine, Position, PowerUpKind,
    PowerUpOutcome, Resolution, ResolutionStep, ShopItem, SwapOutcome,
};
use ratatui::DefaultTerminal;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Target frame time (~60 FPS).
const FRAME_MS: u64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    /// Level complete or game over popup.
    Results,
    Shop,
    Achievements,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    Restart,
    Exit,
}

impl QuitOption {
    pub const ALL: [Self; 3] = [Self::Resume, Self::Restart, Self::Exit];

    fn cycle(self, forward: bool) -> Self {
        let i = Self::ALL.iter().position(|o| *o == self).unwrap_or(0);
        let n = Self::ALL.len();
        Self::ALL[if forward { (i + 1) % n } else { (i + n - 1) % n }]
    }
}

/// A resolution being replayed. The board on screen lags the engine until it finishes.
#[derive(Debug)]
pub struct Playback {
    steps: VecDeque<ResolutionStep>,
    shown: Grid,
    fading: Vec<Position>,
    next_at: Instant,
    terminal: Option<LevelEvent>,
}

impl Playback {
    fn new(start: Grid, resolution: Resolution, now: Instant) -> Self {
        Self {
            steps: resolution.steps.into(),
            shown: start,
            fading: Vec::new(),
            next_at: now,
            terminal: resolution.terminal,
        }
    }

    /// Apply the next step once its time has come. Returns true when a new fade starts.
    fn advance(&mut self, now: Instant, step: Duration) -> bool {
        if now < self.next_at {
            return false;
        }
        let Some(next) = self.steps.pop_front() else {
            return false;
        };
        self.next_at = now + step;
        match next {
            ResolutionStep::Cleared { positions, .. }
            | ResolutionStep::Removed { positions, .. }
            | ResolutionStep::Stabilized { positions } => {
                self.fading = positions;
                true
            }
            ResolutionStep::Refilled { grid, .. } | ResolutionStep::Shuffled { grid } => {
                self.shown = grid;
                self.fading.clear();
                false
            }
        }
    }

    fn is_done(&self, now: Instant) -> bool {
        self.steps.is_empty() && now >= self.next_at
    }
}

pub struct App {
    args: Args,
    theme: Theme,
    engine: MatchEngine,
    store: Box<dyn ProgressionStore>,
    sinks: Vec<Box<dyn AnalyticsSink>>,
    screen: Screen,
    /// Where the quit menu and shop return to.
    return_to: Screen,
    cursor: Cursor,
    hint: Option<(Position, Position)>,
    message: Option<String>,
    result: Option<LevelEvent>,
    playback: Option<Playback>,
    fade: ClearFade,
    quit_selected: QuitOption,
    shop_selected: usize,
}

impl App {
    pub fn new(args: Args, theme: Theme) -> Result<Self> {
        let store: Box<dyn ProgressionStore> = if args.no_save {
            Box::new(MemoryStore::default())
        } else if let Some(path) = &args.save_file {
            Box::new(JsonFileStore::new(path))
        } else {
            match JsonFileStore::default_location() {
                Ok(store) => {
                    log::info!("player record at {}", store.path().display());
                    Box::new(store)
                }
                Err(err) => {
                    log::warn!("progress will not be saved: {err}");
                    Box::new(MemoryStore::default())
                }
            }
        };

        let mut player = store.load_or_default();
        if let Some(level) = args.level {
            player.level = level.max(1);
        }

        let mut sinks: Vec<Box<dyn AnalyticsSink>> = vec![Box::new(LogSink)];
        if let Some(path) = &args.analytics {
            sinks.push(Box::new(JsonLinesSink::new(path)));
        }

        let engine = MatchEngine::new(args.engine_config(), player);
        Ok(Self {
            args,
            theme,
            engine,
            store,
            sinks,
            screen: Screen::Playing,
            return_to: Screen::Playing,
            cursor: Cursor::default(),
            hint: None,
            message: None,
            result: None,
            playback: None,
            fade: ClearFade::default(),
            quit_selected: QuitOption::Resume,
            shop_selected: 0,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;
        self.save();
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let step = Duration::from_millis(self.args.step_ms);
        loop {
            let now = Instant::now();
            self.tick_playback(now, step);

            let (shown, fading) = match &self.playback {
                Some(p) => (&p.shown, p.fading.as_slice()),
                None => (self.engine.grid(), &[][..]),
            };
            let view = View {
                screen: self.screen,
                theme: &self.theme,
                grid: shown,
                fading,
                session: self.engine.session(),
                player: self.engine.player(),
                cursor: self.cursor,
                hint: self.hint,
                message: self.message.as_deref(),
                result: self.result,
                quit_selected: self.quit_selected,
                shop_selected: self.shop_selected,
                animate: !self.args.no_animation,
            };
            let fade = &mut self.fade;
            terminal.draw(|f| ui::draw(f, &view, fade, now))?;

            let timeout = Duration::from_millis(FRAME_MS).saturating_sub(now.elapsed());
            if !event::poll(timeout)? {
                continue;
            }
            while event::poll(Duration::ZERO)? {
                let Event::Key(key) = event::read()? else {
                    continue;
                };
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                // Input waits until the board on screen has caught up with the engine.
                if self.playback.is_some() {
                    continue;
                }
                if !self.handle(key_to_action(key)) {
                    return Ok(());
                }
            }
        }
    }

    fn tick_playback(&mut self, now: Instant, step: Duration) {
        let Some(playback) = &mut self.playback else {
            return;
        };
        if playback.advance(now, step) {
            self.fade.reset();
        }
        if playback.is_done(now) {
            let terminal = playback.terminal;
            self.playback = None;
            self.fade.reset();
            self.settle(terminal);
        }
    }

    /// Returns false to exit.
    fn handle(&mut self, action: Action) -> bool {
        let keep_going = match self.screen {
            Screen::Playing => {
                self.handle_playing(action);
                true
            }
            Screen::Results => {
                self.handle_results(action);
                true
            }
            Screen::Shop => {
                self.handle_shop(action);
                true
            }
            Screen::Achievements => {
                if matches!(
                    action,
                    Action::Cancel | Action::Select | Action::Achievements | Action::Quit
                ) {
                    self.close_overlay();
                }
                true
            }
            Screen::QuitMenu => self.handle_quit_menu(action),
        };
        self.after_engine_op();
        keep_going
    }

    fn handle_playing(&mut self, action: Action) {
        if self.engine.is_paused() {
            match action {
                Action::Pause => {
                    self.engine.resume_play();
                    self.message = None;
                }
                Action::Quit => self.open(Screen::QuitMenu),
                _ => {}
            }
            return;
        }
        match action {
            Action::Up | Action::Down | Action::Left | Action::Right => self.cursor.step(action),
            Action::Select => self.select(),
            Action::PowerUp(kind) => self.power_up(kind),
            Action::Cancel => {
                if let Some(kind) = self.engine.cancel_power_up() {
                    self.message = Some(format!("{kind} put away"));
                } else {
                    self.cursor.clear();
                }
            }
            Action::Pause => self.engine.pause(),
            Action::Shop => self.open(Screen::Shop),
            Action::Achievements => self.open(Screen::Achievements),
            Action::Restart => self.restart(),
            Action::Quit => self.open(Screen::QuitMenu),
            Action::NextLevel | Action::None => {}
        }
    }

    fn handle_results(&mut self, action: Action) {
        match action {
            Action::NextLevel | Action::Select
                if self.engine.session().status == LevelStatus::Complete =>
            {
                match self.engine.next_level() {
                    Ok(()) => self.back_to_board(),
                    Err(err) => self.refused(&err),
                }
            }
            Action::Restart | Action::Select => self.restart(),
            Action::Shop => self.open(Screen::Shop),
            Action::Achievements => self.open(Screen::Achievements),
            Action::Quit => self.open(Screen::QuitMenu),
            _ => {}
        }
    }

    fn handle_shop(&mut self, action: Action) {
        let n = ShopItem::ALL.len();
        match action {
            Action::Up => self.shop_selected = (self.shop_selected + n - 1) % n,
            Action::Down => self.shop_selected = (self.shop_selected + 1) % n,
            Action::Select => {
                let item = ShopItem::ALL[self.shop_selected % n];
                match self.engine.buy(item) {
                    Ok(()) => {
                        self.message = Some(format!("Bought {item}"));
                        self.save();
                    }
                    Err(err) => self.refused(&err),
                }
            }
            Action::Cancel | Action::Shop | Action::Quit => self.close_overlay(),
            _ => {}
        }
    }

    fn handle_quit_menu(&mut self, action: Action) -> bool {
        match action {
            Action::Up | Action::Left => self.quit_selected = self.quit_selected.cycle(false),
            Action::Down | Action::Right => self.quit_selected = self.quit_selected.cycle(true),
            Action::Select => match self.quit_selected {
                QuitOption::Resume => self.close_overlay(),
                QuitOption::Restart => self.restart(),
                QuitOption::Exit => return false,
            },
            Action::Cancel | Action::Quit => self.close_overlay(),
            _ => {}
        }
        true
    }

    fn open(&mut self, screen: Screen) {
        if matches!(self.screen, Screen::Playing | Screen::Results) {
            self.return_to = self.screen;
        }
        self.quit_selected = QuitOption::Resume;
        self.screen = screen;
    }

    /// Leave the shop or quit menu. Buying moves after a game over goes back to the board.
    fn close_overlay(&mut self) {
        self.screen = match self.engine.session().status {
            LevelStatus::Playing => Screen::Playing,
            _ if self.return_to == Screen::Results => Screen::Results,
            _ => Screen::Playing,
        };
    }

    fn back_to_board(&mut self) {
        self.screen = Screen::Playing;
        self.result = None;
        self.hint = None;
        self.cursor.clear();
    }

    fn restart(&mut self) {
        self.engine.restart();
        self.back_to_board();
        self.message = Some(format!("Level {} restarted", self.engine.session().level));
    }

    fn select(&mut self) {
        if self.engine.session().active_power_up.is_some() {
            let start = *self.engine.grid();
            match self.engine.apply_power_up_target(self.cursor.pos) {
                Ok(resolution) => self.play(start, resolution),
                Err(err) => self.refused(&err),
            }
            return;
        }
        match self.cursor.select() {
            Selection::Swap(a, b) => self.swap(a, b),
            Selection::Selected(_) | Selection::Deselected => {}
        }
    }

    fn swap(&mut self, a: Position, b: Position) {
        let mut start = *self.engine.grid();
        match self.engine.attempt_swap(a, b) {
            Ok(SwapOutcome::Resolved(resolution)) => {
                start.swap(a, b);
                self.play(start, resolution);
            }
            Ok(SwapOutcome::Rejected) => self.message = Some("No match there".to_string()),
            Err(err) => self.refused(&err),
        }
    }

    fn power_up(&mut self, kind: PowerUpKind) {
        let start = *self.engine.grid();
        match self.engine.use_power_up(kind) {
            Ok(PowerUpOutcome::Armed(kind)) => {
                self.cursor.clear();
                self.message = Some(format!("{kind} ready: pick a cell, Esc to cancel"));
            }
            Ok(PowerUpOutcome::Hint(a, b)) => {
                self.hint = Some((a, b));
                self.message = Some(format!("Try swapping {a} and {b}"));
            }
            Ok(PowerUpOutcome::NoMovesAvailable) => {
                self.message = Some("No moves available: try a shuffle".to_string());
            }
            Ok(PowerUpOutcome::Resolved(resolution)) => self.play(start, resolution),
            Err(err) => self.refused(&err),
        }
    }

    /// Start replaying a resolution from `start`, or jump to its end without animation.
    fn play(&mut self, start: Grid, resolution: Resolution) {
        self.hint = None;
        self.message = match resolution.unlocked.as_slice() {
            [] if resolution.combo > 1 => Some(format!("Combo x{}!", resolution.combo)),
            [] => None,
            unlocked => Some(format!(
                "Achievement unlocked: {}",
                unlocked.iter().map(|a| a.title()).collect::<Vec<_>>().join(", ")
            )),
        };
        if self.args.no_animation {
            self.settle(resolution.terminal);
        } else {
            self.playback = Some(Playback::new(start, resolution, Instant::now()));
            self.fade.reset();
        }
    }

    /// Board has caught up: show results or warn when no move is left.
    fn settle(&mut self, terminal: Option<LevelEvent>) {
        if let Some(event) = terminal {
            self.result = Some(event);
            self.screen = Screen::Results;
            self.cursor.clear();
            self.save();
        } else if find_hint(self.engine.grid()).is_none() {
            self.message = Some("No moves left: shuffle (2) or restart (r)".to_string());
        }
    }

    fn refused(&mut self, err: &EngineError) {
        let prefix = match err.kind() {
            ErrorKind::InvalidInput => "Can't do that",
            ErrorKind::InsufficientResource => "Not enough",
            ErrorKind::PreconditionViolation => "Not now",
        };
        self.message = Some(format!("{prefix}: {err}"));
    }

    /// Drain queued analytics into the sinks.
    fn after_engine_op(&mut self) {
        for event in self.engine.take_analytics() {
            for sink in &mut self.sinks {
                sink.record(&event);
            }
        }
    }

    fn save(&mut self) {
        if let Err(err) = self.store.save(&self.engine.snapshot()) {
            log::warn!("could not save player record: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use fruitcrushtui::ScriptedFruits;

    fn app_without_save_file() -> App {
        let args = Args::parse_from(["fruitcrushtui", "--no-save", "--seed", "3"]);
        App::new(args, Theme::default()).unwrap()
    }

    #[test]
    fn test_purchase_is_saved() {
        let mut app = app_without_save_file();
        app.handle(Action::Shop);
        assert_eq!(app.screen, Screen::Shop);
        app.shop_selected = ShopItem::ALL
            .iter()
            .position(|&item| item == ShopItem::Shuffle)
            .unwrap();
        assert!(app.handle(Action::Select));

        let saved = app.store.load().unwrap();
        assert_eq!(saved.coins, 20);
        assert_eq!(saved.power_ups.count(PowerUpKind::Shuffle), 4);

        // Refused purchases leave the saved record alone.
        app.handle(Action::Select);
        assert_eq!(app.store.load().unwrap().coins, 20);
    }

    #[test]
    fn test_achievements_screen_opens_and_closes() {
        let mut app = app_without_save_file();
        app.handle(Action::Achievements);
        assert_eq!(app.screen, Screen::Achievements);
        app.handle(Action::Cancel);
        assert_eq!(app.screen, Screen::Playing);
    }

    #[test]
    fn test_quit_option_cycles() {
        assert_eq!(QuitOption::Resume.cycle(true), QuitOption::Restart);
        assert_eq!(QuitOption::Exit.cycle(true), QuitOption::Resume);
        assert_eq!(QuitOption::Resume.cycle(false), QuitOption::Exit);
    }

    #[test]
    fn test_playback_steps_through_resolution() {
        let mut source = ScriptedFruits::default();
        let start = Grid::deal(&mut source);
        let mut after = start;
        after.swap(Position::new(0, 0), Position::new(0, 1));
        let resolution = Resolution {
            steps: vec![
                ResolutionStep::Cleared {
                    positions: vec![Position::new(0, 0)],
                    score_delta: 10,
                    combo: 1,
                },
                ResolutionStep::Refilled {
                    fills: Vec::new(),
                    grid: after,
                },
            ],
            ..Resolution::default()
        };
        let t0 = Instant::now();
        let step = Duration::from_millis(100);
        let mut playback = Playback::new(start, resolution, t0);

        assert!(playback.advance(t0, step));
        assert_eq!(playback.fading, vec![Position::new(0, 0)]);
        assert_eq!(playback.shown, start);
        assert!(!playback.advance(t0 + Duration::from_millis(50), step));
        assert!(!playback.is_done(t0 + Duration::from_millis(50)));

        let t1 = t0 + step;
        assert!(!playback.advance(t1, step));
        assert_eq!(playback.shown, after);
        assert!(playback.fading.is_empty());
        assert!(!playback.is_done(t1));
        assert!(playback.is_done(t1 + step));
    }
}
