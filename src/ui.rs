//! Layout and drawing: board, sidebar, message line and the pause/results/shop/achievements/quit
//! popups.

use crate::app::{QuitOption, Screen};
use crate::input::Cursor;
use crate::theme::Theme;
use fruitcrushtui::grid::{COLS, ROWS};
use fruitcrushtui::{
    Achievement, Cell, Grid, LevelEvent, Player, Position, PowerUpKind, Session, ShopItem,
};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal cells per board cell.
const CELL_WIDTH: u16 = 4;
const CELL_HEIGHT: u16 = 2;
/// Board including its border.
const BOARD_WIDTH: u16 = COLS as u16 * CELL_WIDTH + 2;
const BOARD_HEIGHT: u16 = ROWS as u16 * CELL_HEIGHT + 2;
const SIDEBAR_WIDTH: u16 = 26;

/// Fade of cleared cells, a little shorter than the default cascade step.
const CLEAR_FADE_MS: u32 = 200;

/// Everything one frame needs, borrowed from the app.
pub struct View<'a> {
    pub screen: Screen,
    pub theme: &'a Theme,
    /// Board as currently shown (may lag the engine during playback).
    pub grid: &'a Grid,
    pub fading: &'a [Position],
    pub session: &'a Session,
    pub player: &'a Player,
    pub cursor: Cursor,
    pub hint: Option<(Position, Position)>,
    pub message: Option<&'a str>,
    pub result: Option<LevelEvent>,
    pub quit_selected: QuitOption,
    pub shop_selected: usize,
    pub animate: bool,
}

/// TachyonFX fade state for the cells currently being cleared.
#[derive(Default)]
pub struct ClearFade {
    effect: Option<Effect>,
    last_process: Option<Instant>,
}

impl ClearFade {
    /// Drop the running effect; the next frame with fading cells builds a new one.
    pub fn reset(&mut self) {
        self.effect = None;
        self.last_process = None;
    }
}

pub fn draw(frame: &mut Frame, view: &View, fade: &mut ClearFade, now: Instant) {
    let area = frame.area();
    let (board_area, sidebar_area, message_area) = split_screen(area);

    let board_inner = draw_board(frame, view, board_area);
    draw_sidebar(frame, view, sidebar_area);
    draw_message(frame, view, message_area);

    if view.animate && !view.fading.is_empty() {
        apply_clear_effect(frame, view, board_inner, fade, now);
    }

    match view.screen {
        Screen::Playing if view.session.paused => draw_pause_overlay(frame, view.theme, area),
        Screen::Playing => {}
        Screen::Results => {
            if let Some(event) = view.result {
                draw_results(frame, view, event, area);
            }
        }
        Screen::Shop => draw_shop(frame, view, area),
        Screen::Achievements => draw_achievements(frame, view, area),
        Screen::QuitMenu => draw_quit_menu(frame, view.theme, view.quit_selected),
    }
}

/// Board, sidebar and the message line under them, centred in `area`.
fn split_screen(area: Rect) -> (Rect, Rect, Rect) {
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(BOARD_WIDTH + SIDEBAR_WIDTH),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(BOARD_HEIGHT),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(BOARD_WIDTH),
            Constraint::Length(SIDEBAR_WIDTH),
        ])
        .split(vert[1]);
    (row[0], row[1], vert[2])
}

fn cell_rect(board_inner: Rect, pos: Position) -> Rect {
    Rect {
        x: board_inner.x + pos.col as u16 * CELL_WIDTH,
        y: board_inner.y + pos.row as u16 * CELL_HEIGHT,
        width: CELL_WIDTH,
        height: CELL_HEIGHT,
    }
    .intersection(board_inner)
}

/// Draws the board and returns its inner rect.
fn draw_board(frame: &mut Frame, view: &View, area: Rect) -> Rect {
    let theme = view.theme;
    let title = format!(" Fruit Crush  Level {} ", view.session.level);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, Style::default().fg(theme.title)));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let hinted = |pos: Position| view.hint.is_some_and(|(a, b)| a == pos || b == pos);
    let buf = frame.buffer_mut();
    for pos in Grid::positions() {
        let rect = cell_rect(inner, pos);
        if rect.is_empty() {
            continue;
        }
        // The outer columns frame the fruit and carry the cursor/selection highlight.
        let frame_bg = if view.cursor.selected == Some(pos) {
            theme.title
        } else if view.cursor.pos == pos {
            theme.cursor_bg
        } else if hinted(pos) {
            theme.inactive_fg
        } else {
            theme.bg
        };
        for y in rect.top()..rect.bottom() {
            for x in rect.left()..rect.right() {
                buf[(x, y)].set_symbol(" ").set_style(Style::default().bg(frame_bg));
            }
        }
        let Some(Cell::Fruit(kind)) = view.grid.get(pos) else {
            continue;
        };
        let color = theme.fruit_color(kind);
        for y in rect.top()..rect.bottom() {
            for x in (rect.left() + 1)..rect.right().saturating_sub(1) {
                buf[(x, y)].set_style(Style::default().bg(color));
            }
        }
        if rect.width > 2 {
            buf[(rect.x + 1, rect.y)]
                .set_char(kind.letter())
                .set_style(Style::default().fg(theme.bg).bg(color).bold());
        }
    }
    inner
}

/// Buffer (x, y) positions covered by the fading board cells.
fn fading_buffer_positions(board_inner: Rect, fading: &[Position]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &pos in fading {
        let rect = cell_rect(board_inner, pos);
        for y in rect.top()..rect.bottom() {
            for x in rect.left()..rect.right() {
                set.insert((x, y));
            }
        }
    }
    set
}

/// Create or advance the fade on cleared cells (TachyonFX: fade them to the board bg).
fn apply_clear_effect(
    frame: &mut Frame,
    view: &View,
    board_inner: Rect,
    fade: &mut ClearFade,
    now: Instant,
) {
    let delta = fade
        .last_process
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    fade.last_process = Some(now);

    if fade.effect.is_none() {
        let set = fading_buffer_positions(board_inner, view.fading);
        let filter = CellFilter::PositionFn(ref_count(move |pos: ratatui::layout::Position| {
            set.contains(&(pos.x, pos.y))
        }));
        let bg = view.theme.bg;
        fade.effect = Some(
            fx::fade_to(bg, bg, (CLEAR_FADE_MS, Interpolation::Linear))
                .with_filter(filter)
                .with_area(board_inner),
        );
    }

    if let Some(effect) = &mut fade.effect {
        frame.render_effect(effect, board_inner, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);
    let session = view.session;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Level: score gauge, moves, combo
            Constraint::Length(1),
            Constraint::Length(6), // Power-ups
            Constraint::Length(1),
            Constraint::Length(4), // Player
        ])
        .split(area);

    // --- Level ---
    let level_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(format!(" Level {} ", session.level), title_style));
    let level_inner = level_block.inner(chunks[0]);
    level_block.render(chunks[0], frame.buffer_mut());
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1); 4])
        .split(level_inner);
    Paragraph::new(Line::from(vec![
        Span::styled("Score: ", title_style),
        Span::styled(format!("{} / {}", session.score, session.target_score), fg_style),
    ]))
    .render(rows[0], frame.buffer_mut());
    let ratio = session.progress();
    let bar_color = if ratio >= 1.0 {
        Color::Green
    } else if ratio > 0.5 {
        Color::Yellow
    } else {
        Color::Red
    };
    Gauge::default()
        .ratio(ratio)
        .label("")
        .gauge_style(Style::default().fg(bar_color).bg(theme.bg))
        .render(rows[1], frame.buffer_mut());
    let moves_style = if session.moves_remaining <= 5 {
        Style::default().fg(Color::Red).bold()
    } else {
        fg_style
    };
    Paragraph::new(Line::from(vec![
        Span::styled("Moves: ", title_style),
        Span::styled(session.moves_remaining.to_string(), moves_style),
    ]))
    .render(rows[2], frame.buffer_mut());
    let combo = if session.combo > 1 {
        format!("x{}", session.combo)
    } else {
        "-".to_string()
    };
    Paragraph::new(Line::from(vec![
        Span::styled("Combo: ", title_style),
        Span::styled(combo, fg_style),
    ]))
    .render(rows[3], frame.buffer_mut());

    // --- Power-ups: key, name, count; the armed one highlighted ---
    let power_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(" Power-ups ", title_style));
    let power_inner = power_block.inner(chunks[2]);
    power_block.render(chunks[2], frame.buffer_mut());
    let lines: Vec<Line> = PowerUpKind::ALL
        .iter()
        .enumerate()
        .map(|(i, &kind)| {
            let count = view.player.power_ups.count(kind);
            let style = if session.active_power_up == Some(kind) {
                Style::default().fg(theme.bg).bg(theme.title).bold()
            } else if count == 0 {
                Style::default().fg(theme.inactive_fg)
            } else {
                fg_style
            };
            Line::from(Span::styled(
                format!(" {} {:<10}{:>3} ", i + 1, kind.name(), count),
                style,
            ))
        })
        .collect();
    Paragraph::new(lines).render(power_inner, frame.buffer_mut());

    // --- Player ---
    let player_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(format!(" {} ", view.player.name), title_style));
    let player_inner = player_block.inner(chunks[4]);
    player_block.render(chunks[4], frame.buffer_mut());
    Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Coins: ", title_style),
            Span::styled(view.player.coins.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Stars: ", title_style),
            Span::styled(view.player.total_stars.to_string(), fg_style),
            Span::styled("  Best: ", title_style),
            Span::styled(view.player.best_score.to_string(), fg_style),
        ]),
    ])
    .render(player_inner, frame.buffer_mut());
}

fn draw_message(frame: &mut Frame, view: &View, area: Rect) {
    let line = match view.message {
        Some(msg) => Line::from(Span::styled(msg, Style::default().fg(view.theme.title))),
        None => Line::from(Span::styled(
            "Space select  1-4 power-ups  S shop  A achievements  P pause  Q quit",
            Style::default().fg(view.theme.inactive_fg),
        )),
    };
    Paragraph::new(line)
        .alignment(Alignment::Center)
        .render(area, frame.buffer_mut());
}

/// Centred popup rect with its background cleared.
fn popup(frame: &mut Frame, area: Rect, width: u16, height: u16, bg: Color) -> Rect {
    let rect = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    };
    for y in rect.top()..rect.bottom() {
        for x in rect.left()..rect.right() {
            frame.buffer_mut()[(x, y)]
                .set_symbol(" ")
                .set_style(Style::default().bg(bg));
        }
    }
    rect
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let rect = popup(frame, area, 28, 5, theme.bg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(Span::styled(
            " P  Resume    Q  Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(rect, frame.buffer_mut());
}

fn stars_line(stars: u8) -> String {
    (1..=3)
        .map(|i| if i <= stars { '★' } else { '☆' })
        .collect()
}

fn draw_results(frame: &mut Frame, view: &View, event: LevelEvent, area: Rect) {
    let theme = view.theme;
    let fg = Style::default().fg(theme.main_fg);
    let rect = popup(frame, area, 36, 10, theme.bg);
    let lines = match event {
        LevelEvent::LevelComplete {
            level,
            score,
            stars,
            coins,
        } => vec![
            Line::from(""),
            Line::from(Span::styled(
                format!(" Level {level} complete! "),
                Style::default().fg(Color::Black).bg(Color::Green),
            )),
            Line::from(Span::styled(
                stars_line(stars),
                Style::default().fg(Color::Yellow).bold(),
            )),
            Line::from(Span::styled(format!("Score: {score}"), fg)),
            Line::from(Span::styled(format!("+{coins} coins"), fg)),
            Line::from(""),
            Line::from(Span::styled(
                " N  Next   R  Replay   S  Shop ",
                Style::default().fg(theme.title),
            )),
        ],
        LevelEvent::GameOver {
            level,
            score,
            target,
        } => vec![
            Line::from(""),
            Line::from(Span::styled(
                format!(" Level {level}: out of moves "),
                Style::default().fg(Color::White).bg(Color::Red),
            )),
            Line::from(""),
            Line::from(Span::styled(format!("Score: {score} / {target}"), fg)),
            Line::from(""),
            Line::from(Span::styled(
                " R  Retry   S  Shop (extra moves) ",
                Style::default().fg(theme.title),
            )),
        ],
    };
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .title(Span::styled(" Fruit Crush ", theme.title)),
        )
        .render(rect, frame.buffer_mut());
}

fn draw_shop(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let height = ShopItem::ALL.len() as u16 + 6;
    let rect = popup(frame, area, 38, height, theme.bg);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(format!(" Shop  {} coins ", view.player.coins));
    let inner = block.inner(rect);
    block.render(rect, frame.buffer_mut());

    let mut lines = vec![Line::from("")];
    for (i, item) in ShopItem::ALL.iter().enumerate() {
        let affordable = view.player.coins >= item.price();
        let style = if i == view.shop_selected {
            Style::default().fg(theme.bg).bg(theme.title).bold()
        } else if affordable {
            Style::default().fg(theme.main_fg)
        } else {
            Style::default().fg(theme.inactive_fg)
        };
        lines.push(Line::from(Span::styled(
            format!(" {:<24}{:>6} ", item.label(), item.price()),
            style,
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Enter  Buy    Esc  Back ",
        Style::default().fg(theme.inactive_fg),
    )));
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(inner, frame.buffer_mut());
}

/// One achievement as listed: progress ratio and a `best/target` label.
struct AchievementRow {
    achievement: Achievement,
    unlocked: bool,
    ratio: f64,
    label: String,
}

fn achievement_rows(player: &Player) -> Vec<AchievementRow> {
    Achievement::ALL
        .into_iter()
        .map(|achievement| {
            let unlocked = player.achievements.is_unlocked(achievement);
            let (best, target) = player.achievements.progress(achievement);
            let ratio = if unlocked || target == 0 {
                1.0
            } else {
                (best as f64 / target as f64).min(1.0)
            };
            AchievementRow {
                achievement,
                unlocked,
                ratio,
                label: format!("{best}/{target}"),
            }
        })
        .collect()
}

fn draw_achievements(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let rows = achievement_rows(view.player);
    let height = rows.len() as u16 * 3 + 3;
    let rect = popup(frame, area, 44, height, theme.bg);
    let unlocked = view.player.achievements.unlocked().count();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(format!(" Achievements {}/{} ", unlocked, Achievement::ALL.len()));
    let inner = block.inner(rect);
    block.render(rect, frame.buffer_mut());

    let mut constraints = vec![Constraint::Length(3); rows.len()];
    constraints.push(Constraint::Length(1));
    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (row, slot) in rows.iter().zip(slots.iter()) {
        let lines = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1); 3])
            .split(*slot);
        let (mark, title_style) = if row.unlocked {
            ("✓", Style::default().fg(Color::Green).bold())
        } else {
            ("·", Style::default().fg(theme.main_fg))
        };
        Paragraph::new(Line::from(vec![
            Span::styled(format!(" {mark} "), title_style),
            Span::styled(row.achievement.title(), title_style),
        ]))
        .render(lines[0], frame.buffer_mut());
        Paragraph::new(Line::from(Span::styled(
            format!("   {}", row.achievement.description()),
            Style::default().fg(theme.inactive_fg),
        )))
        .render(lines[1], frame.buffer_mut());
        let bar = Rect {
            x: lines[2].x + 3,
            width: lines[2].width.saturating_sub(4),
            ..lines[2]
        };
        Gauge::default()
            .ratio(row.ratio)
            .label(row.label.as_str())
            .gauge_style(Style::default().fg(theme.title).bg(theme.div_line))
            .render(bar, frame.buffer_mut());
    }
    if let Some(footer) = slots.last() {
        Paragraph::new(Line::from(Span::styled(
            " Esc  Back ",
            Style::default().fg(theme.inactive_fg),
        )))
        .alignment(Alignment::Center)
        .render(*footer, frame.buffer_mut());
    }
}

fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let area = frame.area();
    let rect = popup(frame, area, 24, 8, theme.bg);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(" Quit? ");
    let inner = block.inner(rect);
    block.render(rect, frame.buffer_mut());

    for (i, opt) in QuitOption::ALL.iter().enumerate() {
        let label = match opt {
            QuitOption::Resume => " Resume ",
            QuitOption::Restart => " Restart level ",
            QuitOption::Exit => " Exit ",
        };
        let style = if *opt == selected {
            Style::default().fg(theme.bg).bg(theme.title).bold()
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + inner.width.saturating_sub(label.len() as u16) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.bottom() {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fruitcrushtui::player::Progress;

    #[test]
    fn test_layout_fits_board_and_sidebar() {
        let area = Rect::new(0, 0, 100, 30);
        let (board, sidebar, message) = split_screen(area);
        assert_eq!(board.width, BOARD_WIDTH);
        assert_eq!(board.height, BOARD_HEIGHT);
        assert_eq!(sidebar.x, board.x + BOARD_WIDTH);
        assert_eq!(message.y, board.y + BOARD_HEIGHT);
    }

    #[test]
    fn test_fading_positions_cover_whole_cells() {
        let inner = Rect::new(1, 1, COLS as u16 * CELL_WIDTH, ROWS as u16 * CELL_HEIGHT);
        let set = fading_buffer_positions(inner, &[Position::new(0, 0), Position::new(7, 7)]);
        assert_eq!(set.len(), 2 * (CELL_WIDTH * CELL_HEIGHT) as usize);
        assert!(set.contains(&(1, 1)));
        assert!(set.contains(&(1 + 31, 1 + 15)));
        assert!(!set.contains(&(5, 1)));
    }

    #[test]
    fn test_cells_clip_to_small_board() {
        let inner = Rect::new(0, 0, 10, 3);
        assert!(cell_rect(inner, Position::new(4, 4)).is_empty());
        assert_eq!(cell_rect(inner, Position::new(1, 2)).height, 1);
    }

    #[test]
    fn test_achievement_rows_follow_progress() {
        let mut player = Player::default();
        let rows = achievement_rows(&player);
        assert_eq!(rows.len(), Achievement::ALL.len());
        assert!(rows.iter().all(|r| !r.unlocked && r.ratio == 0.0));

        player.achievements.observe(&Progress {
            matches: 1,
            coins: 250,
            ..Progress::default()
        });
        let rows = achievement_rows(&player);
        let first = &rows[0];
        assert_eq!(first.achievement, Achievement::FirstMatch);
        assert!(first.unlocked);
        assert_eq!(first.ratio, 1.0);
        let coins = rows
            .iter()
            .find(|r| r.achievement == Achievement::CoinCollector)
            .unwrap();
        assert!(!coins.unlocked);
        assert_eq!(coins.ratio, 0.5);
        assert_eq!(coins.label, "250/500");
    }

    #[test]
    fn test_stars_line() {
        assert_eq!(stars_line(1), "★☆☆");
        assert_eq!(stars_line(3), "★★★");
    }
}
