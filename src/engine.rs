//! The match engine. Owns the grid, the level session and the player record; every
//! operation runs to a stable grid before it returns and reports what happened as an
//! ordered list of steps.
//!
//! Operations take `&mut self`, so one swap or power-up is in flight at a time and
//! input cannot arrive mid-resolution.

use crate::analytics::AnalyticsEvent;
use crate::error::{EngineError, Precondition};
use crate::events::{LevelEvent, PowerUpOutcome, Resolution, ResolutionStep, SwapOutcome};
use crate::fruits::{FruitSource, SeededFruits};
use crate::grid::{Grid, Position};
use crate::player::{Achievement, Player, Progress};
use crate::powerup::{self, PowerUpKind};
use crate::scoring;
use crate::shop::{self, Reward, ShopItem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub moves_per_level: u32,
    /// Seed for `SeededFruits`; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Scored cascade passes before the grid is stabilized without score.
    pub max_cascade_passes: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            moves_per_level: scoring::MOVES_PER_LEVEL,
            seed: None,
            max_cascade_passes: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelStatus {
    Playing,
    Complete,
    Failed,
}

/// Per-level state, reset on every level start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub level: u32,
    pub score: u32,
    pub moves_remaining: u32,
    pub target_score: u32,
    /// Passes that matched in the most recent resolution.
    pub combo: u32,
    pub active_power_up: Option<PowerUpKind>,
    pub paused: bool,
    pub status: LevelStatus,
}

impl Session {
    pub fn new(level: u32, moves: u32) -> Self {
        Self {
            level,
            score: 0,
            moves_remaining: moves,
            target_score: scoring::target_score(level),
            combo: 0,
            active_power_up: None,
            paused: false,
            status: LevelStatus::Playing,
        }
    }

    /// Score as a fraction of the target, capped at 1.
    pub fn progress(&self) -> f64 {
        if self.target_score == 0 {
            return 1.0;
        }
        (f64::from(self.score) / f64::from(self.target_score)).min(1.0)
    }
}

#[derive(Debug)]
pub struct MatchEngine<S = SeededFruits> {
    config: EngineConfig,
    source: S,
    grid: Grid,
    session: Session,
    player: Player,
    analytics: Vec<AnalyticsEvent>,
}

impl MatchEngine<SeededFruits> {
    /// Engine with random fruit (seeded from `config.seed`), dealt at the player's level.
    pub fn new(config: EngineConfig, player: Player) -> Self {
        let source = SeededFruits::new(config.seed);
        Self::with_source(config, player, source)
    }
}

impl<S: FruitSource> MatchEngine<S> {
    pub fn with_source(config: EngineConfig, player: Player, source: S) -> Self {
        let level = player.level.max(1);
        let mut engine = Self {
            config,
            source,
            grid: Grid::empty(),
            session: Session::new(level, config.moves_per_level),
            player,
            analytics: Vec::new(),
        };
        engine.start_level();
        engine
    }

    /// Pick up an exact grid and session, e.g. a saved position or a test fixture.
    pub fn resume(
        config: EngineConfig,
        player: Player,
        source: S,
        grid: Grid,
        session: Session,
    ) -> Self {
        Self {
            config,
            source,
            grid,
            session,
            player,
            analytics: Vec::new(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn find_matches(&self) -> BTreeSet<Position> {
        self.grid.find_matches()
    }

    /// Serializable copy of the player record for the progression store.
    pub fn snapshot(&self) -> Player {
        self.player.clone()
    }

    /// Hand over queued analytics events.
    pub fn take_analytics(&mut self) -> Vec<AnalyticsEvent> {
        std::mem::take(&mut self.analytics)
    }

    /// Fresh grid and session for the player's current level.
    pub fn start_level(&mut self) {
        let level = self.player.level.max(1);
        self.grid = Grid::deal(&mut self.source);
        self.session = Session::new(level, self.config.moves_per_level);
        log::info!(
            "level {level} started: target {}, {} moves",
            self.session.target_score,
            self.session.moves_remaining
        );
        log::debug!("dealt grid:\n{}", self.grid);
    }

    pub fn restart(&mut self) {
        log::info!("restarting level {}", self.session.level);
        self.start_level();
    }

    /// Advance to the next level. Only after the current one is complete.
    pub fn next_level(&mut self) -> Result<(), EngineError> {
        if self.session.status != LevelStatus::Complete {
            return Err(refused("next level", Precondition::LevelNotComplete.into()));
        }
        self.player.level = self.session.level.saturating_add(1);
        self.start_level();
        self.observe(Progress::default());
        Ok(())
    }

    pub fn pause(&mut self) {
        self.session.paused = true;
    }

    pub fn resume_play(&mut self) {
        self.session.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.session.paused
    }

    fn ensure_playing(&self) -> Result<(), EngineError> {
        if self.session.paused {
            return Err(Precondition::Paused.into());
        }
        if self.session.status != LevelStatus::Playing {
            return Err(Precondition::LevelOver.into());
        }
        if self.session.moves_remaining == 0 {
            return Err(Precondition::OutOfMoves.into());
        }
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), EngineError> {
        self.ensure_playing()?;
        match self.session.active_power_up {
            Some(kind) => Err(Precondition::PowerUpArmed(kind).into()),
            None => Ok(()),
        }
    }

    fn validate_swap(&self, a: Position, b: Position) -> Result<(), EngineError> {
        self.ensure_idle()?;
        if !a.in_bounds() {
            return Err(EngineError::OutOfBounds(a));
        }
        if !b.in_bounds() {
            return Err(EngineError::OutOfBounds(b));
        }
        if a == b {
            return Err(EngineError::SameCell(a));
        }
        if !a.is_adjacent(b) {
            return Err(EngineError::NotAdjacent(a, b));
        }
        Ok(())
    }

    /// Swap two adjacent cells. A swap that makes no match is reverted and costs nothing;
    /// otherwise one move is spent and cascades resolve to a stable grid.
    pub fn attempt_swap(&mut self, a: Position, b: Position) -> Result<SwapOutcome, EngineError> {
        self.validate_swap(a, b).map_err(|err| refused("swap", err))?;

        self.grid.swap(a, b);
        if self.grid.find_matches().is_empty() {
            self.grid.swap(a, b);
            log::debug!("swap {a} <-> {b} matched nothing, reverted");
            return Ok(SwapOutcome::Rejected);
        }

        self.session.moves_remaining = self.session.moves_remaining.saturating_sub(1);
        log::debug!(
            "swap {a} <-> {b} committed, {} moves left",
            self.session.moves_remaining
        );
        let resolution = self.resolve();
        Ok(SwapOutcome::Resolved(self.finish(resolution)))
    }

    /// Run cascade passes until nothing matches: clear, gravity, refill, re-check.
    /// Each pass scores `matched * 10 + (combo - 1) * 25`. On a stable grid this is a no-op.
    pub fn resolve(&mut self) -> Resolution {
        let start_score = self.session.score;
        self.session.combo = 0;
        let mut steps = Vec::new();

        loop {
            let matches = self.grid.find_matches();
            if matches.is_empty() {
                break;
            }
            if self.session.combo >= self.config.max_cascade_passes {
                log::warn!(
                    "still matching after {} passes, stabilizing without score",
                    self.session.combo
                );
                steps.push(ResolutionStep::Stabilized {
                    positions: matches.into_iter().collect(),
                });
                let fills = self.grid.stabilize(&mut self.source);
                steps.push(ResolutionStep::Refilled {
                    fills,
                    grid: self.grid,
                });
                break;
            }

            self.session.combo += 1;
            let combo = self.session.combo;
            let delta = scoring::pass_score(matches.len(), combo);
            self.session.score = self.session.score.saturating_add(delta);
            self.player.total_score = self.player.total_score.saturating_add(u64::from(delta));
            log::debug!("pass {combo}: {} cells, +{delta}", matches.len());

            steps.push(ResolutionStep::Cleared {
                positions: matches.iter().copied().collect(),
                score_delta: delta,
                combo,
            });
            self.grid.clear(&matches);
            self.grid.apply_gravity();
            let fills = self.grid.fill_empty(&mut self.source);
            steps.push(ResolutionStep::Refilled {
                fills,
                grid: self.grid,
            });
        }

        Resolution {
            steps,
            score_delta: self.session.score - start_score,
            final_score: self.session.score,
            combo: self.session.combo,
            terminal: None,
            unlocked: Vec::new(),
        }
    }

    /// Shuffle and hint act at once; hammer and bomb arm and wait for
    /// `apply_power_up_target`. Arming while another targeted power-up is armed swaps it.
    pub fn use_power_up(&mut self, kind: PowerUpKind) -> Result<PowerUpOutcome, EngineError> {
        let check = if kind.needs_target() {
            self.ensure_playing()
        } else {
            self.ensure_idle()
        };
        check.map_err(|err| refused("power-up", err))?;
        if self.player.power_ups.count(kind) == 0 {
            return Err(refused("power-up", EngineError::NoPowerUp(kind)));
        }

        match kind {
            PowerUpKind::Hammer | PowerUpKind::Bomb => {
                self.session.active_power_up = Some(kind);
                log::debug!("{kind} armed");
                Ok(PowerUpOutcome::Armed(kind))
            }
            PowerUpKind::Hint => {
                if let Some((a, b)) = powerup::find_hint(&self.grid) {
                    self.consume(kind);
                    log::debug!("hint: {a} <-> {b}");
                    Ok(PowerUpOutcome::Hint(a, b))
                } else {
                    log::info!("hint found no available move");
                    Ok(PowerUpOutcome::NoMovesAvailable)
                }
            }
            PowerUpKind::Shuffle => {
                self.consume(kind);
                self.grid = Grid::filled(&mut self.source);
                let shuffled = self.grid;
                log::debug!("shuffled:\n{shuffled}");
                let mut resolution = self.resolve();
                resolution
                    .steps
                    .insert(0, ResolutionStep::Shuffled { grid: shuffled });
                Ok(PowerUpOutcome::Resolved(self.finish(resolution)))
            }
        }
    }

    /// Fire the armed hammer or bomb at `target`.
    pub fn apply_power_up_target(&mut self, target: Position) -> Result<Resolution, EngineError> {
        self.ensure_playing()
            .map_err(|err| refused("power-up target", err))?;
        let Some(kind) = self.session.active_power_up else {
            return Err(refused("power-up target", Precondition::NothingArmed.into()));
        };
        if !target.in_bounds() {
            return Err(refused("power-up target", EngineError::OutOfBounds(target)));
        }
        if self.player.power_ups.count(kind) == 0 {
            self.session.active_power_up = None;
            return Err(refused("power-up target", EngineError::NoPowerUp(kind)));
        }

        self.session.active_power_up = None;
        self.consume(kind);
        let area = powerup::blast_area(kind, target);
        log::debug!("{kind} at {target} removes {} cells", area.len());
        self.grid.clear(&area);
        self.grid.apply_gravity();
        let fills = self.grid.fill_empty(&mut self.source);
        let lead = [
            ResolutionStep::Removed {
                positions: area,
                power_up: kind,
            },
            ResolutionStep::Refilled {
                fills,
                grid: self.grid,
            },
        ];

        let mut resolution = self.resolve();
        resolution.steps = lead.into_iter().chain(resolution.steps).collect();
        Ok(self.finish(resolution))
    }

    /// Disarm without spending. Returns what was armed.
    pub fn cancel_power_up(&mut self) -> Option<PowerUpKind> {
        self.session.active_power_up.take()
    }

    /// Buy a shop item with coins. Extra moves are also sold after game over and put
    /// the level back in play.
    pub fn buy(&mut self, item: ShopItem) -> Result<(), EngineError> {
        if self.session.paused {
            return Err(refused("purchase", Precondition::Paused.into()));
        }
        if item == ShopItem::Moves && self.session.status == LevelStatus::Complete {
            return Err(refused("purchase", Precondition::NotInLevel.into()));
        }
        let cost = item.price();
        self.player
            .spend(cost)
            .map_err(|err| refused("purchase", err))?;

        match item.power_up() {
            Some((kind, n)) => self.player.power_ups.add(kind, n),
            None => self.add_moves(shop::EXTRA_MOVES),
        }
        log::info!("bought {item} for {cost}, {} coins left", self.player.coins);
        self.analytics.push(AnalyticsEvent::Purchase {
            item,
            cost,
            coins_left: self.player.coins,
        });
        self.observe(Progress::default());
        Ok(())
    }

    pub fn grant_reward(&mut self, reward: Reward) {
        match reward {
            Reward::Coins(n) => self.player.coins = self.player.coins.saturating_add(n),
            Reward::Moves => self.add_moves(shop::EXTRA_MOVES),
            Reward::PowerUps => self
                .player
                .power_ups
                .add(PowerUpKind::Hammer, shop::REWARD_HAMMERS),
        }
        log::info!("reward granted: {reward:?}");
        self.observe(Progress::default());
    }

    fn add_moves(&mut self, n: u32) {
        self.session.moves_remaining = self.session.moves_remaining.saturating_add(n);
        if self.session.status == LevelStatus::Failed {
            self.session.status = LevelStatus::Playing;
            log::info!("level {} continues with {n} extra moves", self.session.level);
        }
    }

    fn consume(&mut self, kind: PowerUpKind) {
        if self.player.power_ups.take(kind) {
            self.analytics.push(AnalyticsEvent::PowerUpUsed {
                kind,
                level: self.session.level,
            });
        }
    }

    /// Level-end check after a resolution, then achievements.
    fn finish(&mut self, mut resolution: Resolution) -> Resolution {
        resolution.terminal = self.settle_level();
        let stats = Progress {
            matches: resolution.cleared_passes() as u64,
            combo: resolution.combo,
            level_score: self.session.score,
            ..Progress::default()
        };
        resolution.unlocked = self.observe(stats);
        resolution
    }

    fn settle_level(&mut self) -> Option<LevelEvent> {
        let Session {
            level,
            score,
            target_score,
            moves_remaining,
            ..
        } = self.session;

        if score >= target_score {
            let stars = scoring::star_rating(score, target_score);
            let coins = self.player.record_level_complete(score, stars);
            self.session.status = LevelStatus::Complete;
            self.session.active_power_up = None;
            log::info!("level {level} complete: {score} points, {stars} stars, +{coins} coins");
            self.analytics.push(AnalyticsEvent::LevelComplete {
                level,
                score,
                stars,
                coins,
                moves_left: moves_remaining,
            });
            Some(LevelEvent::LevelComplete {
                level,
                score,
                stars,
                coins,
            })
        } else if moves_remaining == 0 {
            self.player.record_game_over();
            self.session.status = LevelStatus::Failed;
            self.session.active_power_up = None;
            log::info!("game over on level {level}: {score}/{target_score}");
            self.analytics.push(AnalyticsEvent::GameOver {
                level,
                score,
                target: target_score,
            });
            Some(LevelEvent::GameOver {
                level,
                score,
                target: target_score,
            })
        } else {
            None
        }
    }

    /// Fold current numbers into achievements; queue an event per new unlock.
    fn observe(&mut self, stats: Progress) -> Vec<Achievement> {
        let stats = Progress {
            level: self.player.level,
            coins: self.player.coins,
            games_played: self.player.games_played,
            ..stats
        };
        let newly = self.player.achievements.observe(&stats);
        for &id in &newly {
            log::info!("achievement unlocked: {}", id.title());
            self.analytics.push(AnalyticsEvent::AchievementUnlocked { id });
        }
        newly
    }
}

fn refused(op: &str, err: EngineError) -> EngineError {
    log::warn!("{op} refused: {err}");
    err
}
