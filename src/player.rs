//! The persisted player record: progression, lifetime stats, coins, power-ups, achievements.

use crate::error::EngineError;
use crate::powerup::Inventory;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_NAME: &str = "Fruit Master";
pub const STARTING_COINS: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Player {
    pub name: String,
    pub level: u32,
    pub total_score: u64,
    pub games_played: u32,
    pub total_stars: u32,
    pub coins: u32,
    pub is_premium: bool,
    pub best_score: u32,
    pub power_ups: Inventory,
    pub achievements: Achievements,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            level: 1,
            total_score: 0,
            games_played: 0,
            total_stars: 0,
            coins: STARTING_COINS,
            is_premium: false,
            best_score: 0,
            power_ups: Inventory::default(),
            achievements: Achievements::default(),
        }
    }
}

impl Player {
    /// Book a cleared level. Returns the coins awarded.
    pub fn record_level_complete(&mut self, score: u32, stars: u8) -> u32 {
        let coins = crate::scoring::coin_reward(stars);
        self.total_stars = self.total_stars.saturating_add(u32::from(stars));
        self.games_played = self.games_played.saturating_add(1);
        self.coins = self.coins.saturating_add(coins);
        self.best_score = self.best_score.max(score);
        coins
    }

    pub fn record_game_over(&mut self) {
        self.games_played = self.games_played.saturating_add(1);
    }

    /// Deduct `cost` coins, or refuse without touching the balance.
    pub fn spend(&mut self, cost: u32) -> Result<(), EngineError> {
        match self.coins.checked_sub(cost) {
            Some(left) => {
                self.coins = left;
                Ok(())
            }
            None => Err(EngineError::NotEnoughCoins {
                needed: cost,
                available: self.coins,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    FirstMatch,
    ComboMaster,
    #[serde(rename = "score_1000")]
    Score1000,
    #[serde(rename = "level_5")]
    Level5,
    CoinCollector,
    FruitMaster,
}

impl Achievement {
    pub const ALL: [Self; 6] = [
        Self::FirstMatch,
        Self::ComboMaster,
        Self::Score1000,
        Self::Level5,
        Self::CoinCollector,
        Self::FruitMaster,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::FirstMatch => "First Crush",
            Self::ComboMaster => "Combo Master",
            Self::Score1000 => "High Scorer",
            Self::Level5 => "Level 5",
            Self::CoinCollector => "Coin Collector",
            Self::FruitMaster => "Fruit Master",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::FirstMatch => "Make your first match",
            Self::ComboMaster => "Get a 5x combo",
            Self::Score1000 => "Score 1000 points in one level",
            Self::Level5 => "Reach level 5",
            Self::CoinCollector => "Collect 500 coins",
            Self::FruitMaster => "Play 50 games",
        }
    }

    pub fn target(self) -> u64 {
        match self {
            Self::FirstMatch => 1,
            Self::ComboMaster => 5,
            Self::Score1000 => 1000,
            Self::Level5 => 5,
            Self::CoinCollector => 500,
            Self::FruitMaster => 50,
        }
    }

    fn measure(self, stats: &Progress) -> u64 {
        match self {
            Self::FirstMatch => stats.matches,
            Self::ComboMaster => u64::from(stats.combo),
            Self::Score1000 => u64::from(stats.level_score),
            Self::Level5 => u64::from(stats.level),
            Self::CoinCollector => u64::from(stats.coins),
            Self::FruitMaster => u64::from(stats.games_played),
        }
    }
}

/// Snapshot of the numbers achievements are measured against.
#[derive(Debug, Clone, Copy, Default)]
pub struct Progress {
    pub matches: u64,
    pub combo: u32,
    pub level_score: u32,
    pub level: u32,
    pub coins: u32,
    pub games_played: u32,
}

/// Best progress seen per achievement, plus the ones already unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Achievements {
    best: BTreeMap<Achievement, u64>,
    unlocked: BTreeSet<Achievement>,
}

impl Achievements {
    pub fn is_unlocked(&self, achievement: Achievement) -> bool {
        self.unlocked.contains(&achievement)
    }

    pub fn unlocked(&self) -> impl Iterator<Item = Achievement> + '_ {
        self.unlocked.iter().copied()
    }

    /// (best so far, target)
    pub fn progress(&self, achievement: Achievement) -> (u64, u64) {
        let best = self.best.get(&achievement).copied().unwrap_or(0);
        (best.min(achievement.target()), achievement.target())
    }

    /// Fold in new numbers. Returns achievements unlocked by this call, in `ALL` order.
    pub fn observe(&mut self, stats: &Progress) -> Vec<Achievement> {
        let mut newly = Vec::new();
        for achievement in Achievement::ALL {
            if self.unlocked.contains(&achievement) {
                continue;
            }
            let best = self.best.entry(achievement).or_insert(0);
            *best = (*best).max(achievement.measure(stats));
            if *best >= achievement.target() {
                self.unlocked.insert(achievement);
                newly.push(achievement);
            }
        }
        newly
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = Player::default();
        assert_eq!(p.name, "Fruit Master");
        assert_eq!(p.level, 1);
        assert_eq!(p.coins, 100);
        assert!(!p.is_premium);
    }

    #[test]
    fn test_level_complete_bookkeeping() {
        let mut p = Player::default();
        let coins = p.record_level_complete(2100, 3);
        assert_eq!(coins, 125);
        assert_eq!(p.coins, 225);
        assert_eq!(p.total_stars, 3);
        assert_eq!(p.games_played, 1);
        assert_eq!(p.best_score, 2100);
        p.record_level_complete(1200, 1);
        assert_eq!(p.best_score, 2100);
        p.record_game_over();
        assert_eq!(p.games_played, 3);
    }

    #[test]
    fn test_spend_refuses_without_change() {
        let mut p = Player::default();
        assert_eq!(
            p.spend(150),
            Err(EngineError::NotEnoughCoins {
                needed: 150,
                available: 100
            })
        );
        assert_eq!(p.coins, 100);
        assert!(p.spend(80).is_ok());
        assert_eq!(p.coins, 20);
    }

    #[test]
    fn test_achievements_unlock_once() {
        let mut a = Achievements::default();
        let stats = Progress {
            matches: 1,
            combo: 2,
            level: 1,
            coins: 100,
            ..Progress::default()
        };
        assert_eq!(a.observe(&stats), vec![Achievement::FirstMatch]);
        assert!(a.observe(&stats).is_empty());
        assert_eq!(a.progress(Achievement::ComboMaster), (2, 5));

        let later = Progress {
            combo: 5,
            level_score: 1000,
            ..Progress::default()
        };
        assert_eq!(
            a.observe(&later),
            vec![Achievement::ComboMaster, Achievement::Score1000]
        );
        // Best progress is kept even when later numbers are lower.
        assert_eq!(a.progress(Achievement::CoinCollector), (100, 500));
    }

    #[test]
    fn test_achievement_titles() {
        let titles: Vec<_> = Achievement::ALL.iter().map(|a| a.title()).collect();
        assert_eq!(
            titles,
            [
                "First Crush",
                "Combo Master",
                "High Scorer",
                "Level 5",
                "Coin Collector",
                "Fruit Master"
            ]
        );
    }

    #[test]
    fn test_record_json_shape() {
        let json = serde_json::to_value(Player::default()).unwrap();
        assert_eq!(json["totalScore"], 0);
        assert_eq!(json["isPremium"], false);
        assert_eq!(json["powerUps"]["hint"], 5);
        // Old records without newer fields still load.
        let p: Player = serde_json::from_str(r#"{"level": 4, "coins": 7}"#).unwrap();
        assert_eq!(p.level, 4);
        assert_eq!(p.coins, 7);
        assert_eq!(p.name, "Fruit Master");
    }
}
