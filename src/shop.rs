//! Coin shop catalogue and rewarded grants.

use crate::powerup::PowerUpKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Moves added by a Moves purchase or reward.
pub const EXTRA_MOVES: u32 = 5;

/// Hints in one hint pack.
pub const HINT_PACK: u32 = 3;

/// Hammers handed out by a power-up reward.
pub const REWARD_HAMMERS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopItem {
    Hammer,
    Shuffle,
    Bomb,
    Hints,
    Moves,
}

impl ShopItem {
    pub const ALL: [Self; 5] = [
        Self::Hammer,
        Self::Shuffle,
        Self::Bomb,
        Self::Hints,
        Self::Moves,
    ];

    pub fn price(self) -> u32 {
        match self {
            Self::Hammer => 100,
            Self::Shuffle => 80,
            Self::Bomb => 150,
            Self::Hints => 50,
            Self::Moves => 100,
        }
    }

    /// Power-up stock this item adds, if it is a power-up.
    pub fn power_up(self) -> Option<(PowerUpKind, u32)> {
        match self {
            Self::Hammer => Some((PowerUpKind::Hammer, 1)),
            Self::Shuffle => Some((PowerUpKind::Shuffle, 1)),
            Self::Bomb => Some((PowerUpKind::Bomb, 1)),
            Self::Hints => Some((PowerUpKind::Hint, HINT_PACK)),
            Self::Moves => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hammer => "Hammer",
            Self::Shuffle => "Shuffle",
            Self::Bomb => "Bomb",
            Self::Hints => "Hint pack (x3)",
            Self::Moves => "+5 moves",
        }
    }
}

impl fmt::Display for ShopItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Grants handed out for free, e.g. after a rewarded ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reward {
    Coins(u32),
    Moves,
    PowerUps,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prices() {
        let prices: Vec<_> = ShopItem::ALL.iter().map(|i| i.price()).collect();
        assert_eq!(prices, [100, 80, 150, 50, 100]);
    }

    #[test]
    fn test_power_up_stock() {
        assert_eq!(ShopItem::Hints.power_up(), Some((PowerUpKind::Hint, 3)));
        assert_eq!(ShopItem::Bomb.power_up(), Some((PowerUpKind::Bomb, 1)));
        assert_eq!(ShopItem::Moves.power_up(), None);
    }
}
