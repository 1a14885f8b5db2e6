//! Scoring, level targets and level-complete rewards.

/// Moves granted at the start of every level.
pub const MOVES_PER_LEVEL: u32 = 30;

/// Points for each matched cell in a pass.
pub const POINTS_PER_FRUIT: u32 = 10;

/// Bonus per cascade pass beyond the first.
pub const COMBO_BONUS: u32 = 25;

pub const BASE_TARGET: u32 = 1000;
pub const TARGET_STEP: u32 = 500;

pub const BASE_COIN_REWARD: u32 = 50;
pub const COINS_PER_STAR: u32 = 25;

/// Score for one cascade pass: `matched * 10 + (combo - 1) * 25`.
/// `combo` is the 1-based pass number within the current resolution.
pub fn pass_score(matched: usize, combo: u32) -> u32 {
    let base = u32::try_from(matched)
        .unwrap_or(u32::MAX)
        .saturating_mul(POINTS_PER_FRUIT);
    base.saturating_add(combo.saturating_sub(1).saturating_mul(COMBO_BONUS))
}

/// Score needed to clear `level` (1-based).
pub fn target_score(level: u32) -> u32 {
    BASE_TARGET.saturating_add(level.saturating_sub(1).saturating_mul(TARGET_STEP))
}

/// 3 stars at double the target, 2 at one and a half, otherwise 1.
pub fn star_rating(score: u32, target: u32) -> u8 {
    let (score, target) = (u64::from(score), u64::from(target));
    if score >= 2 * target {
        3
    } else if 2 * score >= 3 * target {
        2
    } else {
        1
    }
}

pub fn coin_reward(stars: u8) -> u32 {
    BASE_COIN_REWARD + u32::from(stars) * COINS_PER_STAR
}
