//! Final payout composition and the pre-commitment exit advisory.
//!
//! Multipliers compose additively: exploration multiplier plus torch bonus
//! plus goal bonus. All functions here are pure; the advisory never gates
//! actual progression.

use crate::score::ExplorationPoints;
use crate::torch::TorchPool;
use crate::types::LootItem;

/// Bonus per fraction of the torch pool left unspent at exit.
pub const TORCH_BONUS_SCALE: f64 = 0.03;
/// Flat bonus for exiting with the objective complete.
pub const GOAL_COMPLETION_BONUS: f64 = 0.5;
/// Torch fraction below which the advisory considers the run at risk.
pub const LOW_TORCH_FRACTION: f64 = 0.3;

#[derive(Clone, Debug, PartialEq)]
pub struct RunRewards {
    pub base_gold: u32,
    pub base_exp: u32,
    pub exploration_multiplier: f64,
    pub torch_bonus: f64,
    pub goal_bonus: f64,
    pub total_multiplier: f64,
    pub final_gold: u32,
    pub final_exp: u32,
    pub items: Vec<LootItem>,
}

/// Compose the final payout. Item rewards are appended by the caller.
pub fn finalize(
    base_gold: u32,
    base_exp: u32,
    points: &ExplorationPoints,
    pool: &TorchPool,
    goal_completed: bool,
) -> RunRewards {
    let exploration_multiplier = points.multiplier();
    let torch_bonus = pool.fraction() * TORCH_BONUS_SCALE;
    let goal_bonus = if goal_completed { GOAL_COMPLETION_BONUS } else { 0.0 };
    let total_multiplier = exploration_multiplier + torch_bonus + goal_bonus;

    RunRewards {
        base_gold,
        base_exp,
        exploration_multiplier,
        torch_bonus,
        goal_bonus,
        total_multiplier,
        final_gold: (f64::from(base_gold) * total_multiplier).round() as u32,
        final_exp: (f64::from(base_exp) * total_multiplier).round() as u32,
        items: Vec::new(),
    }
}

/// Percentage contribution of each source to the total multiplier, for the
/// exit-decision UI. Sums to 100 up to rounding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BonusBreakdown {
    pub base_pct: f64,
    pub exploration_pct: f64,
    pub torch_pct: f64,
    pub goal_pct: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RewardForecast {
    pub rewards: RunRewards,
    pub breakdown: BonusBreakdown,
}

/// The same math as [`finalize`], exposed before the player commits to
/// leaving. Mutates nothing.
pub fn predict(
    base_gold: u32,
    base_exp: u32,
    points: &ExplorationPoints,
    pool: &TorchPool,
    goal_completed: bool,
) -> RewardForecast {
    let rewards = finalize(base_gold, base_exp, points, pool, goal_completed);
    let total = rewards.total_multiplier;
    let exploration_bonus = rewards.exploration_multiplier - 1.0;
    let breakdown = BonusBreakdown {
        base_pct: 100.0 / total,
        exploration_pct: exploration_bonus * 100.0 / total,
        torch_pct: rewards.torch_bonus * 100.0 / total,
        goal_pct: rewards.goal_bonus * 100.0 / total,
    };
    RewardForecast { rewards, breakdown }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitRisk {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitRecommendation {
    Continue,
    ConsiderExit,
    ExitNow,
}

pub fn risk(pool: &TorchPool) -> ExitRisk {
    if pool.exhausted() {
        ExitRisk::High
    } else if pool.fraction() < LOW_TORCH_FRACTION {
        ExitRisk::Medium
    } else {
        ExitRisk::Low
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TorchBand {
    Exhausted,
    Low,
    Ok,
}

fn band(pool: &TorchPool) -> TorchBand {
    if pool.exhausted() {
        TorchBand::Exhausted
    } else if pool.fraction() < LOW_TORCH_FRACTION {
        TorchBand::Low
    } else {
        TorchBand::Ok
    }
}

/// Fixed decision table crossing goal state, torch band, and rooms
/// remaining. Advisory only.
pub fn recommendation(
    goal_completed: bool,
    pool: &TorchPool,
    rooms_remaining: usize,
) -> ExitRecommendation {
    match (goal_completed, band(pool), rooms_remaining) {
        (_, _, 0) => ExitRecommendation::ExitNow,
        (true, TorchBand::Exhausted, _) => ExitRecommendation::ExitNow,
        (false, TorchBand::Exhausted, remaining) if remaining <= 2 => {
            ExitRecommendation::ConsiderExit
        }
        (false, TorchBand::Exhausted, _) => ExitRecommendation::ExitNow,
        (true, TorchBand::Low, _) => ExitRecommendation::ExitNow,
        (false, TorchBand::Low, _) => ExitRecommendation::ConsiderExit,
        (true, TorchBand::Ok, remaining) if remaining > 2 => ExitRecommendation::ConsiderExit,
        (true, TorchBand::Ok, _) => ExitRecommendation::Continue,
        (false, TorchBand::Ok, _) => ExitRecommendation::Continue,
    }
}
