//! The depleting light-source pool gating room-to-room progression.

use serde::{Deserialize, Serialize};

use crate::affix::apply_affix_count;
use crate::content::{Affix, AffixContext};

/// Flat fraction of max health the player loses on combat entry while the
/// pool is exhausted. Exposed for the combat system to honor; the engine
/// never applies it itself.
pub const EXHAUSTED_HEALTH_PENALTY: f64 = 0.10;
/// Flat damage bonus enemies gain while the pool is exhausted. Advisory,
/// like [`EXHAUSTED_HEALTH_PENALTY`].
pub const EXHAUSTED_ENEMY_DAMAGE_BONUS: f64 = 0.10;

const BASE_TORCHES: u32 = 5;
const TORCH_CAP: u32 = 10;
const ABUNDANT_FRACTION: f64 = 0.7;
const MODERATE_FRACTION: f64 = 0.3;

/// Torch pool for one run. Transitions return a new value; the run
/// re-assigns its snapshot after each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorchPool {
    torches: u32,
    max_torches: u32,
}

impl TorchPool {
    /// Starting pool: `min(10, 5 + level/5)`, then through the affix
    /// pipeline under the torch-count context, floored at 1. The result is
    /// also the pool's maximum.
    pub fn for_player_level(level: u32, affixes: &[&Affix]) -> Self {
        let base = (BASE_TORCHES + level / 5).min(TORCH_CAP);
        let adjusted =
            apply_affix_count(affixes, AffixContext::TorchCount, i64::from(base)).max(1) as u32;
        Self { torches: adjusted, max_torches: adjusted }
    }

    /// Rebuild from saved counts, rejecting counts that violate the pool
    /// invariant.
    pub fn from_saved(torches: u32, max_torches: u32) -> Option<Self> {
        if max_torches == 0 || torches > max_torches {
            return None;
        }
        Some(Self { torches, max_torches })
    }

    pub fn torches(&self) -> u32 {
        self.torches
    }

    pub fn max_torches(&self) -> u32 {
        self.max_torches
    }

    pub fn exhausted(&self) -> bool {
        self.torches == 0
    }

    pub fn fraction(&self) -> f64 {
        f64::from(self.torches) / f64::from(self.max_torches)
    }

    #[must_use]
    pub fn consume(self) -> Self {
        Self { torches: self.torches.saturating_sub(1), max_torches: self.max_torches }
    }

    #[must_use]
    pub fn restore(self, amount: u32) -> Self {
        Self {
            torches: (self.torches + amount).min(self.max_torches),
            max_torches: self.max_torches,
        }
    }

    /// Pay `cost` torches for a special action, or `None` without mutation
    /// when the pool cannot afford it. Callers are expected to pre-check.
    #[must_use]
    pub fn spend_for_action(self, cost: u32) -> Option<Self> {
        if self.torches < cost {
            return None;
        }
        Some(Self { torches: self.torches - cost, max_torches: self.max_torches })
    }

    pub fn status(&self) -> TorchStatus {
        if self.exhausted() {
            TorchStatus::Exhausted
        } else if self.fraction() >= ABUNDANT_FRACTION {
            TorchStatus::Abundant
        } else if self.fraction() >= MODERATE_FRACTION {
            TorchStatus::Moderate
        } else {
            TorchStatus::Low
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TorchStatus {
    Abundant,
    Moderate,
    Low,
    Exhausted,
}

impl TorchStatus {
    pub fn describe(self) -> &'static str {
        match self {
            Self::Abundant => "The torches burn bright; the way ahead is clear.",
            Self::Moderate => "The supply of torches holds steady.",
            Self::Low => "The last torches gutter low.",
            Self::Exhausted => "Darkness presses in; every torch is spent.",
        }
    }
}
