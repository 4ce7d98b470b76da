//! Static catalogs for tiers, affixes, and goals, plus pure lookup functions.
//! Catalog entries are immutable process-wide data; per-run state lives on
//! the run itself.

use xxhash_rust::xxh3::Xxh3;

use crate::types::{Difficulty, Polarity, RoomKind};

pub mod keys {
    pub const AFFIX_STRONG_ENEMIES: &str = "strong_enemies";
    pub const AFFIX_SAVAGE_BLOWS: &str = "savage_blows";
    pub const AFFIX_DIM_TORCHES: &str = "dim_torches";
    pub const AFFIX_TARNISHED_GOLD: &str = "tarnished_gold";
    pub const AFFIX_MISERS_HOARD: &str = "misers_hoard";
    pub const AFFIX_QUARTERMASTER: &str = "quartermaster";
    pub const AFFIX_GILDED_HALLS: &str = "gilded_halls";
    pub const AFFIX_SCHOLARS_INSIGHT: &str = "scholars_insight";
    pub const AFFIX_ABUNDANT_CACHES: &str = "abundant_caches";
    pub const AFFIX_TREASURE_CALL: &str = "treasure_call";

    pub const GOAL_FIND_KEY: &str = "find_key";
    pub const GOAL_COLLECT_SHARDS: &str = "collect_shards";
    pub const GOAL_SLAY_ELITES: &str = "slay_elites";
    pub const GOAL_CLEANSE_ALTARS: &str = "cleanse_altars";
}

/// Static difficulty/content band governing room count, enemy level bonus,
/// and affix count. Loaded once per run by id.
#[derive(Debug)]
pub struct DungeonTier {
    pub id: u8,
    pub name: &'static str,
    pub min_player_level: u32,
    pub room_count: usize,
    pub difficulty: Difficulty,
    pub base_reward_multiplier: f64,
    pub enemy_level_bonus: u32,
    pub affix_count: usize,
    /// Tier that must have been cleared before this one unlocks, if any.
    /// Enforced by the host's progression layer, carried here as data.
    pub unlocked_after: Option<u8>,
}

pub const TIERS: &[DungeonTier] = &[
    DungeonTier {
        id: 1,
        name: "Forgotten Cellars",
        min_player_level: 1,
        room_count: 8,
        difficulty: Difficulty::Normal,
        base_reward_multiplier: 1.0,
        enemy_level_bonus: 0,
        affix_count: 2,
        unlocked_after: None,
    },
    DungeonTier {
        id: 2,
        name: "Sunken Catacombs",
        min_player_level: 10,
        room_count: 10,
        difficulty: Difficulty::Normal,
        base_reward_multiplier: 1.2,
        enemy_level_bonus: 2,
        affix_count: 2,
        unlocked_after: Some(1),
    },
    DungeonTier {
        id: 3,
        name: "Howling Depths",
        min_player_level: 20,
        room_count: 12,
        difficulty: Difficulty::Heroic,
        base_reward_multiplier: 1.5,
        enemy_level_bonus: 4,
        affix_count: 3,
        unlocked_after: Some(2),
    },
    DungeonTier {
        id: 4,
        name: "Abyssal Throne",
        min_player_level: 30,
        room_count: 14,
        difficulty: Difficulty::Mythic,
        base_reward_multiplier: 2.0,
        enemy_level_bonus: 6,
        affix_count: 4,
        unlocked_after: Some(3),
    },
];

pub fn tier_by_id(id: u8) -> Option<&'static DungeonTier> {
    TIERS.iter().find(|tier| tier.id == id)
}

/// Value contexts an affix may hook into. An affix transforms a value only
/// when the caller's context matches its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AffixContext {
    TorchCount,
    EnemyStats,
    EnemyDamage,
    GoldReward,
    ExpReward,
    LootCount,
    RoomLayout,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AffixEffect {
    Scale(f64),
    Add(f64),
    /// Consumed by the sequencer, not the value pipeline.
    ExtraChestRoom,
}

/// Run-wide modifier altering combat, loot, or resource parameters for one
/// dungeon run.
#[derive(Debug)]
pub struct Affix {
    pub kind: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub polarity: Polarity,
    pub context: AffixContext,
    pub effect: AffixEffect,
}

pub const AFFIXES: &[Affix] = &[
    Affix {
        kind: keys::AFFIX_STRONG_ENEMIES,
        name: "Strong Enemies",
        description: "Enemies endure more and hit harder.",
        icon: "affix/skull",
        polarity: Polarity::Negative,
        context: AffixContext::EnemyStats,
        effect: AffixEffect::Scale(1.15),
    },
    Affix {
        kind: keys::AFFIX_SAVAGE_BLOWS,
        name: "Savage Blows",
        description: "Enemy attacks land with brutal force.",
        icon: "affix/claw",
        polarity: Polarity::Negative,
        context: AffixContext::EnemyDamage,
        effect: AffixEffect::Scale(1.2),
    },
    Affix {
        kind: keys::AFFIX_DIM_TORCHES,
        name: "Dim Torches",
        description: "The expedition sets out with two fewer torches.",
        icon: "affix/torch_out",
        polarity: Polarity::Negative,
        context: AffixContext::TorchCount,
        effect: AffixEffect::Add(-2.0),
    },
    Affix {
        kind: keys::AFFIX_TARNISHED_GOLD,
        name: "Tarnished Gold",
        description: "Gold found below is worth less on the surface.",
        icon: "affix/coin_cracked",
        polarity: Polarity::Negative,
        context: AffixContext::GoldReward,
        effect: AffixEffect::Scale(0.85),
    },
    Affix {
        kind: keys::AFFIX_MISERS_HOARD,
        name: "Miser's Hoard",
        description: "Caches below hold one item fewer.",
        icon: "affix/chest_shut",
        polarity: Polarity::Negative,
        context: AffixContext::LootCount,
        effect: AffixEffect::Add(-1.0),
    },
    Affix {
        kind: keys::AFFIX_QUARTERMASTER,
        name: "Quartermaster",
        description: "The expedition sets out with two extra torches.",
        icon: "affix/torch_lit",
        polarity: Polarity::Positive,
        context: AffixContext::TorchCount,
        effect: AffixEffect::Add(2.0),
    },
    Affix {
        kind: keys::AFFIX_GILDED_HALLS,
        name: "Gilded Halls",
        description: "Gold rewards are increased.",
        icon: "affix/coin",
        polarity: Polarity::Positive,
        context: AffixContext::GoldReward,
        effect: AffixEffect::Scale(1.2),
    },
    Affix {
        kind: keys::AFFIX_SCHOLARS_INSIGHT,
        name: "Scholar's Insight",
        description: "Experience rewards are increased.",
        icon: "affix/tome",
        polarity: Polarity::Positive,
        context: AffixContext::ExpReward,
        effect: AffixEffect::Scale(1.15),
    },
    Affix {
        kind: keys::AFFIX_ABUNDANT_CACHES,
        name: "Abundant Caches",
        description: "Caches below hold one extra item.",
        icon: "affix/chest_open",
        polarity: Polarity::Positive,
        context: AffixContext::LootCount,
        effect: AffixEffect::Add(1.0),
    },
    Affix {
        kind: keys::AFFIX_TREASURE_CALL,
        name: "Treasure Call",
        description: "One additional treasure chamber appears on the path.",
        icon: "affix/map",
        polarity: Polarity::Positive,
        context: AffixContext::RoomLayout,
        effect: AffixEffect::ExtraChestRoom,
    },
];

pub fn affix_by_kind(kind: &str) -> Option<&'static Affix> {
    AFFIXES.iter().find(|affix| affix.kind == kind)
}

/// Objective template. Declares which room categories may host its
/// collectible content and how many items are needed.
pub struct GoalSpec {
    pub kind: &'static str,
    pub description: &'static str,
    pub required: u32,
    pub host_rooms: &'static [RoomKind],
}

pub const GOALS: &[GoalSpec] = &[
    GoalSpec {
        kind: keys::GOAL_FIND_KEY,
        description: "Wrest the gate key from whatever carries it.",
        required: 1,
        host_rooms: &[RoomKind::Combat],
    },
    GoalSpec {
        kind: keys::GOAL_COLLECT_SHARDS,
        description: "Gather three shards of the sealing sigil.",
        required: 3,
        host_rooms: &[RoomKind::Combat, RoomKind::Chest],
    },
    GoalSpec {
        kind: keys::GOAL_SLAY_ELITES,
        description: "Cut down two of the warren's champions.",
        required: 2,
        host_rooms: &[RoomKind::Combat],
    },
    GoalSpec {
        kind: keys::GOAL_CLEANSE_ALTARS,
        description: "Cleanse two defiled altars.",
        required: 2,
        host_rooms: &[RoomKind::Altar],
    },
];

pub fn goal_by_kind(kind: &str) -> Option<&'static GoalSpec> {
    GOALS.iter().find(|goal| goal.kind == kind)
}

/// Stable hash over the catalog identities, recorded in journals so a replay
/// against drifted content tables can be detected.
pub fn catalog_hash() -> u64 {
    use std::hash::Hasher;

    let mut hasher = Xxh3::new();
    for tier in TIERS {
        hasher.write_u8(tier.id);
        hasher.write(tier.name.as_bytes());
        hasher.write_u64(tier.room_count as u64);
    }
    for affix in AFFIXES {
        hasher.write(affix.kind.as_bytes());
    }
    for goal in GOALS {
        hasher.write(goal.kind.as_bytes());
        hasher.write_u32(goal.required);
    }
    hasher.finish()
}
