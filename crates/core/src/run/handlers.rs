//! Per-room-type handlers. Each handler takes the room, asks the content
//! provider for whatever it needs, flips the room's own flags, and returns
//! narrative plus state deltas. Handlers never fail: a provider with nothing
//! to give produces a safe no-op outcome, and a room whose flag is already
//! set short-circuits to an idempotent result.

use crate::affix::{apply_affix_count, apply_affix_effect};
use crate::content::{Affix, AffixContext, DungeonTier};
use crate::providers::ContentProvider;
use crate::seed::{derive_room_seed, random_usize};
use crate::torch::TorchPool;
use crate::types::{
    Enemy, PlayerSnapshot, Room, RoomKind, RoomResult, StatDeltas, SubFlow,
};

const STREAM_TRAP_DODGE: u64 = 0x31;
const STREAM_TRAP_DAMAGE: u64 = 0x32;
const STREAM_CHEST_GOLD: u64 = 0x33;
const STREAM_COMBAT_DROP: u64 = 0x34;
const STREAM_EVENT_PICK: u64 = 0x35;

const TRAP_DODGE_CAP: u32 = 75;
const COMBAT_DROP_PERCENT: usize = 30;
const ALTAR_VOTIVE_COST: u32 = 1;

pub(crate) struct HandlerContext<'a> {
    pub seed: u64,
    pub tier: &'static DungeonTier,
    pub player: PlayerSnapshot,
    pub affixes: &'a [&'static Affix],
    pub torches: TorchPool,
}

pub(crate) fn execute(
    room: &mut Room,
    room_index: usize,
    ctx: &HandlerContext<'_>,
    provider: &dyn ContentProvider,
) -> RoomResult {
    match room.kind {
        RoomKind::Combat => combat(room, room_index, ctx, provider),
        RoomKind::Boss => boss(room, room_index, ctx, provider),
        RoomKind::Trap => trap(room, room_index, ctx),
        RoomKind::Altar => altar(room, ctx),
        RoomKind::Merchant => merchant(room),
        RoomKind::Chest => chest(room, room_index, ctx, provider),
        RoomKind::Event => event(room, room_index, ctx, provider),
        // Start, gate, and any future kind fall through to a safe room.
        _ => safe_room(room),
    }
}

fn empty_result(room: &Room) -> RoomResult {
    RoomResult {
        room: room.id,
        lines: Vec::new(),
        deltas: StatDeltas::default(),
        items: Vec::new(),
        enemy: None,
        sub_flow: None,
    }
}

/// Idempotent short-circuit for a room whose flag is already set: no repeat
/// combat, no repeat loot, only a flavor trickle of health.
fn revisit(room: &Room) -> RoomResult {
    let mut result = empty_result(room);
    result.lines.push("The chamber lies quiet; nothing here is left undone.".to_string());
    result.lines.push("A moment's rest steadies you.".to_string());
    result.deltas.health = 1;
    result
}

fn safe_room(room: &Room) -> RoomResult {
    let mut result = empty_result(room);
    let line = match room.kind {
        RoomKind::Start => "Torchlight dances at the expedition's first threshold.",
        RoomKind::Gate => "The seal recognizes its key; the gate grinds open.",
        _ => "A bare stretch of corridor passes without incident.",
    };
    result.lines.push(line.to_string());
    result
}

fn combat(
    room: &mut Room,
    room_index: usize,
    ctx: &HandlerContext<'_>,
    provider: &dyn ContentProvider,
) -> RoomResult {
    if room.defeated {
        return revisit(room);
    }
    room.defeated = true;

    let Some(base) = provider.generate_enemy(room_index, false, ctx.tier.difficulty) else {
        let mut result = empty_result(room);
        result
            .lines
            .push("The chamber lies silent; whatever laired here is long gone.".to_string());
        if room.carries_goal_item {
            result.lines.push("What you came for lies abandoned among old bones.".to_string());
        }
        return result;
    };

    let enemy = scale_enemy(base, ctx, false);
    let mut result = empty_result(room);
    result.lines.push(format!("A {} blocks the corridor ahead.", enemy.name));
    if room.carries_goal_item {
        result.lines.push("Something you came for glints at its belt.".to_string());
    }
    result.deltas.gold = enemy.gold_reward as i32;
    result.deltas.exp = enemy.exp_reward as i32;

    let room_seed = derive_room_seed(ctx.seed, room_index);
    if random_usize(room_seed, STREAM_COMBAT_DROP, 0, 99) < COMBAT_DROP_PERCENT
        && let Some(item) = provider.generate_material(room_index, false)
    {
        result.items.push(item);
    }

    result.enemy = Some(enemy);
    result.sub_flow = Some(SubFlow::Battle);
    result
}

fn boss(
    room: &mut Room,
    room_index: usize,
    ctx: &HandlerContext<'_>,
    provider: &dyn ContentProvider,
) -> RoomResult {
    if room.defeated {
        return revisit(room);
    }
    room.defeated = true;

    let Some(base) = provider.generate_enemy(room_index, true, ctx.tier.difficulty) else {
        let mut result = empty_result(room);
        result.lines.push("The throne at the dungeon's heart sits empty.".to_string());
        return result;
    };

    let enemy = scale_enemy(base, ctx, true);
    let mut result = empty_result(room);
    result.lines.push(format!("{} rises to meet you.", enemy.name));
    result.deltas.gold = enemy.gold_reward as i32;
    result.deltas.exp = enemy.exp_reward as i32;

    let count = apply_affix_count(ctx.affixes, AffixContext::LootCount, 2).max(0) as usize;
    result.items = provider.generate_materials(room_index, true, count);

    result.enemy = Some(enemy);
    result.sub_flow = Some(SubFlow::Battle);
    result
}

fn trap(room: &mut Room, room_index: usize, ctx: &HandlerContext<'_>) -> RoomResult {
    if room.used {
        return revisit(room);
    }
    room.used = true;

    let room_seed = derive_room_seed(ctx.seed, room_index);
    let dodge_chance = ctx.player.dexterity.min(TRAP_DODGE_CAP);
    let roll = random_usize(room_seed, STREAM_TRAP_DODGE, 0, 99) as u32;

    let mut result = empty_result(room);
    result.lines.push("A flagstone sinks underfoot with a click.".to_string());
    if roll < dodge_chance {
        result.lines.push("You twist aside as darts hiss past.".to_string());
        return result;
    }

    let low = (ctx.player.max_health * 8 / 100).max(1) as usize;
    let high = (ctx.player.max_health * 18 / 100).max(low as i32) as usize;
    let damage = random_usize(room_seed, STREAM_TRAP_DAMAGE, low, high) as i32;
    result.lines.push("Darts find their mark before you can move.".to_string());
    result.deltas.health = -damage;
    result
}

fn altar(room: &mut Room, ctx: &HandlerContext<'_>) -> RoomResult {
    if room.used {
        return revisit(room);
    }

    let mut result = empty_result(room);
    result.lines.push("A cold altar waits beneath a shroud of dust.".to_string());
    if ctx.torches.spend_for_action(ALTAR_VOTIVE_COST).is_none() {
        // Affordability failure recovers locally: the room stays unused so
        // the player can return with a torch to spare.
        result.lines.push("You have no torch to spare for a votive flame.".to_string());
        return result;
    }

    room.used = true;
    result.deltas.torches = -(ALTAR_VOTIVE_COST as i32);
    result.deltas.health = (ctx.player.max_health / 5).max(1);
    result.lines.push("You set a torch upon the altar; warmth spreads through old wounds."
        .to_string());
    if room.carries_goal_item {
        result.lines.push("The defilement burns away in the votive light.".to_string());
    }
    result
}

fn merchant(room: &mut Room) -> RoomResult {
    if room.used {
        return revisit(room);
    }
    room.used = true;

    let mut result = empty_result(room);
    result.lines.push("A hooded trader spreads their wares across a cloak.".to_string());
    result.sub_flow = Some(SubFlow::Exploring);
    result
}

fn chest(
    room: &mut Room,
    room_index: usize,
    ctx: &HandlerContext<'_>,
    provider: &dyn ContentProvider,
) -> RoomResult {
    if room.looted {
        return revisit(room);
    }
    room.looted = true;

    let mut result = empty_result(room);
    let count = apply_affix_count(ctx.affixes, AffixContext::LootCount, 1).max(0) as usize;
    result.items = provider.generate_materials(room_index, false, count);

    let room_seed = derive_room_seed(ctx.seed, room_index);
    result.deltas.gold = random_usize(room_seed, STREAM_CHEST_GOLD, 8, 24) as i32;

    result.lines.push("The chest's lock gives way.".to_string());
    if result.items.is_empty() && count > 0 {
        result.lines.push("Dust and splinters; the cache was plundered long ago.".to_string());
    }
    if room.carries_goal_item {
        result.lines.push("Among the coins lies what you came for.".to_string());
    }
    result
}

fn event(
    room: &mut Room,
    room_index: usize,
    ctx: &HandlerContext<'_>,
    provider: &dyn ContentProvider,
) -> RoomResult {
    if room.used {
        return revisit(room);
    }
    room.used = true;

    let room_seed = derive_room_seed(ctx.seed, room_index);
    let mut result = empty_result(room);
    match random_usize(room_seed, STREAM_EVENT_PICK, 0, 2) {
        0 => {
            result.lines.push("A torch still gutters in a fallen sconce.".to_string());
            result.lines.push("You take it for the road ahead.".to_string());
            result.deltas.torches = 1;
        }
        1 => {
            if let Some(base) = provider.generate_enemy(room_index, false, ctx.tier.difficulty) {
                let enemy = scale_enemy(base, ctx, false);
                result.lines.push(format!("A {} bursts from the rubble.", enemy.name));
                result.deltas.gold = enemy.gold_reward as i32;
                result.deltas.exp = enemy.exp_reward as i32;
                result.enemy = Some(enemy);
                result.sub_flow = Some(SubFlow::Battle);
            } else {
                result.lines.push("Rubble shifts in the dark, then settles.".to_string());
            }
        }
        _ => {
            result.lines.push("A whispering shrine hums at the edge of hearing.".to_string());
            result.deltas.mana = (ctx.player.max_mana / 4).max(1);
        }
    }
    result
}

/// Scale provider base stats by the tier's difficulty factor, then run the
/// stat and damage affix pipelines. Exp and gold scale by difficulty only;
/// reward affixes apply once at exit.
fn scale_enemy(mut enemy: Enemy, ctx: &HandlerContext<'_>, is_boss: bool) -> Enemy {
    let factor = ctx.tier.difficulty.factor();
    let stat_scale = apply_affix_effect(ctx.affixes, AffixContext::EnemyStats, factor);
    let attack_scale = apply_affix_effect(ctx.affixes, AffixContext::EnemyDamage, stat_scale);

    enemy.level = ctx.player.level + ctx.tier.enemy_level_bonus + if is_boss { 2 } else { 0 };
    enemy.health = (f64::from(enemy.health) * stat_scale).round() as i32;
    enemy.defense = (f64::from(enemy.defense) * stat_scale).round() as i32;
    enemy.attack = (f64::from(enemy.attack) * attack_scale).round() as i32;
    enemy.exp_reward = (f64::from(enemy.exp_reward) * factor).round() as u32;
    enemy.gold_reward = (f64::from(enemy.gold_reward) * factor).round() as u32;
    enemy
}
