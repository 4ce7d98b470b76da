//! Shared fixtures for the run state-machine test suites. This module owns
//! no production logic.

use super::ExpeditionRun;
use crate::content::keys;
use crate::providers::ContentProvider;
use crate::types::{Difficulty, Enemy, LootItem, PlayerSnapshot, RoomId, RoomKind};

pub(super) fn level_one_player() -> PlayerSnapshot {
    PlayerSnapshot {
        health: 30,
        max_health: 30,
        mana: 12,
        max_mana: 12,
        dexterity: 10,
        luck: 5,
        level: 1,
    }
}

pub(super) fn veteran_player() -> PlayerSnapshot {
    PlayerSnapshot {
        health: 140,
        max_health: 140,
        mana: 60,
        max_mana: 60,
        dexterity: 35,
        luck: 20,
        level: 30,
    }
}

pub(super) fn started_run(seed: u64) -> ExpeditionRun {
    ExpeditionRun::start(1, level_one_player(), keys::GOAL_FIND_KEY, seed).expect("run starts")
}

/// Walk the whole path in order, resolving every sub-flow immediately.
pub(super) fn drive_full_run(run: &mut ExpeditionRun, provider: &dyn ContentProvider) {
    for room_id in run.room_order().to_vec() {
        let result = run.enter_room(room_id, provider).expect("room enters");
        if result.sub_flow.is_some() {
            run.resolve_room().expect("sub-flow resolves");
        }
    }
}

/// First room of the given kind on the path, if the seed produced one.
pub(super) fn find_room(run: &ExpeditionRun, kind: RoomKind) -> Option<RoomId> {
    run.room_order()
        .iter()
        .copied()
        .find(|id| run.room(*id).map(|room| room.kind) == Some(kind))
}

/// Scan seeds until the tier-1 path contains the wanted kind. Path
/// assembly is deterministic, so the scan is stable across runs.
pub(super) fn run_containing(kind: RoomKind) -> (ExpeditionRun, RoomId) {
    for seed in 0..200 {
        let run = started_run(seed);
        if let Some(room_id) = find_room(&run, kind) {
            return (run, room_id);
        }
    }
    panic!("no seed below 200 produced a {kind:?} room");
}

/// Provider with nothing to give, for exercising local recovery.
pub(super) struct EmptyProvider;

impl ContentProvider for EmptyProvider {
    fn generate_enemy(
        &self,
        _room_index: usize,
        _is_boss: bool,
        _difficulty: Difficulty,
    ) -> Option<Enemy> {
        None
    }

    fn generate_material(&self, _room_index: usize, _is_boss: bool) -> Option<LootItem> {
        None
    }
}
