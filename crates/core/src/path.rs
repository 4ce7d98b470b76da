//! Seeded assembly of the expedition's room path, constrained by the run
//! objective.

use crate::affix::has_extra_chest_room;
use crate::content::{Affix, DungeonTier, GoalSpec};
use crate::seed::{mix_seed_stream, random_usize};
use crate::types::RoomKind;

const STREAM_INTERIOR_BASE: u64 = 0x1000;
const STREAM_GOAL_BASE: u64 = 0x2000;

/// Tiers at least this large place a sealed gate room in front of the boss.
const GATE_ROOM_THRESHOLD: usize = 12;

const INTERIOR_WEIGHTS: &[(RoomKind, u32)] = &[
    (RoomKind::Combat, 40),
    (RoomKind::Chest, 14),
    (RoomKind::Event, 12),
    (RoomKind::Trap, 12),
    (RoomKind::Altar, 12),
    (RoomKind::Merchant, 10),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PlannedRoom {
    pub kind: RoomKind,
    pub carries_goal_item: bool,
}

/// Build the ordered room plan for one run. Identical inputs produce the
/// identical sequence.
pub(crate) fn build_room_path(
    tier: &DungeonTier,
    goal: &GoalSpec,
    affixes: &[&Affix],
    seed: u64,
) -> Vec<PlannedRoom> {
    let has_gate = tier.room_count >= GATE_ROOM_THRESHOLD;
    let interior_count = tier.room_count - 2 - usize::from(has_gate);

    let mut kinds = Vec::with_capacity(tier.room_count + 1);
    kinds.push(RoomKind::Start);
    for slot in 0..interior_count {
        kinds.push(draw_interior_kind(seed, slot));
    }
    ensure_goal_hosts(&mut kinds, goal, interior_count);
    if has_gate {
        kinds.push(RoomKind::Gate);
    }
    kinds.push(RoomKind::Boss);

    let mut rooms: Vec<PlannedRoom> =
        kinds.into_iter().map(|kind| PlannedRoom { kind, carries_goal_item: false }).collect();
    place_goal_items(&mut rooms, goal, seed);

    if has_extra_chest_room(affixes) {
        let boss_block = rooms
            .iter()
            .position(|room| matches!(room.kind, RoomKind::Gate | RoomKind::Boss))
            .unwrap_or(rooms.len());
        rooms.insert(boss_block, PlannedRoom { kind: RoomKind::Chest, carries_goal_item: false });
    }

    rooms
}

fn draw_interior_kind(seed: u64, slot: usize) -> RoomKind {
    let total: u32 = INTERIOR_WEIGHTS.iter().map(|(_, weight)| weight).sum();
    let mut roll =
        random_usize(seed, STREAM_INTERIOR_BASE + slot as u64, 0, total as usize - 1) as u32;
    for (kind, weight) in INTERIOR_WEIGHTS {
        if roll < *weight {
            return *kind;
        }
        roll -= weight;
    }
    RoomKind::Combat
}

/// Guarantee the draw produced enough rooms of the goal's host categories,
/// converting the earliest non-host interior rooms when it fell short.
fn ensure_goal_hosts(kinds: &mut [RoomKind], goal: &GoalSpec, interior_count: usize) {
    let interior = 1..=interior_count;
    let mut hosts = kinds[interior.clone()]
        .iter()
        .filter(|kind| goal.host_rooms.contains(*kind))
        .count();

    for index in interior {
        if hosts >= goal.required as usize {
            break;
        }
        if !goal.host_rooms.contains(&kinds[index]) {
            kinds[index] = goal.host_rooms[0];
            hosts += 1;
        }
    }
    debug_assert!(hosts >= goal.required as usize, "tier too small to host goal content");
}

fn place_goal_items(rooms: &mut [PlannedRoom], goal: &GoalSpec, seed: u64) {
    let mut host_indices: Vec<usize> = rooms
        .iter()
        .enumerate()
        .filter(|(index, room)| {
            *index != 0 && *index != rooms.len() - 1 && goal.host_rooms.contains(&room.kind)
        })
        .map(|(index, _)| index)
        .collect();

    for placement in 0..goal.required as usize {
        if host_indices.is_empty() {
            break;
        }
        let pick = random_usize(
            mix_seed_stream(seed, STREAM_GOAL_BASE),
            placement as u64,
            0,
            host_indices.len() - 1,
        );
        let index = host_indices.swap_remove(pick);
        rooms[index].carries_goal_item = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{goal_by_kind, keys, tier_by_id};

    fn tier(id: u8) -> &'static DungeonTier {
        tier_by_id(id).expect("tier")
    }

    fn goal(kind: &str) -> &'static GoalSpec {
        goal_by_kind(kind).expect("goal")
    }

    #[test]
    fn path_is_bracketed_by_start_and_boss() {
        for seed in [0_u64, 9, 4_242, 999_999] {
            let rooms = build_room_path(tier(1), goal(keys::GOAL_FIND_KEY), &[], seed);
            assert_eq!(rooms.len(), tier(1).room_count);
            assert_eq!(rooms.first().map(|r| r.kind), Some(RoomKind::Start));
            assert_eq!(rooms.last().map(|r| r.kind), Some(RoomKind::Boss));
        }
    }

    #[test]
    fn large_tiers_gain_a_gate_before_the_boss() {
        let rooms = build_room_path(tier(4), goal(keys::GOAL_COLLECT_SHARDS), &[], 7);
        assert_eq!(rooms.len(), tier(4).room_count);
        assert_eq!(rooms[rooms.len() - 2].kind, RoomKind::Gate);
        assert_eq!(rooms[rooms.len() - 1].kind, RoomKind::Boss);

        let small = build_room_path(tier(1), goal(keys::GOAL_COLLECT_SHARDS), &[], 7);
        assert!(!small.iter().any(|room| room.kind == RoomKind::Gate));
    }

    #[test]
    fn goal_items_land_on_exactly_required_host_rooms() {
        for seed in [3_u64, 17, 90_210] {
            for goal_kind in
                [keys::GOAL_FIND_KEY, keys::GOAL_COLLECT_SHARDS, keys::GOAL_CLEANSE_ALTARS]
            {
                let spec = goal(goal_kind);
                let rooms = build_room_path(tier(3), spec, &[], seed);
                let carriers: Vec<_> =
                    rooms.iter().filter(|room| room.carries_goal_item).collect();
                assert_eq!(carriers.len(), spec.required as usize, "goal {goal_kind}");
                for room in carriers {
                    assert!(spec.host_rooms.contains(&room.kind));
                }
            }
        }
    }

    #[test]
    fn identical_inputs_rebuild_the_identical_path() {
        let left = build_room_path(tier(2), goal(keys::GOAL_SLAY_ELITES), &[], 555);
        let right = build_room_path(tier(2), goal(keys::GOAL_SLAY_ELITES), &[], 555);
        assert_eq!(left, right);
    }

    #[test]
    fn treasure_call_inserts_one_chest_before_the_boss_block() {
        let treasure = crate::content::affix_by_kind(keys::AFFIX_TREASURE_CALL).expect("affix");
        let without = build_room_path(tier(4), goal(keys::GOAL_FIND_KEY), &[], 21);
        let with = build_room_path(tier(4), goal(keys::GOAL_FIND_KEY), &[treasure], 21);

        assert_eq!(with.len(), without.len() + 1);
        let gate_index = with.iter().position(|r| r.kind == RoomKind::Gate).expect("gate");
        assert_eq!(with[gate_index - 1].kind, RoomKind::Chest);
        assert!(!with[gate_index - 1].carries_goal_item);
    }
}
