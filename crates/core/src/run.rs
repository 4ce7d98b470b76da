//! One expedition run: lifecycle, the per-room state machine, and the
//! snapshot surface the host persists between sessions.
//!
//! A run is single-threaded and owns all of its state. Exactly one room may
//! be entered and unresolved at a time; provider calls block the run until
//! their result lands.

use std::mem;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::affix::{apply_affix_count, select_affixes};
use crate::content::{self, Affix, AffixContext, DungeonTier};
use crate::goal::Goal;
use crate::path::build_room_path;
use crate::providers::ContentProvider;
use crate::rewards::{self, ExitRecommendation, ExitRisk, RewardForecast, RunRewards};
use crate::score::{ExplorationPoints, Rank};
use crate::seed::mix_seed_stream;
use crate::torch::{TorchPool, TorchStatus};
use crate::types::{
    EngineError, LogEvent, LootItem, PlayerSnapshot, Room, RoomId, RoomKind, RoomResult,
    RoomState, StatDeltas,
};

mod handlers;

#[cfg(test)]
mod test_support;

const STREAM_AFFIX_SELECT: u64 = 0x41;

#[derive(Debug)]
struct PendingAward {
    gold: u32,
    exp: u32,
    items: Vec<LootItem>,
    goal_items: u32,
}

#[derive(Debug)]
pub struct ExpeditionRun {
    seed: u64,
    tier: &'static DungeonTier,
    player: PlayerSnapshot,
    affixes: Vec<&'static Affix>,
    goal: Goal,
    torches: TorchPool,
    points: ExplorationPoints,
    rooms: SlotMap<RoomId, Room>,
    room_order: Vec<RoomId>,
    in_flight: Option<RoomId>,
    pending_award: Option<PendingAward>,
    earned_gold: u32,
    earned_exp: u32,
    loot: Vec<LootItem>,
    log: Vec<LogEvent>,
    finished: bool,
}

impl ExpeditionRun {
    /// Validate configuration and assemble a fresh run. Any failure here
    /// leaves nothing behind; a run is never partially initialized.
    pub fn start(
        tier_id: u8,
        player: PlayerSnapshot,
        goal_kind: &str,
        seed: u64,
    ) -> Result<Self, EngineError> {
        let tier = content::tier_by_id(tier_id).ok_or(EngineError::UnknownTier(tier_id))?;
        if player.level < tier.min_player_level {
            return Err(EngineError::PlayerLevelTooLow {
                required: tier.min_player_level,
                actual: player.level,
            });
        }
        let goal = Goal::new(goal_kind)
            .ok_or_else(|| EngineError::UnknownGoal(goal_kind.to_string()))?;
        let goal_spec = content::goal_by_kind(goal_kind)
            .ok_or_else(|| EngineError::UnknownGoal(goal_kind.to_string()))?;

        let affixes =
            select_affixes(tier.affix_count, mix_seed_stream(seed, STREAM_AFFIX_SELECT));
        let torches = TorchPool::for_player_level(player.level, &affixes);

        let planned = build_room_path(tier, goal_spec, &affixes, seed);
        let mut rooms = SlotMap::with_key();
        let mut room_order = Vec::with_capacity(planned.len());
        for plan in planned {
            let id = rooms.insert(Room {
                id: RoomId::default(), // Overwritten below.
                kind: plan.kind,
                state: RoomState::Unvisited,
                defeated: false,
                looted: false,
                used: false,
                carries_goal_item: plan.carries_goal_item,
            });
            rooms[id].id = id;
            room_order.push(id);
        }

        Ok(Self {
            seed,
            tier,
            player,
            affixes,
            goal,
            torches,
            points: ExplorationPoints::default(),
            rooms,
            room_order,
            in_flight: None,
            pending_award: None,
            earned_gold: 0,
            earned_exp: 0,
            loot: Vec::new(),
            log: Vec::new(),
            finished: false,
        })
    }

    /// Enter a room: boss-gate admission first, then the torch charge, then
    /// the type handler. A blocked entry is an ordinary result, not an
    /// error, and costs nothing.
    pub fn enter_room(
        &mut self,
        room_id: RoomId,
        provider: &dyn ContentProvider,
    ) -> Result<RoomResult, EngineError> {
        if self.finished {
            return Err(EngineError::RunFinished);
        }
        if self.in_flight.is_some() {
            return Err(EngineError::RoomInFlight);
        }
        let room = *self.rooms.get(room_id).ok_or(EngineError::UnknownRoom)?;

        if !self.goal.can_enter(room.kind) {
            self.log.push(LogEvent::EntryBlocked { room: room_id, kind: room.kind });
            return Ok(RoomResult {
                room: room_id,
                lines: vec![
                    "A seal of pale fire bars the way.".to_string(),
                    "The objective of this expedition is not yet met.".to_string(),
                ],
                deltas: StatDeltas::default(),
                items: Vec::new(),
                enemy: None,
                sub_flow: None,
            });
        }

        let first_entry = room.state == RoomState::Unvisited;
        if room.kind != RoomKind::Start {
            let was_exhausted = self.torches.exhausted();
            self.torches = self.torches.consume();
            self.log.push(LogEvent::TorchConsumed { remaining: self.torches.torches() });
            if self.torches.exhausted() && !was_exhausted {
                self.log.push(LogEvent::TorchesExhausted);
            }
        }
        if first_entry {
            self.points = self.points.add_points(room.kind);
            self.log.push(LogEvent::RoomEntered { room: room_id, kind: room.kind });
        } else {
            self.log.push(LogEvent::RoomRevisited { room: room_id });
        }

        let was_resolved = room.state == RoomState::Resolved;
        let was_flagged = room.defeated || room.looted || room.used;
        self.rooms[room_id].state = RoomState::Entered;
        let room_index = self.room_order.iter().position(|id| *id == room_id).unwrap_or(0);
        let ctx = handlers::HandlerContext {
            seed: self.seed,
            tier: self.tier,
            player: self.player,
            affixes: &self.affixes,
            torches: self.torches,
        };
        let result = handlers::execute(&mut self.rooms[room_id], room_index, &ctx, provider);

        self.apply_torch_delta(result.deltas.torches);

        // Goal content is collected the moment the room's action actually
        // lands, observed as the first flag transition. Flags never revert,
        // so this fires at most once per room.
        let after = &self.rooms[room_id];
        let newly_flagged = !was_flagged && (after.defeated || after.looted || after.used);
        let award = PendingAward {
            gold: result.deltas.gold.max(0) as u32,
            exp: result.deltas.exp.max(0) as u32,
            items: result.items.clone(),
            goal_items: u32::from(newly_flagged && after.carries_goal_item),
        };
        match result.sub_flow {
            None => self.finish_room(room_id, award, was_resolved),
            Some(flow) => {
                self.in_flight = Some(room_id);
                self.pending_award = Some(award);
                self.log.push(LogEvent::SubFlowOpened { room: room_id, flow });
            }
        }

        Ok(result)
    }

    /// Close the sub-flow opened by the last entry and let the room count
    /// as resolved.
    pub fn resolve_room(&mut self) -> Result<RoomId, EngineError> {
        if self.finished {
            return Err(EngineError::RunFinished);
        }
        let room_id = self.in_flight.take().ok_or(EngineError::NoRoomInFlight)?;
        let award = self.pending_award.take().unwrap_or(PendingAward {
            gold: 0,
            exp: 0,
            items: Vec::new(),
            goal_items: 0,
        });
        self.finish_room(room_id, award, false);
        Ok(room_id)
    }

    /// Leave the dungeon and collect the final payout. The run is finished
    /// afterwards; further operations return [`EngineError::RunFinished`].
    pub fn exit_run(&mut self) -> Result<RunRewards, EngineError> {
        if self.finished {
            return Err(EngineError::RunFinished);
        }
        if self.in_flight.is_some() {
            return Err(EngineError::RoomInFlight);
        }
        self.finished = true;

        let (base_gold, base_exp) = self.reward_bases();
        let mut rewards =
            rewards::finalize(base_gold, base_exp, &self.points, &self.torches, self.goal.completed);
        rewards.items = mem::take(&mut self.loot);
        Ok(rewards)
    }

    /// Terminal cancellation. In-memory state is for the host to discard;
    /// rewards already computed are not revoked.
    pub fn abort(&mut self) {
        if !self.finished {
            self.finished = true;
            self.log.push(LogEvent::RunAborted);
        }
    }

    // ------------------------------------------------------------------
    // Query surface
    // ------------------------------------------------------------------

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tier(&self) -> &'static DungeonTier {
        self.tier
    }

    pub fn player(&self) -> PlayerSnapshot {
        self.player
    }

    pub fn affixes(&self) -> &[&'static Affix] {
        &self.affixes
    }

    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    pub fn torches(&self) -> TorchPool {
        self.torches
    }

    pub fn torch_status(&self) -> TorchStatus {
        self.torches.status()
    }

    pub fn points(&self) -> ExplorationPoints {
        self.points
    }

    pub fn rank(&self) -> Rank {
        self.points.rank()
    }

    pub fn room_order(&self) -> &[RoomId] {
        &self.room_order
    }

    pub fn room(&self, room_id: RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn rooms_remaining(&self) -> usize {
        self.room_order
            .iter()
            .filter(|id| self.rooms[**id].state != RoomState::Resolved)
            .count()
    }

    pub fn log(&self) -> &[LogEvent] {
        &self.log
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn exit_risk(&self) -> ExitRisk {
        rewards::risk(&self.torches)
    }

    pub fn exit_recommendation(&self) -> ExitRecommendation {
        rewards::recommendation(self.goal.completed, &self.torches, self.rooms_remaining())
    }

    /// Forecast the payout of exiting right now. Pure; run state is
    /// untouched.
    pub fn predict_rewards(&self) -> RewardForecast {
        let (base_gold, base_exp) = self.reward_bases();
        rewards::predict(base_gold, base_exp, &self.points, &self.torches, self.goal.completed)
    }

    /// Canonical hash over everything reward-relevant, for determinism
    /// checks and replay verification.
    pub fn snapshot_hash(&self) -> u64 {
        use std::hash::Hasher;
        use xxhash_rust::xxh3::Xxh3;

        let mut hasher = Xxh3::new();
        hasher.write_u64(self.seed);
        hasher.write_u8(self.tier.id);
        hasher.write_u32(self.torches.torches());
        hasher.write_u32(self.torches.max_torches());
        hasher.write_u32(self.points.current());
        hasher.write_u32(self.points.from_safe());
        hasher.write_u32(self.points.from_dangerous());
        hasher.write_u32(self.points.from_boss());
        hasher.write_u32(self.goal.current);
        hasher.write_u8(u8::from(self.goal.completed));
        hasher.write_u32(self.earned_gold);
        hasher.write_u32(self.earned_exp);
        for id in &self.room_order {
            let room = &self.rooms[*id];
            hasher.write_u8(room.kind as u8);
            hasher.write_u8(room.state as u8);
            hasher.write_u8(u8::from(room.defeated));
            hasher.write_u8(u8::from(room.looted));
            hasher.write_u8(u8::from(room.used));
            hasher.write_u8(u8::from(room.carries_goal_item));
        }
        hasher.finish()
    }

    // ------------------------------------------------------------------
    // Snapshot round-trip
    // ------------------------------------------------------------------

    /// Serializable image of the run. Valid only at quiescent points: a
    /// snapshot is refused while a room is entered and unresolved.
    pub fn snapshot(&self) -> Result<RunSnapshot, EngineError> {
        if self.in_flight.is_some() {
            return Err(EngineError::RoomInFlight);
        }
        Ok(RunSnapshot {
            format_version: 1,
            seed: self.seed,
            tier_id: self.tier.id,
            player: self.player,
            affixes: self.affixes.iter().map(|affix| affix.kind.to_string()).collect(),
            goal: self.goal.clone(),
            torches: self.torches.torches(),
            max_torches: self.torches.max_torches(),
            points: self.points,
            rooms: self
                .room_order
                .iter()
                .map(|id| {
                    let room = &self.rooms[*id];
                    RoomSnapshot {
                        kind: room.kind,
                        state: room.state,
                        defeated: room.defeated,
                        looted: room.looted,
                        used: room.used,
                        carries_goal_item: room.carries_goal_item,
                    }
                })
                .collect(),
            earned_gold: self.earned_gold,
            earned_exp: self.earned_exp,
            loot: self.loot.clone(),
            finished: self.finished,
        })
    }

    /// Rebuild a run from a saved snapshot, re-validating every engine
    /// invariant the serialized form could have lost.
    pub fn from_snapshot(snapshot: &RunSnapshot) -> Result<Self, EngineError> {
        let tier = content::tier_by_id(snapshot.tier_id)
            .ok_or(EngineError::UnknownTier(snapshot.tier_id))?;
        let goal_spec = content::goal_by_kind(&snapshot.goal.kind)
            .ok_or_else(|| EngineError::UnknownGoal(snapshot.goal.kind.clone()))?;
        if snapshot.goal.required != goal_spec.required {
            return Err(EngineError::CorruptSnapshot("goal requirement drifted from the catalog"));
        }
        let mut affixes = Vec::with_capacity(snapshot.affixes.len());
        for kind in &snapshot.affixes {
            let affix = content::affix_by_kind(kind)
                .ok_or_else(|| EngineError::UnknownAffix(kind.clone()))?;
            affixes.push(affix);
        }
        let torches = TorchPool::from_saved(snapshot.torches, snapshot.max_torches)
            .ok_or(EngineError::CorruptSnapshot("torch counts violate the pool invariant"))?;
        let points = ExplorationPoints::from_saved(
            snapshot.points.current(),
            snapshot.points.from_safe(),
            snapshot.points.from_dangerous(),
            snapshot.points.from_boss(),
        )
        .ok_or(EngineError::CorruptSnapshot("exploration sub-totals do not sum"))?;
        if snapshot.goal.current > snapshot.goal.required {
            return Err(EngineError::CorruptSnapshot("goal progress exceeds requirement"));
        }
        if snapshot.rooms.iter().any(|room| room.state == RoomState::Entered) {
            return Err(EngineError::CorruptSnapshot("snapshot taken with a room in flight"));
        }

        let mut rooms = SlotMap::with_key();
        let mut room_order = Vec::with_capacity(snapshot.rooms.len());
        for saved in &snapshot.rooms {
            let id = rooms.insert(Room {
                id: RoomId::default(),
                kind: saved.kind,
                state: saved.state,
                defeated: saved.defeated,
                looted: saved.looted,
                used: saved.used,
                carries_goal_item: saved.carries_goal_item,
            });
            rooms[id].id = id;
            room_order.push(id);
        }

        Ok(Self {
            seed: snapshot.seed,
            tier,
            player: snapshot.player,
            affixes,
            goal: snapshot.goal.clone(),
            torches,
            points,
            rooms,
            room_order,
            in_flight: None,
            pending_award: None,
            earned_gold: snapshot.earned_gold,
            earned_exp: snapshot.earned_exp,
            loot: snapshot.loot.clone(),
            log: Vec::new(),
            finished: snapshot.finished,
        })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn finish_room(&mut self, room_id: RoomId, award: PendingAward, was_resolved: bool) {
        self.rooms[room_id].state = RoomState::Resolved;
        self.earned_gold += award.gold;
        self.earned_exp += award.exp;
        self.loot.extend(award.items);
        if award.goal_items > 0 {
            self.advance_goal(award.goal_items);
        }
        if !was_resolved {
            self.log.push(LogEvent::RoomResolved { room: room_id });
        }
    }

    fn advance_goal(&mut self, increment: u32) {
        let was_completed = self.goal.completed;
        self.goal = self.goal.advanced(increment);
        self.log.push(LogEvent::GoalAdvanced {
            current: self.goal.current,
            required: self.goal.required,
        });
        if self.goal.completed && !was_completed {
            self.log.push(LogEvent::GoalCompleted);
        }
    }

    fn apply_torch_delta(&mut self, delta: i32) {
        if delta > 0 {
            self.torches = self.torches.restore(delta as u32);
        } else if delta < 0 {
            if let Some(pool) = self.torches.spend_for_action(delta.unsigned_abs()) {
                self.torches = pool;
            }
        }
    }

    /// Accumulated gold/exp, scaled by the tier's base multiplier and the
    /// reward affix pipelines. These feed both `exit_run` and the forecast.
    fn reward_bases(&self) -> (u32, u32) {
        let gold = (f64::from(self.earned_gold) * self.tier.base_reward_multiplier).round();
        let exp = (f64::from(self.earned_exp) * self.tier.base_reward_multiplier).round();
        let gold =
            apply_affix_count(&self.affixes, AffixContext::GoldReward, gold as i64).max(0) as u32;
        let exp =
            apply_affix_count(&self.affixes, AffixContext::ExpReward, exp as i64).max(0) as u32;
        (gold, exp)
    }
}

/// Everything needed to reconstruct a run between sessions: tier id, affix
/// set, goal, resource, score, and the room list with flags. Log events are
/// ephemeral and deliberately absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub format_version: u16,
    pub seed: u64,
    pub tier_id: u8,
    pub player: PlayerSnapshot,
    pub affixes: Vec<String>,
    pub goal: Goal,
    pub torches: u32,
    pub max_torches: u32,
    pub points: ExplorationPoints,
    pub rooms: Vec<RoomSnapshot>,
    pub earned_gold: u32,
    pub earned_exp: u32,
    pub loot: Vec<LootItem>,
    pub finished: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub kind: RoomKind,
    pub state: RoomState,
    pub defeated: bool,
    pub looted: bool,
    pub used: bool,
    pub carries_goal_item: bool,
}
