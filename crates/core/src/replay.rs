//! Re-drive a run from its input journal and report the final state.
//!
//! Replay equivalence is the engine's determinism check: the same journal
//! against the same deterministic provider must land on the same snapshot
//! hash a live run produced.

use std::fmt;

use crate::journal::{InputPayload, RunJournal};
use crate::providers::ContentProvider;
use crate::rewards::RunRewards;
use crate::run::ExpeditionRun;
use crate::types::{EngineError, RoomState};

#[derive(Debug, PartialEq)]
pub enum ReplayError {
    Start(EngineError),
    InputRejected { seq: u64, error: EngineError },
    RoomIndexOutOfRange { seq: u64, room_index: usize },
    UnresolvedRoomAtEnd,
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start(error) => write!(f, "replayed run failed to start: {error}"),
            Self::InputRejected { seq, error } => {
                write!(f, "journal input {seq} was rejected: {error}")
            }
            Self::RoomIndexOutOfRange { seq, room_index } => {
                write!(f, "journal input {seq} names room index {room_index} past the path end")
            }
            Self::UnresolvedRoomAtEnd => {
                write!(f, "journal ended with a room still entered and unresolved")
            }
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct ReplayResult {
    pub rewards: RunRewards,
    pub final_snapshot_hash: u64,
    pub rooms_resolved: usize,
}

pub fn replay_to_end(
    journal: &RunJournal,
    provider: &dyn ContentProvider,
) -> Result<ReplayResult, ReplayError> {
    let mut run =
        ExpeditionRun::start(journal.tier_id, journal.player, &journal.goal_kind, journal.seed)
            .map_err(ReplayError::Start)?;

    for record in &journal.inputs {
        match record.payload {
            InputPayload::EnterRoom { room_index } => {
                let Some(&room_id) = run.room_order().get(room_index) else {
                    return Err(ReplayError::RoomIndexOutOfRange { seq: record.seq, room_index });
                };
                run.enter_room(room_id, provider)
                    .map_err(|error| ReplayError::InputRejected { seq: record.seq, error })?;
            }
            InputPayload::ResolveRoom => {
                run.resolve_room()
                    .map_err(|error| ReplayError::InputRejected { seq: record.seq, error })?;
            }
        }
    }

    let rooms_resolved = run
        .room_order()
        .iter()
        .filter(|id| run.room(**id).map(|room| room.state) == Some(RoomState::Resolved))
        .count();
    let final_snapshot_hash = run.snapshot_hash();
    let rewards = run.exit_run().map_err(|error| match error {
        EngineError::RoomInFlight => ReplayError::UnresolvedRoomAtEnd,
        other => ReplayError::InputRejected { seq: u64::MAX, error: other },
    })?;

    Ok(ReplayResult { rewards, final_snapshot_hash, rooms_resolved })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::keys;
    use crate::providers::StockProvider;
    use crate::types::PlayerSnapshot;

    fn player() -> PlayerSnapshot {
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

    /// Drive a live run in path order, journaling every accepted input.
    fn live_run_with_journal(seed: u64) -> (u64, RunJournal) {
        let provider = StockProvider::new(seed);
        let mut run =
            ExpeditionRun::start(1, player(), keys::GOAL_COLLECT_SHARDS, seed).expect("run");
        let mut journal = RunJournal::new(seed, 1, keys::GOAL_COLLECT_SHARDS, player());
        let mut seq = 0;

        for (index, room_id) in run.room_order().to_vec().into_iter().enumerate() {
            let result = run.enter_room(room_id, &provider).expect("enter");
            journal.append_enter(index, seq);
            seq += 1;
            if result.sub_flow.is_some() {
                run.resolve_room().expect("resolve");
                journal.append_resolve(seq);
                seq += 1;
            }
        }

        (run.snapshot_hash(), journal)
    }

    #[test]
    fn replay_reproduces_a_live_run_hash() {
        let (live_hash, journal) = live_run_with_journal(2_026);
        let provider = StockProvider::new(2_026);
        let replayed = replay_to_end(&journal, &provider).expect("replay");
        assert_eq!(replayed.final_snapshot_hash, live_hash);
        assert!(replayed.rooms_resolved > 0);
    }

    #[test]
    fn identical_journals_replay_identically() {
        let (_, journal) = live_run_with_journal(314);
        let provider = StockProvider::new(314);
        let left = replay_to_end(&journal, &provider).expect("left");
        let right = replay_to_end(&journal, &provider).expect("right");
        assert_eq!(left, right);
    }

    #[test]
    fn different_seeds_land_on_different_hashes() {
        let (left_hash, _) = live_run_with_journal(1);
        let (right_hash, _) = live_run_with_journal(2);
        assert_ne!(left_hash, right_hash);
    }

    #[test]
    fn out_of_range_room_indices_are_reported() {
        let mut journal = RunJournal::new(7, 1, keys::GOAL_FIND_KEY, player());
        journal.append_enter(999, 0);
        let provider = StockProvider::new(7);
        assert_eq!(
            replay_to_end(&journal, &provider).unwrap_err(),
            ReplayError::RoomIndexOutOfRange { seq: 0, room_index: 999 }
        );
    }

    #[test]
    fn a_journal_for_an_unknown_tier_fails_to_start() {
        let journal = RunJournal::new(7, 77, keys::GOAL_FIND_KEY, player());
        let provider = StockProvider::new(7);
        assert!(matches!(
            replay_to_end(&journal, &provider).unwrap_err(),
            ReplayError::Start(EngineError::UnknownTier(77))
        ));
    }
}
