use serde::{Deserialize, Serialize};

use crate::content;
use crate::types::PlayerSnapshot;

/// Ordered record of every accepted input to one run, together with the
/// configuration needed to re-drive it. Identical journals replayed against
/// a deterministic provider reproduce the identical run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunJournal {
    pub format_version: u16,
    pub build_id: String,
    pub content_hash: u64,
    pub seed: u64,
    pub tier_id: u8,
    pub goal_kind: String,
    pub player: PlayerSnapshot,
    pub inputs: Vec<InputRecord>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputRecord {
    pub seq: u64,
    pub payload: InputPayload,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputPayload {
    EnterRoom { room_index: usize },
    ResolveRoom,
}

impl RunJournal {
    pub fn new(seed: u64, tier_id: u8, goal_kind: &str, player: PlayerSnapshot) -> Self {
        Self {
            format_version: 1,
            build_id: "dev".to_string(),
            content_hash: content::catalog_hash(),
            seed,
            tier_id,
            goal_kind: goal_kind.to_string(),
            player,
            inputs: Vec::new(),
        }
    }

    pub fn append_enter(&mut self, room_index: usize, seq: u64) {
        self.inputs.push(InputRecord { seq, payload: InputPayload::EnterRoom { room_index } });
    }

    pub fn append_resolve(&mut self, seq: u64) {
        self.inputs.push(InputRecord { seq, payload: InputPayload::ResolveRoom });
    }
}
