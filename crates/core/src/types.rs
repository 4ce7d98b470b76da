use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    pub struct RoomId;
}

/// Encounter kind of a single node in the expedition path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoomKind {
    Start,
    Combat,
    Boss,
    Gate,
    Trap,
    Altar,
    Merchant,
    Chest,
    Event,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Normal,
    Heroic,
    Mythic,
}

impl Difficulty {
    /// Fixed scaling factor applied to enemy health/attack/defense and to the
    /// exp/gold an enemy is worth.
    pub fn factor(self) -> f64 {
        match self {
            Self::Normal => 1.0,
            Self::Heroic => 1.3,
            Self::Mythic => 1.6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Positive,
    Negative,
}

/// Read-only view of the player handed in by the host at run start.
/// Equipment and stat computation happen outside the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub health: i32,
    pub max_health: i32,
    pub mana: i32,
    pub max_mana: i32,
    pub dexterity: u32,
    pub luck: u32,
    pub level: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub name: String,
    pub level: u32,
    pub health: i32,
    pub attack: i32,
    pub defense: i32,
    pub exp_reward: u32,
    pub gold_reward: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootItem {
    pub name: String,
    pub quantity: u32,
}

/// Numeric state changes a room asks to be applied. `torches` is applied to
/// the run's own pool; the rest belong to the host's player state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatDeltas {
    pub health: i32,
    pub mana: i32,
    pub gold: i32,
    pub exp: i32,
    pub torches: i32,
}

/// Sub-flow the host must open before the room counts as resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubFlow {
    Battle,
    Event,
    Exploring,
}

/// Everything a room handler hands back to the host loop. Handlers never
/// fail; a room that can do nothing still returns printable lines.
#[derive(Clone, Debug, PartialEq)]
pub struct RoomResult {
    pub room: RoomId,
    pub lines: Vec<String>,
    pub deltas: StatDeltas,
    pub items: Vec<LootItem>,
    pub enemy: Option<Enemy>,
    pub sub_flow: Option<SubFlow>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    Unvisited,
    Entered,
    Resolved,
}

/// One node in the assembled expedition path. Flags never revert to false
/// within a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub kind: RoomKind,
    pub state: RoomState,
    pub defeated: bool,
    pub looted: bool,
    pub used: bool,
    pub carries_goal_item: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    UnknownTier(u8),
    UnknownGoal(String),
    UnknownAffix(String),
    PlayerLevelTooLow { required: u32, actual: u32 },
    UnknownRoom,
    RoomInFlight,
    NoRoomInFlight,
    RunFinished,
    CorruptSnapshot(&'static str),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTier(id) => write!(f, "unknown dungeon tier {id}"),
            Self::UnknownGoal(kind) => write!(f, "unknown goal kind {kind:?}"),
            Self::UnknownAffix(kind) => write!(f, "unknown affix kind {kind:?}"),
            Self::PlayerLevelTooLow { required, actual } => {
                write!(f, "player level {actual} below tier minimum {required}")
            }
            Self::UnknownRoom => write!(f, "room id does not belong to this run"),
            Self::RoomInFlight => write!(f, "another room is already entered and unresolved"),
            Self::NoRoomInFlight => write!(f, "no entered room awaits resolution"),
            Self::RunFinished => write!(f, "run has already exited or been aborted"),
            Self::CorruptSnapshot(reason) => write!(f, "snapshot rejected: {reason}"),
        }
    }
}

/// Structured record of engine-side transitions, kept in memory on the run
/// for the host to drain or inspect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogEvent {
    RoomEntered { room: RoomId, kind: RoomKind },
    RoomRevisited { room: RoomId },
    EntryBlocked { room: RoomId, kind: RoomKind },
    TorchConsumed { remaining: u32 },
    TorchesExhausted,
    SubFlowOpened { room: RoomId, flow: SubFlow },
    RoomResolved { room: RoomId },
    GoalAdvanced { current: u32, required: u32 },
    GoalCompleted,
    RunAborted,
}
