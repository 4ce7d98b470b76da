pub mod affix;
pub mod content;
pub mod goal;
pub mod journal;
pub mod journal_file;
mod path;
pub mod providers;
pub mod replay;
pub mod rewards;
pub mod run;
pub mod score;
mod seed;
pub mod torch;
pub mod types;

pub use goal::Goal;
pub use journal::{InputPayload, InputRecord, RunJournal};
pub use providers::{ContentProvider, StockProvider};
pub use replay::*;
pub use rewards::{ExitRecommendation, ExitRisk, RewardForecast, RunRewards};
pub use run::{ExpeditionRun, RunSnapshot};
pub use score::{ExplorationPoints, Rank};
pub use torch::{TorchPool, TorchStatus};
pub use types::*;
