//! Adventure progression core: domain records, the zone-progress codec,
//! the balance policy seam, the tick-driven quest/event engine, and the
//! per-zone quest watermark used by content generation.

pub mod engine;
pub mod errors;
pub mod policy;
pub mod progress;
pub mod types;
pub mod watermark;

pub use engine::{AdventureEngine, Outcome};
pub use errors::GameError;
pub use policy::{BalancePolicy, QuestRoll, Reward, StandardBalance};
pub use types::{
    AdventureContainer, EventId, Guild, GuildId, Player, PlayerId, Quest, QuestId, Zone, ZoneEvent,
    ZoneId, ZoneProgress,
};
pub use watermark::WatermarkTracker;
