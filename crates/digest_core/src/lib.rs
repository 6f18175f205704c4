pub mod adapters;
pub mod error;
pub mod event;
pub mod orchestrator;
pub mod ranker;
pub mod stats;
pub mod window;

pub use adapters::{ChannelDirectory, EventSource, UserLookup, UserProfile};
pub use error::{DigestError, Result};
pub use event::{Event, Reaction};
pub use orchestrator::{ChannelConfig, ChannelResult, ChannelStage, Orchestrator};
pub use ranker::{rank, CachedUserLookup, UserStat, SYSTEM_USER_ID};
pub use stats::Stats;
pub use window::{Window, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};
