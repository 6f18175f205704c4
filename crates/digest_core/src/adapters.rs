use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::event::Event;

/// Resolves a human channel name to the platform's channel id.
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    /// Fails with [`DigestError::ChannelNotFound`](crate::DigestError::ChannelNotFound) when
    /// no channel carries `name`.
    async fn resolve_channel_id(&self, name: &str) -> Result<String>;
}

/// Supplies a channel's history, all pages concatenated in delivery order.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_events(&self, channel_id: &str, oldest: DateTime<Utc>) -> Result<Vec<Event>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub display_name: String,
    pub is_bot: bool,
}

#[async_trait]
pub trait UserLookup: Send + Sync {
    /// Fails with [`DigestError::UserNotFound`](crate::DigestError::UserNotFound) for unknown ids.
    async fn lookup_user(&self, user_id: &str) -> Result<UserProfile>;
}
