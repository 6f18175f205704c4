use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use digest_core::{ChannelDirectory, DigestError, Event, EventSource, UserLookup, UserProfile};

pub struct SlackClient {
    pub(super) http: reqwest::Client,
    pub(super) token: String,
    pub(super) api_base: String,
}

impl SlackClient {
    pub fn with_api_base(api_base: &str, token: String, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to create Slack HTTP client")?;

        Ok(Self {
            http,
            token: token.trim().to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub async fn find_conversation_id(&self, channel_name: &str) -> Result<Option<String>> {
        let conversations = self.list_all_conversations().await?;
        Ok(conversations
            .into_iter()
            .find(|conv| conv.name.as_deref() == Some(channel_name))
            .map(|conv| conv.id))
    }
}

#[async_trait]
impl ChannelDirectory for SlackClient {
    async fn resolve_channel_id(&self, name: &str) -> digest_core::Result<String> {
        self.find_conversation_id(name)
            .await?
            .ok_or_else(|| DigestError::ChannelNotFound(name.to_string()))
    }
}

#[async_trait]
impl EventSource for SlackClient {
    async fn fetch_events(
        &self,
        channel_id: &str,
        oldest: DateTime<Utc>,
    ) -> digest_core::Result<Vec<Event>> {
        Ok(self
            .fetch_conversation_history_since(channel_id, oldest)
            .await?)
    }
}

#[async_trait]
impl UserLookup for SlackClient {
    async fn lookup_user(&self, user_id: &str) -> digest_core::Result<UserProfile> {
        let user = self
            .user_info(user_id)
            .await?
            .ok_or_else(|| DigestError::UserNotFound(user_id.to_string()))?;
        Ok(UserProfile {
            display_name: user.display_name(),
            is_bot: user.is_bot,
        })
    }
}
