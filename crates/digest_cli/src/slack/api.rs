use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use digest_core::Event;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::json;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use super::client::SlackClient;
use super::types::{
    ChatPostMessageResponse, ConversationsHistoryResponse, ConversationsJoinResponse,
    ConversationsListResponse, ResponseMetadata, SlackConversation, SlackPostedMessage, SlackUser,
    UsersInfoResponse, CHAT_POST_MESSAGE, CONVERSATIONS_HISTORY, CONVERSATIONS_JOIN,
    CONVERSATIONS_LIST, CONVERSATION_TYPES, DEFAULT_RETRY_AFTER_SECS, ERROR_NOT_IN_CHANNEL,
    ERROR_USER_NOT_FOUND, PAGE_LIMIT, USERS_INFO,
};

impl SlackClient {
    pub async fn list_all_conversations(&self) -> Result<Vec<SlackConversation>> {
        let mut all_conversations = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut params = vec![
                ("types", CONVERSATION_TYPES),
                ("exclude_archived", "true"),
                ("limit", PAGE_LIMIT),
            ];
            if let Some(ref c) = cursor {
                params.push(("cursor", c));
            }

            let response = self
                .execute_request(
                    self.http
                        .get(self.api_url(CONVERSATIONS_LIST))
                        .header("Authorization", format!("Bearer {}", self.token))
                        .query(&params),
                    CONVERSATIONS_LIST,
                )
                .await?;

            let resp: ConversationsListResponse = response
                .json()
                .await
                .context("Failed to parse conversations.list response")?;

            if !resp.ok {
                let error_msg = resp.error.as_deref().unwrap_or("unknown error");
                anyhow::bail!("conversations.list returned ok=false: {}", error_msg);
            }

            all_conversations.extend(resp.channels.unwrap_or_default());
            cursor = next_cursor(resp.response_metadata);

            if cursor.is_none() {
                break;
            }
        }

        Ok(all_conversations)
    }

    pub async fn join_channel(&self, channel_id: &str) -> Result<()> {
        let params = vec![("channel", channel_id)];

        let response = self
            .execute_request(
                self.http
                    .post(self.api_url(CONVERSATIONS_JOIN))
                    .header("Authorization", format!("Bearer {}", self.token))
                    .query(&params),
                CONVERSATIONS_JOIN,
            )
            .await
            .with_context(|| {
                format!(
                    "Failed to request conversations.join for channel {}",
                    channel_id
                )
            })?;

        let resp: ConversationsJoinResponse = response
            .json()
            .await
            .context("Failed to parse conversations.join response")?;

        if !resp.ok {
            let error_msg = resp.error.as_deref().unwrap_or("unknown error");
            anyhow::bail!(
                "conversations.join returned ok=false: {} (channel: {})",
                error_msg,
                channel_id
            );
        }

        Ok(())
    }

    /// Every message at or after `oldest`, pages concatenated in the order Slack returns them.
    pub async fn fetch_conversation_history_since(
        &self,
        channel_id: &str,
        oldest: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let oldest = slack_ts(oldest);
        let mut all_messages = Vec::new();
        let mut cursor: Option<String> = None;
        let mut tried_join = false;
        let mut pages = 0usize;

        loop {
            let mut params = vec![
                ("channel", channel_id),
                ("oldest", oldest.as_str()),
                ("inclusive", "true"),
                ("limit", PAGE_LIMIT),
            ];
            if let Some(ref c) = cursor {
                params.push(("cursor", c));
            }

            let response = self
                .execute_request(
                    self.http
                        .get(self.api_url(CONVERSATIONS_HISTORY))
                        .header("Authorization", format!("Bearer {}", self.token))
                        .query(&params),
                    CONVERSATIONS_HISTORY,
                )
                .await
                .with_context(|| {
                    format!(
                        "Failed to request conversations.history for channel {}",
                        channel_id
                    )
                })?;

            let resp: ConversationsHistoryResponse = response
                .json()
                .await
                .context("Failed to parse conversations.history response")?;

            if !resp.ok {
                let error_msg = resp.error.as_deref().unwrap_or("unknown error");

                if error_msg == ERROR_NOT_IN_CHANNEL && !tried_join {
                    info!(channel_id, "not in channel, joining before reading history");
                    self.join_channel(channel_id).await?;
                    tried_join = true;
                    continue;
                }

                anyhow::bail!(
                    "conversations.history returned ok=false: {} (channel: {})",
                    error_msg,
                    channel_id
                );
            }

            pages += 1;
            all_messages.extend(resp.messages.unwrap_or_default());
            cursor = next_cursor(resp.response_metadata);

            if cursor.is_none() {
                break;
            }
        }

        debug!(
            channel_id,
            pages,
            messages = all_messages.len(),
            "fetched conversation history"
        );
        Ok(all_messages)
    }

    /// `Ok(None)` when Slack does not know the user.
    pub async fn user_info(&self, user_id: &str) -> Result<Option<SlackUser>> {
        let params = vec![("user", user_id)];

        let response = self
            .execute_request(
                self.http
                    .get(self.api_url(USERS_INFO))
                    .header("Authorization", format!("Bearer {}", self.token))
                    .query(&params),
                USERS_INFO,
            )
            .await
            .with_context(|| format!("Failed to request users.info for user {}", user_id))?;

        let resp: UsersInfoResponse = response
            .json()
            .await
            .context("Failed to parse users.info response")?;

        if !resp.ok {
            let error_msg = resp.error.as_deref().unwrap_or("unknown error");
            if error_msg == ERROR_USER_NOT_FOUND {
                return Ok(None);
            }
            anyhow::bail!(
                "users.info returned ok=false: {} (user: {})",
                error_msg,
                user_id
            );
        }

        resp.user
            .map(Some)
            .context("users.info response did not include a user")
    }

    pub async fn post_message(&self, channel: &str, text: &str) -> Result<SlackPostedMessage> {
        let payload = json!({
            "channel": channel,
            "text": text,
        });

        let response = self
            .execute_request(
                self.http
                    .post(self.api_url(CHAT_POST_MESSAGE))
                    .header("Authorization", format!("Bearer {}", self.token))
                    .json(&payload),
                CHAT_POST_MESSAGE,
            )
            .await
            .with_context(|| format!("Failed to request chat.postMessage for channel {}", channel))?;

        let resp: ChatPostMessageResponse = response
            .json()
            .await
            .context("Failed to parse chat.postMessage response")?;

        if !resp.ok {
            let error_msg = resp.error.as_deref().unwrap_or("unknown error");
            anyhow::bail!(
                "chat.postMessage returned ok=false: {} (channel: {})",
                error_msg,
                channel
            );
        }

        Ok(SlackPostedMessage {
            channel: resp.channel.unwrap_or_else(|| channel.to_string()),
            ts: resp.ts.unwrap_or_default(),
        })
    }

    pub(super) async fn execute_request(
        &self,
        builder: RequestBuilder,
        label: &str,
    ) -> Result<Response> {
        let base_builder = builder;

        loop {
            let request = base_builder
                .try_clone()
                .context("Unable to clone Slack request for retry")?;

            let response = request
                .send()
                .await
                .with_context(|| format!("Failed to send {}", label))?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                let wait = retry_after(&response);
                warn!(
                    endpoint = label,
                    wait_secs = wait.as_secs(),
                    "rate limited, waiting before retrying"
                );
                sleep(wait).await;
                continue;
            }

            if !response.status().is_success() {
                anyhow::bail!("{} returned status: {}", label, response.status());
            }

            return Ok(response);
        }
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_base, endpoint)
    }
}

/// Slack timestamps are `<unix seconds>.<microseconds>`.
pub fn slack_ts(at: DateTime<Utc>) -> String {
    format!("{}.{:06}", at.timestamp(), at.timestamp_subsec_micros())
}

fn next_cursor(metadata: Option<ResponseMetadata>) -> Option<String> {
    metadata
        .and_then(|meta| meta.next_cursor)
        .filter(|cursor| !cursor.is_empty())
}

fn retry_after(response: &Response) -> Duration {
    response
        .headers()
        .get("Retry-After")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_RETRY_AFTER_SECS))
}
