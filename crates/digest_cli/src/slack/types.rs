use digest_core::Event;
use serde::Deserialize;

pub const API_BASE: &str = "https://slack.com/api";
pub const CONVERSATIONS_LIST: &str = "conversations.list";
pub const CONVERSATIONS_HISTORY: &str = "conversations.history";
pub const CONVERSATIONS_JOIN: &str = "conversations.join";
pub const USERS_INFO: &str = "users.info";
pub const CHAT_POST_MESSAGE: &str = "chat.postMessage";
pub const CONVERSATION_TYPES: &str = "public_channel,private_channel";
pub const PAGE_LIMIT: &str = "200";
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

pub const ERROR_NOT_IN_CHANNEL: &str = "not_in_channel";
pub const ERROR_USER_NOT_FOUND: &str = "user_not_found";

#[derive(Debug, Deserialize)]
pub struct SlackConversation {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SlackUser {
    pub id: String,
    pub name: Option<String>,
    pub real_name: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
    pub profile: Option<SlackUserProfile>,
}

#[derive(Debug, Deserialize)]
pub struct SlackUserProfile {
    pub real_name: Option<String>,
}

impl SlackUser {
    /// `real_name`, then the profile's real name, then the handle, then the id.
    pub fn display_name(&self) -> String {
        [
            self.real_name.as_deref(),
            self.profile
                .as_ref()
                .and_then(|profile| profile.real_name.as_deref()),
            self.name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
        .unwrap_or(&self.id)
        .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackPostedMessage {
    pub channel: String,
    pub ts: String,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMetadata {
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ConversationsListResponse {
    pub ok: bool,
    pub channels: Option<Vec<SlackConversation>>,
    pub response_metadata: Option<ResponseMetadata>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ConversationsHistoryResponse {
    pub ok: bool,
    pub messages: Option<Vec<Event>>,
    pub response_metadata: Option<ResponseMetadata>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ConversationsJoinResponse {
    pub ok: bool,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UsersInfoResponse {
    pub ok: bool,
    pub user: Option<SlackUser>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatPostMessageResponse {
    pub ok: bool,
    pub channel: Option<String>,
    pub ts: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(value: serde_json::Value) -> SlackUser {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn display_name_prefers_real_name() {
        let user = user(json!({
            "id": "U1",
            "name": "anna",
            "real_name": "Anna Nowak",
            "profile": {"real_name": "Anna N."}
        }));
        assert_eq!(user.display_name(), "Anna Nowak");
        assert!(!user.is_bot);
    }

    #[test]
    fn display_name_falls_back_to_profile_then_handle_then_id() {
        assert_eq!(
            user(json!({"id": "U1", "name": "anna", "profile": {"real_name": "Anna N."}}))
                .display_name(),
            "Anna N."
        );
        assert_eq!(
            user(json!({"id": "U1", "name": "anna", "real_name": "  "})).display_name(),
            "anna"
        );
        assert_eq!(user(json!({"id": "U1"})).display_name(), "U1");
    }
}
