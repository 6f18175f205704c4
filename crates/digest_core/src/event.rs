use serde::{Deserialize, Serialize};

/// A single entry of a channel's message history.
///
/// Field names follow Slack's `conversations.history` message objects so the
/// API payload can be decoded directly; anything else on the wire is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    /// Set on system messages (joins, topic changes, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Authors of the thread replies, as reported on the parent message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_users: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reactions: Option<Vec<Reaction>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    #[serde(default)]
    pub name: String,
    pub count: u64,
}

impl Event {
    /// System and bot messages are never counted as topics.
    pub fn is_topic(&self) -> bool {
        self.subtype.is_none() && self.bot_id.is_none()
    }

    pub fn reaction_total(&self) -> Option<u64> {
        self.reactions
            .as_ref()
            .map(|reactions| reactions.iter().map(|reaction| reaction.count).sum())
    }
}
