mod api;
mod client;
mod types;


pub use api::slack_ts;
pub use client::SlackClient;
pub use types::{SlackConversation, SlackPostedMessage, SlackUser, API_BASE};
