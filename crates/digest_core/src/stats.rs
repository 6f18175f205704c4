use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DigestError, Result};
use crate::event::Event;

/// Running totals for one channel's window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub questions: u64,
    /// Authored topics plus thread replies, per user id.
    pub active_users: HashMap<String, u64>,
    pub replies: u64,
    pub reactions: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events<'a, I>(events: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Event>,
    {
        let mut stats = Self::new();
        stats.ingest_all(events)?;
        Ok(stats)
    }

    pub fn credit(&mut self, user_id: &str) {
        *self.active_users.entry(user_id.to_string()).or_insert(0) += 1;
    }

    /// Folds one event into the totals.
    ///
    /// A topic without an author is rejected before anything is touched, so a
    /// failed call leaves the stats as they were.
    pub fn ingest(&mut self, event: &Event) -> Result<()> {
        if event.is_topic() {
            let author = event.user.as_deref().ok_or_else(|| DigestError::MissingAuthor {
                ts: event.ts.clone(),
            })?;
            self.questions += 1;
            self.credit(author);
        } else {
            debug!(
                ts = event.ts.as_deref().unwrap_or_default(),
                subtype = event.subtype.as_deref().unwrap_or_default(),
                bot_id = event.bot_id.as_deref().unwrap_or_default(),
                "skipping non-topic message"
            );
        }

        if let Some(reply_users) = &event.reply_users {
            for user_id in reply_users {
                self.credit(user_id);
            }
        }
        if let Some(reply_count) = event.reply_count {
            self.replies += reply_count;
        }
        if let Some(total) = event.reaction_total() {
            self.reactions += total;
        }
        Ok(())
    }

    pub fn ingest_all<'a, I>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Event>,
    {
        for event in events {
            self.ingest(event)?;
        }
        Ok(())
    }
}
