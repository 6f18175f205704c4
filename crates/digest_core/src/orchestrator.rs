use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::adapters::{ChannelDirectory, EventSource, UserLookup};
use crate::error::Result;
use crate::ranker::{rank, UserStat};
use crate::stats::Stats;
use crate::window::Window;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    /// Emoji token shown in front of the channel's line, e.g. `:android:`.
    pub icon: String,
    /// Whether the channel receives its own digest.
    #[serde(default = "default_post")]
    pub post: bool,
}

fn default_post() -> bool {
    true
}

impl ChannelConfig {
    pub fn new(name: &str, icon: &str) -> Self {
        Self {
            name: name.to_string(),
            icon: icon.to_string(),
            post: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelResult {
    pub channel: ChannelConfig,
    pub channel_id: String,
    pub stats: Stats,
    pub contributors: Vec<UserStat>,
}

/// Progress of a single channel through a run. Strictly linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStage {
    Unresolved,
    IdentifierResolved,
    EventsRetrieved,
    Accumulated,
    Ranked,
    Finalized,
}

impl ChannelStage {
    pub fn next(self) -> Self {
        match self {
            ChannelStage::Unresolved => ChannelStage::IdentifierResolved,
            ChannelStage::IdentifierResolved => ChannelStage::EventsRetrieved,
            ChannelStage::EventsRetrieved => ChannelStage::Accumulated,
            ChannelStage::Accumulated => ChannelStage::Ranked,
            ChannelStage::Ranked | ChannelStage::Finalized => ChannelStage::Finalized,
        }
    }
}

/// Describes the work a channel is doing while in this stage.
impl fmt::Display for ChannelStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChannelStage::Unresolved => "resolving the channel id",
            ChannelStage::IdentifierResolved => "fetching history",
            ChannelStage::EventsRetrieved => "accumulating stats",
            ChannelStage::Accumulated => "ranking contributors",
            ChannelStage::Ranked => "finalizing",
            ChannelStage::Finalized => "finalized",
        };
        f.write_str(label)
    }
}

/// Drives every configured channel through resolve, fetch, accumulate and rank.
pub struct Orchestrator<'a, D: ?Sized, E: ?Sized, U: ?Sized> {
    directory: &'a D,
    events: &'a E,
    users: &'a U,
}

impl<'a, D, E, U> Orchestrator<'a, D, E, U>
where
    D: ChannelDirectory + ?Sized,
    E: EventSource + ?Sized,
    U: UserLookup + ?Sized,
{
    pub fn new(directory: &'a D, events: &'a E, users: &'a U) -> Self {
        Self {
            directory,
            events,
            users,
        }
    }

    /// Results for every channel, in configured order. The first failure aborts
    /// the run and nothing is returned for the channels that did succeed.
    pub async fn collect(
        &self,
        channels: &[ChannelConfig],
        window: &Window,
    ) -> Result<Vec<ChannelResult>> {
        info!(
            channels = channels.len(),
            days = window.days(),
            oldest = %window.oldest(),
            "collecting channel stats"
        );
        let mut results = Vec::with_capacity(channels.len());
        for channel in channels {
            results.push(self.channel_result(channel, window).await?);
        }
        Ok(results)
    }

    pub async fn channel_result(
        &self,
        channel: &ChannelConfig,
        window: &Window,
    ) -> Result<ChannelResult> {
        let name = channel.name.as_str();
        let mut stage = ChannelStage::Unresolved;

        let channel_id = self
            .directory
            .resolve_channel_id(name)
            .await
            .map_err(|err| err.at_stage(name, stage))?;
        stage = advance(name, stage);
        info!(channel = name, channel_id = %channel_id, "found conversation id");

        let events = self
            .events
            .fetch_events(&channel_id, window.oldest())
            .await
            .map_err(|err| err.at_stage(name, stage))?;
        stage = advance(name, stage);

        let stats = Stats::from_events(&events).map_err(|err| err.at_stage(name, stage))?;
        stage = advance(name, stage);
        info!(
            channel = name,
            messages = events.len(),
            questions = stats.questions,
            replies = stats.replies,
            reactions = stats.reactions,
            active_users = stats.active_users.len(),
            "accumulated channel stats"
        );

        let contributors = rank(&stats, self.users)
            .await
            .map_err(|err| err.at_stage(name, stage))?;
        stage = advance(name, stage);
        let stage = advance(name, stage);
        debug_assert_eq!(stage, ChannelStage::Finalized);

        Ok(ChannelResult {
            channel: channel.clone(),
            channel_id,
            stats,
            contributors,
        })
    }
}

fn advance(channel: &str, stage: ChannelStage) -> ChannelStage {
    let next = stage.next();
    debug!(channel, from = ?stage, to = ?next, "channel stage");
    next
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::adapters::UserProfile;
    use crate::error::DigestError;
    use crate::event::{Event, Reaction};

    #[derive(Default)]
    struct StubSlack {
        channels: HashMap<String, String>,
        history: HashMap<String, Vec<Event>>,
        bots: Vec<String>,
        unknown_users: Vec<String>,
        broken_history: Vec<String>,
        requested_oldest: Mutex<Vec<DateTime<Utc>>>,
    }

    impl StubSlack {
        fn with_channel(mut self, name: &str, id: &str, events: Vec<Event>) -> Self {
            self.channels.insert(name.to_string(), id.to_string());
            self.history.insert(id.to_string(), events);
            self
        }
    }

    #[async_trait]
    impl ChannelDirectory for StubSlack {
        async fn resolve_channel_id(&self, name: &str) -> Result<String> {
            self.channels
                .get(name)
                .cloned()
                .ok_or_else(|| DigestError::ChannelNotFound(name.to_string()))
        }
    }

    #[async_trait]
    impl EventSource for StubSlack {
        async fn fetch_events(
            &self,
            channel_id: &str,
            oldest: DateTime<Utc>,
        ) -> Result<Vec<Event>> {
            self.requested_oldest.lock().unwrap().push(oldest);
            if self.broken_history.iter().any(|id| id == channel_id) {
                return Err(anyhow::anyhow!("conversations.history returned status: 502").into());
            }
            Ok(self.history.get(channel_id).cloned().unwrap_or_default())
        }
    }

    #[async_trait]
    impl UserLookup for StubSlack {
        async fn lookup_user(&self, user_id: &str) -> Result<UserProfile> {
            if self.unknown_users.iter().any(|id| id == user_id) {
                return Err(DigestError::UserNotFound(user_id.to_string()));
            }
            Ok(UserProfile {
                display_name: user_id.to_lowercase(),
                is_bot: self.bots.iter().any(|id| id == user_id),
            })
        }
    }

    fn post(user: &str, replies: &[&str], reactions: u64) -> Event {
        Event {
            user: Some(user.to_string()),
            reply_users: (!replies.is_empty())
                .then(|| replies.iter().map(|id| id.to_string()).collect()),
            reply_count: (!replies.is_empty()).then_some(replies.len() as u64),
            reactions: (reactions > 0).then(|| {
                vec![Reaction {
                    name: "heart".to_string(),
                    count: reactions,
                }]
            }),
            ..Default::default()
        }
    }

    fn channels() -> Vec<ChannelConfig> {
        vec![
            ChannelConfig::new("android-talks", ":android:"),
            ChannelConfig::new("ios-talks", ":apple:"),
        ]
    }

    fn window() -> Window {
        Window::trailing(30, Utc.with_ymd_and_hms(2024, 5, 31, 8, 0, 0).unwrap()).unwrap()
    }

    fn slack() -> StubSlack {
        StubSlack {
            bots: vec!["UBOT".to_string()],
            ..Default::default()
        }
        .with_channel(
            "android-talks",
            "C1",
            vec![
                post("UANNA", &["UBOB", "UBOT"], 2),
                post("UBOB", &[], 0),
                post("UANNA", &[], 1),
            ],
        )
        .with_channel("ios-talks", "C2", vec![post("UCARL", &["UANNA"], 0)])
    }

    #[tokio::test]
    async fn collects_every_channel_in_order() {
        let slack = slack();
        let orchestrator = Orchestrator::new(&slack, &slack, &slack);

        let results = orchestrator.collect(&channels(), &window()).await.unwrap();
        assert_eq!(results.len(), 2);

        let android = &results[0];
        assert_eq!(android.channel.name, "android-talks");
        assert_eq!(android.channel_id, "C1");
        assert_eq!(android.stats.questions, 3);
        assert_eq!(android.stats.replies, 2);
        assert_eq!(android.stats.reactions, 3);
        let ranked: Vec<(&str, u64)> = android
            .contributors
            .iter()
            .map(|user| (user.user_id.as_str(), user.count))
            .collect();
        assert_eq!(ranked, vec![("UANNA", 2), ("UBOB", 2)]);

        let ios = &results[1];
        assert_eq!(ios.stats.questions, 1);
        assert_eq!(ios.stats.active_users.len(), 2);
        assert_eq!(ios.contributors[0].display_name, "uanna");
    }

    #[tokio::test]
    async fn every_fetch_uses_the_window_lower_bound() {
        let slack = slack();
        let orchestrator = Orchestrator::new(&slack, &slack, &slack);
        let window = window();

        orchestrator.collect(&channels(), &window).await.unwrap();
        let requested = slack.requested_oldest.lock().unwrap().clone();
        assert_eq!(requested, vec![window.oldest(), window.oldest()]);
    }

    #[tokio::test]
    async fn unknown_channel_fails_the_whole_run() {
        let slack = slack();
        let orchestrator = Orchestrator::new(&slack, &slack, &slack);
        let mut configured = channels();
        configured.push(ChannelConfig::new("flutter-talks", ":flutter:"));

        let err = orchestrator
            .collect(&configured, &window())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DigestError::Stage {
                stage: ChannelStage::Unresolved,
                ..
            }
        ));
        assert!(matches!(err.root(), DigestError::ChannelNotFound(name) if name == "flutter-talks"));
    }

    #[tokio::test]
    async fn history_failure_fails_the_whole_run() {
        let mut slack = slack();
        slack.broken_history.push("C2".to_string());
        let orchestrator = Orchestrator::new(&slack, &slack, &slack);

        let outcome = orchestrator.collect(&channels(), &window()).await;
        let err = match outcome {
            Ok(results) => panic!("expected failure, got {} results", results.len()),
            Err(err) => err,
        };
        match &err {
            DigestError::Stage { channel, stage, .. } => {
                assert_eq!(channel, "ios-talks");
                assert_eq!(*stage, ChannelStage::IdentifierResolved);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(err.root(), DigestError::Upstream(_)));
        assert_eq!(slack.requested_oldest.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_contributor_fails_during_ranking() {
        let mut slack = slack();
        slack.unknown_users.push("UCARL".to_string());
        let orchestrator = Orchestrator::new(&slack, &slack, &slack);

        let err = orchestrator
            .collect(&channels(), &window())
            .await
            .unwrap_err();
        match err {
            DigestError::Stage {
                channel, stage, ..
            } => {
                assert_eq!(channel, "ios-talks");
                assert_eq!(stage, ChannelStage::Accumulated);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn authorless_topic_is_a_data_error() {
        let slack = StubSlack::default().with_channel(
            "android-talks",
            "C1",
            vec![Event {
                ts: Some("1717000000.000100".to_string()),
                ..Default::default()
            }],
        );
        let orchestrator = Orchestrator::new(&slack, &slack, &slack);

        let err = orchestrator
            .channel_result(&ChannelConfig::new("android-talks", ":android:"), &window())
            .await
            .unwrap_err();
        assert!(matches!(err.root(), DigestError::MissingAuthor { .. }));
    }

    #[tokio::test]
    async fn stats_do_not_leak_between_channels() {
        let slack = StubSlack::default()
            .with_channel("a", "C1", vec![post("U1", &[], 5)])
            .with_channel("b", "C2", Vec::new());
        let orchestrator = Orchestrator::new(&slack, &slack, &slack);

        let results = orchestrator
            .collect(
                &[ChannelConfig::new("a", ":a:"), ChannelConfig::new("b", ":b:")],
                &window(),
            )
            .await
            .unwrap();
        assert_eq!(results[1].stats, Stats::default());
        assert!(results[1].contributors.is_empty());
    }

    #[test]
    fn stages_advance_linearly() {
        let mut stage = ChannelStage::Unresolved;
        let mut seen = vec![stage];
        while stage != ChannelStage::Finalized {
            stage = stage.next();
            seen.push(stage);
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(ChannelStage::Finalized.next(), ChannelStage::Finalized);
    }

    #[test]
    fn channel_config_defaults_post_to_true() {
        let config: ChannelConfig =
            serde_json::from_str(r#"{"name": "ios-talks", "icon": ":apple:"}"#).unwrap();
        assert!(config.post);
    }
}
