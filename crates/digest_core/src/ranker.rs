use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapters::{UserLookup, UserProfile};
use crate::error::Result;
use crate::stats::Stats;

/// The workspace's own automation account. Never ranked.
pub const SYSTEM_USER_ID: &str = "USLACKBOT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStat {
    pub user_id: String,
    pub display_name: String,
    pub count: u64,
}

pub fn is_system_identity(user_id: &str) -> bool {
    user_id == SYSTEM_USER_ID
}

/// Participation tallies ordered by count, highest first; equal counts by user id.
pub fn sorted_candidates(stats: &Stats) -> Vec<(&str, u64)> {
    let mut candidates: Vec<(&str, u64)> = stats
        .active_users
        .iter()
        .map(|(user_id, count)| (user_id.as_str(), *count))
        .collect();
    candidates.sort_by(|(left_id, left_count), (right_id, right_count)| {
        right_count
            .cmp(left_count)
            .then_with(|| left_id.cmp(right_id))
    });
    candidates
}

/// Builds the contributor list for one channel.
///
/// The system identity and bot accounts are dropped; everyone else keeps the
/// position they had after sorting. Any lookup failure aborts the whole ranking.
pub async fn rank<U>(stats: &Stats, users: &U) -> Result<Vec<UserStat>>
where
    U: UserLookup + ?Sized,
{
    let candidates = sorted_candidates(stats);
    let mut ranked = Vec::with_capacity(candidates.len());

    for (user_id, count) in candidates {
        if is_system_identity(user_id) {
            debug!(user_id, count, "skipping system user");
            continue;
        }
        let profile = users.lookup_user(user_id).await?;
        if profile.is_bot {
            debug!(user_id, name = %profile.display_name, count, "skipping bot user");
            continue;
        }
        ranked.push(UserStat {
            user_id: user_id.to_string(),
            display_name: profile.display_name,
            count,
        });
    }

    Ok(ranked)
}

/// Memoizes successful lookups for the lifetime of one run.
pub struct CachedUserLookup<'a, L: ?Sized> {
    inner: &'a L,
    profiles: Mutex<HashMap<String, UserProfile>>,
}

impl<'a, L: UserLookup + ?Sized> CachedUserLookup<'a, L> {
    pub fn new(inner: &'a L) -> Self {
        Self {
            inner,
            profiles: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, user_id: &str) -> Option<UserProfile> {
        self.profiles
            .lock()
            .ok()
            .and_then(|profiles| profiles.get(user_id).cloned())
    }
}

#[async_trait]
impl<L: UserLookup + ?Sized> UserLookup for CachedUserLookup<'_, L> {
    async fn lookup_user(&self, user_id: &str) -> Result<UserProfile> {
        if let Some(profile) = self.cached(user_id) {
            return Ok(profile);
        }
        let profile = self.inner.lookup_user(user_id).await?;
        if let Ok(mut profiles) = self.profiles.lock() {
            profiles.insert(user_id.to_string(), profile.clone());
        }
        Ok(profile)
    }
}
