use chrono::{DateTime, Duration, Utc};

use crate::error::{DigestError, Result};

pub const DEFAULT_WINDOW_DAYS: u32 = 30;
/// Ten years; anything longer is a typo rather than a digest.
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Trailing window of `days` ending at `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    days: u32,
    now: DateTime<Utc>,
}

impl Window {
    pub fn trailing(days: u32, now: DateTime<Utc>) -> Result<Self> {
        if !(1..=MAX_WINDOW_DAYS).contains(&days) {
            return Err(DigestError::InvalidWindow(days));
        }
        Ok(Self { days, now })
    }

    pub fn ending_now(days: u32) -> Result<Self> {
        Self::trailing(days, Utc::now())
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// Inclusive lower bound; the window has no upper bound other than `now`.
    pub fn oldest(&self) -> DateTime<Utc> {
        self.now - Duration::days(i64::from(self.days))
    }
}
