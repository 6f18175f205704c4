use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use digest_core::{ChannelConfig, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};

use crate::slack::API_BASE;

const SLACK_TOKEN_VAR: &str = "SLACK_BOT_TOKEN";
const SLACK_API_BASE_VAR: &str = "SLACK_API_BASE";
const REQUEST_TIMEOUT_VAR: &str = "SLACK_REQUEST_TIMEOUT_SECS";
const WINDOW_DAYS_VAR: &str = "DIGEST_WINDOW_DAYS";
const CHANNELS_FILE_VAR: &str = "DIGEST_CHANNELS_FILE";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub slack_token: String,
    pub slack_api_base: String,
    pub request_timeout: Duration,
    pub window_days: u32,
    pub channels: Vec<ChannelConfig>,
}

pub fn load_config() -> Result<Config> {
    dotenvy::dotenv().ok();
    config_from(|key| env::var(key).ok())
}

/// Builds the config from any variable source; `load_config` passes the process environment.
pub fn config_from<F>(var: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let slack_token = var(SLACK_TOKEN_VAR)
        .map(|token| token.trim().to_owned())
        .filter(|token| !token.is_empty())
        .context("SLACK_BOT_TOKEN not found. Export a bot token (xoxb-...) or add it to .env.")?;

    let slack_api_base = var(SLACK_API_BASE_VAR).unwrap_or_else(|| API_BASE.to_string());

    let request_timeout = match var(REQUEST_TIMEOUT_VAR) {
        Some(raw) => Duration::from_secs(raw.trim().parse::<u64>().with_context(|| {
            format!("SLACK_REQUEST_TIMEOUT_SECS `{raw}` is not a whole number of seconds")
        })?),
        None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
    };

    let window_days = match var(WINDOW_DAYS_VAR) {
        Some(raw) => parse_window_days(&raw)?,
        None => DEFAULT_WINDOW_DAYS,
    };

    let channels = match var(CHANNELS_FILE_VAR) {
        Some(path) => load_channels_file(&PathBuf::from(path))?,
        None => default_channels(),
    };

    Ok(Config {
        slack_token,
        slack_api_base,
        request_timeout,
        window_days,
        channels,
    })
}

pub fn default_channels() -> Vec<ChannelConfig> {
    vec![
        ChannelConfig::new("android-talks", ":android:"),
        ChannelConfig::new("ios-talks", ":apple:"),
        ChannelConfig::new("flutter-talks", ":flutter:"),
        ChannelConfig::new("frontend-talks", ":spider_web:"),
    ]
}

/// Reads a YAML list of `{name, icon, post}` entries.
pub fn load_channels_file(path: &Path) -> Result<Vec<ChannelConfig>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read channels file {}", path.display()))?;
    let channels: Vec<ChannelConfig> = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse channels file {}", path.display()))?;

    if channels.is_empty() {
        anyhow::bail!("channels file {} lists no channels", path.display());
    }
    for (idx, channel) in channels.iter().enumerate() {
        if channels[..idx].iter().any(|other| other.name == channel.name) {
            anyhow::bail!(
                "channel `{}` appears more than once in {}",
                channel.name,
                path.display()
            );
        }
    }
    Ok(channels)
}

fn parse_window_days(raw: &str) -> Result<u32> {
    let days = raw
        .trim()
        .parse::<u32>()
        .with_context(|| format!("DIGEST_WINDOW_DAYS `{raw}` is not a whole number of days"))?;
    if days == 0 {
        anyhow::bail!("DIGEST_WINDOW_DAYS must be at least 1");
    }
    if days > MAX_WINDOW_DAYS {
        anyhow::bail!("DIGEST_WINDOW_DAYS must be at most {MAX_WINDOW_DAYS}");
    }
    Ok(days)
}
