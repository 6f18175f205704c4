pub mod post;
pub mod preview;
pub mod stats;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use digest_core::{CachedUserLookup, ChannelResult, Orchestrator, Window, MAX_WINDOW_DAYS};

use crate::app::AppContext;
use crate::slack::SlackClient;

pub use post::PostCommand;
pub use preview::PreviewCommand;
pub use stats::StatsCommand;

#[async_trait]
pub trait CliCommand {
    async fn execute(&self, ctx: &AppContext) -> Result<()>;
}

#[derive(Parser, Debug, Clone)]
#[command(name = "channel-digest", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: RootCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RootCommand {
    Stats(StatsCommand),
    Preview(PreviewCommand),
    Post(PostCommand),
}

impl Cli {
    pub async fn execute(self, ctx: &AppContext) -> Result<()> {
        match self.command {
            RootCommand::Stats(cmd) => cmd.execute(ctx).await,
            RootCommand::Preview(cmd) => cmd.execute(ctx).await,
            RootCommand::Post(cmd) => cmd.execute(ctx).await,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// Length of the trailing window. Defaults to DIGEST_WINDOW_DAYS or 30
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_WINDOW_DAYS)))]
    pub days: Option<u32>,
}

impl WindowArgs {
    pub fn window(&self, ctx: &AppContext) -> Result<Window> {
        let days = match self.days {
            Some(days) => days,
            None => ctx.config()?.window_days,
        };
        Ok(Window::ending_now(days)?)
    }
}

/// Stats for every configured channel. Either all channels succeed or the run fails.
pub(crate) async fn collect_results(
    ctx: &AppContext,
    client: &SlackClient,
    window: &Window,
) -> Result<Vec<ChannelResult>> {
    let cfg = ctx.config()?;
    let users = CachedUserLookup::new(client);
    let orchestrator = Orchestrator::new(client, client, &users);
    orchestrator
        .collect(&cfg.channels, window)
        .await
        .context("Failed to collect channel stats")
}

/// Channels that get a digest: the one named on the command line, or every channel flagged `post`.
pub(crate) fn digest_targets<'a>(
    results: &'a [ChannelResult],
    only: Option<&str>,
) -> Result<Vec<&'a ChannelResult>> {
    match only {
        Some(name) => {
            let result = results
                .iter()
                .find(|result| result.channel.name == name)
                .with_context(|| format!("channel `{name}` is not in the configured channel list"))?;
            Ok(vec![result])
        }
        None => Ok(results.iter().filter(|result| result.channel.post).collect()),
    }
}
