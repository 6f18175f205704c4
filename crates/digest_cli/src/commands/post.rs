use anyhow::Result;
use async_trait::async_trait;
use clap::Args;
use tracing::info;

use crate::app::AppContext;
use crate::commands::{collect_results, digest_targets, CliCommand, WindowArgs};
use crate::render;

#[derive(Args, Debug, Clone, Default)]
#[command(about = "Render the digests and post each one into its channel")]
pub struct PostCommand {
    #[command(flatten)]
    pub window: WindowArgs,
    /// Only post the digest for this channel
    #[arg(long)]
    pub channel: Option<String>,
    /// Send every digest to this channel id instead, e.g. a private test channel
    #[arg(long)]
    pub target: Option<String>,
}

#[async_trait]
impl CliCommand for PostCommand {
    async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let window = self.window.window(ctx)?;
        let client = ctx.slack_client()?;
        let results = collect_results(ctx, &client, &window).await?;

        // Render everything up front so a template failure posts nothing.
        let mut outgoing = Vec::new();
        for target in digest_targets(&results, self.channel.as_deref())? {
            let text = render::render_digest(&results, &target.channel.name, window.days())?;
            let destination = self
                .target
                .clone()
                .unwrap_or_else(|| target.channel_id.clone());
            outgoing.push((target.channel.name.as_str(), destination, text));
        }

        for (channel, destination, text) in &outgoing {
            let posted = client.post_message(destination, text).await?;
            info!(
                channel = %channel,
                destination = %posted.channel,
                ts = %posted.ts,
                "posted digest"
            );
        }
        Ok(())
    }
}
