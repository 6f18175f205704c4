use anyhow::Result;
use async_trait::async_trait;
use clap::Args;

use crate::app::AppContext;
use crate::commands::{collect_results, digest_targets, CliCommand, WindowArgs};
use crate::render;

#[derive(Args, Debug, Clone, Default)]
#[command(about = "Render the digests and print them instead of posting")]
pub struct PreviewCommand {
    #[command(flatten)]
    pub window: WindowArgs,
    /// Only render the digest for this channel
    #[arg(long)]
    pub channel: Option<String>,
}

#[async_trait]
impl CliCommand for PreviewCommand {
    async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let window = self.window.window(ctx)?;
        let client = ctx.slack_client()?;
        let results = collect_results(ctx, &client, &window).await?;

        for target in digest_targets(&results, self.channel.as_deref())? {
            let text = render::render_digest(&results, &target.channel.name, window.days())?;
            println!("==== {} ({}) ====", target.channel.name, target.channel_id);
            println!("{text}\n");
        }
        Ok(())
    }
}
