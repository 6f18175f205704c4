use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Args;

use crate::app::AppContext;
use crate::commands::{collect_results, CliCommand, WindowArgs};

#[derive(Args, Debug, Clone, Default)]
#[command(about = "Collect and print per-channel stats without rendering a digest")]
pub struct StatsCommand {
    #[command(flatten)]
    pub window: WindowArgs,
    /// Print the raw results as JSON
    #[arg(long)]
    pub json: bool,
}

#[async_trait]
impl CliCommand for StatsCommand {
    async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let window = self.window.window(ctx)?;
        let client = ctx.slack_client()?;
        let results = collect_results(ctx, &client, &window).await?;

        if self.json {
            let rendered =
                serde_json::to_string_pretty(&results).context("Failed to serialize results")?;
            println!("{rendered}");
            return Ok(());
        }

        println!(
            "Channel activity for the last {} days (since {})",
            window.days(),
            window.oldest()
        );
        for result in &results {
            println!(
                "\n{} {} ({}): {} topics | {} replies | {} reactions | {} active users",
                result.channel.icon,
                result.channel.name,
                result.channel_id,
                result.stats.questions,
                result.stats.replies,
                result.stats.reactions,
                result.stats.active_users.len()
            );
            if result.contributors.is_empty() {
                println!("  No contributors in this window.");
            }
            for (idx, user) in result.contributors.iter().enumerate() {
                println!(
                    "  {}. {} ({}): {}",
                    idx + 1,
                    user.display_name,
                    user.user_id,
                    user.count
                );
            }
        }
        Ok(())
    }
}
