use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    digest_cli::app::run().await
}
