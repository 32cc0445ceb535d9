use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    langqueue_cli::cli::app::run().await
}
