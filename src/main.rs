#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mock_sso::app::run().await
}
