#[tokio::main]
async fn main() -> anyhow::Result<()> {
    batepapo::run().await
}
