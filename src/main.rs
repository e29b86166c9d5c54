#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storefront_lib::run().await
}
