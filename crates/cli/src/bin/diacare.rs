use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    diacare_cli::main_entry().await
}
