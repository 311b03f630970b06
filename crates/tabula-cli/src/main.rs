use anyhow::Result;
use tabula::Config;
use tabula_cli::TabulaCli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = TabulaCli::with_config(Config::load(None)?);
    cli.parse_and_run().await
}
