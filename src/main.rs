use anyhow::{Context, Result};
use milvus_store::config::env::load_env_files;
use milvus_store::{MilvusConfig, MilvusStore};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Ensures the collection described by `MILVUS_*` variables exists on the cluster.
#[tokio::main]
async fn main() -> Result<()> {
    load_env_files();

    // Logs go to stderr; override the level with RUST_LOG (e.g., RUST_LOG=debug)
    let env_filter = EnvFilter::try_from_env("RUST_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();

    let config = MilvusConfig::from_env().context("Invalid Milvus configuration")?;
    tracing::debug!("Using configuration: {:?}", config);

    let store = MilvusStore::connect(config)?;
    store.create_collection().await?;

    Ok(())
}
