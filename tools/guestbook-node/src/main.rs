use anyhow::Context;
use clap::Parser;
use guestbook_node::{build_router, open_runtime, NodeConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = NodeConfig::parse();
    let runtime = open_runtime(&config).context("failed to open ledger storage")?;

    if config.temporary {
        tracing::info!("using temporary storage");
    } else {
        tracing::info!(path = %config.data_dir().display(), "using persistent storage");
    }

    let app = build_router(runtime.clone());
    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    tracing::info!(
        contract = %config.contract_id,
        addr = %config.listen,
        "guest book node listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server failed")?;

    runtime.store().flush()?;
    tracing::info!("storage flushed, exiting");
    Ok(())
}
