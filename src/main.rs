use pageserve::config::Config;
use pageserve::server::Server;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    info!(
        root = %cfg.static_files.root.display(),
        workers = cfg.server.max_workers,
        backlog = cfg.server.backlog,
        "Starting pageserve"
    );

    let server = Server::bind(&cfg).await?;

    server
        .serve_until(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => {
                    // Without a handler the server runs until the accept loop fails.
                    warn!(error = %e, "cannot listen for ctrl-c");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await?;

    Ok(())
}
