use anyhow::{Context, Result};
use utility_mcp::{
    config::AppConfig, metrics_server, observability, router, AppState, ConnectionManager,
    ServerIdentity, ToolDispatcher,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    // A failed first connection is fatal; later outages only flip health.
    let connection =
        ConnectionManager::connect(cfg.mongodb_uri()?, &cfg.mongodb, &cfg.server.name).await?;

    let dispatcher =
        ToolDispatcher::new(connection.store(), cfg.analytics.unrecognized_customer_types);
    let state = AppState::new(
        dispatcher,
        connection.state(),
        ServerIdentity::new(&cfg.server.name),
    );

    let bind_addr = cfg.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "utility MCP server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    connection.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
