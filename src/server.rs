//! HTTP server lifecycle: bind, serve with an empty engine slot, load the artifacts
//! in the background and install the engine once they pass validation.

use crate::config::Config;
use crate::engine::{Engine, EngineSlot, LoadError, LoadReport};
use anyhow::Context;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = SocketAddr::new(config.bind_addr, config.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    serve(
        listener,
        config,
        EngineSlot::new(),
        CancellationToken::new(),
        Engine::load,
    )
    .await
}

/// Serves on `listener` while `load` runs on the blocking pool. A successful load is
/// installed into `slot`; a failed one marks the slot failed, stops the server and is
/// returned as the error. Otherwise returns once `shutdown_token` is cancelled or a
/// shutdown signal arrives.
pub async fn serve<L>(
    listener: TcpListener,
    config: Config,
    slot: EngineSlot,
    shutdown_token: CancellationToken,
    load: L,
) -> anyhow::Result<()>
where
    L: FnOnce(&Config) -> Result<(Engine, LoadReport), LoadError> + Send + 'static,
{
    let app = crate::api::router(slot.clone(), config.clone());
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "listening");
    }
    tracing::info!("Process ID: {}", std::process::id());

    let server = tokio::spawn({
        let token = shutdown_token.clone();
        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal(token))
                .await
        }
    });

    let loaded = tokio::task::spawn_blocking(move || load(&config))
        .await
        .context("artifact loader panicked")?;

    match loaded {
        Ok((engine, report)) => {
            slot.install(engine);
            tracing::info!(books = report.books, "ready");
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to load recommender");
            slot.fail(err.to_string());
            shutdown_token.cancel();
            let _ = server.await;
            return Err(err).context("load recommender artifacts");
        }
    }

    server.await.context("server task failed")??;
    tracing::info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down...");
        },
        _ = token.cancelled() => {
            tracing::info!("Shutdown requested...");
        },
    }

    token.cancel();
}
