mod api;
mod middleware;
mod scheduler;

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    scheduler::{DemoteStaleUsers, LifecycleCoordinator},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = usrsvc_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::info!(env = %config.env, routine = ?config.routine, "starting usrsvc-server");

    let pool_config = usrsvc_db::PoolConfig::from_app_config(&config);
    let pool = usrsvc_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = usrsvc_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database migrations up to date");

    let coordinator = Arc::new(LifecycleCoordinator::start(
        config.routine,
        DemoteStaleUsers::new(pool.clone(), config.stale_after_months),
    )?);

    let app = build_app(AppState { pool });
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");

    let shutdown = CancellationToken::new();
    let mut server = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
        }
    });

    let exited_early = tokio::select! {
        signal = shutdown_signal() => {
            if let Err(e) = signal {
                tracing::error!(error = %e, "failed to listen for shutdown signals");
            }
            tracing::info!("received shutdown signal, starting graceful shutdown");
            None
        }
        served = &mut server => Some(served),
    };

    shutdown.cancel();
    tracing::debug!(phase = ?coordinator.phase(), "stopping scheduler");
    coordinator.request_stop().await;

    match exited_early {
        Some(served) => served??,
        None => {
            let grace = Duration::from_secs(config.shutdown_grace_secs);
            match tokio::time::timeout(grace, server).await {
                Ok(served) => served??,
                Err(_) => tracing::warn!(
                    grace_secs = config.shutdown_grace_secs,
                    "HTTP server did not drain within the grace period"
                ),
            }
        }
    }

    tracing::info!("shutdown complete");
    Ok(())
}

/// Completes on Ctrl-C, SIGINT or SIGTERM.
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = sigint.recv() => {},
            _ = sigterm.recv() => {},
        }
        Ok(())
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await
}
