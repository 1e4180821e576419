mod api;
mod channel;
mod scheduler;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    channel::ChannelMap,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = chansync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = chansync_db::PoolConfig::from_app_config(&config);
    let pool = chansync_db::connect_pool(&config.database_url, pool_config).await?;
    chansync_db::run_migrations(&pool).await?;

    let channels = ChannelMap::new();
    let scheduler =
        scheduler::start_background_jobs(pool.clone(), &config, channels.clone()).await?;

    let app = build_app(AppState { pool, channels });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "chansync server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop issuing job ticks once the listener has drained.
    if let Some(mut scheduler) = scheduler {
        scheduler.shutdown().await?;
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
