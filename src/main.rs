use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use crl_monitor::{
    cli::Args,
    config::Config,
    crl::{ConfigStore, ConfigWatcher, CrlMetrics, CrlScheduler, HttpCrlFetcher, watcher},
    server::Server,
    telemetry,
};
use tokio::sync::oneshot;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    telemetry::init_tracing();

    let args = Args::parse();
    let config = Config::load()?;
    tracing::info!("Loaded configuration: {:?}", config);

    let store = ConfigStore::load(&args.config, args.refresh_interval)
        .wrap_err_with(|| format!("error loading config {}", args.config.display()))?;
    let store = Arc::new(store);

    // Without a watcher the startup config simply stays active
    let _watcher = match ConfigWatcher::spawn(Arc::clone(&store), watcher::DEFAULT_DEBOUNCE) {
        Ok(config_watcher) => Some(config_watcher),
        Err(e) => {
            tracing::warn!("Config hot reload disabled: {}", e);
            None
        }
    };

    let metrics = Arc::new(CrlMetrics::new());
    let fetcher = Arc::new(HttpCrlFetcher::new()?);
    let scheduler = CrlScheduler::new(store, fetcher, Arc::clone(&metrics));

    let server = Server::new(metrics, &config.server).await?;

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let scheduler_task = tokio::spawn(scheduler.run(async move {
        let _ = stop_rx.await;
    }));

    server.run_until(shutdown_signal()).await?;

    let _ = stop_tx.send(());
    scheduler_task.await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
}
