pub mod handlers;

use std::future::Future;
use std::sync::Arc;

use axum::{Router, routing::get};
use color_eyre::eyre::{Context, Result};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::crl::CrlMetrics;
use handlers::health::health_check;
use handlers::metrics::metrics_handler;

#[derive(Debug, Clone)]
pub struct AppState {
    pub metrics: Arc<CrlMetrics>,
}

/// HTTP server exposing `/metrics` for Prometheus scrapes
pub struct Server {
    router: Router,
    listener: TcpListener,
    port: u16,
}

impl Server {
    /// Binds the listener; use port 0 to let the OS pick one.
    pub async fn new(metrics: Arc<CrlMetrics>, config: &ServerConfig) -> Result<Self> {
        let trace_layer =
            TraceLayer::new_for_http().make_span_with(|request: &'_ axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                tracing::info_span!("request", method = %request.method(), uri)
            });

        let state = AppState { metrics };

        let router = Router::new()
            .route("/health", get(health_check))
            .route("/metrics", get(metrics_handler))
            .layer(trace_layer)
            .with_state(state);

        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Binding TCP listener on {addr}"))?;
        let port = listener
            .local_addr()
            .context("Getting local address")?
            .port();

        Ok(Self {
            router,
            listener,
            port,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until the process is stopped.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves, then let in-flight requests finish.
    pub async fn run_until<S>(self, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("Serving metrics on port {}", self.port);
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .context("Running HTTP server")
    }
}
