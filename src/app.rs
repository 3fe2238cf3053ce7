use crate::{api, auth::gate, init::settings::Mode, SharedState};
use axum::{middleware, routing::get, Router};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use std::{net::TcpListener, time::Duration};
use tokio::signal;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, Level};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// The main application object
/// Built once at startup and handed to the listener
pub struct App {
    shared_state: SharedState,
    tls_config: Option<RustlsConfig>,
}

impl App {
    /// Create a new application object
    ///
    /// # Arguments
    /// * `shared_state` - Token table and clock used by the handlers
    /// * `tls_config` - The TLS configuration (if HTTPS is enabled)
    pub fn new(shared_state: SharedState, tls_config: Option<RustlsConfig>) -> Self {
        Self {
            shared_state,
            tls_config,
        }
    }

    /// Build the routing table for `mode`
    ///
    /// `/health` is always public. `/metrics` goes through the bearer gate
    /// in [`Mode::Authenticated`] and is public in [`Mode::Open`].
    pub fn router(&self, mode: Mode) -> Router {
        let metrics: Router<SharedState> = match mode {
            Mode::Open => Router::new().route("/metrics", get(api::metrics::metrics)),
            Mode::Authenticated => Router::new()
                .route("/metrics", get(api::metrics::authenticated_metrics))
                .route_layer(middleware::from_fn_with_state(
                    self.shared_state.clone(),
                    gate::require_bearer,
                )),
        };

        Router::new()
            .merge(metrics)
            .route("/health", get(api::health::health))
            .fallback(api::unknown_route)
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .with_state(self.shared_state.clone())
    }

    /// Start a server on `address` and serve until a shutdown signal arrives
    ///
    /// # Returns
    /// * `Ok(())` if the server exited successfully
    /// * An error if binding or serving failed
    pub async fn serve(self, address: &str, mode: Mode) -> Result<(), Box<dyn std::error::Error>> {
        let router = self.router(mode);

        let listener = TcpListener::bind(address)?;
        listener.set_nonblocking(true)?;

        let handle = Handle::new();
        tokio::spawn(shutdown_signal(handle.clone()));

        match self.tls_config {
            None => {
                info!("Listening on: http://{} ({})", address, mode);

                axum_server::from_tcp(listener)
                    .handle(handle)
                    .serve(router.into_make_service())
                    .await?;
            }
            Some(tls_config) => {
                info!("Listening on: https://{} ({})", address, mode);

                axum_server::from_tcp_rustls(listener, tls_config)
                    .handle(handle)
                    .serve(router.into_make_service())
                    .await?;
            }
        }

        Ok(())
    }
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Error listening for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Error listening for SIGTERM: {}", e);
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

    info!("Shutdown signal received, finishing open requests");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
