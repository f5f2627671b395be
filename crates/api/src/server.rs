// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP server lifecycle
//!
//! [`Server`] binds the listener, runs the cache sweeper next to it and tears
//! both down from a single root `CancellationToken`.

use std::{net::SocketAddr, time::Duration};

use axum::{Router, http::HeaderName};
use hyper::Request;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, warn};

use crate::{
    config::ServerConfig,
    error::{ServerError, ServerResult},
    routes::create_routes,
    state::ServerState,
};

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_FORCE_SHUTDOWN_TIMEOUT_SECONDS: u64 = 5;

/// Time limits applied while shutting down
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Maximum time in-flight requests get to finish once shutdown started
    pub graceful_timeout: Duration,
    /// Maximum time background tasks get to stop after the listener closed
    pub force_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            graceful_timeout: Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS),
            force_timeout: Duration::from_secs(DEFAULT_FORCE_SHUTDOWN_TIMEOUT_SECONDS),
        }
    }
}

/// Main server struct
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    router: Router,
    state: ServerState,
    cancellation_token: CancellationToken,
    shutdown_config: ShutdownConfig,
}

impl Server {
    /// Create new server instance with clients built from `config`
    ///
    /// # Errors
    ///
    /// `ServerError::Config` when a provider client cannot be built from `config`
    pub fn new(config: ServerConfig, shutdown_config: ShutdownConfig) -> ServerResult<Self> {
        let cancellation_token = CancellationToken::new();
        let state = ServerState::from_config(config.clone(), cancellation_token.child_token())?;
        Ok(Self::with_state(config, shutdown_config, state, cancellation_token))
    }

    /// Create server around prepared state
    ///
    /// `cancellation_token` must be the token `state` was derived from.
    pub fn with_state(
        config: ServerConfig,
        shutdown_config: ShutdownConfig,
        state: ServerState,
        cancellation_token: CancellationToken,
    ) -> Self {
        let router = Self::create_router(state.clone());
        Self {
            config,
            router,
            state,
            cancellation_token,
            shutdown_config,
        }
    }

    /// Routes wrapped in request id, tracing, CORS and timeout layers
    fn create_router(state: ServerState) -> Router {
        let timeout_duration = state.config().timeout_seconds.value();

        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                    if let Some(request_id) = req.headers().get(REQUEST_ID_HEADER) {
                        info_span!("http_request", ?request_id, method = %req.method(), uri = %req.uri())
                    } else {
                        error!("failed to extract id from request");
                        info_span!("http_request", request_id = "unknown")
                    }
                }),
            )
            .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
            .layer(CorsLayer::permissive())
            .layer(TimeoutLayer::new(timeout_duration));

        create_routes().layer(middleware).with_state(state)
    }

    /// Start the periodic removal of unused cache entries
    fn spawn_sweeper(&self) -> JoinHandle<()> {
        let interval = self.config.cache.sweep_interval();
        info!(interval_seconds = interval.as_secs(), "starting cache sweeper");
        self.state.service().spawn_gc_sweeper(interval)
    }

    async fn bind(&self) -> ServerResult<(TcpListener, SocketAddr)> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                address: addr,
                source,
            })?;
        let actual_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Startup { source })?;
        Ok((listener, actual_addr))
    }

    /// Serve until a shutdown signal or programmatic cancellation
    ///
    /// On SIGINT/SIGTERM the root token is cancelled: the listener stops
    /// accepting, in-flight fan-outs are abandoned and the sweeper stops.
    ///
    /// # Errors
    ///
    /// `ServerError::Bind` when the address is unavailable, `ServerError::Shutdown`
    /// when axum stops with an error
    pub async fn run(self) -> ServerResult<()> {
        let (listener, actual_addr) = self.bind().await?;

        info!(
            address = %actual_addr,
            environment = %self.config.environment,
            chains = self.state.service().registry().len(),
            "wallet API server starting",
        );

        let sweeper = self.spawn_sweeper();

        let shutdown_token = self.cancellation_token.clone();
        tokio::spawn(async move {
            Self::shutdown_signal_handler(shutdown_token).await;
        });

        let serve_token = self.cancellation_token.clone();
        let mut serving = tokio::spawn(
            axum::serve(listener, self.router)
                .with_graceful_shutdown(async move { serve_token.cancelled().await })
                .into_future(),
        );

        let result = tokio::select! {
            result = &mut serving => result,
            () = self.cancellation_token.cancelled() => {
                match tokio::time::timeout(self.shutdown_config.graceful_timeout, &mut serving).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            timeout_seconds = self.shutdown_config.graceful_timeout.as_secs(),
                            "graceful shutdown timed out, aborting open connections"
                        );
                        serving.abort();
                        Ok(Ok(()))
                    }
                }
            }
        };

        // the server may have stopped on its own; make sure background work stops too
        self.cancellation_token.cancel();
        if tokio::time::timeout(self.shutdown_config.force_timeout, sweeper)
            .await
            .is_err()
        {
            warn!("cache sweeper did not stop in time");
        }

        match result? {
            Ok(()) => {
                info!("wallet API server shut down gracefully");
                Ok(())
            }
            Err(e) => {
                error!(error = ?e, "server error during shutdown");
                Err(ServerError::Shutdown { source: e })
            }
        }
    }

    /// Cancel `cancellation_token` on SIGINT or SIGTERM
    async fn shutdown_signal_handler(cancellation_token: CancellationToken) {
        let signal_received = async {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{SignalKind, signal};

                let (mut sigterm, mut sigint) =
                    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                        (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                        (Err(e), _) | (_, Err(e)) => {
                            error!(error = %e, "failed to register signal handlers");
                            return std::future::pending::<&str>().await;
                        }
                    };

                tokio::select! {
                    _ = sigterm.recv() => "SIGTERM",
                    _ = sigint.recv() => "SIGINT",
                }
            }

            #[cfg(not(unix))]
            {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!(error = %e, "failed to install CTRL+C signal handler");
                    return std::future::pending::<&str>().await;
                }
                "CTRL+C"
            }
        };

        tokio::select! {
            signal_name = signal_received => {
                warn!(signal = signal_name, "shutdown signal received, cancelling all operations");
                cancellation_token.cancel();
            },
            () = cancellation_token.cancelled() => {
                info!("cancellation token already cancelled, shutdown signal handler exiting");
            }
        }
    }

    /// Root token; cancelling it stops the server
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Start a graceful shutdown
    pub fn shutdown(&self) {
        info!("programmatic shutdown requested");
        self.cancellation_token.cancel();
    }

    /// Serve in the background and return the bound address
    ///
    /// Cancelling the returned token stops the listener, the sweeper and every
    /// in-flight fan-out.
    ///
    /// # Errors
    ///
    /// `ServerError::Bind` when the address is unavailable
    pub async fn run_for_testing(self) -> ServerResult<(SocketAddr, CancellationToken)> {
        let (listener, actual_addr) = self.bind().await?;
        drop(self.spawn_sweeper());

        let token = self.cancellation_token.clone();
        let task = token.clone();
        tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, self.router)
                .with_graceful_shutdown(async move { task.cancelled().await })
                .await
            {
                error!(%error, "test server stopped with an error");
            }
        });

        Ok((actual_addr, token))
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get server state
    pub fn state(&self) -> &ServerState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[tokio::test]
    async fn new_server_is_not_cancelled() -> ServerResult<()> {
        let config = ServerConfig::for_testing();
        let server = Server::new(config, ShutdownConfig::default())?;
        assert_eq!(server.config().environment, Environment::Testing);
        assert!(!server.cancellation_token().is_cancelled());
        Ok(())
    }

    #[tokio::test]
    async fn programmatic_shutdown_reaches_the_state() -> ServerResult<()> {
        let config = ServerConfig::for_testing();
        let server = Server::new(config, ShutdownConfig::default())?;

        assert!(!server.state().cancellation_token.is_cancelled());

        server.shutdown();

        assert!(server.cancellation_token().is_cancelled());
        assert!(server.state().cancellation_token.is_cancelled());
        Ok(())
    }

    #[tokio::test]
    async fn run_returns_after_shutdown() -> ServerResult<()> {
        let server = Server::new(ServerConfig::for_testing(), ShutdownConfig::default())?;
        let token = server.cancellation_token();
        let running = tokio::spawn(server.run());

        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), running).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
        Ok(())
    }

    #[test]
    fn shutdown_config_default() {
        let config = ShutdownConfig::default();
        assert_eq!(
            config.graceful_timeout,
            Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS)
        );
        assert_eq!(
            config.force_timeout,
            Duration::from_secs(DEFAULT_FORCE_SHUTDOWN_TIMEOUT_SECONDS)
        );
    }
}
