//! Process wiring: model client, router and listener.
//!
//! Every dependency is constructed before the listener is bound, so a bad
//! credential never results in a reachable socket.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;

use crate::config::{Config, ConfigError};
use crate::routes::create_router;
use crate::services::{GeminiClient, ModelClient, ModelError};
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to initialize Gemini model: {0}")]
    Model(#[from] ModelError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

pub struct Application {
    listener: TcpListener,
    local_addr: SocketAddr,
    app: Router,
}

impl Application {
    /// Build the Gemini client from `config`, then bind.
    pub async fn build(config: Config) -> Result<Self, StartupError> {
        let client = GeminiClient::new(config.gemini())?;
        tracing::info!(model = %client.model(), "Initialized Gemini model client");
        Self::build_with_model(config, Arc::new(client)).await
    }

    pub async fn build_with_model(
        config: Config,
        model: Arc<dyn ModelClient>,
    ) -> Result<Self, StartupError> {
        let app = create_router(&config.cors).with_state(AppState::shared(model));

        let addr = config.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| StartupError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| StartupError::Bind { addr, source })?;

        Ok(Self {
            listener,
            local_addr,
            app,
        })
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!("Listening on http://{}", self.local_addr);
        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
