use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Product images HTTP server.
pub struct ImageServer {
    config: ServerConfig,
}

impl ImageServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Open storage and build the router (useful for testing).
    pub fn router(&self) -> ServerResult<axum::Router> {
        let state = AppState::from_config(&self.config)?;
        Ok(build_router(state, &self.config))
    }

    /// Serve until Ctrl-C or SIGTERM, then let in-flight requests finish.
    ///
    /// Requests still running are bounded by the request timeout; a save
    /// cut short that way removes its staging file like any failed save.
    pub async fn serve(self) -> ServerResult<()> {
        self.config.validate()?;
        let app = self.router()?;
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(
            bind_addr = %self.config.bind_addr,
            base_path = %self.config.base_path.display(),
            "product images server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(signal = "ctrl-c", "shutting down"),
        _ = terminate => info!(signal = "SIGTERM", "shutting down"),
    }
}
