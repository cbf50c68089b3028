//! HTTP 服务器启动和关闭

use tokio::net::TcpListener;

use crate::api;
use crate::core::{Config, Result, ServerState};

pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Serve an already initialized state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    /// Bind, serve until Ctrl+C, then close WebSocket sessions
    pub async fn run(&self) -> Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        let app = api::build_app(state.clone());
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(
            %addr,
            environment = %self.config.environment,
            database = %self.config.database_file().display(),
            "POS server listening"
        );

        let bus = state.message_bus.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
                bus.shutdown();
            })
            .await?;

        state.pool.close().await;
        tracing::info!("Server stopped");
        Ok(())
    }
}
