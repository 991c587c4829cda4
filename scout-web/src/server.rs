//! Scout web server built on Axum

use crate::{create_app, AppState, WebConfig, WebError, WebResult};
use axum::serve;
use scout_core::ScoutConfig;
use tokio::net::TcpListener;
use tracing::{error, info};

pub struct ScoutServer {
    config: WebConfig,
    state: AppState,
}

impl ScoutServer {
    pub fn new(config: WebConfig, scout_config: ScoutConfig) -> Self {
        Self {
            config,
            state: AppState::new(scout_config),
        }
    }

    /// Bind and serve until the process stops
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();
        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);

        if let Err(e) = serve(listener, app).await {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        Ok(())
    }

    pub fn config(&self) -> &WebConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Builder for ScoutServer
pub struct ScoutServerBuilder {
    config: WebConfig,
    scout_config: ScoutConfig,
}

impl ScoutServerBuilder {
    pub fn new() -> Self {
        Self {
            config: WebConfig::from_env(),
            scout_config: ScoutConfig::default(),
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn scout_config(mut self, scout_config: ScoutConfig) -> Self {
        self.scout_config = scout_config;
        self
    }

    pub fn build(self) -> ScoutServer {
        ScoutServer::new(self.config, self.scout_config)
    }
}

impl Default for ScoutServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
