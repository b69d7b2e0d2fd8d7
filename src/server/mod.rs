pub mod api;
pub mod auth;
pub mod tls;
pub mod websocket;

use crate::assistant::Assistant;
use crate::cli::Args;
use crate::persistence::PersistenceClient;
use crate::sensors::BiometricReading;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::watch;

/// Everything a connection or request handler needs.
#[derive(Clone)]
pub struct AppContext {
    pub assistant: Arc<Assistant>,
    pub records: Arc<dyn PersistenceClient>,
    pub biometrics: watch::Receiver<BiometricReading>,
    pub history_default_limit: usize,
}

pub struct Server {
    addr: String,
    context: AppContext,
    args: Args,
}

impl Server {
    pub fn new(addr: String, context: AppContext, args: Args) -> Self {
        Self { addr, context, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if let Some(http_port) = self.args.http_port {
            self.start_http_server(http_port).await?;
        }

        self.start_ws_server().await?;

        Ok(())
    }

    async fn start_http_server(&self, http_port: u16) -> Result<(), Box<dyn Error + Send + Sync>> {
        api::start_http_server(http_port, self.context.clone(), self.args.clone()).await
    }

    async fn start_ws_server(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        websocket::start_ws_server(
            &self.addr,
            self.context.clone(),
            self.args.server_api_key.clone(),
            self.args.clone()
        ).await
    }
}
