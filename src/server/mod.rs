pub mod api;

use crate::config::AppConfig;
use crate::gateway::Gateway;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use log::info;

pub struct Server {
    config: Arc<AppConfig>,
    gateway: Gateway,
}

impl Server {
    pub fn new(config: Arc<AppConfig>, gateway: Gateway) -> Self {
        Self { config, gateway }
    }

    pub fn router(&self) -> Router {
        api::build_router(self.gateway.clone(), &self.config.static_dir)
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.config.server_addr
            .parse::<SocketAddr>()
            .map_err(|e| format!("Invalid server address '{}': {}", self.config.server_addr, e))?;
        let app = self.router();

        match &self.config.tls {
            Some(tls) => {
                info!(
                    "TLS enabled. Loading certificate from '{}' and key from '{}'",
                    tls.cert_path,
                    tls.key_path
                );
                let tls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await?;
                info!("HTTPS server listening on: https://{}", addr);
                axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
            }
            None => {
                let listener = tokio::net::TcpListener
                    ::bind(addr).await
                    .map_err(|e| format!("Failed to bind HTTP server to {}: {}", addr, e))?;
                info!("HTTP server listening on: http://{}", addr);
                axum::serve(listener, app.into_make_service()).await?;
            }
        }

        Ok(())
    }
}
