//! Gateway server
//!
//! Binds the HTTP listener and serves the router until shutdown, then stops
//! every converter the supervisor still holds.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::camera::CameraRegistry;
use crate::error::Result;
use crate::onvif::OnvifClient;
use crate::server::config::ServerConfig;
use crate::server::routes;
use crate::service::CameraService;
use crate::supervisor::StreamSupervisor;

/// HTTP gateway
pub struct GatewayServer {
    config: ServerConfig,
    service: Arc<CameraService>,
}

impl GatewayServer {
    /// Load the camera list and wire up the default components
    pub fn from_config(config: ServerConfig) -> Result<Self> {
        let registry = CameraRegistry::load(&config.cameras_path)?;
        let control = OnvifClient::new(config.control.clone())?;
        let supervisor = StreamSupervisor::new(config.supervisor.clone());

        let service = CameraService::new(Arc::new(registry), Arc::new(supervisor), Arc::new(control))
            .default_move_timeout(config.control.default_move_timeout);

        Ok(Self::new(config, Arc::new(service)))
    }

    /// Create a server around an existing service
    pub fn new(config: ServerConfig, service: Arc<CameraService>) -> Self {
        Self { config, service }
    }

    /// The camera service
    pub fn service(&self) -> &Arc<CameraService> {
        &self.service
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Router serving the API and the streaming root
    pub fn router(&self) -> Router {
        routes::router(
            Arc::clone(&self.service),
            &self.config.supervisor.stream_root,
            &self.config.supervisor.public_prefix,
        )
    }

    /// Run the server
    ///
    /// This method blocks until the listener fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let stream_root = &self.config.supervisor.stream_root;
        tokio::fs::create_dir_all(stream_root).await?;

        tracing::info!(
            addr = %listener.local_addr()?,
            stream_root = %stream_root.display(),
            "Gateway listening"
        );

        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        self.service.supervisor().shutdown().await;

        result.map_err(Into::into)
    }
}
