//! Connection acceptor
//!
//! Owns the listening socket and the client registry, and spawns one
//! independent task per accepted connection.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::handler::handle_connection;
use crate::registry::ClientRegistry;

/// The relay server
///
/// Sessions share nothing but the registry handed to them at spawn time.
pub struct RelayServer {
    listener: TcpListener,
    registry: ClientRegistry,
}

impl RelayServer {
    /// Bind to the configured address with a fresh registry
    pub async fn bind(config: &Config) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.addr).await?;
        Ok(Self::new(listener, ClientRegistry::new()))
    }

    /// Wrap an already bound listener and an injected registry
    pub fn new(listener: TcpListener, registry: ClientRegistry) -> Self {
        Self { listener, registry }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    /// Accept connections until `shutdown` resolves
    ///
    /// Sessions already running are not interrupted.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        let RelayServer { listener, registry } = self;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Relay stopped accepting connections");
                    break;
                }
                accept_result = listener.accept() => {
                    handle_accept_result(accept_result, &registry);
                }
            }
        }
    }

    /// Accept connections until Ctrl-C
    pub async fn run_until_ctrl_c(self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to install Ctrl-C handler: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }
}

fn handle_accept_result(
    result: std::io::Result<(TcpStream, SocketAddr)>,
    registry: &ClientRegistry,
) {
    match result {
        Ok((stream, addr)) => {
            info!("New connection from {}", addr);
            let registry = registry.clone();

            // Spawn handler task for each connection
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, registry).await {
                    error!("Connection handler error for {}: {}", addr, e);
                }
            });
        }
        Err(e) => {
            error!("Failed to accept connection: {}", e);
        }
    }
}
