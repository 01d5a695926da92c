//! Tcp listener - accepts clients and spawns one session task each

use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use uuid::Uuid;

use crate::{session::SessionHandler, OriginFetch, SetupError};

#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    pub async fn bind(host: &str, port: u16) -> Result<Self, SetupError> {
        let inner = TcpListener::bind((host, port))
            .await
            .map_err(SetupError::Bind)?;

        Ok(Self { inner })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Accept forever. Every connection runs in its own task, so a failed
    /// session is logged and dies alone; the loop keeps accepting.
    pub async fn run<F>(self, handler: Arc<SessionHandler<F>>)
    where
        F: OriginFetch + Send + Sync + 'static,
    {
        loop {
            let (stream, peer) = match self.inner.accept().await {
                Ok(conn) => conn,
                Err(err) => {
                    tracing::error!(error = %err, "accept failed");
                    continue;
                }
            };

            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                let conn = Uuid::new_v4();
                tracing::debug!(%conn, %peer, "connection accepted");

                if let Err(err) = handler.handle(stream).await {
                    tracing::error!(%conn, %peer, error = %err, "session aborted");
                }
            });
        }
    }
}
