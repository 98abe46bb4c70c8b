//! HTTP server for the Magnet gateway.
//!
//! A plain hyper http/1.1 accept loop: one tokio task per connection, each
//! request forwarded to the [`GatewayRouter`]. The server owns no gateway
//! state of its own; everything request-scoped lives in the router and the
//! gateway beneath it.

use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use magnet_common::MagnetError;

use crate::http_router::GatewayRouter;

/// HTTP front end for the gateway.
pub struct HttpServer {
    router: Arc<GatewayRouter>,
}

impl HttpServer {
    pub fn new(router: GatewayRouter) -> Self {
        Self {
            router: Arc::new(router),
        }
    }

    /// Binds to `addr` and serves until the process exits.
    pub async fn run(self, addr: SocketAddr) -> Result<(), MagnetError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| MagnetError::Transport(format!("failed to bind to {}: {}", addr, e)))?;

        tracing::info!(
            "gateway listening on {}",
            listener
                .local_addr()
                .map_err(|e| MagnetError::Transport(format!("failed to get local address: {}", e)))?
        );

        self.serve(listener).await
    }

    /// Serves connections from an already-bound listener.
    ///
    /// Split out from [`run`](HttpServer::run) so tests can bind to port 0
    /// and learn the address before serving.
    pub async fn serve(self, listener: TcpListener) -> Result<(), MagnetError> {
        loop {
            let (stream, _) = listener
                .accept()
                .await
                .map_err(|e| MagnetError::Transport(format!("failed to accept connection: {}", e)))?;

            let io = TokioIo::new(stream);
            let router = self.router.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let router = router.clone();
                    async move { Self::handle_request(router, req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::error!("error serving connection: {}", err);
                }
            });
        }
    }

    async fn handle_request(
        router: Arc<GatewayRouter>,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, MagnetError> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        tracing::debug!(%method, %path, "incoming request");

        let routed = router.handle(&method, &path);

        Response::builder()
            .status(routed.status)
            .header(CONTENT_TYPE, routed.content_type)
            .body(Full::new(Bytes::from(routed.body)))
            .map_err(|e| {
                tracing::error!("failed to build response: {}", e);
                MagnetError::Transport(e.to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Gateway;
    use crate::runtime::sandbox::BaseEnv;
    use hyper::StatusCode;
    use std::fs;

    #[tokio::test]
    async fn test_server_creation() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.rhai"), r#"print("hi");"#).unwrap();

        let gateway = Arc::new(Gateway::new(BaseEnv::new()));
        let router = GatewayRouter::new(gateway, dir.path());
        let server = HttpServer::new(router);
        assert_eq!(Arc::strong_count(&server.router), 1);
    }

    #[tokio::test]
    async fn test_handle_request_maps_status() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.rhai"), r#"print("hi");"#).unwrap();

        let gateway = Arc::new(Gateway::new(BaseEnv::new()));
        let router = Arc::new(GatewayRouter::new(gateway, dir.path()));

        let routed = router.handle(&hyper::Method::GET, "/hello.rhai");
        assert_eq!(routed.status, StatusCode::OK);
        assert_eq!(routed.body, "hi");
    }
}
