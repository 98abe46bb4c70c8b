//! HTTP router for the Magnet gateway.
//!
//! Maps a request's URL path to a script file under the configured document
//! root and turns the gateway's outcome into an HTTP response:
//!
//! - success: `200` with the script's captured output as the body
//! - `NotFound`: `404`, never retried
//! - compile/execution failure: `500` with a generic body; the diagnostic
//!   goes to the log, never to the client
//!
//! Two built-in paths are intercepted before script dispatch: `/_metrics`
//! (counters snapshot) and `/_info` (server metadata), both JSON.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use hyper::{Method, StatusCode};

use magnet_common::{MagnetError, OutputSink};

use crate::gateway::Gateway;

const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";
const CONTENT_TYPE_JSON: &str = "application/json";

/// A fully rendered response, transport-agnostic.
#[derive(Debug)]
pub struct Routed {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
}

impl Routed {
    fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: CONTENT_TYPE_TEXT,
            body: body.into(),
        }
    }

    fn json(body: String) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: CONTENT_TYPE_JSON,
            body,
        }
    }
}

/// Routes URL paths to scripts under a document root.
pub struct GatewayRouter {
    gateway: Arc<Gateway>,
    doc_root: PathBuf,
    index: String,
}

impl GatewayRouter {
    pub fn new(gateway: Arc<Gateway>, doc_root: impl Into<PathBuf>) -> Self {
        Self {
            gateway,
            doc_root: doc_root.into(),
            index: "index.rhai".to_string(),
        }
    }

    /// Overrides the script served for directory requests.
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Resolves a URL path to a script path under the document root.
    ///
    /// Only plain path segments are accepted; `..` (or anything else that
    /// could climb out of the root) rejects the request. Directory targets
    /// resolve to the configured index script.
    fn resolve(&self, url_path: &str) -> Option<PathBuf> {
        let relative = url_path.trim_start_matches('/');

        let mut resolved = self.doc_root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(segment) => resolved.push(segment),
                Component::CurDir => {}
                _ => return None,
            }
        }

        if resolved.is_dir() {
            resolved.push(&self.index);
        }

        Some(resolved)
    }

    /// Handles one request.
    ///
    /// Synchronous by design: script execution blocks, exactly like the
    /// gateway underneath, and the HTTP layer runs one task per connection.
    pub fn handle(&self, method: &Method, url_path: &str) -> Routed {
        if method != Method::GET {
            return Routed::text(StatusCode::METHOD_NOT_ALLOWED, "method not allowed\n");
        }

        // Built-in endpoints are intercepted before script dispatch.
        match url_path {
            "/_metrics" => {
                return match serde_json::to_string(&self.gateway.metrics().snapshot()) {
                    Ok(body) => Routed::json(body),
                    Err(e) => {
                        tracing::error!("failed to serialize metrics: {}", e);
                        Routed::text(StatusCode::INTERNAL_SERVER_ERROR, "internal error\n")
                    }
                };
            }
            "/_info" => {
                return match serde_json::to_string(&self.gateway.metrics().info()) {
                    Ok(body) => Routed::json(body),
                    Err(e) => {
                        tracing::error!("failed to serialize info: {}", e);
                        Routed::text(StatusCode::INTERNAL_SERVER_ERROR, "internal error\n")
                    }
                };
            }
            _ => {}
        }

        let script_path = match self.resolve(url_path) {
            Some(path) => path,
            None => {
                tracing::warn!(path = url_path, "rejected path traversal attempt");
                return Routed::text(StatusCode::NOT_FOUND, "not found\n");
            }
        };

        let sink = OutputSink::new();
        match self.gateway.handle(&script_path, sink.clone()) {
            Ok(()) => Routed::text(StatusCode::OK, sink.take()),
            Err(MagnetError::NotFound(_)) => {
                tracing::debug!(script = %script_path.display(), "script not found");
                Routed::text(StatusCode::NOT_FOUND, "not found\n")
            }
            Err(e) => {
                tracing::error!(script = %script_path.display(), "request failed: {}", e);
                Routed::text(StatusCode::INTERNAL_SERVER_ERROR, "script failed\n")
            }
        }
    }
}
