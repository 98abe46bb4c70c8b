//! The request dispatcher.
//!
//! Drives the per-request pipeline: resolve the script through the cache,
//! build a fresh sandbox wired to the request's output sink, run, and hand
//! the outcome back to the transport layer. All three failure kinds are
//! recovered here - a failing request never terminates the process, never
//! corrupts the cache, and never leaks execution-context state.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use magnet_common::{MagnetError, OutputSink, Result};
use magnet_metrics::{GatewayMetricsCollector, RequestOutcome};

use crate::runtime::sandbox::{BaseEnv, ExecLimits, SandboxBuilder};
use crate::script_cache::{CacheStatus, ScriptCache};

/// The Magnet gateway: compiled-script cache plus sandbox builder.
///
/// One `Gateway` serves many requests, potentially concurrently; the cache
/// serializes its own map access and everything else is per-request state.
pub struct Gateway {
    cache: ScriptCache,
    sandbox: SandboxBuilder,
    metrics: Arc<GatewayMetricsCollector>,
}

impl Gateway {
    pub fn new(base: BaseEnv) -> Self {
        Self::with_limits(base, ExecLimits::default())
    }

    pub fn with_limits(base: BaseEnv, limits: ExecLimits) -> Self {
        Self {
            cache: ScriptCache::new(),
            sandbox: SandboxBuilder::new(base).with_limits(limits),
            metrics: Arc::new(GatewayMetricsCollector::new()),
        }
    }

    /// Handles one request: the script at `path` runs with its output
    /// routed to `sink`.
    ///
    /// `Ok(())` means the script ran to completion and `sink` holds the
    /// response body. The error taxonomy maps one-to-one onto user-facing
    /// outcomes: `NotFound` is the explicit 404, everything else a generic
    /// failure whose diagnostic the transport layer logs.
    pub fn handle(&self, path: &Path, sink: OutputSink) -> Result<()> {
        let start = Instant::now();

        let result = self.dispatch(path, &sink);

        let outcome = match &result {
            Ok(()) => RequestOutcome::Success,
            Err(MagnetError::NotFound(_)) => RequestOutcome::NotFound,
            Err(_) => RequestOutcome::Failed,
        };
        self.metrics.record_request(start, outcome);

        result
    }

    fn dispatch(&self, path: &Path, sink: &OutputSink) -> Result<()> {
        let (script, status) = self.cache.get_or_compile(path)?;

        match status {
            CacheStatus::Hit => self.metrics.record_cache_hit(),
            CacheStatus::Miss => self.metrics.record_cache_miss(),
            CacheStatus::Stale => self.metrics.record_recompile(),
        }

        tracing::debug!(script = %path.display(), ?status, "executing script");

        // Fresh context per request; dropped on return no matter how the
        // run ends.
        let sandbox = self.sandbox.build(sink.clone());
        sandbox.run(&script)
    }

    pub fn metrics(&self) -> &GatewayMetricsCollector {
        &self.metrics
    }

    pub fn cache(&self) -> &ScriptCache {
        &self.cache
    }
}
