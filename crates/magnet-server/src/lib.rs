//! Magnet Server
//!
//! This crate implements the core of the Magnet gateway: the compiled-script
//! cache with mtime-based staleness detection, the per-request execution
//! sandbox, and the HTTP glue that drives them.
//!
//! # Per-request flow
//!
//! ```text
//! request -> resolve script path
//!         -> ScriptCache::get_or_compile    (reuse, compile, or recompile)
//!         -> SandboxBuilder::build          (fresh scope, print -> sink)
//!         -> Sandbox::run                   (faults caught here)
//!         -> response (200 / 404 / 500)
//! ```
//!
//! The cache is the only state that survives a request. Execution contexts
//! are created fresh per request and discarded afterwards, so nothing a
//! script binds can leak into another request.

pub mod freshness;
pub mod gateway;
pub mod http_router;
pub mod http_server;
pub mod runtime;
pub mod script_cache;

pub use gateway::Gateway;
pub use http_router::GatewayRouter;
pub use http_server::HttpServer;
pub use runtime::compiler::{CompiledScript, ScriptCompiler};
pub use runtime::sandbox::{BaseEnv, ExecLimits, Sandbox, SandboxBuilder};
pub use script_cache::{CacheStatus, ScriptCache};
