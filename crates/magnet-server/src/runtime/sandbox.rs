//! Per-request execution isolation.
//!
//! Every request gets a fresh engine and a fresh variable scope. Bindings a
//! script creates live only in that scope and are thrown away when the run
//! completes, whether it succeeded or faulted. Lookups that miss the
//! per-request scope fall through to a shared, read-only [`BaseEnv`] - an
//! explicit two-level resolver, checked scope-first so scripts can shadow
//! base bindings without mutating them.
//!
//! The script's `print` capability is rebound per request to an
//! [`OutputSink`], so script output lands in the response body and never in
//! the host's stdout. `debug` goes the other way: to the host's diagnostic
//! stream, never the response.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rhai::{Dynamic, Engine, Scope};

use magnet_common::{MagnetError, OutputSink, Result};

use crate::runtime::compiler::CompiledScript;

/// Shared, read-only bindings visible to every script unless shadowed.
///
/// Built once at gateway construction. The engine's standard library plays
/// the role of the host's global functions; `BaseEnv` carries the host's
/// global values on top of it.
#[derive(Debug, Default)]
pub struct BaseEnv {
    values: HashMap<String, Dynamic>,
}

impl BaseEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Dynamic>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Dynamic> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Resource limits for script execution.
///
/// Runaway scripts are a per-request problem, not a process problem: hitting
/// a limit fails that execution with [`MagnetError::Execution`] and leaves
/// the cache entry intact.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecLimits {
    /// Operation budget for one execution. `None` means unbounded.
    pub max_operations: Option<u64>,
    /// Wall-clock deadline for one execution. `None` means unbounded.
    pub execution_timeout: Option<Duration>,
}

impl Default for ExecLimits {
    fn default() -> Self {
        Self {
            max_operations: None,
            // Generous enough for legitimate scripts while preventing
            // indefinite hangs.
            execution_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ExecLimits {
    pub fn unbounded() -> Self {
        Self {
            max_operations: None,
            execution_timeout: None,
        }
    }

    pub fn with_max_operations(mut self, max: u64) -> Self {
        self.max_operations = Some(max);
        self
    }

    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = Some(timeout);
        self
    }
}

/// Builds a fresh [`Sandbox`] per request.
///
/// The builder owns what is shared across requests (the base environment
/// and the limits); everything request-scoped - the engine, the scope, the
/// output routing - is created in [`build`](SandboxBuilder::build).
pub struct SandboxBuilder {
    base: Arc<BaseEnv>,
    limits: ExecLimits,
}

impl SandboxBuilder {
    pub fn new(base: BaseEnv) -> Self {
        Self {
            base: Arc::new(base),
            limits: ExecLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ExecLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Constructs an isolated execution context wired to `sink`.
    ///
    /// Expected to be called once per request, immediately before
    /// [`Sandbox::run`]; the execution deadline starts counting here.
    pub fn build(&self, sink: OutputSink) -> Sandbox {
        let mut engine = Engine::new();

        // Rebind the script's print capability to the response sink.
        // Text is written verbatim; scripts emit their own newlines.
        {
            let sink = sink.clone();
            engine.on_print(move |text| sink.push(text));
        }

        // debug() belongs to the host's diagnostic stream, not the response.
        engine.on_debug(|text, source, pos| {
            tracing::debug!(script = source.unwrap_or("<anon>"), position = %pos, "{}", text);
        });

        // Two-level lookup: the per-request scope wins, then the shared
        // base environment, then a normal lookup failure local to this run.
        let base = Arc::clone(&self.base);
        engine.on_var(move |name, _index, context| {
            if context.scope().contains(name) {
                // Defer to normal scope resolution so shadowing works.
                return Ok(None);
            }
            Ok(base.get(name).cloned())
        });

        if let Some(max) = self.limits.max_operations {
            engine.set_max_operations(max);
        }

        if let Some(timeout) = self.limits.execution_timeout {
            let deadline = Instant::now() + timeout;
            engine.on_progress(move |_ops| {
                if Instant::now() >= deadline {
                    Some(Dynamic::from("execution deadline exceeded"))
                } else {
                    None
                }
            });
        }

        Sandbox { engine }
    }
}

/// A single-use execution context.
///
/// Holds the per-request engine; the variable scope is created inside
/// [`run`](Sandbox::run) and dropped when it returns, so no binding survives
/// the call.
pub struct Sandbox {
    engine: Engine,
}

impl Sandbox {
    /// Invokes a compiled unit inside this context.
    ///
    /// Zero-or-one result values by convention; the result, if any, is
    /// discarded. Runtime faults are caught here and converted to
    /// [`MagnetError::Execution`] - they never propagate as a process-level
    /// fault and never invalidate the cached unit.
    pub fn run(&self, script: &CompiledScript) -> Result<()> {
        let mut scope = Scope::new();

        self.engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, script.ast())
            .map_err(|e| MagnetError::Execution(e.to_string()))?;

        Ok(())
    }
}
