//! Stateless source-to-compiled-unit adapter.
//!
//! The compiler reads a script file and parses it into a [`CompiledScript`],
//! an opaque invokable artifact the cache can hold across requests. It has
//! no caching responsibility of its own; the [`ScriptCache`] decides when to
//! call it.
//!
//! The compiled unit is an `Arc<rhai::AST>`: immutable once created and
//! shared by reference, so a cache entry replacement never mutates a unit
//! that another in-flight request is still executing.
//!
//! [`ScriptCache`]: crate::script_cache::ScriptCache

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rhai::{Engine, AST};

use magnet_common::{MagnetError, Result};

/// An opaque, invokable compiled unit.
///
/// Clones share the same underlying AST; [`CompiledScript::ptr_eq`] tells
/// whether two handles refer to the same compilation.
#[derive(Clone, Debug)]
pub struct CompiledScript {
    ast: Arc<AST>,
}

impl CompiledScript {
    pub(crate) fn new(ast: AST) -> Self {
        Self { ast: Arc::new(ast) }
    }

    pub fn ast(&self) -> &AST {
        &self.ast
    }

    /// Whether two handles point at the same compiled unit instance.
    pub fn ptr_eq(&self, other: &CompiledScript) -> bool {
        Arc::ptr_eq(&self.ast, &other.ast)
    }
}

/// Turns a script file's source bytes into a [`CompiledScript`].
///
/// Pure transform: bytes in, compiled-unit-or-error out. Both a read
/// failure and a parse failure yield [`MagnetError::Compile`] with the
/// offending path in the message; the caller logs it and fails the request.
pub struct ScriptCompiler {
    engine: Engine,
}

impl ScriptCompiler {
    pub fn new() -> Self {
        // A plain engine is enough for parsing; variable and function
        // resolution happens at evaluation time inside the sandbox.
        Self {
            engine: Engine::new(),
        }
    }

    pub fn compile(&self, path: &Path) -> Result<CompiledScript> {
        let source = fs::read_to_string(path)
            .map_err(|e| MagnetError::Compile(format!("failed to read {}: {}", path.display(), e)))?;

        let ast = self
            .engine
            .compile(&source)
            .map_err(|e| MagnetError::Compile(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(script = %path.display(), "compiled script");

        Ok(CompiledScript::new(ast))
    }
}

impl Default for ScriptCompiler {
    fn default() -> Self {
        Self::new()
    }
}
