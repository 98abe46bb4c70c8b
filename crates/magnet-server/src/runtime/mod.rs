pub mod compiler;
pub mod sandbox;

pub use compiler::{CompiledScript, ScriptCompiler};
pub use sandbox::{BaseEnv, ExecLimits, Sandbox, SandboxBuilder};
