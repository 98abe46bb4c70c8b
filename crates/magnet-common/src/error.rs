use thiserror::Error;

/// Errors surfaced by the Magnet gateway.
///
/// The three script-facing kinds map directly to request outcomes:
///
/// - [`NotFound`](MagnetError::NotFound) - the script path does not resolve
///   to a readable resource; surfaced as an explicit 404 and never retried.
/// - [`Compile`](MagnetError::Compile) - the source was read but failed to
///   produce a compiled unit; logged with diagnostic detail, surfaced as a
///   generic failure. Any existing cache entry is preserved unmodified.
/// - [`Execution`](MagnetError::Execution) - the compiled unit ran but
///   raised a runtime fault; the compiled unit itself is still considered
///   good, only this invocation failed.
///
/// All three are recovered at the request boundary: a failing request never
/// terminates the process and never corrupts the script cache.
#[derive(Error, Debug)]
pub enum MagnetError {
    #[error("script not found: {0}")]
    NotFound(String),

    #[error("compile error: {0}")]
    Compile(String),

    #[error("execution error: {0}")]
    Execution(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MagnetError>;
