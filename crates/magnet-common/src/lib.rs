//! Magnet Common Types
//!
//! This crate provides the error taxonomy and boundary types shared by all
//! Magnet components:
//!
//! - [`error`] - The crate-wide error enum and `Result` alias
//! - [`sink`] - The per-request output sink handed to script executions
//!
//! Magnet is a request-time script-execution gateway: every request resolves
//! to a script file, which is compiled (or fetched from the compiled-script
//! cache), executed in an isolated scope, and whose printed output becomes
//! the response body.

pub mod error;
pub mod sink;

pub use error::{MagnetError, Result};
pub use sink::OutputSink;
