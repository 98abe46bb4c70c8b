//! Per-request output capture.
//!
//! Scripts never write to the host process's stdout. Each request is handed
//! an [`OutputSink`] and the sandbox rebinds the script's `print` capability
//! to it, so output emitted during request A appears only in request A's
//! response body and is never interleaved with another request's output or
//! with the host's own diagnostic stream.

use std::sync::{Arc, Mutex};

/// Cloneable handle to a request-scoped text buffer.
///
/// Clones share the same buffer; the sandbox holds one clone (wired to the
/// script's `print`) while the dispatcher keeps another to collect the
/// response body after the run completes.
#[derive(Clone, Debug, Default)]
pub struct OutputSink {
    buf: Arc<Mutex<String>>,
}

impl OutputSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends text verbatim. No newline is added; scripts emit their own.
    pub fn push(&self, text: &str) {
        self.buf.lock().unwrap().push_str(text);
    }

    /// Takes the captured output, leaving the buffer empty.
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.buf.lock().unwrap())
    }

    /// Returns a copy of the captured output without draining it.
    pub fn contents(&self) -> String {
        self.buf.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_buffer() {
        let sink = OutputSink::new();
        let writer = sink.clone();

        writer.push("hello ");
        writer.push("world");

        assert_eq!(sink.contents(), "hello world");
    }

    #[test]
    fn test_push_is_verbatim() {
        let sink = OutputSink::new();
        sink.push("a");
        sink.push("b");
        assert_eq!(sink.contents(), "ab");
    }

    #[test]
    fn test_take_drains() {
        let sink = OutputSink::new();
        sink.push("body");
        assert_eq!(sink.take(), "body");
        assert!(sink.is_empty());
    }

    #[test]
    fn test_independent_sinks_do_not_cross() {
        let a = OutputSink::new();
        let b = OutputSink::new();
        a.push("for a");
        b.push("for b");
        assert_eq!(a.contents(), "for a");
        assert_eq!(b.contents(), "for b");
    }
}
