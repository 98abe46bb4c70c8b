//! Staleness detection for cached compiled scripts.
//!
//! One metadata probe per request, then an exact-equality comparison against
//! the timestamp recorded when the cached unit was compiled. Any difference,
//! including a clock moving backward, is treated as staleness and triggers
//! recompilation.
//!
//! The policy is deliberately coarse: two modifications landing within the
//! same timestamp tick are indistinguishable from "unchanged" and the stale
//! unit is reused. That tradeoff is accepted here rather than papered over
//! with content hashing; see DESIGN.md.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use magnet_common::{MagnetError, Result};

/// Probes the filesystem for the script's current modification timestamp.
///
/// Any metadata failure (missing file, unreadable metadata) maps to
/// [`MagnetError::NotFound`] - this is the single user-facing "not found"
/// condition, distinct from a compile failure.
pub fn modified_time(path: &Path) -> Result<SystemTime> {
    let metadata = fs::metadata(path)
        .map_err(|e| MagnetError::NotFound(format!("{}: {}", path.display(), e)))?;

    metadata
        .modified()
        .map_err(|e| MagnetError::NotFound(format!("{}: {}", path.display(), e)))
}

/// Returns whether a cached compiled unit is still usable.
///
/// `current` is the timestamp just probed from the filesystem; `cached` is
/// the staleness witness recorded at compile time.
pub fn is_fresh(current: SystemTime, cached: SystemTime) -> bool {
    current == cached
}
