//! Process-wide cache of compiled scripts.
//!
//! One entry per script path: the compiled unit, the modification timestamp
//! recorded at compile time (the staleness witness), and a hit counter.
//! Entries live for the life of the process; there is no eviction and no
//! on-disk persistence - the cache is rebuilt from scratch on restart.
//!
//! # Concurrency
//!
//! The map lock is held only for the lookup and for the final install,
//! never across compilation. Two concurrent requests hitting the same stale
//! script may therefore both compile; the last writer wins. Installs are
//! wholesale entry replacements, so no reader ever observes a mix of old
//! unit and new timestamp.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use magnet_common::Result;

use crate::freshness;
use crate::runtime::compiler::{CompiledScript, ScriptCompiler};

/// How a lookup was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Unchanged on disk; the cached unit was reused.
    Hit,
    /// First request for this path; compiled and inserted.
    Miss,
    /// Changed on disk; recompiled and the entry replaced wholesale.
    Stale,
}

struct CacheEntry {
    script: CompiledScript,
    /// Staleness witness: mtime observed just before the unit was compiled.
    modified: SystemTime,
    /// Incremented once per reuse, never on a fresh compile. Observational.
    hits: u64,
}

/// The compiled-script cache.
///
/// Owned by the [`Gateway`](crate::gateway::Gateway); there is no ambient
/// global state.
pub struct ScriptCache {
    entries: Mutex<HashMap<PathBuf, CacheEntry>>,
    compiler: ScriptCompiler,
}

impl ScriptCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            compiler: ScriptCompiler::new(),
        }
    }

    /// Returns a compiled unit for `path`, reusing the cached one if the
    /// file is unchanged.
    ///
    /// Exactly one staleness probe per call, before anything else: a failed
    /// probe is a `NotFound` and leaves the cache untouched. A compile
    /// failure also leaves any existing entry untouched - the previous unit
    /// stays reusable once the file reverts, and no partial entry is ever
    /// installed.
    pub fn get_or_compile(&self, path: &Path) -> Result<(CompiledScript, CacheStatus)> {
        let modified = freshness::modified_time(path)?;

        let status = {
            let mut entries = self.entries.lock().unwrap();
            match entries.get_mut(path) {
                Some(entry) if freshness::is_fresh(modified, entry.modified) => {
                    entry.hits += 1;
                    tracing::trace!(script = %path.display(), hits = entry.hits, "cache hit");
                    return Ok((entry.script.clone(), CacheStatus::Hit));
                }
                Some(_) => CacheStatus::Stale,
                None => CacheStatus::Miss,
            }
        };
        // Lock released: compilation does I/O and parsing and must not
        // stall unrelated requests. Duplicate concurrent compiles of the
        // same stale path are possible; last writer wins.

        if status == CacheStatus::Stale {
            tracing::debug!(script = %path.display(), "script changed on disk, recompiling");
        }

        let script = self.compiler.compile(path)?;

        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            path.to_path_buf(),
            CacheEntry {
                script: script.clone(),
                modified,
                hits: 0,
            },
        );

        Ok((script, status))
    }

    /// Hit counter for `path`, if an entry exists. Observational only.
    pub fn hit_count(&self, path: &Path) -> Option<u64> {
        self.entries.lock().unwrap().get(path).map(|e| e.hits)
    }

    /// Number of cached scripts.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl Default for ScriptCache {
    fn default() -> Self {
        Self::new()
    }
}
