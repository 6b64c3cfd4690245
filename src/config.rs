//! Explicit configuration for a [`crate::CorpusIndex`].
//!
//! The source this crate is modeled on reads a handful of process-global
//! settings (logging verbosity, a license key, a default result cap) from
//! static state that every subsystem reaches into directly. We pass all of
//! it in through one object instead, constructed once by the caller and
//! owned by the index for its whole lifetime.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Options accepted by [`crate::CorpusIndex::create`].
#[derive(Clone)]
pub struct IndexOptions {
    /// When present, the index is persistent and rooted at this directory.
    /// When absent, the index lives entirely in memory.
    pub persist_dir: Option<PathBuf>,

    /// If `persist_dir` already contains a `file_list.json` marker, remove
    /// its contents before building. Refused (see
    /// [`crate::error::Error::IllegalState`]) when the marker is absent, to
    /// avoid nuking an unrelated directory.
    pub force_create: bool,

    /// Per-file indexing failures are logged and the file skipped rather
    /// than propagated. Defaults to `true`.
    pub continue_on_failure: bool,

    /// Default `max_results` for `Search` when the caller passes a negative
    /// value. Defaults to 10.
    pub max_results_default: u32,

    /// Minimum wall-clock interval between `file_list.json` flushes in
    /// persistent mode.
    pub flush_interval: Duration,

    /// Called once per file during `AddFile`/CLI indexing with a
    /// human-readable progress line. Must not block and must be safe to
    /// call from the indexing thread.
    pub report: Option<Arc<dyn Fn(&str) + Send + Sync>>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            persist_dir: None,
            force_create: false,
            continue_on_failure: true,
            max_results_default: 10,
            flush_interval: Duration::from_secs(60),
            report: None,
        }
    }
}

impl std::fmt::Debug for IndexOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexOptions")
            .field("persist_dir", &self.persist_dir)
            .field("force_create", &self.force_create)
            .field("continue_on_failure", &self.continue_on_failure)
            .field("max_results_default", &self.max_results_default)
            .field("flush_interval", &self.flush_interval)
            .field("report", &self.report.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl IndexOptions {
    pub(crate) fn report(&self, line: &str) {
        if let Some(cb) = &self.report {
            cb(line);
        }
    }

    /// `max_results` resolution: negative (here, represented by the caller
    /// passing `None`) falls back to `max_results_default`.
    pub(crate) fn resolve_max_results(&self, requested: Option<i64>) -> u32 {
        match requested {
            Some(n) if n >= 0 => n as u32,
            _ => self.max_results_default,
        }
    }
}
