//! In-run template memoization.
//!
//! Templates are named by the `template` key of a page source, relative to
//! the project root. Many pages share a handful of templates, so each
//! distinct name is read from disk once per run and served from memory
//! afterwards.
//!
//! ## Cache keys
//!
//! Keys are the literal strings pages use. No canonicalization happens:
//! `t.html` and `./t.html` are separate entries even though they name the
//! same file. Nothing is invalidated during a run and nothing survives it.
//!
//! ## Concurrency
//!
//! The lock is held across the disk read, so a check-then-load for one key
//! is a single atomic step even when pages render in parallel.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
#[error("cannot read template '{name}' at {}: {source}", .path.display())]
pub struct TemplateError {
    pub name: String,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Loads template text by name and keeps it for the rest of the run.
#[derive(Debug)]
pub struct TemplateStore {
    root: PathBuf,
    cache: Mutex<HashMap<String, Arc<str>>>,
    disk_reads: AtomicUsize,
}

impl TemplateStore {
    /// Create an empty store resolving names against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: Mutex::new(HashMap::new()),
            disk_reads: AtomicUsize::new(0),
        }
    }

    /// Return the template text for `name`, reading it on first request.
    ///
    /// Absolute names are used as-is; relative names are joined to the
    /// store root.
    pub fn get(&self, name: &str) -> Result<Arc<str>, TemplateError> {
        // Entries are inserted whole, so a poisoned map is still usable
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(text) = cache.get(name) {
            return Ok(Arc::clone(text));
        }

        let path = self.root.join(name);
        self.disk_reads.fetch_add(1, Ordering::Relaxed);
        let text: Arc<str> = std::fs::read_to_string(&path)
            .map_err(|source| TemplateError {
                name: name.to_string(),
                path,
                source,
            })?
            .into();
        cache.insert(name.to_string(), Arc::clone(&text));
        Ok(text)
    }

    /// Number of distinct names currently cached.
    pub fn len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of disk reads attempted so far, failed ones included.
    pub fn disk_reads(&self) -> usize {
        self.disk_reads.load(Ordering::Relaxed)
    }
}
