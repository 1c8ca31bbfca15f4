//! State persistence middleware.

use crate::error::{Result, StoreError};
use crate::store::Dispatch;
use crate::types::Action;
use fs2::FileExt;
use parking_lot::Mutex;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{trace, warn};

use super::{Middleware, MiddlewareApi};

/// Destination for state snapshots.
pub trait PersistSink<S>: Send + Sync {
    fn persist(&self, state: &Arc<S>) -> Result<()>;
}

/// Keeps every persisted snapshot in memory.
pub struct MemorySink<S> {
    snapshots: Mutex<Vec<Arc<S>>>,
}

impl<S> MemorySink<S> {
    pub fn new() -> Self {
        Self {
            snapshots: Mutex::new(Vec::new()),
        }
    }

    pub fn snapshots(&self) -> Vec<Arc<S>> {
        self.snapshots.lock().clone()
    }

    pub fn last(&self) -> Option<Arc<S>> {
        self.snapshots.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.lock().is_empty()
    }
}

impl<S> Default for MemorySink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Send + Sync> PersistSink<S> for MemorySink<S> {
    fn persist(&self, state: &Arc<S>) -> Result<()> {
        self.snapshots.lock().push(Arc::clone(state));
        Ok(())
    }
}

/// Writes the state as pretty JSON to a single file, replacing its contents.
///
/// Each snapshot goes to a temporary file in the same directory which is then
/// renamed over the target, so the target always holds a complete snapshot.
/// Writers serialize on an exclusive lock of a sibling `<file>.lock`.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the lock file guarding writes.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Read back the last persisted state.
    pub fn load(&self) -> Result<serde_json::Value> {
        let buf = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&buf)?)
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn write(&self, bytes: &[u8]) -> std::io::Result<()> {
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;
        lock.lock_exclusive()?;

        let written = (|| -> std::io::Result<()> {
            let mut tmp = NamedTempFile::new_in(self.dir())?;
            tmp.write_all(bytes)?;
            tmp.as_file().sync_data()?;
            tmp.persist(&self.path)?;
            Ok(())
        })();

        FileExt::unlock(&lock)?;
        written
    }
}

impl<S: Serialize + Send + Sync> PersistSink<S> for JsonFileSink {
    fn persist(&self, state: &Arc<S>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&**state)?;
        self.write(&bytes)
            .map_err(|e| StoreError::Persist(format!("{}: {}", self.path.display(), e)))?;
        trace!(path = %self.path.display(), bytes = bytes.len(), "State persisted");
        Ok(())
    }
}

/// Hands the new state to a [`PersistSink`] after every dispatch that
/// changed it.
///
/// Sink failures are logged, not returned: by the time the sink runs the
/// state has already been committed.
pub struct PersistMiddleware<S> {
    sink: Arc<dyn PersistSink<S>>,
}

impl<S> PersistMiddleware<S> {
    pub fn new(sink: Arc<dyn PersistSink<S>>) -> Self {
        Self { sink }
    }
}

impl<S, A> Middleware<S, A> for PersistMiddleware<S>
where
    S: Send + Sync + 'static,
    A: Action,
{
    fn handle(&self, api: &MiddlewareApi<S, A>, action: A, next: &Dispatch<A>) -> Result<A> {
        let before = api.get_state();
        let action = next(action)?;
        let after = api.get_state();

        if !Arc::ptr_eq(&before, &after) {
            if let Err(e) = self.sink.persist(&after) {
                warn!(action_type = action.action_type(), error = %e, "Failed to persist state");
            }
        }

        Ok(action)
    }
}
