//! Local snapshot store: one JSON file per entity collection.
//!
//! This is the write-through mirror behind every backend and the sole data
//! source in local-only mode. Each collection is persisted wholesale as a
//! pretty-printed JSON array at `<dir>/<collection>.json`; there are no
//! partial or append writes. The store fails open: a missing or corrupt file
//! loads as an empty collection, and a failed save is logged, never raised.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::DataError;
use crate::types::{EntityKind, Record};

/// How long after one of our own saves a filesystem event on that collection
/// is attributed to us rather than to another process. Keeps the snapshot
/// watcher from echoing writes the facade already published.
const SELF_WRITE_WINDOW: Duration = Duration::from_millis(750);

struct StoreInner {
    dir: PathBuf,
    recent_writes: Mutex<Vec<(EntityKind, Instant)>>,
}

/// Handle to the snapshot directory. Cheap to clone; clones share the
/// self-write ledger so the watcher sees every save.
#[derive(Clone)]
pub struct LocalStore {
    inner: Arc<StoreInner>,
}

impl LocalStore {
    /// Open the default store at `~/.ravechi/data/`.
    pub fn open_default() -> Result<Self, DataError> {
        let home = dirs::home_dir()
            .ok_or_else(|| DataError::Config("could not find home directory".to_string()))?;
        Self::open_at(home.join(".ravechi").join("data"))
    }

    /// Open a store at an explicit directory, creating it if needed.
    /// Tests point this at a temp dir.
    pub fn open_at(dir: PathBuf) -> Result<Self, DataError> {
        fs::create_dir_all(&dir)?;
        Ok(Self {
            inner: Arc::new(StoreInner {
                dir,
                recent_writes: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }

    fn path_for(&self, kind: EntityKind) -> PathBuf {
        self.inner.dir.join(format!("{}.json", kind.collection()))
    }

    /// Load the raw snapshot for a collection. Never fails: missing files,
    /// unreadable files, and malformed JSON all yield an empty vec.
    pub fn load_raw(&self, kind: EntityKind) -> Vec<Value> {
        let path = self.path_for(kind);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                log::warn!("store: failed to read {}: {}", path.display(), err);
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<Value>>(&content) {
            Ok(rows) => rows,
            Err(err) => {
                log::warn!("store: corrupt snapshot {}: {}", path.display(), err);
                Vec::new()
            }
        }
    }

    /// Load a collection as typed records, re-validated through the record
    /// mapper (enumerations persist as plain strings, so every read goes
    /// back through normalization).
    pub fn load<T: Record>(&self) -> Vec<T> {
        self.load_raw(T::KIND).iter().map(T::from_row).collect()
    }

    /// Overwrite the whole snapshot for a collection. Writes to a temp file
    /// in the same directory and renames it into place so a concurrent
    /// reader never sees a torn file. Failures are logged, not raised.
    pub fn save<T: Record>(&self, records: &[T]) {
        let path = self.path_for(T::KIND);
        let content = match serde_json::to_string_pretty(records) {
            Ok(content) => content,
            Err(err) => {
                log::warn!("store: failed to serialize {}: {}", T::KIND, err);
                return;
            }
        };

        self.note_self_write(T::KIND);

        let tmp = path.with_extension("json.tmp");
        let result = fs::write(&tmp, content).and_then(|_| fs::rename(&tmp, &path));
        if let Err(err) = result {
            log::warn!("store: failed to write {}: {}", path.display(), err);
            let _ = fs::remove_file(&tmp);
        }
    }

    fn note_self_write(&self, kind: EntityKind) {
        let mut recent = self.inner.recent_writes.lock();
        let now = Instant::now();
        recent.retain(|(_, at)| now.duration_since(*at) < SELF_WRITE_WINDOW);
        recent.push((kind, now));
    }

    /// Whether this process saved the collection within the self-write
    /// window. Used by the snapshot watcher to skip its own echoes.
    pub(crate) fn recently_written(&self, kind: EntityKind) -> bool {
        let recent = self.inner.recent_writes.lock();
        let now = Instant::now();
        recent
            .iter()
            .any(|(k, at)| *k == kind && now.duration_since(*at) < SELF_WRITE_WINDOW)
    }
}
