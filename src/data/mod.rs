//! The data access facade.
//!
//! `DataService` is the single entry point pages use: typed CRUD per entity
//! (one file per entity in this module), status transitions, dashboard
//! aggregation and change subscriptions. The backend behind it is fixed at
//! construction from `BackendConfig` and never consulted again.
//!
//! Write-through invariant: every successful write lands in the local
//! snapshot store and publishes its entity kind exactly once, before the
//! call returns. Reads prefer the backend and fall back to the local
//! snapshot when it is unreachable; a refreshed read re-mirrors the snapshot
//! without publishing.

mod clients;
mod dashboard;
mod finance;
mod invoices;
mod leads;
mod products;
mod purchase_orders;
mod proposals;
mod tickets;
mod timesheet;
mod users;

use rand::Rng;

use crate::config::BackendConfig;
use crate::error::DataError;
use crate::notifier::{ChangeNotifier, Subscription};
use crate::remote::document::DocumentAdapter;
use crate::remote::realtime::{self, RealtimeHandle};
use crate::remote::relational::RelationalAdapter;
use crate::store::LocalStore;
use crate::types::{EntityKind, Record};
use crate::watcher::{self, WatcherHandle};

pub struct DataService {
    config: BackendConfig,
    store: LocalStore,
    notifier: ChangeNotifier,
    relational: Option<RelationalAdapter>,
    document: Option<DocumentAdapter>,
}

/// Background listeners started by `spawn_listeners`. Dropping this stops
/// both the snapshot watcher and the realtime feed.
pub struct Listeners {
    _watcher: WatcherHandle,
    _realtime: Option<RealtimeHandle>,
}

impl DataService {
    pub fn new(config: BackendConfig, store: LocalStore) -> Result<Self, DataError> {
        let relational = match &config {
            BackendConfig::Relational(settings) => {
                Some(RelationalAdapter::new(&settings.url, &settings.api_key)?)
            }
            _ => None,
        };
        let document = match &config {
            BackendConfig::AuthDocument(settings) => {
                Some(DocumentAdapter::new(&settings.project_id, &settings.api_key))
            }
            _ => None,
        };
        Ok(Self {
            config,
            store,
            notifier: ChangeNotifier::new(),
            relational,
            document,
        })
    }

    /// Construct from the canonical config file and default store location.
    pub fn with_defaults() -> Result<Self, DataError> {
        Self::new(BackendConfig::load()?, LocalStore::open_default()?)
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// Register a callback fired after every change to the given collection,
    /// whether made through this service, by another process, or pushed by
    /// the backend. Dropping the handle unsubscribes.
    pub fn subscribe_to_data(
        &self,
        kind: EntityKind,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Subscription {
        self.notifier.subscribe(kind, callback)
    }

    /// Start the out-of-process change sources: the snapshot watcher always,
    /// the realtime feed when the relational backend is active. Not started
    /// by `new` so construction stays side-effect free.
    pub fn spawn_listeners(&self) -> Result<Listeners, DataError> {
        let watcher = watcher::start_watcher(self.store.clone(), self.notifier.clone())
            .map_err(|e| DataError::Config(format!("snapshot watcher: {e}")))?;
        let realtime = match (&self.relational, &self.config) {
            (Some(adapter), BackendConfig::Relational(_)) => Some(realtime::spawn(
                adapter.base_url(),
                adapter.api_key(),
                self.notifier.clone(),
            )?),
            _ => None,
        };
        Ok(Listeners {
            _watcher: watcher,
            _realtime: realtime,
        })
    }

    // ------------------------------------------------------------------
    // Generic internals shared by the per-entity wrappers
    // ------------------------------------------------------------------

    /// Read a collection, scoped to what `requester` may see. Backend
    /// errors degrade to the local snapshot, never to the caller.
    pub(crate) async fn fetch<T: Record>(&self, requester: Option<&str>) -> Vec<T> {
        let rows = match (&self.relational, &self.document) {
            (Some(adapter), _) => match adapter.list(T::KIND, requester).await {
                Ok(rows) => Some(rows),
                Err(err) => {
                    log::warn!("data: {} read failed, using snapshot: {}", T::KIND, err);
                    None
                }
            },
            (None, Some(adapter)) if adapter.supports(T::KIND) => {
                match adapter.list(T::KIND).await {
                    Ok(rows) => Some(rows),
                    Err(err) => {
                        log::warn!("data: {} read failed, using snapshot: {}", T::KIND, err);
                        None
                    }
                }
            }
            _ => None,
        };

        match rows {
            Some(rows) => {
                let records: Vec<T> = rows.iter().map(T::from_row).collect();
                // A scoped relational read was filtered server-side, so it
                // holds only the requester's slice of the table. Merge it
                // by id instead of overwriting, or the mirror would lose
                // every row the requester cannot see.
                if self.relational.is_some() && T::KIND.is_scoped() {
                    self.mirror_merge(&records);
                } else {
                    self.store.save(&records);
                }
                records
                    .into_iter()
                    .filter(|r| r.visible_to(requester))
                    .collect()
            }
            None => self.load_visible(requester),
        }
    }

    pub(crate) fn load_visible<T: Record>(&self, requester: Option<&str>) -> Vec<T> {
        self.store
            .load::<T>()
            .into_iter()
            .filter(|r| r.visible_to(requester))
            .collect()
    }

    /// Insert a record: backend first, then the snapshot mirror, then one
    /// publish. The relational backend assigns identity to records sent
    /// without an id; elsewhere a locally generated id fills the gap.
    pub(crate) async fn create<T: Record>(&self, mut record: T) -> Result<T, DataError> {
        match (&self.relational, &self.document) {
            (Some(adapter), _) => {
                let mut payload = serde_json::to_value(&record)?;
                if record.id().is_empty() {
                    if let Some(map) = payload.as_object_mut() {
                        map.remove("id");
                    }
                }
                let stored = adapter.insert(T::KIND, &payload).await?;
                record = T::from_row(&stored);
                if record.id().is_empty() {
                    record.assign_id(local_id());
                }
            }
            (None, Some(adapter)) if adapter.supports(T::KIND) => {
                if record.id().is_empty() {
                    record.assign_id(local_id());
                }
                let payload = serde_json::to_value(&record)?;
                let stored = adapter.create(T::KIND, record.id(), &payload).await?;
                record = T::from_row(&stored);
            }
            _ => {
                if record.id().is_empty() {
                    record.assign_id(local_id());
                }
            }
        }

        self.mirror_insert(&record);
        self.notifier.publish(T::KIND);
        Ok(record)
    }

    /// Replace a record wholesale by id.
    pub(crate) async fn replace<T: Record>(&self, mut record: T) -> Result<T, DataError> {
        match (&self.relational, &self.document) {
            (Some(adapter), _) => {
                let payload = serde_json::to_value(&record)?;
                let stored = adapter.update(T::KIND, record.id(), &payload).await?;
                record = T::from_row(&stored);
            }
            (None, Some(adapter)) if adapter.supports(T::KIND) => {
                let payload = serde_json::to_value(&record)?;
                let stored = adapter.patch(T::KIND, record.id(), &payload).await?;
                record = T::from_row(&stored);
            }
            _ => {}
        }

        self.mirror_replace(&record);
        self.notifier.publish(T::KIND);
        Ok(record)
    }

    pub(crate) async fn remove<T: Record>(&self, id: &str) -> Result<(), DataError> {
        match (&self.relational, &self.document) {
            (Some(adapter), _) => adapter.delete(T::KIND, id).await?,
            (None, Some(adapter)) if adapter.supports(T::KIND) => {
                adapter.delete(T::KIND, id).await?
            }
            _ => {}
        }

        self.mirror_remove::<T>(id);
        self.notifier.publish(T::KIND);
        Ok(())
    }

    /// Load one record, mutate it, and persist the result. The snapshot is
    /// tried first; a backend lookup covers records not yet mirrored.
    pub(crate) async fn patch<T: Record>(
        &self,
        id: &str,
        apply: impl FnOnce(&mut T),
    ) -> Result<T, DataError> {
        let mut record = self.find_record::<T>(id).await?;
        apply(&mut record);
        self.replace(record).await
    }

    pub(crate) async fn find_record<T: Record>(&self, id: &str) -> Result<T, DataError> {
        if let Some(record) = self.store.load::<T>().into_iter().find(|r| r.id() == id) {
            return Ok(record);
        }

        let row = match (&self.relational, &self.document) {
            (Some(adapter), _) => adapter.fetch_one(T::KIND, id).await?,
            (None, Some(adapter)) if adapter.supports(T::KIND) => {
                adapter.get(T::KIND, id).await?
            }
            _ => None,
        };

        row.map(|r| T::from_row(&r)).ok_or_else(|| DataError::NotFound {
            kind: T::KIND,
            id: id.to_string(),
        })
    }

    // Snapshot mirroring. Saves go through `LocalStore::save`, which notes
    // the self-write so the snapshot watcher does not publish a second time.

    fn mirror_insert<T: Record>(&self, record: &T) {
        let mut records = self.store.load::<T>();
        records.retain(|r| r.id() != record.id());
        records.insert(0, record.clone());
        self.store.save(&records);
    }

    fn mirror_replace<T: Record>(&self, record: &T) {
        let mut records = self.store.load::<T>();
        match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => *existing = record.clone(),
            None => records.insert(0, record.clone()),
        }
        self.store.save(&records);
    }

    fn mirror_remove<T: Record>(&self, id: &str) {
        let mut records = self.store.load::<T>();
        records.retain(|r| r.id() != id);
        self.store.save(&records);
    }

    /// Fold a partial result set into the snapshot: fresh rows replace
    /// their stored versions, new ones are prepended, and rows the result
    /// set does not cover stay untouched.
    fn mirror_merge<T: Record>(&self, fresh: &[T]) {
        let mut records = self.store.load::<T>();
        for record in fresh {
            match records.iter_mut().find(|r| r.id() == record.id()) {
                Some(existing) => *existing = record.clone(),
                None => records.insert(0, record.clone()),
            }
        }
        self.store.save(&records);
    }
}

/// Short random id for records created without one: nine characters from
/// [0-9a-z], matching the ids seeded data already uses.
pub(crate) fn local_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Route test logs through env_logger. Safe to call from every test;
    /// only the first call in the binary installs the logger.
    pub fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Local-only service over a temp directory.
    pub fn local_service() -> (tempfile::TempDir, DataService) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open_at(dir.path().to_path_buf()).unwrap();
        let service = DataService::new(BackendConfig::LocalOnly, store).unwrap();
        (dir, service)
    }

    /// Service pointed at a relational backend that cannot be reached, for
    /// exercising the degrade paths.
    pub fn unreachable_relational_service() -> (tempfile::TempDir, DataService) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open_at(dir.path().to_path_buf()).unwrap();
        let config = BackendConfig::Relational(crate::config::RelationalSettings {
            url: "http://127.0.0.1:9/".to_string(),
            api_key: "test-key".to_string(),
        });
        let service = DataService::new(config, store).unwrap();
        (dir, service)
    }
}
