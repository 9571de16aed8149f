//! Snapshot watcher for cross-process change detection.
//!
//! Watches the local store directory for changes to the per-collection
//! snapshot files and publishes the matching entity kind, so a second
//! process (or anything else editing the snapshots) is picked up by
//! subscribers in this one. Saves made by this process within the
//! self-write window are skipped; the facade already published those.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::sleep;

use crate::notifier::ChangeNotifier;
use crate::store::LocalStore;
use crate::types::EntityKind;

/// Debounce window for file system events
const DEBOUNCE_MS: u64 = 500;

/// Handle to the background watcher task. Dropping it stops watching.
pub struct WatcherHandle {
    task: tokio::task::JoinHandle<()>,
    // Kept alive for the task's lifetime; dropping it unregisters the
    // OS-level watch.
    _watcher: RecommendedWatcher,
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start watching the store directory for snapshot changes.
///
/// Spawns a background task that:
/// 1. Watches `<dir>/<collection>.json` for create/modify/remove events
/// 2. Debounces rapid changes (500ms window), coalescing per collection
/// 3. Skips collections this process saved within the self-write window
/// 4. Publishes the entity kind for everything that remains
pub fn start_watcher(
    store: LocalStore,
    notifier: ChangeNotifier,
) -> Result<WatcherHandle, notify::Error> {
    // Channel for forwarding notify events to the async debouncer
    let (fs_tx, mut fs_rx) = mpsc::channel::<PathBuf>(64);

    let mut watcher = RecommendedWatcher::new(
        move |result: Result<Event, notify::Error>| {
            if let Ok(event) = result {
                if matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    for path in event.paths {
                        // The callback runs on notify's own thread, so when
                        // a burst fills the channel we can block until the
                        // debouncer drains it rather than lose the event.
                        if let Err(TrySendError::Full(path)) = fs_tx.try_send(path) {
                            let _ = fs_tx.blocking_send(path);
                        }
                    }
                }
            }
        },
        notify::Config::default(),
    )?;
    watcher.watch(store.dir(), RecursiveMode::NonRecursive)?;
    log::info!("watcher: watching {} for snapshot changes", store.dir().display());

    let task = tokio::spawn(async move {
        loop {
            let Some(first) = fs_rx.recv().await else {
                break; // Channel closed, watcher dropped
            };

            // Debounce: collect every path that changes within the window
            // so one burst of writes publishes each kind once.
            let mut changed = HashSet::new();
            if let Some(kind) = kind_for_path(&first) {
                changed.insert(kind);
            }
            sleep(Duration::from_millis(DEBOUNCE_MS)).await;
            while let Ok(path) = fs_rx.try_recv() {
                if let Some(kind) = kind_for_path(&path) {
                    changed.insert(kind);
                }
            }

            for kind in changed {
                if store.recently_written(kind) {
                    log::debug!("watcher: {} changed by this process, skipping", kind);
                    continue;
                }
                log::debug!("watcher: {} changed externally", kind);
                notifier.publish(kind);
            }
        }
        log::info!("watcher: stopped");
    });

    Ok(WatcherHandle {
        task,
        _watcher: watcher,
    })
}

/// Map a changed path back to its entity kind. Temp files and anything
/// that is not a `<collection>.json` snapshot are ignored.
fn kind_for_path(path: &std::path::Path) -> Option<EntityKind> {
    if path.extension()?.to_str()? != "json" {
        return None;
    }
    EntityKind::from_collection(path.file_stem()?.to_str()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_kind_for_path_maps_snapshots_only() {
        assert_eq!(
            kind_for_path(std::path::Path::new("/data/leads.json")),
            Some(EntityKind::Leads)
        );
        assert_eq!(
            kind_for_path(std::path::Path::new("/data/purchase_orders.json")),
            Some(EntityKind::PurchaseOrders)
        );
        assert_eq!(kind_for_path(std::path::Path::new("/data/leads.json.tmp")), None);
        assert_eq!(kind_for_path(std::path::Path::new("/data/unknown.json")), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_external_write_publishes_kind() {
        crate::data::test_support::init_logging();
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open_at(dir.path().to_path_buf()).unwrap();
        let notifier = ChangeNotifier::new();

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let _sub = notifier.subscribe(EntityKind::Leads, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let _handle = start_watcher(store, notifier).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Simulates another process rewriting the snapshot.
        std::fs::write(dir.path().join("leads.json"), "[]").unwrap();

        for _ in 0..40 {
            if hits.load(Ordering::SeqCst) > 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("external snapshot change was never published");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_burst_of_external_writes_publishes_every_kind() {
        crate::data::test_support::init_logging();
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open_at(dir.path().to_path_buf()).unwrap();
        let notifier = ChangeNotifier::new();

        let lead_hits = Arc::new(AtomicUsize::new(0));
        let product_hits = Arc::new(AtomicUsize::new(0));
        let leads = Arc::clone(&lead_hits);
        let products = Arc::clone(&product_hits);
        let _lead_sub = notifier.subscribe(EntityKind::Leads, move || {
            leads.fetch_add(1, Ordering::SeqCst);
        });
        let _product_sub = notifier.subscribe(EntityKind::Products, move || {
            products.fetch_add(1, Ordering::SeqCst);
        });

        let _handle = start_watcher(store, notifier).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Rapid rewrites of both snapshots; no event may be lost even when
        // they arrive faster than the debouncer drains them.
        for _ in 0..50 {
            std::fs::write(dir.path().join("leads.json"), "[]").unwrap();
            std::fs::write(dir.path().join("products.json"), "[]").unwrap();
        }

        for _ in 0..40 {
            if lead_hits.load(Ordering::SeqCst) > 0 && product_hits.load(Ordering::SeqCst) > 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!(
            "burst writes lost events: leads={} products={}",
            lead_hits.load(Ordering::SeqCst),
            product_hits.load(Ordering::SeqCst)
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_own_save_is_not_echoed() {
        crate::data::test_support::init_logging();
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open_at(dir.path().to_path_buf()).unwrap();
        let notifier = ChangeNotifier::new();

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let _sub = notifier.subscribe(EntityKind::Products, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let _handle = start_watcher(store.clone(), notifier).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        store.save::<crate::types::Product>(&[]);
        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
