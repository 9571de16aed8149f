//! In-process change notification registry.
//!
//! Pages subscribe a callback per entity kind; the facade publishes that kind
//! after every successful write, and the snapshot watcher / realtime listener
//! publish it for out-of-process changes. Callbacks run synchronously in
//! registration order on the publishing thread, so a subscriber invoked
//! during `publish` already observes the updated local snapshot.
//!
//! Registering the same closure twice is allowed and fires twice; each
//! registration has its own `Subscription` handle removing exactly itself.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::EntityKind;

type Callback = Arc<dyn Fn() + Send + Sync>;

struct Registration {
    id: u64,
    callback: Callback,
}

struct NotifierInner {
    registry: Mutex<HashMap<EntityKind, Vec<Registration>>>,
    next_id: AtomicU64,
}

/// Publish/subscribe registry keyed by entity kind. Cheap to clone; clones
/// share the registry.
#[derive(Clone)]
pub struct ChangeNotifier {
    inner: Arc<NotifierInner>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(NotifierInner {
                registry: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register a callback for one entity kind. The returned handle removes
    /// exactly this registration when unsubscribed or dropped.
    pub fn subscribe(
        &self,
        kind: EntityKind,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .registry
            .lock()
            .entry(kind)
            .or_default()
            .push(Registration {
                id,
                callback: Arc::new(callback),
            });
        Subscription {
            inner: Arc::clone(&self.inner),
            kind,
            id,
            active: true,
        }
    }

    /// Invoke every callback registered for `kind`, synchronously, in
    /// registration order. Each invocation is isolated: a panicking
    /// subscriber is logged and the rest still run.
    pub fn publish(&self, kind: EntityKind) {
        // Snapshot the callbacks so subscribers may subscribe/unsubscribe
        // (or publish) reentrantly without deadlocking on the registry.
        let callbacks: Vec<Callback> = {
            let registry = self.inner.registry.lock();
            match registry.get(&kind) {
                Some(entries) => entries.iter().map(|r| Arc::clone(&r.callback)).collect(),
                None => return,
            }
        };

        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                log::warn!("notifier: subscriber for {} panicked", kind);
            }
        }
    }

    /// Number of live registrations for a kind. Diagnostic only.
    pub fn subscriber_count(&self, kind: EntityKind) -> usize {
        self.inner
            .registry
            .lock()
            .get(&kind)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

/// Handle to one registration. `unsubscribe()` (or dropping the handle)
/// removes that registration; other subscribers for the same kind are
/// unaffected. Unsubscribing twice is a no-op.
pub struct Subscription {
    inner: Arc<NotifierInner>,
    kind: EntityKind,
    id: u64,
    active: bool,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        let mut registry = self.inner.registry.lock();
        if let Some(entries) = registry.get_mut(&self.kind) {
            entries.retain(|r| r.id != self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_publish_reaches_all_subscribers_once() {
        let notifier = ChangeNotifier::new();
        let (a, cb_a) = counter();
        let (b, cb_b) = counter();
        let _sub_a = notifier.subscribe(EntityKind::Leads, cb_a);
        let _sub_b = notifier.subscribe(EntityKind::Leads, cb_b);

        notifier.publish(EntityKind::Leads);
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_publish_is_scoped_to_kind() {
        let notifier = ChangeNotifier::new();
        let (count, cb) = counter();
        let _sub = notifier.subscribe(EntityKind::Leads, cb);

        notifier.publish(EntityKind::Products);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_removes_exactly_one() {
        let notifier = ChangeNotifier::new();
        let (a, cb_a) = counter();
        let (b, cb_b) = counter();
        let sub_a = notifier.subscribe(EntityKind::Leads, cb_a);
        let _sub_b = notifier.subscribe(EntityKind::Leads, cb_b);

        sub_a.unsubscribe();
        notifier.publish(EntityKind::Leads);
        assert_eq!(a.load(Ordering::SeqCst), 0);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let notifier = ChangeNotifier::new();
        let (count, cb) = counter();
        {
            let _sub = notifier.subscribe(EntityKind::Leads, cb);
            assert_eq!(notifier.subscriber_count(EntityKind::Leads), 1);
        }
        assert_eq!(notifier.subscriber_count(EntityKind::Leads), 0);
        notifier.publish(EntityKind::Leads);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_duplicate_registration_fires_twice() {
        let notifier = ChangeNotifier::new();
        let (count, _) = counter();
        let shared = Arc::clone(&count);
        let cb = move || {
            shared.fetch_add(1, Ordering::SeqCst);
        };
        let _one = notifier.subscribe(EntityKind::Leads, cb.clone());
        let _two = notifier.subscribe(EntityKind::Leads, cb);

        notifier.publish(EntityKind::Leads);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panicking_subscriber_does_not_starve_others() {
        let notifier = ChangeNotifier::new();
        let _panicky = notifier.subscribe(EntityKind::Leads, || panic!("boom"));
        let (count, cb) = counter();
        let _sub = notifier.subscribe(EntityKind::Leads, cb);

        notifier.publish(EntityKind::Leads);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callbacks_run_in_registration_order() {
        let notifier = ChangeNotifier::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            // Leak the handles into the notifier's lifetime for this test.
            std::mem::forget(notifier.subscribe(EntityKind::Leads, move || {
                order.lock().push(tag);
            }));
        }
        notifier.publish(EntityKind::Leads);
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }
}
