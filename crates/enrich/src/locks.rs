//! Registry of per-key async locks.
//!
//! Entries are created on first use and removed when the last holder
//! releases, so the registry only ever holds keys with work in flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Registry = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

fn lock_registry(registry: &Registry) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default, Clone)]
pub struct KeyedLocks {
    registry: Registry,
}

/// One caller's claim on a registry entry, held while waiting and while
/// holding. Dropping the last claim removes the entry.
struct Registration {
    key: String,
    registry: Registry,
    entry: Arc<AsyncMutex<()>>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut map = lock_registry(&self.registry);
        // One reference in the map, one here: no other claims remain.
        if Arc::strong_count(&self.entry) <= 2 {
            map.remove(&self.key);
        }
    }
}

/// Held for as long as the caller owns the key.
pub struct KeyGuard {
    // Field order matters: the mutex guard must release before the claim.
    _guard: OwnedMutexGuard<()>,
    _registration: Registration,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `key` is free, then hold it until the guard drops.
    /// A waiter cancelled before acquiring still releases its claim.
    pub async fn lock(&self, key: impl Into<String>) -> KeyGuard {
        let key = key.into();
        let entry = lock_registry(&self.registry)
            .entry(key.clone())
            .or_default()
            .clone();
        let registration = Registration {
            key,
            registry: self.registry.clone(),
            entry,
        };
        let guard = registration.entry.clone().lock_owned().await;
        KeyGuard {
            _guard: guard,
            _registration: registration,
        }
    }

    /// Keys currently held or waited on.
    pub fn active_keys(&self) -> usize {
        lock_registry(&self.registry).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_serializes() {
        let locks = KeyedLocks::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock("model:GSP180").await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active_keys(), 0);
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock("model:A").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock("model:B")).await;
        assert!(b.is_ok());
        assert_eq!(locks.active_keys(), 2);
    }

    #[tokio::test]
    async fn entry_removed_after_release() {
        let locks = KeyedLocks::new();
        {
            let _guard = locks.lock("id:1").await;
            assert_eq!(locks.active_keys(), 1);
        }
        assert_eq!(locks.active_keys(), 0);
    }

    #[tokio::test]
    async fn cancelled_waiter_leaves_no_entry() {
        let locks = KeyedLocks::new();
        let holder = locks.lock("model:RO-150").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock("model:RO-150").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        drop(holder);
        waiter.abort();
        let _ = waiter.await;
        assert_eq!(locks.active_keys(), 0);
    }

    #[tokio::test]
    async fn timed_out_waiter_leaves_no_entry() {
        let locks = KeyedLocks::new();
        let holder = locks.lock("id:7").await;
        let waited = tokio::time::timeout(Duration::from_millis(10), locks.lock("id:7")).await;
        assert!(waited.is_err());
        assert_eq!(locks.active_keys(), 1);

        drop(holder);
        assert_eq!(locks.active_keys(), 0);
    }
}
