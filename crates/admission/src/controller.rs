//! Fixed-window admission controller.
//!
//! Counters live in a fixed set of independently locked shards keyed by
//! scope. A single admission locks only the shards its keys hash to (in
//! ascending order), checks every applicable limit and increments all of
//! them only when none is exhausted.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use seoforge_core::config::{OperationLimit, RateLimitConfig};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::error::RateLimited;
use crate::identity::normalize_path;
use crate::window::{CounterKey, Scope, Window};

const SHARD_COUNT: usize = 16;

type CounterMap = HashMap<CounterKey, u32>;

/// Outcome of a single admission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdmissionDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

struct Check {
    key: CounterKey,
    limit: u32,
    shard: usize,
}

/// Gatekeeper in front of the pipeline entry point.
pub struct AdmissionController {
    requests_per_minute: u32,
    requests_per_hour: u32,
    /// Operation overrides with normalized paths.
    operations: Vec<OperationLimit>,
    clock: Arc<dyn Clock>,
    shards: Vec<Mutex<CounterMap>>,
}

fn lock(shard: &Mutex<CounterMap>) -> MutexGuard<'_, CounterMap> {
    shard.lock().unwrap_or_else(PoisonError::into_inner)
}

fn sweep_map(map: &mut CounterMap, now: u64) -> usize {
    let before = map.len();
    map.retain(|key, _| !key.window.is_stale(key.bucket, now));
    before - map.len()
}

impl AdmissionController {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        let operations = config
            .operations
            .iter()
            .map(|op| OperationLimit {
                method: op.method.to_uppercase(),
                path: normalize_path(&op.path),
                ..op.clone()
            })
            .collect();
        Self {
            requests_per_minute: config.requests_per_minute,
            requests_per_hour: config.requests_per_hour,
            operations,
            clock,
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    fn shard_for(&self, scope: &Scope) -> usize {
        let mut hasher = DefaultHasher::new();
        scope.hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }

    fn operation_limit(&self, method: &str, path: &str) -> Option<&OperationLimit> {
        self.operations
            .iter()
            .find(|op| op.method.eq_ignore_ascii_case(method) && op.path == path)
    }

    /// Every (counter, limit) pair a request is subject to. A limit of 0
    /// disables that check.
    fn applicable_checks(&self, client: &str, method: &str, path: &str, now: u64) -> Vec<Check> {
        let mut limits = vec![
            (Scope::Client(client.to_string()), Window::Minute, self.requests_per_minute),
            (Scope::Client(client.to_string()), Window::Hour, self.requests_per_hour),
        ];
        let normalized = normalize_path(path);
        if let Some(op) = self.operation_limit(method, &normalized) {
            let scope = Scope::Operation {
                method: op.method.clone(),
                path: op.path.clone(),
                client: client.to_string(),
            };
            limits.push((scope.clone(), Window::Minute, op.requests_per_minute));
            limits.push((scope, Window::Hour, op.requests_per_hour));
        }

        limits
            .into_iter()
            .filter(|(_, _, limit)| *limit > 0)
            .map(|(scope, window, limit)| {
                let shard = self.shard_for(&scope);
                Check {
                    key: CounterKey {
                        scope,
                        window,
                        bucket: window.bucket(now),
                    },
                    limit,
                    shard,
                }
            })
            .collect()
    }

    /// Admit or reject one request. Rejected requests leave every counter
    /// untouched.
    pub fn try_admit(&self, client: &str, method: &str, path: &str) -> Result<(), RateLimited> {
        let now = self.clock.now_unix();
        let checks = self.applicable_checks(client, method, path, now);
        if checks.is_empty() {
            return Ok(());
        }

        // Locks are always taken in ascending shard order.
        let shard_ids: BTreeSet<usize> = checks.iter().map(|c| c.shard).collect();
        let mut guards: BTreeMap<usize, MutexGuard<'_, CounterMap>> = shard_ids
            .into_iter()
            .map(|id| (id, lock(&self.shards[id])))
            .collect();

        let swept: usize = guards.values_mut().map(|g| sweep_map(g, now)).sum();
        if swept > 0 {
            debug!(swept, "Swept stale rate-limit buckets");
        }

        let mut rejection: Option<RateLimited> = None;
        for check in &checks {
            let count = guards
                .get(&check.shard)
                .and_then(|g| g.get(&check.key))
                .copied()
                .unwrap_or(0);
            if count >= check.limit {
                let retry_after = check.key.window.remaining(now);
                let longer = rejection
                    .as_ref()
                    .map_or(true, |r| retry_after > r.retry_after_seconds);
                if longer {
                    rejection = Some(RateLimited {
                        retry_after_seconds: retry_after,
                        window: check.key.window,
                        limit: check.limit,
                        scope: check.key.scope.to_string(),
                    });
                }
            }
        }

        if let Some(rejected) = rejection {
            info!(
                client,
                method,
                path,
                retry_after = rejected.retry_after_seconds,
                window = %rejected.window,
                "Request rate limited"
            );
            return Err(rejected);
        }

        for check in checks {
            if let Some(guard) = guards.get_mut(&check.shard) {
                *guard.entry(check.key).or_insert(0) += 1;
            }
        }
        Ok(())
    }

    pub fn admit(&self, client: &str, method: &str, path: &str) -> AdmissionDecision {
        match self.try_admit(client, method, path) {
            Ok(()) => AdmissionDecision {
                allowed: true,
                retry_after_seconds: None,
            },
            Err(e) => AdmissionDecision {
                allowed: false,
                retry_after_seconds: Some(e.retry_after_seconds),
            },
        }
    }

    /// Drop every stale bucket across all shards. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_unix();
        self.shards.iter().map(|s| sweep_map(&mut lock(s), now)).sum()
    }

    /// Number of live counters (all shards).
    pub fn tracked_counters(&self) -> usize {
        self.shards.iter().map(|s| lock(s).len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    // Aligned to a minute boundary, well inside an hour.
    const T0: u64 = 1_700_000_400;

    fn controller(config: RateLimitConfig) -> (AdmissionController, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(T0));
        (AdmissionController::with_clock(&config, clock.clone()), clock)
    }

    #[test]
    fn three_per_minute_then_next_window() {
        let (ctl, clock) = controller(RateLimitConfig::flat(3, 1000));
        for _ in 0..3 {
            assert!(ctl.admit("1.2.3.4", "GET", "/api/x").allowed);
            clock.advance(5);
        }
        let denied = ctl.admit("1.2.3.4", "GET", "/api/x");
        assert!(!denied.allowed);
        let retry = denied.retry_after_seconds.unwrap();
        assert!(retry <= 60 && retry >= 1);
        assert_eq!(retry, 60 - 15);

        clock.set(T0 + 60);
        assert!(ctl.admit("1.2.3.4", "GET", "/api/x").allowed);
    }

    #[test]
    fn rejection_does_not_consume_quota() {
        let (ctl, clock) = controller(RateLimitConfig::flat(3, 4));
        for _ in 0..3 {
            assert!(ctl.admit("c", "GET", "/").allowed);
        }
        for _ in 0..5 {
            assert!(!ctl.admit("c", "GET", "/").allowed);
        }
        clock.advance(60);
        // hour count is 3, so exactly one more fits
        assert!(ctl.admit("c", "GET", "/").allowed);
        let denied = ctl.try_admit("c", "GET", "/").unwrap_err();
        assert_eq!(denied.window, Window::Hour);
        assert!(denied.retry_after_seconds > 60);
    }

    #[test]
    fn clients_are_independent() {
        let (ctl, _) = controller(RateLimitConfig::flat(1, 100));
        assert!(ctl.admit("a", "GET", "/").allowed);
        assert!(!ctl.admit("a", "GET", "/").allowed);
        assert!(ctl.admit("b", "GET", "/").allowed);
    }

    #[test]
    fn operation_override_is_additional() {
        let mut config = RateLimitConfig::flat(100, 1000);
        config.operations = vec![OperationLimit::new("post", "/api/products/:id/reprocess", 2, 10)];
        let (ctl, _) = controller(config);

        assert!(ctl.admit("c", "POST", "/api/products/7/reprocess").allowed);
        assert!(ctl.admit("c", "POST", "/api/products/8/reprocess").allowed);
        let denied = ctl.try_admit("c", "POST", "/api/products/9/reprocess").unwrap_err();
        assert!(denied.scope.contains("/api/products/:id/reprocess"));

        // other operations and other clients still pass
        assert!(ctl.admit("c", "GET", "/api/products/7").allowed);
        assert!(ctl.admit("d", "POST", "/api/products/7/reprocess").allowed);
    }

    #[test]
    fn global_limit_applies_to_overridden_operation() {
        let mut config = RateLimitConfig::flat(2, 1000);
        config.operations = vec![OperationLimit::new("POST", "/api/products/enrich", 10, 100)];
        let (ctl, _) = controller(config);
        assert!(ctl.admit("c", "GET", "/health").allowed);
        assert!(ctl.admit("c", "POST", "/api/products/enrich").allowed);
        assert!(!ctl.admit("c", "POST", "/api/products/enrich").allowed);
    }

    #[test]
    fn zero_limit_disables_check() {
        let (ctl, _) = controller(RateLimitConfig::flat(0, 0));
        for _ in 0..100 {
            assert!(ctl.admit("c", "GET", "/").allowed);
        }
        assert_eq!(ctl.tracked_counters(), 0);
    }

    #[test]
    fn stale_buckets_are_swept() {
        let (ctl, clock) = controller(RateLimitConfig::flat(10, 100));
        ctl.admit("a", "GET", "/");
        ctl.admit("b", "GET", "/");
        assert_eq!(ctl.tracked_counters(), 4);

        clock.advance(120);
        // minute buckets are now two windows old, hour buckets still live
        assert_eq!(ctl.sweep(), 2);
        assert_eq!(ctl.tracked_counters(), 2);

        clock.advance(2 * 3600);
        assert_eq!(ctl.sweep(), 2);
        assert_eq!(ctl.tracked_counters(), 0);
    }

    #[test]
    fn admission_sweeps_stale_buckets_it_touches() {
        let (ctl, clock) = controller(RateLimitConfig::flat(1, 100));
        assert!(ctl.admit("a", "GET", "/").allowed);
        assert_eq!(ctl.tracked_counters(), 2);

        clock.advance(120);
        assert!(ctl.admit("a", "GET", "/").allowed);
        // old minute bucket gone, fresh minute bucket plus the shared hour bucket
        assert_eq!(ctl.tracked_counters(), 2);
    }

    #[test]
    fn concurrent_admissions_never_overshoot() {
        let (ctl, _) = controller(RateLimitConfig::flat(50, 1000));
        let admitted = std::sync::atomic::AtomicUsize::new(0);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..20 {
                        if ctl.admit("shared", "GET", "/").allowed {
                            admitted.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        }
                    }
                });
            }
        });
        assert_eq!(admitted.into_inner(), 50);
    }
}
