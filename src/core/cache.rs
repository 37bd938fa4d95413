//! Bounded in-memory TTL cache.
//!
//! Entries carry an absolute expiry and are never served past it. When a new key
//! arrives at a full cache, expired entries are purged first and then the least
//! recently used entry is evicted. Concurrent misses on one key share a single
//! computation: the first caller starts it, later callers await the same future.
//! If every caller gives up on a computation, its in-flight slot is released so the
//! next caller starts afresh.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared, TryFutureExt};

/// Default upper bound on the number of cached entries.
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Source of "now" for expiry checks.
pub trait Clock: Send + Sync + fmt::Debug {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset_ms: Arc<AtomicU64>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Creates a clock frozen at the current instant.
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.offset_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}

type Pending<V, E> = Shared<BoxFuture<'static, Result<V, Arc<E>>>>;

/// A running computation and the instant it started, which its TTL counts from.
struct Flight<V, E> {
    pending: Pending<V, E>,
    started: Instant,
    /// Callers currently awaiting `pending`.
    waiters: usize,
}

struct Entry<V> {
    value: V,
    expires_at: Instant,
    last_used: u64,
}

struct Inner<V, E> {
    entries: HashMap<String, Entry<V>>,
    in_flight: HashMap<String, Flight<V, E>>,
    tick: u64,
}

impl<V: Clone, E> Inner<V, E> {
    /// Removes the in-flight slot for `key` if it still holds `pending`, returning
    /// when that computation started.
    fn release(&mut self, key: &str, pending: &Pending<V, E>) -> Option<Instant> {
        let started = self
            .in_flight
            .get(key)
            .filter(|f| f.pending.ptr_eq(pending))?
            .started;
        self.in_flight.remove(key);
        Some(started)
    }

    /// Called when a waiter is dropped before `pending` finished. The last one out
    /// frees the slot.
    fn abandon(&mut self, key: &str, pending: &Pending<V, E>) -> bool {
        let Some(flight) = self
            .in_flight
            .get_mut(key)
            .filter(|f| f.pending.ptr_eq(pending))
        else {
            return false;
        };
        flight.waiters = flight.waiters.saturating_sub(1);
        if flight.waiters > 0 {
            return false;
        }
        self.in_flight.remove(key);
        true
    }

    fn lookup(&mut self, key: &str, now: Instant) -> Option<V> {
        self.tick += 1;
        let tick = self.tick;
        match self.entries.get_mut(key) {
            Some(entry) if now < entry.expires_at => {
                entry.last_used = tick;
                Some(entry.value.clone())
            }
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn store(&mut self, key: String, value: V, now: Instant, ttl: Duration, max_entries: usize) {
        if max_entries == 0 {
            return;
        }
        if !self.entries.contains_key(&key) && self.entries.len() >= max_entries {
            self.entries.retain(|_, e| now < e.expires_at);
            if self.entries.len() >= max_entries
                && let Some(victim) = self
                    .entries
                    .iter()
                    .min_by_key(|(_, e)| e.last_used)
                    .map(|(k, _)| k.clone())
            {
                self.entries.remove(&victim);
            }
        }
        self.tick += 1;
        self.entries.insert(
            key,
            Entry {
                value,
                expires_at: now + ttl,
                last_used: self.tick,
            },
        );
    }
}

/// Signs a caller off from an in-flight computation if it is dropped before the
/// computation finished.
struct FlightGuard<'a, V: Clone, E> {
    inner: &'a Mutex<Inner<V, E>>,
    key: &'a str,
    pending: Option<Pending<V, E>>,
}

impl<V: Clone, E> Drop for FlightGuard<'_, V, E> {
    fn drop(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.abandon(self.key, &pending) {
            tracing::debug!(key = %self.key, "abandoned in-flight computation released");
        }
    }
}

/// A shared, bounded TTL cache keyed by string.
///
/// `V` is the cached value, `E` the error type of the computations run on a miss.
pub struct TtlCache<V, E> {
    inner: Mutex<Inner<V, E>>,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl<V, E> fmt::Debug for TtlCache<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("max_entries", &self.max_entries)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl<V, E> TtlCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Creates a cache using the system clock.
    pub fn new(max_entries: usize) -> Self {
        Self::with_clock(max_entries, Arc::new(SystemClock))
    }

    /// Creates a cache reading time from `clock`.
    pub fn with_clock(max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
                tick: 0,
            }),
            max_entries,
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V, E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Returns the live value for `key`, if any.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        self.lock().lookup(key, now)
    }

    /// Stores `value` under `key` for `ttl`, replacing any previous entry.
    pub async fn insert(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let now = self.clock.now();
        self.lock()
            .store(key.into(), value, now, ttl, self.max_entries);
    }

    /// Drops the entry for `key`. Returns whether one was present.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.lock().entries.remove(key).is_some()
    }

    pub async fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Number of stored entries, expired ones not yet purged included.
    pub async fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Returns the live value for `key`, or runs `compute` and caches its success for `ttl`.
    ///
    /// A failed computation is not stored, so the next call runs it again.
    ///
    /// # Errors
    ///
    /// Returns the computation's error. Callers that joined an in-flight computation
    /// observe the same shared error.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<V, Arc<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        self.resolve(key, ttl, compute, true).await
    }

    /// Like [`get_or_compute`](Self::get_or_compute) but ignores any stored value.
    ///
    /// # Errors
    ///
    /// Returns the computation's error.
    pub async fn refresh<F, Fut>(&self, key: &str, ttl: Duration, compute: F) -> Result<V, Arc<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        self.resolve(key, ttl, compute, false).await
    }

    async fn resolve<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
        read: bool,
    ) -> Result<V, Arc<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let pending = {
            let mut inner = self.lock();
            let now = self.clock.now();
            if read && let Some(value) = inner.lookup(key, now) {
                tracing::debug!(key = %key, "cache hit");
                return Ok(value);
            }
            if let Some(flight) = inner.in_flight.get_mut(key) {
                tracing::debug!(key = %key, "joining in-flight computation");
                flight.waiters += 1;
                flight.pending.clone()
            } else {
                tracing::debug!(key = %key, "cache miss");
                let pending: Pending<V, E> = compute().map_err(Arc::new).boxed().shared();
                inner.in_flight.insert(
                    key.to_string(),
                    Flight {
                        pending: pending.clone(),
                        started: now,
                        waiters: 1,
                    },
                );
                pending
            }
        };

        let mut guard = FlightGuard {
            inner: &self.inner,
            key,
            pending: Some(pending.clone()),
        };
        let result = pending.clone().await;
        guard.pending = None;

        let mut inner = self.lock();
        if let Some(started) = inner.release(key, &pending)
            && let Ok(value) = &result
        {
            inner.store(key.to_string(), value.clone(), started, ttl, self.max_entries);
        }
        result
    }
}
