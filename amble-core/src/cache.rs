//! Time-limited, single-flight cache of built networks.
//!
//! Building a walking network is expensive. [`GraphCache`] keeps one built
//! [`Graph`] per key until its time-to-live elapses. Concurrent callers
//! asking for the same key while it is being built wait for that build
//! rather than starting their own. Failed builds are not cached.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::graph::Graph;

/// Default time-to-live for cached networks.
pub const DEFAULT_GRAPH_TTL: Duration = Duration::from_secs(60 * 60);

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// [`Clock`] backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug)]
struct CachedGraph {
    graph: Arc<Graph>,
    built_at: Instant,
}

type Slot = Arc<Mutex<Option<CachedGraph>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic inside a build leaves the slot empty, which is a valid state.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keyed network cache with TTL expiry and single-flight construction.
///
/// # Examples
/// ```
/// use std::convert::Infallible;
/// use std::time::Duration;
/// use amble_core::{GraphBuilder, GraphCache};
///
/// let cache: GraphCache<&str> = GraphCache::new(Duration::from_secs(60));
/// let first = cache
///     .get_or_build(&"city", || Ok::<_, Infallible>(GraphBuilder::new().build()))
///     .expect("infallible");
/// let second = cache
///     .get_or_build(&"city", || -> Result<_, Infallible> { panic!("already cached") })
///     .expect("infallible");
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// ```
pub struct GraphCache<K, C = SystemClock> {
    ttl: Duration,
    clock: C,
    slots: Mutex<HashMap<K, Slot>>,
}

impl<K, C> fmt::Debug for GraphCache<K, C>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = lock(&self.slots)
            .keys()
            .map(|key| format!("{key:?}"))
            .collect();
        f.debug_struct("GraphCache")
            .field("ttl", &self.ttl)
            .field("keys", &keys)
            .finish_non_exhaustive()
    }
}

impl<K> GraphCache<K, SystemClock>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    /// Create a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<K, C> GraphCache<K, C>
where
    K: Eq + Hash + Clone + fmt::Debug,
    C: Clock,
{
    /// Create a cache reading time from `clock`.
    #[must_use]
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            ttl,
            clock,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Entry lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn slot(&self, key: &K) -> Slot {
        let mut slots = lock(&self.slots);
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Whether `slot` is still the one mapped to `key`.
    fn is_current(&self, key: &K, slot: &Slot) -> bool {
        lock(&self.slots)
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    fn is_fresh(&self, cached: &CachedGraph) -> bool {
        self.clock.now().saturating_duration_since(cached.built_at) < self.ttl
    }

    /// Return the cached network for `key`, building it when absent or
    /// expired.
    ///
    /// Only one build per key runs at a time; other callers for that key
    /// block until it finishes and then share its result.
    ///
    /// # Errors
    /// Propagates the error returned by `build`. Nothing is cached on error.
    pub fn get_or_build<F, E>(&self, key: &K, build: F) -> Result<Arc<Graph>, E>
    where
        F: FnOnce() -> Result<Graph, E>,
    {
        loop {
            let slot = self.slot(key);
            let mut entry = lock(&slot);
            // The slot may have been invalidated or purged between lookup
            // and lock; building into it would race a caller on the new slot.
            if !self.is_current(key, &slot) {
                log::debug!("graph cache slot for {key:?} was dropped; retrying");
                continue;
            }
            match entry.as_ref() {
                Some(cached) if self.is_fresh(cached) => {
                    log::debug!("graph cache hit for {key:?}");
                    return Ok(Arc::clone(&cached.graph));
                }
                Some(_) => log::info!("graph cache entry for {key:?} expired; rebuilding"),
                None => log::info!("graph cache miss for {key:?}; building"),
            }
            let started = self.clock.now();
            let graph = Arc::new(build()?);
            let built_at = self.clock.now();
            log::info!(
                "built graph for {key:?} with {} nodes and {} edges in {:?}",
                graph.node_count(),
                graph.edge_count(),
                built_at.saturating_duration_since(started)
            );
            *entry = Some(CachedGraph {
                graph: Arc::clone(&graph),
                built_at,
            });
            return Ok(graph);
        }
    }

    /// Return the cached network for `key` if present and fresh.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<Arc<Graph>> {
        let slot = lock(&self.slots).get(key).map(Arc::clone)?;
        let entry = lock(&slot);
        entry
            .as_ref()
            .filter(|cached| self.is_fresh(cached))
            .map(|cached| Arc::clone(&cached.graph))
    }

    /// Drop the entry for `key`. Returns `true` if one existed.
    ///
    /// Waits for an in-flight build of `key` to finish first.
    pub fn invalidate(&self, key: &K) -> bool {
        let Some(slot) = lock(&self.slots).get(key).map(Arc::clone) else {
            return false;
        };
        let mut entry = lock(&slot);
        let mut slots = lock(&self.slots);
        if slots
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, &slot))
        {
            slots.remove(key);
        }
        entry.take().is_some()
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut slots = lock(&self.slots);
        let before = slots.len();
        slots.retain(|_, slot| {
            // A slot that is mid-build is locked; keep it.
            slot.try_lock()
                .map_or(true, |entry| entry.as_ref().is_some_and(|c| self.is_fresh(c)))
        });
        before - slots.len()
    }

    /// Number of keys with a slot, fresh or not.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.slots).len()
    }

    /// Return `true` when no keys are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.slots).is_empty()
    }
}
