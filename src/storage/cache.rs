//! Read-through caches fronting store accessors.
//!
//! Three eviction policies: size-bounded (LRU, no expiry), time-bounded
//! (TTL, no capacity limit), and combined. The store uses these as
//! *identity* caches: values are shared handles (`Arc<Mutex<_>>`), so every
//! holder of a live entry sees the same logical instance. Eviction only
//! drops the handle and forces a fresh store read; it never makes an
//! outstanding handle stale, because every mutation path writes through to
//! the store before the object is considered durable.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

struct Inner<K, V> {
    map: HashMap<K, Entry<V>>,
    // Front is least recently used. Only maintained for sized policies.
    order: VecDeque<K>,
}

/// A cache with optional capacity and TTL bounds. `get_or_load` is the
/// read-through entry point; `insert`/`remove` exist for write paths that
/// must keep identity coherent (player creation, administrative deletes).
pub struct ReadThroughCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    capacity: Option<usize>,
    ttl: Option<Duration>,
}

impl<K: Eq + Hash + Clone, V: Clone> ReadThroughCache<K, V> {
    /// LRU cache with a fixed capacity and no expiry.
    pub fn sized(capacity: usize) -> Self {
        Self::with_bounds(Some(capacity), None)
    }

    /// Unbounded cache whose entries expire `ttl` after insertion.
    pub fn ttl(ttl: Duration) -> Self {
        Self::with_bounds(None, Some(ttl))
    }

    /// Capacity-bounded LRU whose entries additionally expire after `ttl`.
    pub fn sized_ttl(capacity: usize, ttl: Duration) -> Self {
        Self::with_bounds(Some(capacity), Some(ttl))
    }

    fn with_bounds(capacity: Option<usize>, ttl: Option<Duration>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity,
            ttl,
        }
    }

    /// Return the cached value for `key` if present and unexpired, else run
    /// `loader`, cache its result, and return it. The lock is not held
    /// across the loader, so loaders may hit other caches freely.
    pub fn get_or_load<E>(
        &self,
        key: K,
        loader: impl FnOnce(&K) -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = loader(&key)?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Cached value for `key`, refreshing its LRU position on hit.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let expired = match inner.map.get(key) {
            None => return None,
            Some(entry) => self
                .ttl
                .is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl),
        };
        if expired {
            Self::evict(&mut inner, key);
            return None;
        }
        if self.capacity.is_some() {
            Self::touch(&mut inner, key);
        }
        inner.map.get(key).map(|entry| entry.value.clone())
    }

    /// Insert `value` under `key`, evicting the least recently used entries
    /// beyond capacity. Expired entries are pruned here so unbounded TTL
    /// caches do not grow without limit between reads.
    pub fn insert(&self, key: K, value: V) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        if let Some(ttl) = self.ttl {
            let expired: Vec<K> = inner
                .map
                .iter()
                .filter(|(_, entry)| entry.inserted_at.elapsed() >= ttl)
                .map(|(k, _)| k.clone())
                .collect();
            for k in &expired {
                Self::evict(&mut inner, k);
            }
        }
        let fresh = Entry {
            value,
            inserted_at: Instant::now(),
        };
        if inner.map.insert(key.clone(), fresh).is_none() {
            inner.order.push_back(key.clone());
        } else {
            Self::touch(&mut inner, &key);
        }
        if let Some(capacity) = self.capacity {
            while inner.map.len() > capacity {
                let Some(oldest) = inner.order.pop_front() else {
                    break;
                };
                inner.map.remove(&oldest);
            }
        }
    }

    /// Drop the entry for `key`, returning the evicted value if present.
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        Self::evict(&mut inner, key)
    }

    /// Number of resident entries, counting expired-but-unpruned ones out.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().expect("cache mutex poisoned");
        match self.ttl {
            None => inner.map.len(),
            Some(ttl) => inner
                .map
                .values()
                .filter(|entry| entry.inserted_at.elapsed() < ttl)
                .count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn touch(inner: &mut Inner<K, V>, key: &K) {
        if let Some(pos) = inner.order.iter().position(|k| k == key) {
            inner.order.remove(pos);
        }
        inner.order.push_back(key.clone());
    }

    fn evict(inner: &mut Inner<K, V>, key: &K) -> Option<V> {
        let entry = inner.map.remove(key)?;
        if let Some(pos) = inner.order.iter().position(|k| k == key) {
            inner.order.remove(pos);
        }
        Some(entry.value)
    }
}
