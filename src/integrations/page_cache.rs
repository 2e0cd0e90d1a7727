//! Response cache for source pages.
//!
//! `AsyncTtlCache` is an in-memory TTL cache with request coalescing: while
//! one caller is fetching a key, concurrent callers for the same key wait for
//! that fetch instead of issuing their own. Each entry carries its own TTL,
//! chosen by the fetcher, so failures can be kept for a backoff window while
//! successful pages use the configured freshness.

use crate::error::FetchError;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OnceCell};

/// A cached fetch outcome. Errors are cached too, for the backoff duration.
#[derive(Debug, Clone)]
pub enum Cached<T> {
    Ok(T),
    Err(FetchError),
}

impl<T> Cached<T> {
    pub fn into_result(self) -> Result<T, FetchError> {
        match self {
            Self::Ok(v) => Ok(v),
            Self::Err(e) => Err(e),
        }
    }
}

impl<T> From<Result<T, FetchError>> for Cached<T> {
    fn from(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(v) => Self::Ok(v),
            Err(e) => Self::Err(e),
        }
    }
}

#[derive(Debug)]
struct Stored<V> {
    value: V,
    expires_at: Instant,
}

type Slot<V> = Arc<OnceCell<Stored<V>>>;

/// Longest an entry is kept, whatever TTL the fetcher asks for
pub const MAX_TTL: Duration = Duration::from_secs(24 * 60 * 60);

fn expiry_after(ttl: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(ttl.min(MAX_TTL)).unwrap_or(now)
}

/// A slot is live while its value is fresh or someone is still fetching it.
/// An empty slot nobody holds belongs to a fetch that was dropped.
fn is_live<V>(slot: &Slot<V>, now: Instant) -> bool {
    match slot.get() {
        Some(stored) => now < stored.expires_at,
        None => Arc::strong_count(slot) > 1,
    }
}

#[derive(Debug)]
pub struct AsyncTtlCache<K, V> {
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> Default for AsyncTtlCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> AsyncTtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Return the fresh value for `key`, joining an in-flight fetch if there
    /// is one, or run `fetcher` and keep its value for the TTL it returns.
    ///
    /// If the fetching caller is dropped mid-flight, one of the waiters
    /// takes over the fetch.
    pub async fn get_or_init_with_ttl<F, Fut>(&self, key: K, fetcher: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = (V, Duration)>,
    {
        let slot = {
            let mut slots = self.slots.lock().await;
            let now = Instant::now();
            let expired = slots
                .get(&key)
                .and_then(|slot| slot.get())
                .is_some_and(|stored| now >= stored.expires_at);
            if expired || !slots.contains_key(&key) {
                // Sweep expired entries before inserting a new key.
                let before = slots.len();
                slots.retain(|_, slot| is_live(slot, now));
                if before > slots.len() {
                    tracing::debug!("page cache evicted {} stale entries", before - slots.len());
                }
            }
            Arc::clone(slots.entry(key).or_default())
        };

        let stored = slot
            .get_or_init(|| async {
                let (value, ttl) = fetcher().await;
                Stored {
                    value,
                    expires_at: expiry_after(ttl),
                }
            })
            .await;

        stored.value.clone()
    }

    /// Drop every entry. In-flight fetches still complete for their waiters.
    pub async fn clear(&self) {
        self.slots.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
