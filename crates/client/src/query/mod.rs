//! Keyed query cache with request de-duplication.
//!
//! The cache is an explicitly constructed object shared through `Arc`; there
//! is no process-wide instance. Each `QueryKey` owns one slot:
//!
//! - A slot holding fresh `Success` data answers without touching the network.
//! - Otherwise the first caller starts one request and every concurrent caller
//!   for the same key awaits that same request.
//! - Failures are stored as `QueryStatus::Error`; nothing is thrown at callers.
//! - Background prefetches never surface errors. A failed prefetch leaves the
//!   slot as it was unless a foreground fetch joined it, and a prefetch never
//!   touches a slot in `Error`; only an explicit `fetch` retries.
//!
//! The internal mutex is never held across an await.

pub mod entry;

pub use entry::{CacheEntry, DETAIL_STALE_TIME, LIST_STALE_TIME, Payload, QueryStatus, StalePolicy};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use animedex_core::QueryKey;
use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::api::{AnimeSource, ApiError};

type SharedFetch = Shared<BoxFuture<'static, Result<Payload, ApiError>>>;

/// Request currently running for a slot.
struct InFlight {
    generation: u64,
    fetch: SharedFetch,
    /// Only prefetches are waiting on it.
    background: bool,
    /// Status the slot had before the request started.
    previous: QueryStatus,
}

struct Slot {
    entry: CacheEntry,
    in_flight: Option<InFlight>,
}

#[derive(Default)]
struct Slots {
    by_key: HashMap<QueryKey, Slot>,
    next_generation: u64,
}

enum Begin {
    Ready(CacheEntry),
    Wait { generation: u64, fetch: SharedFetch },
}

/// De-duplicating, staleness-aware cache in front of an `AnimeSource`.
pub struct QueryCache {
    source: Arc<dyn AnimeSource>,
    policy: StalePolicy,
    slots: Mutex<Slots>,
    prefetches: Mutex<Vec<JoinHandle<()>>>,
}

impl QueryCache {
    pub fn new(source: Arc<dyn AnimeSource>, policy: StalePolicy) -> Self {
        Self { source, policy, slots: Mutex::new(Slots::default()), prefetches: Mutex::new(Vec::new()) }
    }

    pub fn policy(&self) -> &StalePolicy {
        &self.policy
    }

    /// Snapshot of a slot without triggering a fetch.
    pub fn peek(&self, key: &QueryKey) -> Option<CacheEntry> {
        self.slots().by_key.get(key).map(|slot| slot.entry.clone())
    }

    /// Whether `key` should be handed to `fetch` without user action.
    ///
    /// True for missing, idle and stale slots, and for in-flight requests
    /// whose every waiter went away before it settled. Errors stay put until
    /// an explicit retry.
    pub fn needs_fetch(&self, key: &QueryKey) -> bool {
        let slots = self.slots();
        let Some(slot) = slots.by_key.get(key) else {
            return true;
        };
        match slot.entry.status {
            QueryStatus::Idle => true,
            QueryStatus::Error => false,
            // The slot keeps one handle itself; a lone handle means nobody drives the request.
            QueryStatus::Loading => slot.in_flight.as_ref().is_none_or(|f| f.fetch.strong_count() <= Some(1)),
            QueryStatus::Success => !slot.entry.is_fresh(Instant::now(), &self.policy),
        }
    }

    /// Resolve `key`, from cache when fresh and from the source otherwise.
    ///
    /// Concurrent calls for the same key share one request and receive the
    /// same result.
    pub async fn fetch(&self, key: QueryKey) -> CacheEntry {
        self.run(key, false).await
    }

    /// Warm the cache for `key` in the background.
    ///
    /// Fire-and-forget: the result is only observable through later `peek` or
    /// `fetch` calls, and failures are discarded.
    pub fn prefetch(self: &Arc<Self>, key: QueryKey) {
        let cache = Arc::clone(self);
        tracing::debug!(key = %key, "prefetching");
        let handle = tokio::spawn(async move {
            let entry = cache.run(key, true).await;
            if let Some(err) = &entry.error {
                tracing::debug!(key = %entry.key, error = %err, "prefetch failed, discarding");
            }
        });

        let mut tasks = self.prefetches.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    /// Abort background work and drop every entry.
    ///
    /// Requests already awaited by callers still resolve for those callers
    /// but are no longer stored.
    pub fn shutdown(&self) {
        let tasks: Vec<_> = self.prefetches.lock().unwrap_or_else(PoisonError::into_inner).drain(..).collect();
        for task in &tasks {
            task.abort();
        }
        let mut slots = self.slots();
        tracing::debug!(entries = slots.by_key.len(), prefetches = tasks.len(), "query cache shut down");
        slots.by_key.clear();
    }

    async fn run(&self, key: QueryKey, background: bool) -> CacheEntry {
        let (generation, fetch) = match self.begin(&key, background) {
            Begin::Ready(entry) => return entry,
            Begin::Wait { generation, fetch } => (generation, fetch),
        };

        let result = fetch.await;
        self.settle(key, generation, result)
    }

    fn begin(&self, key: &QueryKey, background: bool) -> Begin {
        let now = Instant::now();
        let mut guard = self.slots();
        let Slots { by_key, next_generation } = &mut *guard;
        let slot = by_key
            .entry(key.clone())
            .or_insert_with(|| Slot { entry: CacheEntry::idle(key.clone()), in_flight: None });

        if slot.entry.is_fresh(now, &self.policy) {
            tracing::debug!(key = %key, "cache hit");
            return Begin::Ready(slot.entry.clone());
        }

        if background && slot.entry.status == QueryStatus::Error {
            tracing::debug!(key = %key, "skipping prefetch of failed key");
            return Begin::Ready(slot.entry.clone());
        }

        if let Some(in_flight) = &mut slot.in_flight {
            tracing::debug!(key = %key, "joining in-flight request");
            in_flight.background &= background;
            return Begin::Wait { generation: in_flight.generation, fetch: in_flight.fetch.clone() };
        }

        *next_generation += 1;
        let generation = *next_generation;
        let fetch = load(Arc::clone(&self.source), key.clone()).boxed().shared();

        tracing::debug!(key = %key, background, "cache miss, fetching");
        let previous = std::mem::replace(&mut slot.entry.status, QueryStatus::Loading);
        slot.in_flight = Some(InFlight { generation, fetch: fetch.clone(), background, previous });

        Begin::Wait { generation, fetch }
    }

    fn settle(&self, key: QueryKey, generation: u64, result: Result<Payload, ApiError>) -> CacheEntry {
        let mut slots = self.slots();
        let Some(slot) = slots.by_key.get_mut(&key) else {
            // Dropped by shutdown while the request was running.
            return detached_entry(key, result);
        };

        let owns_request = slot.in_flight.as_ref().is_some_and(|f| f.generation == generation);
        if !owns_request {
            // Another waiter on the same request already stored the result.
            return slot.entry.clone();
        }

        let (background, previous) = match slot.in_flight.take() {
            Some(f) => (f.background, f.previous),
            None => (false, slot.entry.status),
        };
        let entry = &mut slot.entry;
        match result {
            Ok(payload) => {
                entry.status = QueryStatus::Success;
                entry.data = Some(payload);
                entry.error = None;
                entry.fetched_at = Some(Instant::now());
                entry.updated_at = Some(Utc::now());
            }
            Err(err) if background => {
                entry.status = previous;
                return CacheEntry { status: QueryStatus::Error, error: Some(err), ..entry.clone() };
            }
            Err(err) => {
                if err.is_throttled() {
                    tracing::warn!(key = %key, "request throttled by upstream (HTTP 429)");
                } else {
                    tracing::debug!(key = %key, error = %err, "request failed");
                }
                entry.status = QueryStatus::Error;
                entry.error = Some(err);
            }
        }

        entry.clone()
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn load(source: Arc<dyn AnimeSource>, key: QueryKey) -> Result<Payload, ApiError> {
    match key {
        QueryKey::AnimeList { page, search } => {
            source.fetch_list(page, &search).await.map(|list| Payload::List(Arc::new(list)))
        }
        QueryKey::AnimeDetail { id } => source.fetch_detail(id).await.map(|detail| Payload::Detail(Arc::new(detail))),
    }
}

fn detached_entry(key: QueryKey, result: Result<Payload, ApiError>) -> CacheEntry {
    let idle = CacheEntry::idle(key);
    match result {
        Ok(payload) => CacheEntry {
            status: QueryStatus::Success,
            data: Some(payload),
            fetched_at: Some(Instant::now()),
            updated_at: Some(Utc::now()),
            ..idle
        },
        Err(err) => CacheEntry { status: QueryStatus::Error, error: Some(err), ..idle },
    }
}
