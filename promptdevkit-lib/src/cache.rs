//! An in-process query cache with staleness and in-flight deduplication.
//!
//! [`QueryCache`] stores the result of each [`QueryOptions`] fetch under its key and
//! serves it while it is younger than the options' stale time. Concurrent fetches of
//! the same key share one in-flight future. Errors are returned to every waiter but are
//! never stored, so the next fetch tries again.

use crate::clock::Clock;
use crate::query::{QueryKey, QueryOptions};
use crate::remote::QueryError;
use chrono::{DateTime, TimeDelta, Utc};
use core::any::Any;
use core::time::Duration;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const LOG_TARGET: &str = "     cache";

type CachedValue = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<CachedValue, QueryError>>>;

#[derive(Debug)]
struct Entry {
    value: CachedValue,
    fetched_at: DateTime<Utc>,
}

impl Entry {
    fn is_fresh(&self, now: DateTime<Utc>, stale_time: Duration) -> bool {
        // Timestamps in the future (clock skew) count as fresh
        let age = now.signed_duration_since(self.fetched_at);
        age < TimeDelta::from_std(stale_time).unwrap_or(TimeDelta::MAX)
    }
}

struct InFlight {
    generation: u64,
    future: SharedFetch,
}

#[derive(Default)]
struct State {
    entries: HashMap<QueryKey, Entry>,
    in_flight: HashMap<QueryKey, InFlight>,
    next_generation: u64,
}

/// Query cache keyed by [`QueryKey`].
pub struct QueryCache {
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

impl core::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.lock();
        f.debug_struct("QueryCache")
            .field("entries", &state.entries.len())
            .field("in_flight", &state.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl QueryCache {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(State::default()),
        }
    }

    /// Return the cached value for `options.key` while it is fresh, otherwise fetch it.
    ///
    /// Disabled options bypass the cache entirely: their fetch procedure runs directly and
    /// its result is not stored.
    pub async fn fetch<T>(&self, options: &QueryOptions<T>) -> Result<Arc<T>, QueryError>
    where
        T: Send + Sync + 'static,
    {
        if !options.enabled {
            log::debug!(target: LOG_TARGET, "query {} is disabled, not caching", options.key);
            return options.run().await.map(Arc::new);
        }

        let (generation, future) = {
            let mut state = self.lock();

            if let Some(entry) = state.entries.get(&options.key)
                && entry.is_fresh(self.clock.now(), options.stale_time)
                && let Ok(value) = Arc::clone(&entry.value).downcast::<T>()
            {
                log::debug!(target: LOG_TARGET, "cache hit for {}", options.key);
                return Ok(value);
            }

            if let Some(in_flight) = state.in_flight.get(&options.key) {
                log::debug!(target: LOG_TARGET, "joining in-flight fetch for {}", options.key);
                (in_flight.generation, in_flight.future.clone())
            } else {
                log::debug!(target: LOG_TARGET, "cache miss for {}", options.key);
                let generation = state.next_generation;
                state.next_generation += 1;

                let pending = (options.fetch)();
                let future = async move { pending.await.map(|value| Arc::new(value) as CachedValue) }
                    .boxed()
                    .shared();

                let _ = state.in_flight.insert(
                    options.key.clone(),
                    InFlight {
                        generation,
                        future: future.clone(),
                    },
                );

                (generation, future)
            }
        };

        let result = future.await;
        self.complete(&options.key, generation, &result);

        match result?.downcast::<T>() {
            Ok(value) => Ok(value),
            Err(_unexpected) => Err(QueryError::transport(ohno::app_err!(
                "cached value for {} does not have the requested type",
                options.key
            ))),
        }
    }

    /// Peek at the stored value for `key` without fetching, regardless of freshness.
    #[must_use]
    pub fn get<T>(&self, key: &QueryKey) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let state = self.lock();
        let entry = state.entries.get(key)?;
        Arc::clone(&entry.value).downcast::<T>().ok()
    }

    /// Remove every entry whose key starts with `prefix`, returning how many were removed.
    ///
    /// In-flight fetches under the prefix are detached: their waiters still receive the
    /// result, but it is not stored.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut state = self.lock();
        let before = state.entries.len();
        state.entries.retain(|key, _| !key.starts_with(prefix));
        state.in_flight.retain(|key, _| !key.starts_with(prefix));
        let removed = before - state.entries.len();

        log::debug!(target: LOG_TARGET, "invalidated {removed} entries under {prefix}");
        removed
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn complete(&self, key: &QueryKey, generation: u64, result: &Result<CachedValue, QueryError>) {
        let mut state = self.lock();

        // Only the fetch that is still registered for the key may store its result
        if state.in_flight.get(key).is_none_or(|in_flight| in_flight.generation != generation) {
            return;
        }

        let _ = state.in_flight.remove(key);

        match result {
            Ok(value) => {
                let _ = state.entries.insert(
                    key.clone(),
                    Entry {
                        value: Arc::clone(value),
                        fetched_at: self.clock.now(),
                    },
                );
            }
            Err(e) => log::debug!(target: LOG_TARGET, "fetch for {key} failed, not caching: {e}"),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
