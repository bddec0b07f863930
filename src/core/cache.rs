//! Purpose: Keyed cache of fetch results with per-key deduplication and invalidation.
//! Exports: `QueryCache`, `QueryKey`, `CacheEntry`, `EntryStatus`.
//! Role: Session-scoped store shared by every reader; owned by the catalog service.
//! Invariants: At most one fetch per key is outstanding; concurrent readers wait for it.
//! Invariants: A settled fetch overwrites its entry in one step under the cache lock.
//! Invariants: Invalidation never cancels an in-flight fetch; that fetch settles as stale.
//! Invariants: Per-key states: absent -> pending -> success|error -> stale -> pending.
use super::error::{Error, ErrorKind};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (index, part) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{part:?}")?;
        }
        write!(f, "]")
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryStatus {
    Pending,
    Success,
    Error,
}

#[derive(Clone, Debug)]
pub struct CacheEntry<T> {
    pub key: QueryKey,
    pub status: EntryStatus,
    pub value: Option<T>,
    pub error: Option<Arc<Error>>,
    pub stale: bool,
}

struct Slot<T> {
    entry: CacheEntry<T>,
    in_flight: bool,
    started: u64,
    settled: u64,
    generation: u64,
}

impl<T> Slot<T> {
    fn pending(key: QueryKey) -> Self {
        Self {
            entry: CacheEntry {
                key,
                status: EntryStatus::Pending,
                value: None,
                error: None,
                stale: false,
            },
            in_flight: true,
            started: 1,
            settled: 0,
            generation: 0,
        }
    }

    fn claim(&self) -> Claim {
        Claim {
            ticket: self.started,
            generation: self.generation,
        }
    }

    // Keeps the previous value visible while the refetch is pending.
    fn begin_fetch(&mut self) -> Claim {
        self.started += 1;
        self.in_flight = true;
        self.entry.status = EntryStatus::Pending;
        self.entry.error = None;
        self.claim()
    }

    fn finish(&mut self, claim: Claim, outcome: Result<T, Error>) {
        self.in_flight = false;
        self.settled = claim.ticket;
        self.entry.stale = self.generation != claim.generation;
        match outcome {
            Ok(value) => {
                self.entry.status = EntryStatus::Success;
                self.entry.value = Some(value);
                self.entry.error = None;
            }
            Err(err) => {
                self.entry.status = EntryStatus::Error;
                self.entry.value = None;
                self.entry.error = Some(Arc::new(err));
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Claim {
    ticket: u64,
    generation: u64,
}

pub struct QueryCache<T> {
    slots: Mutex<HashMap<QueryKey, Slot<T>>>,
    settled: Condvar,
}

impl<T: Clone> QueryCache<T> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            settled: Condvar::new(),
        }
    }

    /// Returns the cached entry for `key`, running `fetcher` only when the key
    /// is absent or stale and no other reader is already fetching it.
    pub fn read<F>(&self, key: &QueryKey, fetcher: F) -> CacheEntry<T>
    where
        F: FnOnce() -> Result<T, Error>,
    {
        let mut slots = self.lock();
        let claim = loop {
            let Some(slot) = slots.get_mut(key) else {
                let slot = Slot::pending(key.clone());
                let claim = slot.claim();
                slots.insert(key.clone(), slot);
                break claim;
            };
            if slot.in_flight {
                let awaited = slot.started;
                tracing::debug!(key = %key, "joining in-flight fetch");
                slots = self
                    .settled
                    .wait_while(slots, |slots| {
                        slots.get(key).is_some_and(|slot| slot.settled < awaited)
                    })
                    .unwrap_or_else(PoisonError::into_inner);
                match slots.get(key) {
                    Some(slot) if slot.settled >= awaited => return slot.entry.clone(),
                    _ => continue,
                }
            }
            if !slot.entry.stale {
                return slot.entry.clone();
            }
            break slot.begin_fetch();
        };
        drop(slots);

        tracing::debug!(key = %key, ticket = claim.ticket, "fetch started");
        let mut guard = FetchGuard {
            cache: self,
            key,
            claim,
            armed: true,
        };
        let outcome = fetcher();
        guard.armed = false;
        self.settle(key, claim, outcome)
    }

    /// Marks `key` stale; returns false when nothing is cached under it.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let mut slots = self.lock();
        let Some(slot) = slots.get_mut(key) else {
            return false;
        };
        slot.generation += 1;
        slot.entry.stale = true;
        tracing::debug!(key = %key, in_flight = slot.in_flight, "entry invalidated");
        true
    }

    pub fn peek(&self, key: &QueryKey) -> Option<CacheEntry<T>> {
        self.lock().get(key).map(|slot| slot.entry.clone())
    }

    fn settle(&self, key: &QueryKey, claim: Claim, outcome: Result<T, Error>) -> CacheEntry<T> {
        let mut slots = self.lock();
        let slot = slots
            .entry(key.clone())
            .or_insert_with(|| Slot::pending(key.clone()));
        slot.finish(claim, outcome);
        let entry = slot.entry.clone();
        drop(slots);
        self.settled.notify_all();
        tracing::debug!(key = %key, status = ?entry.status, stale = entry.stale, "fetch settled");
        entry
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Slot<T>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Settles the claimed slot as failed if the fetcher unwinds, so waiting
/// readers are released and the next read retries.
struct FetchGuard<'a, T: Clone> {
    cache: &'a QueryCache<T>,
    key: &'a QueryKey,
    claim: Claim,
    armed: bool,
}

impl<T: Clone> Drop for FetchGuard<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let err = Error::new(ErrorKind::Internal).with_message("fetch did not complete");
        let mut slots = self.cache.lock();
        if let Some(slot) = slots.get_mut(self.key) {
            slot.finish(self.claim, Err(err));
            slot.entry.stale = true;
        }
        drop(slots);
        self.cache.settled.notify_all();
    }
}
