//! Purpose: Expose cached catalog reads as loading/error/ready query states.
//! Exports: `Catalog`, `CatalogValue`, `QueryState`, `QueryStatus`, cache key helpers.
//! Role: Session service owning the query cache and the catalog source; passed explicitly.
//! Invariants: Every read goes through the cache under a stable key.
//! Invariants: Background reads deliver over a channel; a dropped receiver discards the result.
#![allow(clippy::result_large_err)]

use super::config::CatalogConfig;
use super::remote::{CatalogSource, RemoteCatalog};
use crate::core::cache::{CacheEntry, EntryStatus, QueryCache, QueryKey};
use crate::core::error::{Error, ErrorKind};
use crate::core::record::{Record, RecordId};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;

type ApiResult<T> = Result<T, Error>;

pub fn records_key() -> QueryKey {
    QueryKey::new(["records"])
}

pub fn categories_key() -> QueryKey {
    QueryKey::new(["categories"])
}

pub fn record_key(id: RecordId) -> QueryKey {
    QueryKey::new(["record".to_string(), id.to_string()])
}

#[derive(Clone, Debug)]
pub enum CatalogValue {
    Records(Arc<Vec<Record>>),
    Categories(Arc<Vec<String>>),
    Record(Arc<Record>),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QueryStatus {
    Loading,
    Error,
    Ready,
}

impl QueryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryStatus::Loading => "loading",
            QueryStatus::Error => "error",
            QueryStatus::Ready => "ready",
        }
    }
}

#[derive(Clone, Debug)]
pub struct QueryState<T> {
    pub status: QueryStatus,
    pub data: Option<T>,
    pub error: Option<Arc<Error>>,
}

impl<T> QueryState<T> {
    pub fn loading() -> Self {
        Self {
            status: QueryStatus::Loading,
            data: None,
            error: None,
        }
    }

    fn from_entry(entry: CacheEntry<CatalogValue>, extract: fn(CatalogValue) -> Option<T>) -> Self {
        let status = match entry.status {
            EntryStatus::Pending => QueryStatus::Loading,
            EntryStatus::Success => QueryStatus::Ready,
            EntryStatus::Error => QueryStatus::Error,
        };
        let data = entry.value.map(extract);
        match data {
            Some(None) => Self {
                status: QueryStatus::Error,
                data: None,
                error: Some(Arc::new(
                    Error::new(ErrorKind::Internal)
                        .with_message(format!("cache entry {} holds another value type", entry.key)),
                )),
            },
            Some(data) => Self {
                status,
                data,
                error: entry.error,
            },
            None => Self {
                status,
                data: None,
                error: entry.error,
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == QueryStatus::Ready
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|err| err.kind())
    }
}

#[derive(Clone)]
pub struct Catalog {
    source: Arc<dyn CatalogSource>,
    cache: Arc<QueryCache<CatalogValue>>,
}

impl Catalog {
    pub fn new(source: impl CatalogSource + 'static) -> Self {
        Self::from_source(Arc::new(source))
    }

    pub fn from_source(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            source,
            cache: Arc::new(QueryCache::new()),
        }
    }

    pub fn connect(config: &CatalogConfig) -> ApiResult<Self> {
        Ok(Self::new(RemoteCatalog::from_config(config)?))
    }

    pub fn source(&self) -> &dyn CatalogSource {
        self.source.as_ref()
    }

    pub fn cache(&self) -> &QueryCache<CatalogValue> {
        &self.cache
    }

    pub fn list_records(&self) -> QueryState<Arc<Vec<Record>>> {
        let entry = self.cache.read(&records_key(), || {
            self.source
                .list_records()
                .map(|records| CatalogValue::Records(Arc::new(records)))
        });
        QueryState::from_entry(entry, as_records)
    }

    pub fn list_categories(&self) -> QueryState<Arc<Vec<String>>> {
        let entry = self.cache.read(&categories_key(), || {
            self.source
                .list_categories()
                .map(|categories| CatalogValue::Categories(Arc::new(categories)))
        });
        QueryState::from_entry(entry, as_categories)
    }

    pub fn get_record(&self, id: RecordId) -> QueryState<Arc<Record>> {
        let entry = self.cache.read(&record_key(id), || {
            self.source
                .get_record(id)
                .map(|record| CatalogValue::Record(Arc::new(record)))
        });
        QueryState::from_entry(entry, as_record)
    }

    /// Current records state without triggering a fetch.
    pub fn peek_records(&self) -> QueryState<Arc<Vec<Record>>> {
        match self.cache.peek(&records_key()) {
            Some(entry) => QueryState::from_entry(entry, as_records),
            None => QueryState::loading(),
        }
    }

    pub fn peek_categories(&self) -> QueryState<Arc<Vec<String>>> {
        match self.cache.peek(&categories_key()) {
            Some(entry) => QueryState::from_entry(entry, as_categories),
            None => QueryState::loading(),
        }
    }

    pub fn invalidate(&self, key: &QueryKey) -> bool {
        self.cache.invalidate(key)
    }

    /// Runs `read` on a worker thread; the result is dropped if the receiver is gone.
    pub fn in_background<T, F>(&self, read: F) -> Receiver<T>
    where
        T: Send + 'static,
        F: FnOnce(&Catalog) -> T + Send + 'static,
    {
        let catalog = self.clone();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let outcome = read(&catalog);
            if tx.send(outcome).is_err() {
                tracing::debug!("receiver dropped; discarding background read");
            }
        });
        rx
    }
}

fn as_records(value: CatalogValue) -> Option<Arc<Vec<Record>>> {
    match value {
        CatalogValue::Records(records) => Some(records),
        _ => None,
    }
}

fn as_categories(value: CatalogValue) -> Option<Arc<Vec<String>>> {
    match value {
        CatalogValue::Categories(categories) => Some(categories),
        _ => None,
    }
}

fn as_record(value: CatalogValue) -> Option<Arc<Record>> {
    match value {
        CatalogValue::Record(record) => Some(record),
        _ => None,
    }
}
