//! Purpose: Define the public Rust API boundary for the catalog client.
//! Exports: Catalog service, remote client, mutation and view controllers, core types.
//! Role: Stable surface for shells (CLI today); hides cache internals behind `Catalog`.
//! Invariants: Shells reach the cache only through `Catalog` and the key helpers.
//! Invariants: Re-exports are additive-only.

mod catalog;
mod config;
#[cfg(test)]
mod fixture;
mod mutation;
mod remote;
mod view;

pub use crate::core::cache::{CacheEntry, EntryStatus, QueryCache, QueryKey};
pub use crate::core::debounce::{DEFAULT_SEARCH_DEBOUNCE, Debouncer};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::listing::{
    ALL_CATEGORIES, CategoryFilter, DEFAULT_PAGE_SIZE, ListQueryState, Page, SortOrder, project,
};
pub use crate::core::record::{Created, RawDraft, Record, RecordDraft, RecordId};
pub use crate::core::validate::{Field, FieldError, validate_draft};
pub use catalog::{
    Catalog, CatalogValue, QueryState, QueryStatus, categories_key, record_key, records_key,
};
pub use config::{CatalogConfig, DEFAULT_BASE_URL};
pub use mutation::{CreateForm, MutationStatus, submit_create};
pub use remote::{CatalogSource, RemoteCatalog};
pub use view::{DetailScreen, ListingPage, ListingScreen, ListingView, detail};
