//! Purpose: Drive the product listing and detail screens from catalog state.
//! Exports: `ListingView`, `ListingScreen`, `ListingPage`, `DetailScreen`, `detail`.
//! Role: UI-shell controller; owns view state, feeds search through the debouncer,
//!       and re-runs the list projection whenever it renders.
//! Invariants: Loading wins over errors; a products failure is reported before a categories failure.
//! Invariants: An error screen never carries a partial list.
use super::catalog::{Catalog, QueryState, QueryStatus, categories_key, records_key};
use super::config::CatalogConfig;
use crate::core::debounce::Debouncer;
use crate::core::error::{Error, ErrorKind};
use crate::core::listing::{CategoryFilter, ListQueryState, SortOrder, project};
use crate::core::record::{Record, RecordId};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

#[derive(Clone, Debug)]
pub enum ListingScreen {
    Loading,
    Failed {
        resource: &'static str,
        error: Arc<Error>,
    },
    Ready(ListingPage),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListingPage {
    pub items: Vec<Record>,
    pub categories: Vec<String>,
    pub page: usize,
    pub total_pages: usize,
    pub total_matches: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

pub struct ListingView {
    catalog: Catalog,
    query: ListQueryState,
    search_input: String,
    search: Debouncer<String>,
}

impl ListingView {
    pub fn new(catalog: Catalog, config: &CatalogConfig) -> Self {
        Self {
            catalog,
            query: ListQueryState::new(config.page_size),
            search_input: String::new(),
            search: Debouncer::new(config.search_debounce),
        }
    }

    pub fn query(&self) -> &ListQueryState {
        &self.query
    }

    /// Raw text in the search box; lags `query().search_text()` until the debounce fires.
    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn type_search(&mut self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        self.search_input = text.clone();
        self.search.push(text, now);
    }

    pub fn search_deadline(&self) -> Option<Instant> {
        self.search.deadline()
    }

    /// Applies a settled search; returns true when the effective search text changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(text) = self.search.poll(now) else {
            return false;
        };
        let changed = text != self.query.search_text();
        self.query.set_search_text(text);
        changed
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.query.set_category(category);
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.query.set_sort(sort);
    }

    pub fn prev_page(&mut self) -> bool {
        if !self.query.can_prev() {
            return false;
        }
        self.query.prev_page();
        true
    }

    pub fn next_page(&mut self) -> bool {
        let total = self.total_pages();
        if !self.query.can_next(total) {
            return false;
        }
        self.query.next_page(total);
        true
    }

    /// Drops cached records and categories so the next render refetches both.
    pub fn refresh(&self) {
        self.catalog.invalidate(&records_key());
        self.catalog.invalidate(&categories_key());
    }

    /// Renders from the cache, fetching whatever is missing or stale.
    /// Products and categories are read concurrently.
    pub fn render(&self) -> ListingScreen {
        let catalog = &self.catalog;
        let (records, categories) = thread::scope(|scope| {
            let categories = scope.spawn(|| catalog.list_categories());
            let records = catalog.list_records();
            let categories = categories.join().unwrap_or_else(|_| QueryState {
                status: QueryStatus::Error,
                data: None,
                error: Some(Arc::new(
                    Error::new(ErrorKind::Internal).with_message("categories read panicked"),
                )),
            });
            (records, categories)
        });
        self.screen(records, categories)
    }

    /// Renders from whatever is cached right now, without fetching.
    pub fn render_cached(&self) -> ListingScreen {
        let records = self.catalog.peek_records();
        let categories = self.catalog.peek_categories();
        self.screen(records, categories)
    }

    fn total_pages(&self) -> usize {
        let records = self.catalog.peek_records();
        let Some(records) = records.data else {
            return 1;
        };
        project(&records, &self.query).total_pages
    }

    fn screen(
        &self,
        records: QueryState<Arc<Vec<Record>>>,
        categories: QueryState<Arc<Vec<String>>>,
    ) -> ListingScreen {
        if records.status == QueryStatus::Loading || categories.status == QueryStatus::Loading {
            return ListingScreen::Loading;
        }
        if records.status == QueryStatus::Error {
            return ListingScreen::Failed {
                resource: "products",
                error: records.error.unwrap_or_else(missing_error),
            };
        }
        if categories.status == QueryStatus::Error {
            return ListingScreen::Failed {
                resource: "categories",
                error: categories.error.unwrap_or_else(missing_error),
            };
        }

        let records = records.data.unwrap_or_default();
        let page = project(&records, &self.query);
        ListingScreen::Ready(ListingPage {
            items: page.items.iter().map(|record| (*record).clone()).collect(),
            categories: categories
                .data
                .map(|categories| categories.as_ref().clone())
                .unwrap_or_default(),
            page: page.page,
            total_pages: page.total_pages,
            total_matches: page.total_matches,
            has_prev: page.has_prev(),
            has_next: page.has_next(),
        })
    }
}

fn missing_error() -> Arc<Error> {
    Arc::new(Error::new(ErrorKind::Internal).with_message("error state without an error"))
}

#[derive(Clone, Debug)]
pub enum DetailScreen {
    Loading,
    NotFound(RecordId),
    Failed(Arc<Error>),
    Ready(Arc<Record>),
}

pub fn detail(catalog: &Catalog, id: RecordId) -> DetailScreen {
    let state = catalog.get_record(id);
    match state.status {
        QueryStatus::Loading => DetailScreen::Loading,
        QueryStatus::Ready => match state.data {
            Some(record) => DetailScreen::Ready(record),
            None => DetailScreen::NotFound(id),
        },
        QueryStatus::Error => match state.error {
            Some(err) if err.kind() == ErrorKind::NotFound => DetailScreen::NotFound(id),
            Some(err) => DetailScreen::Failed(err),
            None => DetailScreen::Failed(missing_error()),
        },
    }
}
