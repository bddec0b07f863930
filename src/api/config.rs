//! Purpose: Hold the session configuration for a catalog client.
//! Exports: `CatalogConfig`, `DEFAULT_BASE_URL`.
//! Role: Plain settings struct filled from CLI flags or by embedding shells.
//! Invariants: Defaults match the public demo catalog service and a six-item page.
//! Invariants: No timeout is imposed unless one is configured.
use crate::core::debounce::DEFAULT_SEARCH_DEBOUNCE;
use crate::core::listing::DEFAULT_PAGE_SIZE;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://fakestoreapi.com";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CatalogConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
    pub page_size: usize,
    pub search_debounce: Duration,
}

impl CatalogConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_search_debounce(mut self, delay: Duration) -> Self {
        self.search_debounce = delay;
        self
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }
}
