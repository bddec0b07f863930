//! Purpose: Shared JSON serializers for CLI listing, detail, and browse output.
//! Exports: `record_json`, `page_json`, `screen_json`, `categories_json`.
//! Role: Keep output envelope shapes identical across one-shot commands and browse mode.
//! Invariants: Stable key names for records and pages; `screen` tags every browse line.

use serde_json::{Value, json};
use storefront::api::{ListQueryState, ListingPage, ListingScreen, Page, Record};

pub(crate) fn record_json(record: &Record) -> Value {
    json!({
        "id": record.id,
        "title": record.title,
        "price": record.price,
        "description": record.description,
        "category": record.category,
        "image": record.image,
    })
}

pub(crate) fn categories_json(categories: &[String]) -> Value {
    json!({ "categories": categories })
}

pub(crate) fn page_json(page: &Page<'_>) -> Value {
    let items = page
        .items
        .iter()
        .map(|record| record_json(record))
        .collect::<Vec<_>>();
    json!({
        "items": items,
        "page": page.page,
        "total_pages": page.total_pages,
        "total": page.total_matches,
        "has_prev": page.has_prev(),
        "has_next": page.has_next(),
    })
}

fn query_json(query: &ListQueryState) -> Value {
    json!({
        "search": query.search_text(),
        "category": query.category().as_str(),
        "sort": query.sort().as_str(),
    })
}

fn listing_page_json(page: &ListingPage) -> Value {
    let items = page.items.iter().map(record_json).collect::<Vec<_>>();
    json!({
        "items": items,
        "page": page.page,
        "total_pages": page.total_pages,
        "total": page.total_matches,
        "has_prev": page.has_prev,
        "has_next": page.has_next,
        "categories": page.categories,
    })
}

pub(crate) fn screen_json(screen: &ListingScreen, query: &ListQueryState) -> Value {
    match screen {
        ListingScreen::Loading => json!({ "screen": "loading", "query": query_json(query) }),
        ListingScreen::Failed { resource, error } => json!({
            "screen": "error",
            "resource": resource,
            "message": format!("Failed to load {resource}."),
            "error": {
                "kind": format!("{:?}", error.kind()),
                "message": error.message(),
                "status": error.status(),
            },
        }),
        ListingScreen::Ready(page) => json!({
            "screen": "ready",
            "query": query_json(query),
            "listing": listing_page_json(page),
        }),
    }
}
