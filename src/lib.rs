//! Purpose: Library crate behind the `storefront` catalog CLI and its tests.
//! Exports: `api` (public surface) and `core` (cache, list pipeline, validation, errors).
//! Role: Thin client over a remote product catalog with client-side list shaping.
//! Invariants: Core modules are pure or explicitly stateful; no hidden globals.
//! Invariants: Network access happens only through `api::CatalogSource` implementations.
pub mod api;
pub mod core;
