// Core catalog model, list pipeline, cache, and error modeling.
pub mod cache;
pub mod debounce;
pub mod error;
pub mod listing;
pub mod record;
pub mod validate;
