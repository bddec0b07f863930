//! Purpose: Define the catalog record model and the create-form payload types.
//! Exports: `Record`, `RecordId`, `RawDraft`, `RecordDraft`, `Created`.
//! Role: Wire-compatible shapes for the catalog service JSON bodies.
//! Invariants: `Record::id` is assigned by the service and never rewritten locally.
//! Invariants: Fields other than `id` are opaque on read; only drafts are validated.
use serde::{Deserialize, Serialize};

pub type RecordId = u64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
}

/// Form values exactly as typed; price is still text at this stage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawDraft {
    pub title: String,
    pub price: String,
    pub description: String,
    pub image: String,
    pub category: String,
}

impl RawDraft {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordDraft {
    pub title: String,
    pub price: f64,
    pub description: String,
    pub image: String,
    pub category: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
pub struct Created {
    pub id: RecordId,
}
