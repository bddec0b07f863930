//! Purpose: Validate create-form input before anything reaches the network.
//! Exports: `Field`, `FieldError`, `validate_draft`.
//! Role: Record-creation schema shared by the mutation pipeline and the CLI.
//! Invariants: Every invalid field yields exactly one `FieldError`; checks never fail fast.
//! Invariants: Field errors are reported in form order (title, price, description, image, category).
use super::record::{RawDraft, RecordDraft};
use url::Url;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Field {
    Title,
    Price,
    Description,
    Image,
    Category,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Price => "price",
            Field::Description => "description",
            Field::Image => "image",
            Field::Category => "category",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_draft(raw: &RawDraft) -> Result<RecordDraft, Vec<FieldError>> {
    let mut errors = Vec::new();

    if raw.title.is_empty() {
        errors.push(FieldError::new(Field::Title, "Title is required"));
    }

    let price = match parse_price(&raw.price) {
        Ok(price) => price,
        Err(message) => {
            errors.push(FieldError::new(Field::Price, message));
            0.0
        }
    };

    if raw.description.is_empty() {
        errors.push(FieldError::new(Field::Description, "Description required"));
    }

    if !is_absolute_url(&raw.image) {
        errors.push(FieldError::new(Field::Image, "Must be a valid URL"));
    }

    if raw.category.is_empty() {
        errors.push(FieldError::new(Field::Category, "Category required"));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(RecordDraft {
        title: raw.title.clone(),
        price,
        description: raw.description.clone(),
        image: raw.image.clone(),
        category: raw.category.clone(),
    })
}

// The whole trimmed text must be a number; a numeric prefix like "12abc" is rejected.
fn parse_price(raw: &str) -> Result<f64, &'static str> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| "Price must be a number")?;
    if !value.is_finite() {
        return Err("Price must be a number");
    }
    if value <= 0.0 {
        return Err("Price must be greater than 0");
    }
    Ok(value)
}

// `Url::parse` only accepts input with a scheme, so relative references fail here.
fn is_absolute_url(raw: &str) -> bool {
    Url::parse(raw).is_ok()
}
