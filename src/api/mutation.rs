//! Purpose: Validate and submit new catalog records, then invalidate the cached list.
//! Exports: `submit_create`, `CreateForm`, `MutationStatus`.
//! Role: Write path of the catalog client; the only code that invalidates `["records"]`.
//! Invariants: Invalid input never reaches the network; every bad field is reported at once.
//! Invariants: A successful create invalidates the records key and clears the form.
//! Invariants: A failed submission keeps the form values for retry.
#![allow(clippy::result_large_err)]

use super::catalog::{Catalog, records_key};
use crate::core::error::{Error, ErrorKind};
use crate::core::record::{Created, RawDraft, RecordDraft};
use crate::core::validate::{Field, FieldError, validate_draft};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};

type ApiResult<T> = Result<T, Error>;

pub fn submit_create(catalog: &Catalog, raw: &RawDraft) -> ApiResult<Created> {
    let draft = validate_draft(raw).map_err(Error::validation)?;
    submit_validated(catalog, &draft)
}

fn submit_validated(catalog: &Catalog, draft: &RecordDraft) -> ApiResult<Created> {
    match catalog.source().create_record(draft) {
        Ok(created) => {
            catalog.invalidate(&records_key());
            tracing::info!(id = created.id, title = %draft.title, "product created");
            Ok(created)
        }
        Err(err) => {
            tracing::warn!(error = %err, "product create failed");
            Err(err)
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Error,
    Success,
}

impl MutationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MutationStatus::Idle => "idle",
            MutationStatus::Pending => "pending",
            MutationStatus::Error => "error",
            MutationStatus::Success => "success",
        }
    }
}

/// Create-form state: field values plus the outcome of the last submission.
#[derive(Debug, Default)]
pub struct CreateForm {
    values: RawDraft,
    status: MutationStatus,
    field_errors: Vec<FieldError>,
    error: Option<Arc<Error>>,
    data: Option<Created>,
    in_flight: Option<Receiver<ApiResult<Created>>>,
}

impl CreateForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &RawDraft {
        &self.values
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Title => self.values.title = value,
            Field::Price => self.values.price = value,
            Field::Description => self.values.description = value,
            Field::Image => self.values.image = value,
            Field::Category => self.values.category = value,
        }
    }

    pub fn status(&self) -> MutationStatus {
        self.status
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    pub fn field_error(&self, field: Field) -> Option<&str> {
        self.field_errors
            .iter()
            .find(|err| err.field == field)
            .map(|err| err.message.as_str())
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_deref()
    }

    pub fn data(&self) -> Option<Created> {
        self.data
    }

    /// Validates and submits on the calling thread.
    pub fn submit(&mut self, catalog: &Catalog) -> MutationStatus {
        let Some(draft) = self.begin() else {
            return self.status;
        };
        let outcome = submit_validated(catalog, &draft);
        self.finish(outcome);
        self.status
    }

    /// Validates, then submits on a worker thread; pair with `poll` or `wait`.
    pub fn start_submit(&mut self, catalog: &Catalog) -> MutationStatus {
        let Some(draft) = self.begin() else {
            return self.status;
        };
        self.in_flight = Some(catalog.in_background(move |catalog| submit_validated(catalog, &draft)));
        self.status
    }

    pub fn poll(&mut self) -> MutationStatus {
        let Some(rx) = &self.in_flight else {
            return self.status;
        };
        match rx.try_recv() {
            Ok(outcome) => self.finish(outcome),
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => self.finish(Err(worker_gone())),
        }
        self.status
    }

    pub fn wait(&mut self) -> MutationStatus {
        let Some(rx) = &self.in_flight else {
            return self.status;
        };
        let outcome = rx.recv().unwrap_or_else(|_| Err(worker_gone()));
        self.finish(outcome);
        self.status
    }

    fn begin(&mut self) -> Option<RecordDraft> {
        if self.status == MutationStatus::Pending {
            return None;
        }
        match validate_draft(&self.values) {
            Ok(draft) => {
                self.field_errors.clear();
                self.error = None;
                self.data = None;
                self.status = MutationStatus::Pending;
                Some(draft)
            }
            Err(field_errors) => {
                self.field_errors = field_errors;
                self.error = None;
                self.data = None;
                self.status = MutationStatus::Idle;
                None
            }
        }
    }

    fn finish(&mut self, outcome: ApiResult<Created>) {
        self.in_flight = None;
        match outcome {
            Ok(created) => {
                self.values.clear();
                self.data = Some(created);
                self.status = MutationStatus::Success;
            }
            Err(err) => {
                self.error = Some(Arc::new(err));
                self.status = MutationStatus::Error;
            }
        }
    }
}

fn worker_gone() -> Error {
    Error::new(ErrorKind::Internal).with_message("submission worker exited without a result")
}
