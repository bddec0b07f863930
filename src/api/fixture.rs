//! Purpose: In-memory catalog source for unit tests.
//! Exports: `FakeSource`, `record`.
//! Role: Test-only stand-in for the remote service with call counters and failure switches.
//! Invariants: Categories are derived from stored records in first-seen order.
use super::remote::CatalogSource;
use crate::core::error::{Error, ErrorKind};
use crate::core::record::{Created, Record, RecordDraft, RecordId};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

pub(crate) fn record(id: RecordId, title: &str, price: f64, category: &str) -> Record {
    Record {
        id,
        title: title.to_string(),
        price,
        description: format!("{title} description"),
        category: category.to_string(),
        image: format!("https://img.example/{id}.png"),
    }
}

#[derive(Default)]
pub(crate) struct FakeSource {
    records: Mutex<Vec<Record>>,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    fail_reads: AtomicBool,
    fail_creates: AtomicBool,
}

impl FakeSource {
    pub(crate) fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub(crate) fn push_record(&self, record: Record) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    fn snapshot(&self) -> Result<Vec<Record>, Error> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::new(ErrorKind::Transport)
                .with_message("catalog error status 503")
                .with_status(503));
        }
        Ok(self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

impl CatalogSource for FakeSource {
    fn list_records(&self) -> Result<Vec<Record>, Error> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot()
    }

    fn list_categories(&self) -> Result<Vec<String>, Error> {
        let mut categories: Vec<String> = Vec::new();
        for record in self.snapshot()? {
            if !categories.contains(&record.category) {
                categories.push(record.category);
            }
        }
        Ok(categories)
    }

    fn get_record(&self, id: RecordId) -> Result<Record, Error> {
        self.snapshot()?
            .into_iter()
            .find(|record| record.id == id)
            .ok_or_else(|| {
                Error::new(ErrorKind::NotFound)
                    .with_message("product not found")
                    .with_id(id)
            })
    }

    fn create_record(&self, draft: &RecordDraft) -> Result<Created, Error> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(Error::new(ErrorKind::Transport)
                .with_message("catalog error status 500")
                .with_status(500));
        }
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let id = records.iter().map(|record| record.id).max().unwrap_or(0) + 1;
        records.push(Record {
            id,
            title: draft.title.clone(),
            price: draft.price,
            description: draft.description.clone(),
            category: draft.category.clone(),
            image: draft.image.clone(),
        });
        Ok(Created { id })
    }
}
