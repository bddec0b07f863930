//! Purpose: Provide the HTTP/JSON client for the remote product catalog service.
//! Exports: `CatalogSource`, `RemoteCatalog`.
//! Role: Stateless transport boundary; every call is exactly one request with no retry.
//! Invariants: Non-2xx responses map to `Transport`; only a record lookup maps 404 to `NotFound`.
//! Invariants: A 2xx record lookup with an empty or `null` body means the id is absent.
//! Invariants: Request paths are appended to the configured base url path.
#![allow(clippy::result_large_err)]

use super::config::CatalogConfig;
use crate::core::error::{Error, ErrorKind};
use crate::core::record::{Created, Record, RecordDraft, RecordId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

type ApiResult<T> = Result<T, Error>;

/// Read/create operations the catalog service offers.
pub trait CatalogSource: Send + Sync {
    fn list_records(&self) -> ApiResult<Vec<Record>>;
    fn list_categories(&self) -> ApiResult<Vec<String>>;
    fn get_record(&self, id: RecordId) -> ApiResult<Record>;
    fn create_record(&self, draft: &RecordDraft) -> ApiResult<Created>;
}

#[derive(Clone)]
pub struct RemoteCatalog {
    inner: Arc<RemoteCatalogInner>,
}

struct RemoteCatalogInner {
    base_url: Url,
    agent: ureq::Agent,
}

impl RemoteCatalog {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let agent = ureq::AgentBuilder::new().build();
        Ok(Self {
            inner: Arc::new(RemoteCatalogInner { base_url, agent }),
        })
    }

    pub fn from_config(config: &CatalogConfig) -> ApiResult<Self> {
        let base_url = normalize_base_url(config.base_url.clone())?;
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            inner: Arc::new(RemoteCatalogInner {
                base_url,
                agent: builder.build(),
            }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn get_json<R>(&self, segments: &[&str]) -> ApiResult<R>
    where
        R: DeserializeOwned,
    {
        let body = self.request_text::<()>("GET", segments, None)?;
        decode_json(&body)
    }

    fn request_text<T>(&self, method: &str, segments: &[&str], body: Option<&T>) -> ApiResult<String>
    where
        T: Serialize,
    {
        let url = build_url(&self.inner.base_url, segments)?;
        tracing::debug!(method, url = %url, "catalog request");
        let request = self
            .inner
            .agent
            .request(method, url.as_str())
            .set("Accept", "application/json");
        let response = match body {
            None => request.call(),
            Some(body) => {
                let payload = serde_json::to_string(body).map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to encode request json")
                        .with_source(err)
                })?;
                request
                    .set("Content-Type", "application/json")
                    .send_string(&payload)
            }
        };

        match response {
            Ok(resp) => {
                tracing::debug!(method, url = %url, status = resp.status(), "catalog response");
                resp.into_string().map_err(|err| {
                    Error::new(ErrorKind::Transport)
                        .with_message("failed to read response body")
                        .with_source(err)
                })
            }
            Err(ureq::Error::Status(code, resp)) => Err(parse_error_response(code, resp)),
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Transport)
                .with_message("request failed")
                .with_source(err)),
        }
    }
}

impl CatalogSource for RemoteCatalog {
    fn list_records(&self) -> ApiResult<Vec<Record>> {
        self.get_json(&["products"])
    }

    fn list_categories(&self) -> ApiResult<Vec<String>> {
        self.get_json(&["products", "categories"])
    }

    fn get_record(&self, id: RecordId) -> ApiResult<Record> {
        let id_segment = id.to_string();
        let body = self
            .request_text::<()>("GET", &["products", &id_segment], None)
            .map_err(|err| missing_on_404(err).with_id(id))?;
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Err(Error::new(ErrorKind::NotFound)
                .with_message("product not found")
                .with_id(id));
        }
        decode_json(trimmed).map_err(|err| err.with_id(id))
    }

    fn create_record(&self, draft: &RecordDraft) -> ApiResult<Created> {
        let body = self.request_text("POST", &["products"], Some(draft))?;
        decode_json(&body)
    }
}

fn normalize_base_url(raw: String) -> ApiResult<Url> {
    let mut url = Url::parse(&raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid catalog base url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("catalog base url must use http or https scheme"));
    }
    if url.cannot_be_a_base() {
        return Err(Error::new(ErrorKind::Usage).with_message("catalog base url cannot be a base"));
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn build_url(base_url: &Url, segments: &[&str]) -> ApiResult<Url> {
    let mut url = base_url.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            Error::new(ErrorKind::Usage).with_message("catalog base url cannot be a base")
        })?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

fn decode_json<R>(body: &str) -> ApiResult<R>
where
    R: DeserializeOwned,
{
    serde_json::from_str(body).map_err(|err| {
        Error::new(ErrorKind::Transport)
            .with_message("invalid response json")
            .with_source(err)
    })
}

fn parse_error_response(status: u16, response: ureq::Response) -> Error {
    let body = response.into_string().unwrap_or_default();
    let err = Error::new(ErrorKind::Transport)
        .with_message(format!("catalog error status {status}"))
        .with_status(status);
    match error_hint(&body) {
        Some(hint) => err.with_hint(hint),
        None => err,
    }
}

/// Response body as a hint, cut to `HINT_MAX_CHARS` on a char boundary.
fn error_hint(body: &str) -> Option<String> {
    let detail = body.trim();
    if detail.is_empty() {
        return None;
    }
    match detail.char_indices().nth(HINT_MAX_CHARS) {
        Some((cut, _)) => Some(format!("{}...", &detail[..cut])),
        None => Some(detail.to_string()),
    }
}

const HINT_MAX_CHARS: usize = 200;

// Only a record lookup can be missing; a 404 anywhere else stays a transport failure.
fn missing_on_404(err: Error) -> Error {
    if err.kind() != ErrorKind::Transport || err.status() != Some(404) {
        return err;
    }
    let mut missing = Error::new(ErrorKind::NotFound)
        .with_message("product not found")
        .with_status(404);
    if let Some(hint) = err.hint() {
        missing = missing.with_hint(hint);
    }
    missing
}
