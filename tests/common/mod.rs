//! Purpose: In-process fake catalog service shared by integration tests.
//! Exports: `FakeCatalog`, `sample_records`.
//! Role: Loopback axum server mimicking the product catalog endpoints.
//! Invariants: Binds an ephemeral port before returning, so clients may connect immediately.
//! Invariants: The server shuts down when `FakeCatalog` is dropped.
#![allow(dead_code)]

use axum::extract::{Path as AxumPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::oneshot;

pub type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

pub fn sample_records() -> Vec<Value> {
    vec![
        json!({
            "id": 1,
            "title": "Fjallraven Backpack",
            "price": 109.95,
            "description": "Fits 15 inch laptops",
            "category": "men's clothing",
            "image": "https://img.example/1.png",
        }),
        json!({
            "id": 2,
            "title": "Slim Fit T-Shirt",
            "price": 22.3,
            "description": "Slim-fitting style",
            "category": "men's clothing",
            "image": "https://img.example/2.png",
        }),
        json!({
            "id": 3,
            "title": "Gold Chain Bracelet",
            "price": 695.0,
            "description": "Dragon station chain",
            "category": "jewelery",
            "image": "https://img.example/3.png",
        }),
        json!({
            "id": 4,
            "title": "Rain Jacket",
            "price": 39.99,
            "description": "Lightweight and hooded",
            "category": "women's clothing",
            "image": "https://img.example/4.png",
        }),
        json!({
            "id": 5,
            "title": "Portable SSD",
            "price": 22.3,
            "description": "1TB external drive",
            "category": "electronics",
            "image": "https://img.example/5.png",
        }),
    ]
}

#[derive(Default)]
struct FakeState {
    records: Mutex<Vec<Value>>,
    list_calls: AtomicUsize,
    category_calls: AtomicUsize,
    get_calls: AtomicUsize,
    create_calls: AtomicUsize,
    fail_status: AtomicU16,
    delay_ms: AtomicU64,
}

impl FakeState {
    fn records(&self) -> Vec<Value> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn gate(&self) -> Option<Response> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        let status = self.fail_status.load(Ordering::SeqCst);
        if status == 0 {
            return None;
        }
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Some((status, "catalog unavailable").into_response())
    }
}

pub struct FakeCatalog {
    base_url: String,
    state: Arc<FakeState>,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl FakeCatalog {
    pub fn start() -> TestResult<Self> {
        Self::with_records(sample_records())
    }

    pub fn with_records(records: Vec<Value>) -> TestResult<Self> {
        let state = Arc::new(FakeState {
            records: Mutex::new(records),
            ..FakeState::default()
        });

        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        let app = Router::new()
            .route("/products", get(list_products).post(create_product))
            .route("/products/categories", get(list_categories))
            .route("/products/:id", get(get_product))
            .with_state(state.clone());

        let (tx, rx) = oneshot::channel::<()>();
        let thread = std::thread::spawn(move || {
            runtime.block_on(async move {
                let Ok(listener) = tokio::net::TcpListener::from_std(listener) else {
                    return;
                };
                let _ = axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = rx.await;
                    })
                    .await;
            });
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            state,
            shutdown: Some(tx),
            thread: Some(thread),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn list_calls(&self) -> usize {
        self.state.list_calls.load(Ordering::SeqCst)
    }

    pub fn category_calls(&self) -> usize {
        self.state.category_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.state.get_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.state.create_calls.load(Ordering::SeqCst)
    }

    pub fn record_count(&self) -> usize {
        self.state.records().len()
    }

    /// Every endpoint answers with `status` until reset with 0.
    pub fn fail_with(&self, status: u16) {
        self.state.fail_status.store(status, Ordering::SeqCst);
    }

    pub fn delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.state.delay_ms.store(millis, Ordering::SeqCst);
    }
}

impl Drop for FakeCatalog {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

async fn list_products(State(state): State<Arc<FakeState>>) -> Response {
    state.list_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = state.gate().await {
        return response;
    }
    Json(state.records()).into_response()
}

async fn list_categories(State(state): State<Arc<FakeState>>) -> Response {
    state.category_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = state.gate().await {
        return response;
    }
    let mut categories: Vec<String> = Vec::new();
    for record in state.records() {
        let Some(category) = record.get("category").and_then(Value::as_str) else {
            continue;
        };
        if !categories.iter().any(|seen| seen == category) {
            categories.push(category.to_string());
        }
    }
    Json(categories).into_response()
}

// Unknown ids answer 200 with an empty body, like the public catalog service.
async fn get_product(
    State(state): State<Arc<FakeState>>,
    AxumPath(id): AxumPath<String>,
) -> Response {
    state.get_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = state.gate().await {
        return response;
    }
    let Ok(id) = id.parse::<u64>() else {
        return StatusCode::OK.into_response();
    };
    let found = state
        .records()
        .into_iter()
        .find(|record| record.get("id").and_then(Value::as_u64) == Some(id));
    match found {
        Some(record) => Json(record).into_response(),
        None => StatusCode::OK.into_response(),
    }
}

async fn create_product(
    State(state): State<Arc<FakeState>>,
    Json(mut body): Json<Value>,
) -> Response {
    state.create_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = state.gate().await {
        return response;
    }
    let mut records = state.records.lock().unwrap_or_else(PoisonError::into_inner);
    let next_id = records
        .iter()
        .filter_map(|record| record.get("id").and_then(Value::as_u64))
        .max()
        .unwrap_or(0)
        + 1;
    if let Some(object) = body.as_object_mut() {
        object.insert("id".to_string(), json!(next_id));
    }
    records.push(body.clone());
    Json(body).into_response()
}
