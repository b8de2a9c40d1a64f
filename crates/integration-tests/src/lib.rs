//! Integration test harness for Rocket Cart.
//!
//! # Running Tests
//!
//! ```bash
//! # HTTP and file-snapshot tests (self-contained)
//! cargo test -p rocket-cart-integration-tests
//!
//! # PostgreSQL snapshot tests
//! CART_DATABASE_URL=postgres://... cargo test -p rocket-cart-integration-tests -- --ignored
//! ```
//!
//! [`MockInventoryService`] serves `/stock/{id}` and `/products/{id}` on an
//! ephemeral port, so tests drive the real `reqwest` client end to end.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rocket_cart_store::CartConfig;
use serde_json::{Value, json};
use url::Url;

/// A canned response for one path.
#[derive(Debug, Clone)]
struct CannedResponse {
    status: StatusCode,
    body: String,
}

#[derive(Debug, Default)]
struct MockState {
    stock: HashMap<i32, u32>,
    products: HashMap<i32, Value>,
    overrides: HashMap<String, CannedResponse>,
    stock_requests: usize,
    product_requests: usize,
    last_authorization: Option<String>,
}

/// In-process stand-in for the storefront inventory API.
#[derive(Debug, Clone, Default)]
pub struct MockInventoryService {
    state: Arc<Mutex<MockState>>,
}

impl MockInventoryService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a product and its stock.
    pub fn add_product(&self, id: i32, title: &str, price: f64, image: &str, stock: u32) {
        let mut state = self.lock();
        state.stock.insert(id, stock);
        state.products.insert(
            id,
            json!({ "id": id, "title": title, "price": price, "image": image }),
        );
    }

    pub fn set_stock(&self, id: i32, amount: u32) {
        self.lock().stock.insert(id, amount);
    }

    /// Serve an arbitrary catalog body for `id`.
    pub fn set_product_json(&self, id: i32, body: Value) {
        self.lock().products.insert(id, body);
    }

    /// Answer `path` (e.g. `stock/5`) with a fixed status and raw body.
    pub fn respond_with(&self, path: &str, status: StatusCode, body: &str) {
        self.lock().overrides.insert(
            path.to_string(),
            CannedResponse {
                status,
                body: body.to_string(),
            },
        );
    }

    pub fn clear_override(&self, path: &str) {
        self.lock().overrides.remove(path);
    }

    #[must_use]
    pub fn stock_requests(&self) -> usize {
        self.lock().stock_requests
    }

    #[must_use]
    pub fn product_requests(&self) -> usize {
        self.lock().product_requests
    }

    /// `Authorization` header of the most recent request.
    #[must_use]
    pub fn last_authorization(&self) -> Option<String> {
        self.lock().last_authorization.clone()
    }

    /// Serve on an ephemeral local port and return the base URL.
    ///
    /// The server runs until the test's runtime shuts down.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn spawn(&self) -> std::io::Result<Url> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let app = Router::new()
            .route("/stock/{id}", get(stock))
            .route("/products/{id}", get(product))
            .with_state(self.clone());

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Url::parse(&format!("http://{addr}/")).map_err(std::io::Error::other)
    }
}

fn record_request(state: &mut MockState, headers: &HeaderMap) {
    state.last_authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
}

fn canned(response: &CannedResponse) -> Response {
    let mut resp = (response.status, response.body.clone()).into_response();
    if response.status == StatusCode::TOO_MANY_REQUESTS {
        resp.headers_mut()
            .insert(header::RETRY_AFTER, header::HeaderValue::from_static("7"));
    }
    resp
}

async fn stock(
    State(service): State<MockInventoryService>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Response {
    let mut state = service.lock();
    state.stock_requests += 1;
    record_request(&mut state, &headers);

    if let Some(response) = state.overrides.get(&format!("stock/{id}")) {
        return canned(response);
    }

    match state.stock.get(&id) {
        Some(amount) => Json(json!({ "id": id, "amount": amount })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn product(
    State(service): State<MockInventoryService>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Response {
    let mut state = service.lock();
    state.product_requests += 1;
    record_request(&mut state, &headers);

    if let Some(response) = state.overrides.get(&format!("products/{id}")) {
        return canned(response);
    }

    match state.products.get(&id) {
        Some(body) => Json(body.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Accept connections on an ephemeral port and never answer them.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn spawn_unresponsive() -> std::io::Result<Url> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    Url::parse(&format!("http://{addr}/")).map_err(std::io::Error::other)
}

/// A snapshot directory no other test uses.
#[must_use]
pub fn temp_snapshot_dir() -> PathBuf {
    std::env::temp_dir().join(format!("rocket-cart-it-{}", uuid::Uuid::new_v4()))
}

/// Configuration pointing at `base_url` with snapshots under `snapshot_dir`.
#[must_use]
pub fn test_config(base_url: Url, snapshot_dir: PathBuf) -> CartConfig {
    let mut config = CartConfig::new(base_url);
    config.snapshot_dir = snapshot_dir;
    config
}
