//! HTTP client for the storefront inventory API.
//!
//! Uses `reqwest` for HTTP. Caches product metadata using `moka`; stock
//! responses always go to the network.

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use rocket_cart_core::{ProductId, ProductInfo, StockInfo};
use tracing::{debug, instrument};
use url::Url;

use super::{Inventory, InventoryError};
use crate::config::CartConfig;

const CATALOG_CACHE_CAPACITY: u64 = 1000;

/// Client for the inventory and catalog endpoints.
///
/// Cheap to clone; clones share the connection pool and catalog cache.
#[derive(Clone)]
pub struct InventoryClient {
    inner: Arc<InventoryClientInner>,
}

struct InventoryClientInner {
    client: reqwest::Client,
    base_url: Url,
    catalog: Option<Cache<ProductId, ProductInfo>>,
}

impl InventoryClient {
    /// Create a new inventory client.
    ///
    /// # Errors
    ///
    /// Returns error if the API token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &CartConfig) -> Result<Self, InventoryError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = config.api_token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                InventoryError::Configuration(format!("Invalid API token format: {e}"))
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let catalog = config.catalog_cache_ttl.map(|ttl| {
            Cache::builder()
                .max_capacity(CATALOG_CACHE_CAPACITY)
                .time_to_live(ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(InventoryClientInner {
                client,
                base_url: config.api_base_url.clone(),
                catalog,
            }),
        })
    }

    /// GET a path relative to the base URL.
    ///
    /// Returns `Ok(None)` on 404 so callers decide what "missing" means.
    async fn fetch(&self, path: &str) -> Result<Option<String>, InventoryError> {
        let url = self.inner.base_url.join(path)?;
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(InventoryError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                path = %path,
                body = %body.chars().take(500).collect::<String>(),
                "Inventory API returned non-success status"
            );
            return Err(InventoryError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        Ok(Some(body))
    }
}

#[async_trait]
impl Inventory for InventoryClient {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn stock(&self, id: ProductId) -> Result<Option<StockInfo>, InventoryError> {
        let Some(body) = self.fetch(&format!("stock/{id}")).await? else {
            debug!("No stock record");
            return Ok(None);
        };

        if body.trim().is_empty() {
            return Ok(None);
        }

        // `null` decodes to None as well
        let stock: Option<StockInfo> = serde_json::from_str(&body)?;
        Ok(stock)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn product(&self, id: ProductId) -> Result<ProductInfo, InventoryError> {
        if let Some(catalog) = &self.inner.catalog
            && let Some(product) = catalog.get(&id).await
        {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let body = self
            .fetch(&format!("products/{id}"))
            .await?
            .ok_or_else(|| InventoryError::NotFound(format!("product {id}")))?;

        let product: ProductInfo = serde_json::from_str(&body)?;

        if let Some(catalog) = &self.inner.catalog {
            catalog.insert(id, product.clone()).await;
        }

        Ok(product)
    }
}
