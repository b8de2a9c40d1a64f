//! Inventory and catalog lookups.
//!
//! # Architecture
//!
//! - [`Inventory`] is the seam the cart store talks to
//! - [`InventoryClient`] calls the storefront HTTP API (`/stock/{id}`,
//!   `/products/{id}`) with `reqwest`, caching product metadata via `moka`
//! - [`MemoryInventory`] keeps everything in process
//!
//! Stock is never cached: a [`StockInfo`] is only valid at the moment it was
//! read.

mod client;
mod memory;

pub use client::InventoryClient;
pub use memory::MemoryInventory;

use async_trait::async_trait;
use rocket_cart_core::{ProductId, ProductInfo, StockInfo};
use thiserror::Error;

/// Errors that can occur when looking up stock or catalog data.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Client could not be configured.
    #[error("Invalid client configuration: {0}")]
    Configuration(String),

    /// Lookup backend is unavailable.
    #[error("Inventory unavailable: {0}")]
    Unavailable(String),
}

/// Read-only stock and catalog lookups keyed by product id.
#[async_trait]
pub trait Inventory: Send + Sync {
    /// Current available stock for a product.
    ///
    /// `Ok(None)` means the service has no stock record, which callers treat
    /// as zero availability.
    async fn stock(&self, id: ProductId) -> Result<Option<StockInfo>, InventoryError>;

    /// Catalog metadata for a product.
    async fn product(&self, id: ProductId) -> Result<ProductInfo, InventoryError>;
}
