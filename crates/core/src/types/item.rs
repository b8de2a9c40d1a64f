//! Catalog and cart line types.
//!
//! Field names match the storefront JSON API (`id`, `title`, `price`, `image`,
//! `amount`) so the same shapes are used on the wire and in snapshots.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::quantity::Quantity;

/// Immutable product metadata as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    /// Catalog identifier.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price, carried as a JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Image URL.
    pub image: String,
}

/// Available inventory for a product at the moment it was queried.
///
/// Never cache this: stock changes outside the cart's control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockInfo {
    /// Catalog identifier.
    pub id: ProductId,
    /// Units available.
    pub amount: u32,
}

/// One product plus the quantity held in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: String,
    pub amount: Quantity,
}

impl LineItem {
    /// Build a line from catalog metadata.
    #[must_use]
    pub fn from_product(product: ProductInfo, amount: Quantity) -> Self {
        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            image: product.image,
            amount,
        }
    }

    /// Price multiplied by amount.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.amount.get())
    }
}
