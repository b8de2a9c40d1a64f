//! Cart operation errors.
//!
//! These never leave the store: each one is absorbed at the operation boundary
//! and turned into a single [`Notification`] for the user.

use rocket_cart_core::{CartInvariantError, ProductId};
use thiserror::Error;

use crate::inventory::InventoryError;
use crate::notify::Notification;
use crate::snapshot::SnapshotError;

/// The cart operation an error happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Remove,
    Update,
}

impl Operation {
    /// Notification shown when this operation fails for a reason other than
    /// stock.
    #[must_use]
    pub const fn failure(self) -> Notification {
        match self {
            Self::Add => Notification::AddFailed,
            Self::Remove => Notification::RemoveFailed,
            Self::Update => Notification::UpdateFailed,
        }
    }

    pub(crate) const fn breadcrumb(self) -> &'static str {
        match self {
            Self::Add => "Added product to cart",
            Self::Remove => "Removed product from cart",
            Self::Update => "Updated product amount",
        }
    }
}

/// Why a cart operation was rejected.
#[derive(Debug, Error)]
pub enum CartError {
    /// Requested amount exceeds reported stock, or there is no stock at all.
    #[error("product {id}: requested {requested}, only {available} in stock")]
    StockUnavailable {
        id: ProductId,
        requested: u64,
        available: u32,
    },

    /// Inventory or catalog lookup failed.
    #[error("lookup failed: {0}")]
    Lookup(#[from] InventoryError),

    /// The product is not in the cart.
    #[error("product {0} is not in the cart")]
    TargetNotFound(ProductId),

    /// The catalog answered for a different product.
    #[error("catalog returned product {returned} for product {requested}")]
    CatalogMismatch {
        requested: ProductId,
        returned: ProductId,
    },

    /// The new cart would break an invariant.
    #[error("invalid cart: {0}")]
    Invariant(#[from] CartInvariantError),

    /// The snapshot could not be written.
    #[error("snapshot write failed: {0}")]
    Snapshot(#[from] SnapshotError),
}

impl CartError {
    /// The notification to show for this error during `operation`.
    #[must_use]
    pub const fn notification(&self, operation: Operation) -> Notification {
        match self {
            Self::StockUnavailable { .. } => Notification::OutOfStock,
            _ => operation.failure(),
        }
    }
}
