//! Durable cart snapshots.
//!
//! The cart is persisted as a single JSON blob under a fixed key. Stores only
//! deal in strings; [`encode`] and [`decode`] convert between the blob and a
//! [`Cart`].
//!
//! # Stores
//!
//! - [`MemorySnapshotStore`] - in process, for tests and previews
//! - [`FileSnapshotStore`] - one file per key, atomically replaced on save
//! - `PgSnapshotStore` - `PostgreSQL` table (`postgres` feature)

mod file;
mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;
#[cfg(feature = "postgres")]
pub use postgres::PgSnapshotStore;

use async_trait::async_trait;
use rocket_cart_core::Cart;
use thiserror::Error;

/// Key the cart is stored under unless configured otherwise.
pub const DEFAULT_SNAPSHOT_KEY: &str = "@RocketShoes:cart";

/// Errors that can occur when reading or writing snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blob is not a valid cart.
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Database operation failed.
    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[cfg(feature = "postgres")]
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Store refused the operation.
    #[error("Snapshot store unavailable: {0}")]
    Unavailable(String),
}

/// Durable get/set of string values by key.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn load(&self, key: &str) -> Result<Option<String>, SnapshotError>;

    /// Replace the value stored under `key`.
    ///
    /// Implementations must never leave a partially written value behind.
    async fn save(&self, key: &str, value: &str) -> Result<(), SnapshotError>;
}

/// Serialize a cart into its snapshot blob.
///
/// # Errors
///
/// Returns `SnapshotError::Encoding` if serialization fails.
pub fn encode(cart: &Cart) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(cart)?)
}

/// Parse a snapshot blob back into a cart.
///
/// Rejects blobs with duplicate product ids or amounts below one.
///
/// # Errors
///
/// Returns `SnapshotError::Encoding` if the blob is not a valid cart.
pub fn decode(blob: &str) -> Result<Cart, SnapshotError> {
    Ok(serde_json::from_str(blob)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rocket_cart_core::{LineItem, ProductId, Quantity};
    use rust_decimal::Decimal;

    use super::*;

    fn cart() -> Cart {
        Cart::from_items(vec![
            LineItem {
                id: ProductId::new(1),
                title: "Tenis de Caminhada Leve Confortavel".to_string(),
                price: Decimal::new(1799, 1),
                image: "https://example.com/1.jpg".to_string(),
                amount: Quantity::new(2).unwrap(),
            },
            LineItem {
                id: ProductId::new(5),
                title: "Tenis VR Caminhada".to_string(),
                price: Decimal::new(139, 0),
                image: "https://example.com/5.jpg".to_string(),
                amount: Quantity::ONE,
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_decode_of_encode_is_identity() {
        let cart = cart();
        assert_eq!(decode(&encode(&cart).unwrap()).unwrap(), cart);
    }

    #[test]
    fn test_decodes_storefront_shaped_blob() {
        let blob = r#"[{"id":3,"title":"Shoe","price":100,"image":"x","amount":4}]"#;
        let cart = decode(blob).unwrap();
        let item = cart.get(ProductId::new(3)).unwrap();
        assert_eq!(item.amount.get(), 4);
        assert_eq!(item.price, Decimal::new(100, 0));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("not json").is_err());
        assert!(decode("null").is_err());
        assert!(decode(r#"{"id":1}"#).is_err());
    }

    #[test]
    fn test_decode_empty_array() {
        assert!(decode("[]").unwrap().is_empty());
    }
}
