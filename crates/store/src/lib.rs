//! Rocket Cart Store - shopping cart state for storefront UIs.
//!
//! The [`CartStore`] holds the cart the shopper is building, checks every
//! change against live stock before applying it, saves each new cart as a
//! durable snapshot and publishes it to the UI.
//!
//! # Collaborators
//!
//! - [`Inventory`] - stock and catalog lookups ([`InventoryClient`] over HTTP)
//! - [`SnapshotStore`] - durable key/value storage for the serialized cart
//! - [`Notifier`] - fire-and-forget user-facing messages
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rocket_cart_store::{CartConfig, CartStore, ProductId, TracingNotifier};
//!
//! let config = CartConfig::from_env()?;
//! let _sentry = rocket_cart_store::telemetry::init(&config);
//! let store = CartStore::from_config(&config, Arc::new(TracingNotifier)).await?;
//!
//! store.add_one(ProductId::new(1)).await;
//! store.set_amount(ProductId::new(1), 3).await;
//! let cart = store.current_cart();
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod inventory;
pub mod notify;
pub mod snapshot;
pub mod store;
pub mod telemetry;

pub use config::{CartConfig, ConfigError};
pub use error::{CartError, Operation};
pub use inventory::{Inventory, InventoryClient, InventoryError, MemoryInventory};
pub use notify::{ChannelNotifier, Notification, Notifier, TracingNotifier};
pub use snapshot::{FileSnapshotStore, MemorySnapshotStore, SnapshotError, SnapshotStore};
pub use store::{CartStore, Outcome};

pub use rocket_cart_core::{Cart, LineItem, ProductId, ProductInfo, Quantity, StockInfo};
