//! The cart store.
//!
//! Holds the live [`Cart`], validates every mutation against current stock,
//! persists the result and then publishes it to subscribers.
//!
//! # Guarantees
//!
//! - Operations are serialized by a per-store lock held for the whole
//!   read-validate-write-publish sequence, so rapid overlapping calls cannot
//!   interleave.
//! - A new cart is published only after its snapshot has been saved. If the
//!   save fails, nothing is published and the published cart still matches the
//!   last saved snapshot.
//! - A rejected operation leaves the cart untouched and produces exactly one
//!   notification. Nothing is returned as an error.

use std::sync::Arc;

use rocket_cart_core::{Cart, LineItem, ProductId, Quantity};
use tokio::sync::{Mutex, watch};
use tracing::{debug, instrument, warn};

use crate::config::CartConfig;
use crate::error::{CartError, Operation};
use crate::inventory::{Inventory, InventoryClient, InventoryError};
use crate::notify::{Notification, Notifier};
use crate::snapshot::{self, FileSnapshotStore, SnapshotStore};
use crate::telemetry;

/// What an operation did. Informational only; the user has already been
/// notified of any rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A new cart was saved and published.
    Applied,
    /// The request was silently ignored (amount below one).
    Ignored,
    /// The request was rejected with this notification.
    Rejected(Notification),
}

impl Outcome {
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Shopping cart state with stock checks and durable snapshots.
///
/// Create one per session with [`CartStore::restore`] and share it by
/// reference (or `Arc`) with the UI.
pub struct CartStore {
    inventory: Arc<dyn Inventory>,
    snapshots: Arc<dyn SnapshotStore>,
    notifier: Arc<dyn Notifier>,
    snapshot_key: String,
    state: watch::Sender<Cart>,
    op_lock: Mutex<()>,
}

impl CartStore {
    /// Create a store, seeding the cart from the snapshot under `snapshot_key`.
    ///
    /// A missing, unreadable or invalid snapshot yields an empty cart.
    pub async fn restore(
        snapshot_key: impl Into<String>,
        inventory: Arc<dyn Inventory>,
        snapshots: Arc<dyn SnapshotStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let snapshot_key = snapshot_key.into();
        let cart = load_cart(snapshots.as_ref(), &snapshot_key).await;
        let (state, _) = watch::channel(cart);

        Self {
            inventory,
            snapshots,
            notifier,
            snapshot_key,
            state,
            op_lock: Mutex::new(()),
        }
    }

    /// Create a store that talks to the configured HTTP service and keeps its
    /// snapshot on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub async fn from_config(
        config: &CartConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, InventoryError> {
        let inventory = InventoryClient::new(config)?;
        let snapshots = FileSnapshotStore::new(&config.snapshot_dir);

        Ok(Self::restore(
            config.snapshot_key.clone(),
            Arc::new(inventory),
            Arc::new(snapshots),
            notifier,
        )
        .await)
    }

    /// The live cart.
    #[must_use]
    pub fn current_cart(&self) -> Cart {
        self.state.borrow().clone()
    }

    /// Receive every newly published cart.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn snapshot_key(&self) -> &str {
        &self.snapshot_key
    }

    /// Add one unit of a product, creating its line if needed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn add_one(&self, id: ProductId) -> Outcome {
        let _guard = self.op_lock.lock().await;
        let current = self.current_cart();

        match self.plan_add(&current, id).await {
            Ok(next) => self.commit(Operation::Add, id, next).await,
            Err(err) => self.reject(Operation::Add, &err),
        }
    }

    /// Remove a product's line entirely.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn remove_one(&self, id: ProductId) -> Outcome {
        let _guard = self.op_lock.lock().await;
        let current = self.current_cart();

        if !current.contains(id) {
            return self.reject(Operation::Remove, &CartError::TargetNotFound(id));
        }
        self.commit(Operation::Remove, id, current.without(id)).await
    }

    /// Set a product's amount.
    ///
    /// Amounts below one are ignored without notification. Setting the amount
    /// of a product that is not in the cart saves the cart unchanged.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn set_amount(&self, id: ProductId, amount: i64) -> Outcome {
        if amount < 1 {
            debug!(amount, "Ignoring amount below one");
            return Outcome::Ignored;
        }

        let _guard = self.op_lock.lock().await;
        let current = self.current_cart();

        match self.plan_set_amount(&current, id, amount).await {
            Ok(next) => self.commit(Operation::Update, id, next).await,
            Err(err) => self.reject(Operation::Update, &err),
        }
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Units available right now; no stock record means none.
    async fn available(&self, id: ProductId) -> Result<u32, CartError> {
        let stock = self.inventory.stock(id).await?;
        Ok(stock.map_or(0, |s| s.amount))
    }

    async fn plan_add(&self, cart: &Cart, id: ProductId) -> Result<Cart, CartError> {
        let available = self.available(id).await?;

        if let Some(line) = cart.get(id) {
            let next = line
                .amount
                .checked_increment()
                .filter(|amount| amount.fits_within(available))
                .ok_or(CartError::StockUnavailable {
                    id,
                    requested: u64::from(line.amount.get()) + 1,
                    available,
                })?;
            return Ok(cart.with_amount(id, next));
        }

        if !Quantity::ONE.fits_within(available) {
            return Err(CartError::StockUnavailable {
                id,
                requested: 1,
                available,
            });
        }

        let product = self.inventory.product(id).await?;
        if product.id != id {
            return Err(CartError::CatalogMismatch {
                requested: id,
                returned: product.id,
            });
        }

        Ok(cart.with_appended(LineItem::from_product(product, Quantity::ONE))?)
    }

    async fn plan_set_amount(
        &self,
        cart: &Cart,
        id: ProductId,
        amount: i64,
    ) -> Result<Cart, CartError> {
        let available = self.available(id).await?;

        let out_of_stock = || CartError::StockUnavailable {
            id,
            requested: amount.unsigned_abs(),
            available,
        };
        if amount > i64::from(available) {
            return Err(out_of_stock());
        }
        let quantity = Quantity::from_requested(amount).ok_or_else(out_of_stock)?;

        Ok(cart.with_amount(id, quantity))
    }

    // =========================================================================
    // Commit / Reject
    // =========================================================================

    /// Save `next`, then publish it.
    async fn commit(&self, operation: Operation, id: ProductId, next: Cart) -> Outcome {
        if let Err(err) = self.persist(&next).await {
            return self.reject(operation, &err);
        }

        self.state.send_replace(next);

        let product_id = id.to_string();
        telemetry::add_breadcrumb(
            "cart",
            operation.breadcrumb(),
            Some(&[("product_id", product_id.as_str())]),
        );
        debug!(operation = ?operation, "Cart updated");

        Outcome::Applied
    }

    async fn persist(&self, cart: &Cart) -> Result<(), CartError> {
        let blob = snapshot::encode(cart)?;
        self.snapshots.save(&self.snapshot_key, &blob).await?;
        Ok(())
    }

    fn reject(&self, operation: Operation, err: &CartError) -> Outcome {
        let notification = err.notification(operation);

        match err {
            CartError::StockUnavailable { .. } => {
                debug!(operation = ?operation, error = %err, "Cart operation rejected");
            }
            _ => warn!(operation = ?operation, error = %err, "Cart operation failed"),
        }

        self.notifier.notify(notification);
        Outcome::Rejected(notification)
    }
}

/// Read the saved cart, falling back to an empty one.
async fn load_cart(snapshots: &dyn SnapshotStore, key: &str) -> Cart {
    let blob = match snapshots.load(key).await {
        Ok(Some(blob)) => blob,
        Ok(None) => return Cart::new(),
        Err(e) => {
            warn!(error = %e, key, "Failed to read cart snapshot, starting empty");
            return Cart::new();
        }
    };

    match snapshot::decode(&blob) {
        Ok(cart) => {
            debug!(items = cart.len(), "Restored cart from snapshot");
            cart
        }
        Err(e) => {
            warn!(error = %e, key, "Discarding invalid cart snapshot");
            Cart::new()
        }
    }
}
