//! In-process inventory.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use rocket_cart_core::{ProductId, ProductInfo, StockInfo};

use super::{Inventory, InventoryError};

/// Inventory held in memory.
///
/// Stock and catalog entries can be changed at any time, and either lookup can
/// be switched into a failing mode to simulate an unreachable service.
#[derive(Debug, Default)]
pub struct MemoryInventory {
    stock: RwLock<HashMap<ProductId, u32>>,
    products: RwLock<HashMap<ProductId, ProductInfo>>,
    stock_failing: AtomicBool,
    catalog_failing: AtomicBool,
    stock_lookups: AtomicUsize,
    product_lookups: AtomicUsize,
}

impl MemoryInventory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product with its available stock.
    #[must_use]
    pub fn with_product(self, product: ProductInfo, stock: u32) -> Self {
        self.set_stock(product.id, stock);
        self.insert_product(product);
        self
    }

    pub fn set_stock(&self, id: ProductId, amount: u32) {
        self.stock
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, amount);
    }

    /// Drop the stock record, so lookups report no stock at all.
    pub fn clear_stock(&self, id: ProductId) {
        self.stock
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }

    pub fn insert_product(&self, product: ProductInfo) {
        self.products
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(product.id, product);
    }

    /// Make stock lookups fail until switched back.
    pub fn fail_stock(&self, failing: bool) {
        self.stock_failing.store(failing, Ordering::SeqCst);
    }

    /// Make catalog lookups fail until switched back.
    pub fn fail_catalog(&self, failing: bool) {
        self.catalog_failing.store(failing, Ordering::SeqCst);
    }

    /// Number of stock lookups served so far.
    #[must_use]
    pub fn stock_lookups(&self) -> usize {
        self.stock_lookups.load(Ordering::SeqCst)
    }

    /// Number of catalog lookups served so far.
    #[must_use]
    pub fn product_lookups(&self) -> usize {
        self.product_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Inventory for MemoryInventory {
    async fn stock(&self, id: ProductId) -> Result<Option<StockInfo>, InventoryError> {
        self.stock_lookups.fetch_add(1, Ordering::SeqCst);
        if self.stock_failing.load(Ordering::SeqCst) {
            return Err(InventoryError::Unavailable("stock lookup disabled".to_string()));
        }

        let stock = self.stock.read().unwrap_or_else(PoisonError::into_inner);
        Ok(stock.get(&id).map(|&amount| StockInfo { id, amount }))
    }

    async fn product(&self, id: ProductId) -> Result<ProductInfo, InventoryError> {
        self.product_lookups.fetch_add(1, Ordering::SeqCst);
        if self.catalog_failing.load(Ordering::SeqCst) {
            return Err(InventoryError::Unavailable(
                "catalog lookup disabled".to_string(),
            ));
        }

        self.products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or_else(|| InventoryError::NotFound(format!("product {id}")))
    }
}
