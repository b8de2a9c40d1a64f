//! Core types for the cart.
//!
//! This module provides type-safe wrappers for catalog ids, quantities, line
//! items and the cart itself.

pub mod cart;
pub mod id;
pub mod item;
pub mod quantity;

pub use cart::{Cart, CartInvariantError};
pub use id::*;
pub use item::{LineItem, ProductInfo, StockInfo};
pub use quantity::Quantity;
