//! Rocket Cart Core - Shared cart types.
//!
//! This crate provides the domain types used by the cart store and its tests:
//! - [`ProductId`] - type-safe catalog identifier
//! - [`Quantity`] - an amount that is always at least one
//! - [`LineItem`], [`ProductInfo`], [`StockInfo`] - catalog and cart lines
//! - [`Cart`] - ordered line items, unique by product id
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! This keeps it lightweight and allows it to be used anywhere.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
