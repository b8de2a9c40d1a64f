//! The cart: an ordered list of line items, unique by product id.
//!
//! `Cart` values are treated as immutable snapshots. Every transition returns a
//! new `Cart`, so a published value is never changed underneath a reader.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ProductId;
use super::item::LineItem;
use super::quantity::Quantity;

/// Errors raised when a list of items cannot form a cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartInvariantError {
    /// Two lines share the same product id.
    #[error("duplicate line item for product {0}")]
    DuplicateItem(ProductId),
}

/// An ordered sequence of [`LineItem`]s with unique ids.
///
/// Serializes as a plain JSON array of line items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from a list of items, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns `CartInvariantError::DuplicateItem` if two items share an id.
    pub fn from_items(items: Vec<LineItem>) -> Result<Self, CartInvariantError> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id) {
                return Err(CartInvariantError::DuplicateItem(item.id));
            }
        }
        Ok(Self { items })
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.items.iter()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find the line for a product.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Sum of all line amounts.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.amount.get()))
            .sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// A copy of this cart with `item` appended.
    ///
    /// # Errors
    ///
    /// Returns `CartInvariantError::DuplicateItem` if the product is already
    /// in the cart.
    pub fn with_appended(&self, item: LineItem) -> Result<Self, CartInvariantError> {
        if self.contains(item.id) {
            return Err(CartInvariantError::DuplicateItem(item.id));
        }
        let mut items = self.items.clone();
        items.push(item);
        Ok(Self { items })
    }

    /// A copy of this cart with the line for `id` set to `amount`.
    ///
    /// Unchanged if the product is not in the cart.
    #[must_use]
    pub fn with_amount(&self, id: ProductId, amount: Quantity) -> Self {
        let items = self
            .items
            .iter()
            .map(|item| {
                if item.id == id {
                    LineItem {
                        amount,
                        ..item.clone()
                    }
                } else {
                    item.clone()
                }
            })
            .collect();
        Self { items }
    }

    /// A copy of this cart without the line for `id`.
    #[must_use]
    pub fn without(&self, id: ProductId) -> Self {
        let items = self
            .items
            .iter()
            .filter(|item| item.id != id)
            .cloned()
            .collect();
        Self { items }
    }
}

impl TryFrom<Vec<LineItem>> for Cart {
    type Error = CartInvariantError;

    fn try_from(items: Vec<LineItem>) -> Result<Self, Self::Error> {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<LineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i32, amount: u32) -> LineItem {
        LineItem {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Decimal::new(1050, 2),
            image: format!("https://example.com/{id}.jpg"),
            amount: Quantity::new(amount).unwrap(),
        }
    }

    #[test]
    fn test_from_items_rejects_duplicates() {
        let result = Cart::from_items(vec![item(1, 1), item(2, 1), item(1, 3)]);
        assert_eq!(
            result.unwrap_err(),
            CartInvariantError::DuplicateItem(ProductId::new(1))
        );
    }

    #[test]
    fn test_from_items_preserves_order() {
        let cart = Cart::from_items(vec![item(3, 1), item(1, 2)]).unwrap();
        let ids: Vec<i32> = cart.iter().map(|i| i.id.as_i32()).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_with_appended() {
        let cart = Cart::new().with_appended(item(1, 1)).unwrap();
        assert_eq!(cart.len(), 1);
        assert!(cart.with_appended(item(1, 2)).is_err());
    }

    #[test]
    fn test_with_amount_only_touches_matching_line() {
        let cart = Cart::from_items(vec![item(1, 1), item(2, 1)]).unwrap();
        let updated = cart.with_amount(ProductId::new(2), Quantity::new(4).unwrap());
        assert_eq!(updated.get(ProductId::new(1)).unwrap().amount.get(), 1);
        assert_eq!(updated.get(ProductId::new(2)).unwrap().amount.get(), 4);
        // Original is untouched
        assert_eq!(cart.get(ProductId::new(2)).unwrap().amount.get(), 1);
    }

    #[test]
    fn test_with_amount_missing_id_is_noop() {
        let cart = Cart::from_items(vec![item(1, 1)]).unwrap();
        assert_eq!(cart.with_amount(ProductId::new(9), Quantity::ONE), cart);
    }

    #[test]
    fn test_without() {
        let cart = Cart::from_items(vec![item(1, 1), item(2, 1)]).unwrap();
        let removed = cart.without(ProductId::new(1));
        assert!(!removed.contains(ProductId::new(1)));
        assert!(removed.contains(ProductId::new(2)));
        assert_eq!(cart.without(ProductId::new(5)), cart);
    }

    #[test]
    fn test_totals() {
        let cart = Cart::from_items(vec![item(1, 2), item(2, 3)]).unwrap();
        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.subtotal(), Decimal::new(5250, 2));
        assert_eq!(Cart::new().subtotal(), Decimal::ZERO);
    }

    #[test]
    fn test_serializes_as_array() {
        let cart = Cart::from_items(vec![item(1, 2)]).unwrap();
        let value = serde_json::to_value(&cart).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["amount"], 2);
    }

    #[test]
    fn test_deserialize_rejects_duplicates_and_zero_amounts() {
        let duplicate = r#"[
            {"id":1,"title":"a","price":1,"image":"a","amount":1},
            {"id":1,"title":"a","price":1,"image":"a","amount":2}
        ]"#;
        assert!(serde_json::from_str::<Cart>(duplicate).is_err());

        let zero = r#"[{"id":1,"title":"a","price":1,"image":"a","amount":0}]"#;
        assert!(serde_json::from_str::<Cart>(zero).is_err());
    }
}
