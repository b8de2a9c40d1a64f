//! Line item quantity.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// The amount of one product held in a cart.
///
/// A cart line can never hold fewer than one unit, so the wrapped value is a
/// [`NonZeroU32`]. Deserializing `0` fails, which means a decoded snapshot can
/// never contain an empty line.
///
/// ## Examples
///
/// ```
/// use rocket_cart_core::Quantity;
///
/// assert_eq!(Quantity::new(3).map(Quantity::get), Some(3));
/// assert!(Quantity::new(0).is_none());
/// assert!(Quantity::from_requested(-5).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity, returning `None` for zero.
    #[must_use]
    pub const fn new(amount: u32) -> Option<Self> {
        match NonZeroU32::new(amount) {
            Some(amount) => Some(Self(amount)),
            None => None,
        }
    }

    /// Interpret a caller-supplied amount.
    ///
    /// Returns `None` for anything below one and for values that do not fit in
    /// a `u32`.
    #[must_use]
    pub fn from_requested(amount: i64) -> Option<Self> {
        u32::try_from(amount).ok().and_then(Self::new)
    }

    /// Get the underlying amount.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// One more unit, or `None` on overflow.
    #[must_use]
    pub const fn checked_increment(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(amount) => Some(Self(amount)),
            None => None,
        }
    }

    /// Whether this quantity can be covered by `stock` available units.
    #[must_use]
    pub const fn fits_within(self, stock: u32) -> bool {
        self.0.get() <= stock
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_rejects_zero() {
        assert!(Quantity::new(0).is_none());
        assert_eq!(Quantity::new(1), Some(Quantity::ONE));
    }

    #[test]
    fn test_from_requested() {
        assert!(Quantity::from_requested(0).is_none());
        assert!(Quantity::from_requested(-5).is_none());
        assert!(Quantity::from_requested(i64::from(u32::MAX) + 1).is_none());
        assert_eq!(Quantity::from_requested(4).unwrap().get(), 4);
    }

    #[test]
    fn test_checked_increment() {
        assert_eq!(Quantity::ONE.checked_increment().unwrap().get(), 2);
        assert!(Quantity::new(u32::MAX).unwrap().checked_increment().is_none());
    }

    #[test]
    fn test_fits_within() {
        let five = Quantity::new(5).unwrap();
        assert!(five.fits_within(5));
        assert!(five.fits_within(6));
        assert!(!five.fits_within(4));
        assert!(!Quantity::ONE.fits_within(0));
    }

    #[test]
    fn test_deserialize_zero_fails() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert!(serde_json::from_str::<Quantity>("-1").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("2").unwrap().get(), 2);
    }
}
