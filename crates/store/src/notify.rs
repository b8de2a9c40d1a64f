//! User-facing notifications.
//!
//! Every rejected cart operation produces exactly one [`Notification`]. The
//! store hands it to a [`Notifier`] and moves on; delivery is fire-and-forget.

use core::fmt;

use tokio::sync::mpsc;

/// The four notification categories a cart operation can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notification {
    /// Adding a product failed (lookup or persistence error).
    AddFailed,
    /// Removing a product failed (not in cart, or persistence error).
    RemoveFailed,
    /// Updating a product amount failed (lookup or persistence error).
    UpdateFailed,
    /// The requested amount exceeds available stock.
    OutOfStock,
}

impl Notification {
    /// Fixed human-readable message for this category.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::AddFailed => "Error adding product",
            Self::RemoveFailed => "Error removing product",
            Self::UpdateFailed => "Error updating product amount",
            Self::OutOfStock => "Requested amount is out of stock",
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A one-way "display error message" sink.
pub trait Notifier: Send + Sync {
    /// Display a notification. Must not block.
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        tracing::warn!(notification = ?notification, "{notification}");
    }
}

/// Forwards notifications to a channel drained by the UI.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver the UI reads from.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        // Nobody listening is not an error for a toast.
        if self.sender.send(notification).is_err() {
            tracing::debug!(notification = ?notification, "Notification dropped, receiver closed");
        }
    }
}
