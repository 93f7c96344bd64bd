use std::sync::Arc;

use crate::favourites::UndoAction;

/// How long a consumer should keep a notification visible, in seconds
pub const NOTIFICATION_SECS: u64 = 3;

/// Kind of transient notification raised by the favourites store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Added,
    Removed,
}

/// Trait for surfacing transient user-visible notifications.
///
/// Implementations render toasts, print to a terminal, or collect
/// notifications for assertions in tests. When an `UndoAction` is attached
/// the consumer may offer it back to
/// [`FavouritesStore::apply_undo`](crate::favourites::FavouritesStore::apply_undo)
/// until the notification expires.
pub trait Notifier: Send + Sync {
    /// Surface a notification
    fn notify(&self, message: &str, kind: NotificationKind, undo: Option<UndoAction>);
}

/// A shared reference to a notifier
pub type SharedNotifier = Arc<dyn Notifier>;

/// A no-op notifier that silently drops all notifications.
/// Useful for tests or headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _message: &str, _kind: NotificationKind, _undo: Option<UndoAction>) {
        // Intentionally empty
    }
}

impl NoopNotifier {
    /// Create a new NoopNotifier wrapped in an Arc
    pub fn shared() -> SharedNotifier {
        Arc::new(Self)
    }
}
