//! Port abstraction for the fire-and-forget notification side channel.

use async_trait::async_trait;

use crate::domain::notification::NotificationEvent;
use crate::domain::user::UserId;

/// Best-effort delivery of notification events to a user.
///
/// Implementations log and swallow failures; a broken notification channel
/// must never fail the state change that produced the event.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Deliver an event to every live channel of the recipient.
    async fn notify(&self, recipient: &UserId, event: NotificationEvent);
}

/// No-op sender for wiring paths where notifications are irrelevant.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotificationSender;

#[async_trait]
impl NotificationSender for NullNotificationSender {
    async fn notify(&self, _recipient: &UserId, _event: NotificationEvent) {}
}
