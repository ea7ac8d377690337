//! WebSocket fan-out adapter implementing the `NotificationSender` port.
//!
//! The hub tracks the live WebSocket sessions per user. Delivery is best
//! effort: events for users without an open session are dropped, and a send
//! failure evicts the dead session. Either way the triggering operation has
//! already committed, so nothing here returns an error to the domain.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use actix_ws::Session;
use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::NotificationEvent;
use crate::domain::ports::NotificationSender;
use crate::domain::user::UserId;

/// Handle for removing a registered session from the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHandle {
    user_id: Uuid,
    connection_id: u64,
}

/// In-process registry of live WebSocket sessions keyed by user.
#[derive(Default)]
pub struct NotificationHub {
    // Guards only session bookkeeping; sends happen after the lock drops
    // because Session::text is async.
    sessions: Mutex<HashMap<Uuid, HashMap<u64, Session>>>,
    next_connection_id: AtomicU64,
}

impl NotificationHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session for a user. A user may hold several concurrent
    /// connections; each gets its own handle.
    pub fn register(&self, user_id: &UserId, session: Session) -> SessionHandle {
        let connection_id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        let handle = SessionHandle {
            user_id: *user_id.as_uuid(),
            connection_id,
        };

        let mut sessions = self.sessions.lock().unwrap_or_else(|err| err.into_inner());
        sessions
            .entry(handle.user_id)
            .or_default()
            .insert(connection_id, session);
        handle
    }

    /// Drop a session, typically after its connection closed.
    pub fn unregister(&self, handle: SessionHandle) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|err| err.into_inner());
        if let Some(user_sessions) = sessions.get_mut(&handle.user_id) {
            user_sessions.remove(&handle.connection_id);
            if user_sessions.is_empty() {
                sessions.remove(&handle.user_id);
            }
        }
    }

    /// Number of open connections for a user.
    pub fn connection_count(&self, user_id: &UserId) -> usize {
        let sessions = self.sessions.lock().unwrap_or_else(|err| err.into_inner());
        sessions
            .get(user_id.as_uuid())
            .map_or(0, HashMap::len)
    }

    /// Snapshot the recipient's sessions so the send happens outside the
    /// lock.
    fn sessions_for(&self, user_id: &Uuid) -> Vec<(u64, Session)> {
        let sessions = self.sessions.lock().unwrap_or_else(|err| err.into_inner());
        sessions.get(user_id).map_or_else(Vec::new, |user_sessions| {
            user_sessions
                .iter()
                .map(|(id, session)| (*id, session.clone()))
                .collect()
        })
    }
}

#[async_trait]
impl NotificationSender for NotificationHub {
    async fn notify(&self, recipient: &UserId, event: NotificationEvent) {
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(error = %error, "failed to serialise notification event");
                return;
            }
        };

        let targets = self.sessions_for(recipient.as_uuid());
        if targets.is_empty() {
            debug!(recipient = %recipient, "no open sessions for notification");
            return;
        }

        for (connection_id, mut session) in targets {
            if session.text(payload.clone()).await.is_err() {
                debug!(
                    recipient = %recipient,
                    connection_id,
                    "evicting closed notification session"
                );
                self.unregister(SessionHandle {
                    user_id: *recipient.as_uuid(),
                    connection_id,
                });
            }
        }
    }
}
