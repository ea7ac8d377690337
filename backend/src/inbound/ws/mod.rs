//! WebSocket inbound adapter for membership notifications.
//!
//! Connections are push-only: the server delivers
//! [`NotificationEvent`](crate::domain::NotificationEvent) payloads as JSON
//! text frames and ignores client text. The contract pings every 5s and
//! considers a connection idle after 10s without client traffic.

use std::time::{Duration, Instant};

use actix_web::web::Payload;
use actix_web::{HttpRequest, HttpResponse, get, web};
use actix_ws::{CloseReason, Message, MessageStream, ProtocolError, Session};
use tokio::time;
use tracing::debug;
use uuid::Uuid;

use crate::domain::user::UserId;
use crate::outbound::notify::NotificationHub;

/// Time between heartbeats to the client.
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client.
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

/// Handle WebSocket upgrade for the notification endpoint.
#[get("/ws/{user_id}")]
pub async fn notifications_ws(
    hub: web::Data<NotificationHub>,
    path: web::Path<Uuid>,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let user_id = UserId::from_uuid(path.into_inner());
    let (response, session, message_stream) = actix_ws::handle(&req, stream)?;

    actix_web::rt::spawn(run_session(hub, user_id, session, message_stream));

    Ok(response)
}

enum SessionEnd {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    Network,
}

/// Drive one connection until it ends, keeping the hub registration in sync
/// with the connection's lifetime.
async fn run_session(
    hub: web::Data<NotificationHub>,
    user_id: UserId,
    mut session: Session,
    mut stream: MessageStream,
) {
    let handle = hub.register(&user_id, session.clone());

    let mut last_heartbeat = Instant::now();
    let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

    let end = loop {
        let result = tokio::select! {
            _ = heartbeat.tick() => {
                heartbeat_tick(&mut session, &last_heartbeat).await
            }
            message = stream.recv() => {
                handle_message(&mut last_heartbeat, message)
            }
        };

        if let Err(end) = result {
            break end;
        }
    };

    hub.unregister(handle);
    log_session_end(&user_id, &end);
    if let SessionEnd::ClientClosed(reason) = end {
        let _ = session.close(reason).await;
    } else {
        let _ = session.close(None).await;
    }
}

async fn heartbeat_tick(
    session: &mut Session,
    last_heartbeat: &Instant,
) -> Result<(), SessionEnd> {
    if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
        return Err(SessionEnd::HeartbeatTimeout);
    }

    session.ping(b"").await.map_err(|_| SessionEnd::Network)
}

fn handle_message(
    last_heartbeat: &mut Instant,
    message: Option<Result<Message, ProtocolError>>,
) -> Result<(), SessionEnd> {
    let Some(message) = message else {
        return Err(SessionEnd::StreamClosed);
    };

    match message {
        Ok(Message::Close(reason)) => Err(SessionEnd::ClientClosed(reason)),
        // Push-only endpoint: any other inbound frame just proves liveness.
        Ok(_) => {
            *last_heartbeat = Instant::now();
            Ok(())
        }
        Err(error) => Err(SessionEnd::Protocol(error)),
    }
}

fn log_session_end(user_id: &UserId, end: &SessionEnd) {
    match end {
        SessionEnd::ClientClosed(reason) => {
            debug!(user_id = %user_id, ?reason, "client closed notification session");
        }
        SessionEnd::StreamClosed => {
            debug!(user_id = %user_id, "notification stream ended");
        }
        SessionEnd::HeartbeatTimeout => {
            debug!(user_id = %user_id, "notification session timed out");
        }
        SessionEnd::Protocol(error) => {
            debug!(user_id = %user_id, error = %error, "notification session protocol error");
        }
        SessionEnd::Network => {
            debug!(user_id = %user_id, "notification session network closed");
        }
    }
}
