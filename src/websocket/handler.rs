use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::{IntoResponse, Response},
    Extension,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Notify};
use tracing::{debug, error, info, warn};

use super::connection::ConnectionSession;
use crate::auth::auth;
use crate::models::TableId;
use crate::services::auth_service::AuthUser;
use crate::ws::{Frame, ProtocolError};
use crate::AppState;

/// How long queued frames may take to flush after the session closed.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// WebSocket handler
pub async fn websocket_handler(
    Path(table_id): Path<TableId>,
    State(app_state): State<Arc<AppState>>,
    user: Option<Extension<AuthUser>>,
    ws: WebSocketUpgrade,
) -> Response {
    info!("New WebSocket connection attempt for table {}", table_id);

    // The auth middleware has authenticated the user, now check the table
    if let Err(rejection) = auth::ensure_table_access(user.as_ref().map(|Extension(u)| u), table_id).await {
        return rejection.into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, table_id, app_state))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, table_id: TableId, app_state: Arc<AppState>) {
    let room = app_state.registry.get_or_load(table_id).await;

    // Split the socket into sender and receiver
    let (mut sender, mut receiver) = socket.split();

    // Everything bound for this client goes through one queue and one
    // writer, so frames from different broadcasts never interleave.
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Frame>(app_state.config.outbound_queue_capacity.max(1));
    let closer = Arc::new(Notify::new());

    let mut session = ConnectionSession::new(room, closer.clone());
    let Some(client_id) = session.open(outbound_tx).await else {
        error!("Failed to open session on table {}", table_id);
        return;
    };
    info!("WebSocket connection established for table {} with client_id {}", table_id, client_id);

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if sender.send(Message::Text(frame.to_string())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });
    let mut send_done = false;

    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => session.handle_text(&text).await,
                Some(Ok(Message::Binary(_))) => session.reject_malformed(ProtocolError::BinaryFrame),
                Some(Ok(Message::Close(_))) | None => {
                    debug!("Client {} closed the connection", client_id);
                    break;
                }
                // Ping and pong are answered by the transport.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket error for client {} on table {}: {}", client_id, table_id, e);
                    break;
                }
            },
            _ = closer.notified() => {
                info!("Closing client {} on table {}: outbound delivery failed", client_id, table_id);
                break;
            }
            _ = &mut send_task => {
                send_done = true;
                break;
            }
        }
    }

    // Drops the last senders once deregistered, letting the writer drain.
    session.close().await;
    drop(session);

    if !send_done {
        let abort = send_task.abort_handle();
        if tokio::time::timeout(FLUSH_TIMEOUT, send_task).await.is_err() {
            abort.abort();
        }
    }
    info!("WebSocket connection terminated for client {} on table {}", client_id, table_id);
}
