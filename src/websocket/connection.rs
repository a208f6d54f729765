use std::sync::Arc;

use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};

use super::msg_edit_handler::handle_edit_message;
use super::msg_layout_handler::{handle_insert_columns, handle_insert_rows};
use super::msg_lock_handler::{handle_acquire_lock, handle_release_lock};
use crate::models::{ClientId, ClientMessage, ServerMessage};
use crate::table::TableError;
use crate::ws::codec::{self, Frame, ProtocolError};
use crate::ws::TableRoom;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active(ClientId),
    Closed,
}

/// Protocol state of one connection to one table.
///
/// Inbound messages are handled one at a time in receipt order. The client
/// id stamped on every broadcast is the one assigned at `open`, whatever the
/// client claims.
pub struct ConnectionSession {
    room: Arc<TableRoom>,
    state: SessionState,
    outbound: Option<mpsc::Sender<Frame>>,
    closer: Arc<Notify>,
}

impl ConnectionSession {
    pub fn new(room: Arc<TableRoom>, closer: Arc<Notify>) -> Self {
        Self {
            room,
            state: SessionState::Connecting,
            outbound: None,
            closer,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Join the table: assigns the client id and queues `init`.
    pub async fn open(&mut self, outbound: mpsc::Sender<Frame>) -> Option<ClientId> {
        if self.state != SessionState::Connecting {
            warn!("Session on table {} opened twice", self.room.id());
            return None;
        }

        match self.room.join(outbound.clone(), self.closer.clone()).await {
            Some(client_id) => {
                self.state = SessionState::Active(client_id);
                self.outbound = Some(outbound);
                Some(client_id)
            }
            None => {
                self.state = SessionState::Closed;
                None
            }
        }
    }

    /// Decode and handle every message in one text frame.
    pub async fn handle_text(&mut self, text: &str) {
        for decoded in codec::decode_frame(text) {
            match decoded {
                Ok(msg) => self.handle_message(msg).await,
                Err(e) => self.reject_malformed(e),
            }
        }
    }

    pub fn reject_malformed(&self, e: ProtocolError) {
        warn!("Malformed message on table {} from {:?}: {}", self.room.id(), self.state, e);
        self.send_error(e.to_string());
    }

    pub async fn handle_message(&mut self, msg: ClientMessage) {
        let SessionState::Active(client_id) = self.state else {
            debug!("Ignoring {} on inactive session", msg.kind());
            return;
        };
        let kind = msg.kind();
        let room = self.room.as_ref();

        let result = match msg {
            ClientMessage::Insert(m) => handle_edit_message(room, client_id, m.into()).await,
            ClientMessage::Delete(m) => handle_edit_message(room, client_id, m.into()).await,
            ClientMessage::Replace(m) => handle_edit_message(room, client_id, m.into()).await,
            ClientMessage::AcquireLock(m) => handle_acquire_lock(room, client_id, m).await,
            ClientMessage::ReleaseLock(m) => handle_release_lock(room, client_id, m).await,
            ClientMessage::InsertRows(m) => handle_insert_rows(room, client_id, m).await,
            ClientMessage::InsertColumns(m) => handle_insert_columns(room, client_id, m).await,
        };

        match result {
            Ok(true) => debug!("Applied {} from client {}", kind, client_id),
            Ok(false) => debug!("{} from client {} changed nothing", kind, client_id),
            Err(e) => self.reject(client_id, kind, e),
        }
    }

    // Malformed diffs are reported back; lock, bounds and layout rejections
    // are dropped silently, the client already shows the cell as locked.
    fn reject(&self, client_id: ClientId, kind: &str, e: TableError) {
        if e.is_malformed() {
            warn!("Malformed {} from client {} on table {}: {}", kind, client_id, self.room.id(), e);
            self.send_error(e.to_string());
        } else {
            debug!("Rejected {} from client {} on table {}: {}", kind, client_id, self.room.id(), e);
        }
    }

    fn send_error(&self, message: String) {
        let Some(outbound) = &self.outbound else {
            return;
        };
        let frame = match codec::encode(&ServerMessage::Error { message }) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to encode error message: {}", e);
                return;
            }
        };
        if outbound.try_send(frame).is_err() {
            warn!("Outbound queue unavailable on table {}, closing connection", self.room.id());
            self.closer.notify_one();
        }
    }

    /// Leave the table: release every held lock and deregister.
    pub async fn close(&mut self) {
        let SessionState::Active(client_id) = self.state else {
            self.state = SessionState::Closed;
            return;
        };
        self.state = SessionState::Closed;
        self.outbound = None;

        let released = self.room.leave(client_id).await;
        info!(
            "Session for client {} on table {} closed, released {:?}",
            client_id,
            self.room.id(),
            released
        );
    }
}
