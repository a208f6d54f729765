use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, Notify, RwLock};
use tracing::{debug, error, info};

use super::broadcast::broadcast;
use super::codec::{self, Frame};
use super::session::SessionRegistry;
use crate::models::{CellRef, ClientId, InitMessage, ServerMessage, TableId, TableSnapshotResponse};
use crate::table::{TableError, TableState};

/// One loaded table: its authoritative state and the sessions editing it.
///
/// Every mutation runs under the `state` mutex and broadcasts before
/// releasing it, so broadcast order is the order mutations were applied.
/// `sessions` is only ever locked while `state` is held, or on its own for
/// read-only inspection.
pub struct TableRoom {
    id: TableId,
    state: Mutex<TableState>,
    sessions: RwLock<SessionRegistry>,
}

impl TableRoom {
    pub fn new(id: TableId, state: TableState) -> Self {
        Self {
            id,
            state: Mutex::new(state),
            sessions: RwLock::new(SessionRegistry::new()),
        }
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    /// Register a connection and queue its `init` message.
    ///
    /// The snapshot, the registration and the queued `init` happen in one
    /// critical section, so the new session sees every later mutation
    /// exactly once.
    pub async fn join(&self, outbound: mpsc::Sender<Frame>, closer: Arc<Notify>) -> Option<ClientId> {
        let state = self.state.lock().await;
        let mut sessions = self.sessions.write().await;
        let handle = sessions.register(outbound, closer);
        let client_id = handle.client_id();

        let init = ServerMessage::Init(InitMessage {
            client_id,
            table: state.snapshot(),
            layout_version: state.layout_version(),
        });
        let delivered = match codec::encode(&init) {
            Ok(frame) => handle.deliver(frame).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(e) = delivered {
            error!("Failed to send init to client {} on table {}: {}", client_id, self.id, e);
            sessions.deregister(client_id);
            return None;
        }

        info!("Client {} joined table {} ({} connected)", client_id, self.id, sessions.len());
        Some(client_id)
    }

    /// Run `op` against the table and broadcast the message it returns to
    /// every session except `origin`. Returns whether anything was broadcast.
    pub async fn mutate<F>(&self, origin: ClientId, op: F) -> Result<bool, TableError>
    where
        F: FnOnce(&mut TableState) -> Result<Option<ServerMessage>, TableError>,
    {
        let mut state = self.state.lock().await;
        let Some(msg) = op(&mut state)? else {
            return Ok(false);
        };
        let frame = match codec::encode(&msg) {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to encode broadcast on table {}: {}", self.id, e);
                return Ok(false);
            }
        };
        let sessions = self.sessions.read().await;
        let report = broadcast(&sessions, &frame, Some(origin));
        debug!(
            "Broadcast from client {} on table {} reached {} sessions",
            origin, self.id, report.delivered
        );
        Ok(true)
    }

    /// Deregister `client_id`, release its locks and tell everyone left.
    pub async fn leave(&self, client_id: ClientId) -> Vec<CellRef> {
        let mut state = self.state.lock().await;
        let released = state.release_all(client_id);
        let mut sessions = self.sessions.write().await;
        if sessions.deregister(client_id).is_none() {
            debug!("Client {} already left table {}", client_id, self.id);
        }
        let sessions = sessions.downgrade();

        for cell in &released {
            match codec::encode(&ServerMessage::ReleaseLock { cell: *cell }) {
                Ok(frame) => {
                    broadcast(&sessions, &frame, None);
                }
                Err(e) => error!("Failed to encode lock release on table {}: {}", self.id, e),
            }
        }

        info!(
            "Client {} left table {} ({} locks released, {} connected)",
            client_id,
            self.id,
            released.len(),
            sessions.len()
        );
        released
    }

    pub async fn snapshot(&self) -> TableSnapshotResponse {
        let state = self.state.lock().await;
        TableSnapshotResponse {
            table_id: self.id,
            rows: state.rows(),
            cols: state.cols(),
            layout_version: state.layout_version(),
            table: state.snapshot(),
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn lock_count(&self) -> usize {
        self.state.lock().await.lock_count()
    }
}
