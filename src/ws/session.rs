use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Notify};

use super::codec::Frame;
use crate::models::ClientId;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("outbound queue is full")]
    QueueFull,
    #[error("connection is closed")]
    Closed,
}

/// The registry's handle on one live connection: its id, its outbound queue
/// and a way to ask its handler to shut the connection down.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    client_id: ClientId,
    outbound: mpsc::Sender<Frame>,
    closer: Arc<Notify>,
}

impl SessionHandle {
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Queue a frame without waiting. The connection's writer task sends
    /// queued frames one at a time, so frames are never interleaved.
    pub fn deliver(&self, frame: Frame) -> Result<(), DeliveryError> {
        self.outbound.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::QueueFull,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    /// Ask the connection's handler to close and run its cleanup.
    pub fn close(&self) {
        self.closer.notify_one();
    }
}

/// Sessions connected to one table, keyed by client id.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: BTreeMap<ClientId, SessionHandle>,
    next_client_id: ClientId,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: BTreeMap::new(),
            // Ids start at 1; browser clients treat 0 as "no owner".
            next_client_id: 1,
        }
    }

    /// Register a connection under a fresh client id. Ids are never reused.
    pub fn register(&mut self, outbound: mpsc::Sender<Frame>, closer: Arc<Notify>) -> SessionHandle {
        let client_id = self.next_client_id;
        self.next_client_id += 1;
        let handle = SessionHandle { client_id, outbound, closer };
        self.sessions.insert(client_id, handle.clone());
        handle
    }

    pub fn deregister(&mut self, client_id: ClientId) -> Option<SessionHandle> {
        self.sessions.remove(&client_id)
    }

    #[cfg(test)]
    pub fn contains(&self, client_id: ClientId) -> bool {
        self.sessions.contains_key(&client_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionHandle> {
        self.sessions.values()
    }
}
