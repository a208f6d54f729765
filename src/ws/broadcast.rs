use tracing::warn;

use super::codec::Frame;
use super::session::SessionRegistry;
use crate::models::ClientId;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: Vec<ClientId>,
}

/// Deliver `frame` to every session except `exclude`.
///
/// Delivery is best-effort per recipient. A recipient whose queue is full or
/// closed is asked to close; its own handler then runs the disconnect
/// cleanup. Nothing is reported back to the sender.
pub fn broadcast(sessions: &SessionRegistry, frame: &Frame, exclude: Option<ClientId>) -> BroadcastReport {
    let mut report = BroadcastReport::default();
    for session in sessions.iter().filter(|s| Some(s.client_id()) != exclude) {
        match session.deliver(frame.clone()) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!(client_id = session.client_id(), "Failed to deliver message, closing connection: {}", e);
                session.close();
                report.failed.push(session.client_id());
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::{mpsc, Notify};

    #[tokio::test]
    async fn delivers_to_everyone_but_the_excluded_client() {
        let mut sessions = SessionRegistry::new();
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        let (tx3, mut rx3) = mpsc::channel(4);
        let a = sessions.register(tx1, Arc::new(Notify::new()));
        sessions.register(tx2, Arc::new(Notify::new()));
        sessions.register(tx3, Arc::new(Notify::new()));

        let report = broadcast(&sessions, &Frame::from("edit"), Some(a.client_id()));

        assert_eq!(report, BroadcastReport { delivered: 2, failed: vec![] });
        assert!(rx1.try_recv().is_err());
        assert_eq!(&*rx2.recv().await.unwrap(), "edit");
        assert_eq!(&*rx3.recv().await.unwrap(), "edit");
    }

    #[tokio::test]
    async fn without_exclusion_everyone_receives() {
        let mut sessions = SessionRegistry::new();
        let (tx, mut rx) = mpsc::channel(4);
        sessions.register(tx, Arc::new(Notify::new()));

        assert_eq!(broadcast(&sessions, &Frame::from("release"), None).delivered, 1);
        assert_eq!(&*rx.recv().await.unwrap(), "release");
    }

    #[tokio::test]
    async fn failed_recipient_is_closed_and_others_still_receive() {
        let mut sessions = SessionRegistry::new();
        let (dead_tx, dead_rx) = mpsc::channel(4);
        let dead_closer = Arc::new(Notify::new());
        let dead = sessions.register(dead_tx, dead_closer.clone());
        drop(dead_rx);
        let (tx, mut rx) = mpsc::channel(4);
        sessions.register(tx, Arc::new(Notify::new()));

        let report = broadcast(&sessions, &Frame::from("edit"), None);

        assert_eq!(report, BroadcastReport { delivered: 1, failed: vec![dead.client_id()] });
        assert_eq!(&*rx.recv().await.unwrap(), "edit");
        tokio::time::timeout(Duration::from_secs(1), dead_closer.notified())
            .await
            .unwrap();
    }
}
