use std::sync::Arc;

use thiserror::Error;

use crate::models::{ClientMessage, ServerMessage};

/// One encoded server message. Broadcasts encode once and share the frame
/// between every recipient's queue.
pub type Frame = Arc<str>;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary frames are not supported")]
    BinaryFrame,

    #[error("range {start}..{end} is inverted")]
    InvertedRange { start: usize, end: usize },
}

pub fn encode(msg: &ServerMessage) -> Result<Frame, ProtocolError> {
    Ok(Arc::from(serde_json::to_string(msg)?))
}

/// Decode every message in a text frame. Messages may be separated by
/// newlines; decoding stops at the first malformed one.
pub fn decode_frame(text: &str) -> Vec<Result<ClientMessage, ProtocolError>> {
    let mut out = Vec::new();
    for item in serde_json::Deserializer::from_str(text).into_iter::<ClientMessage>() {
        match item {
            Ok(msg) => out.push(validate(msg)),
            Err(e) => {
                out.push(Err(e.into()));
                break;
            }
        }
    }
    out
}

fn validate(msg: ClientMessage) -> Result<ClientMessage, ProtocolError> {
    match &msg {
        ClientMessage::Delete(m) if m.start > m.end => {
            Err(ProtocolError::InvertedRange { start: m.start, end: m.end })
        }
        ClientMessage::Replace(m) if m.start > m.end => {
            Err(ProtocolError::InvertedRange { start: m.start, end: m.end })
        }
        _ => Ok(msg),
    }
}
