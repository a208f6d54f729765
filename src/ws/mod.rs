//! Table rooms and the fan-out machinery shared by every connection.

pub mod broadcast;
pub mod codec;
pub mod registry;
pub mod room;
pub mod session;

pub use codec::{Frame, ProtocolError};
pub use registry::{TableDefaults, TableRegistry};
pub use room::TableRoom;
