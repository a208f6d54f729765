pub mod connection;
pub mod handler;
pub mod msg_edit_handler;
pub mod msg_layout_handler;
pub mod msg_lock_handler;

pub use handler::websocket_handler;
