pub mod diagnostics;
pub mod health;
pub mod table_snapshot;

pub use diagnostics::*;
pub use health::*;
pub use table_snapshot::*;
