pub mod state;

pub use state::{Cell, GridLimits, LockOutcome, TableError, TableState};
