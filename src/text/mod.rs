//! Keystroke-level string diffs exchanged between clients and the server.
//!
//! All offsets are UTF-16 code units, the unit browser clients measure
//! strings in, so a diff computed on either end of the wire patches the
//! same characters on the other.

pub mod diff;
pub mod patch;

pub use diff::{diff, Diff};
pub use patch::{patch, PatchError};

pub(crate) fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

pub(crate) fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}
