use thiserror::Error;

use super::{is_low_surrogate, Diff};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("range {start}..{end} is inverted")]
    InvertedRange { start: usize, end: usize },

    #[error("offset {offset} is past the end of a {len}-unit string")]
    OutOfRange { offset: usize, len: usize },

    #[error("offset {offset} splits a surrogate pair")]
    SplitsSurrogate { offset: usize },
}

/// Check that `diff` addresses valid cut points of a string made of `units`.
pub fn validate(units: &[u16], diff: &Diff) -> Result<(), PatchError> {
    let Some((start, end)) = diff.range() else {
        return Ok(());
    };
    if start > end {
        return Err(PatchError::InvertedRange { start, end });
    }
    for offset in [start, end] {
        if offset > units.len() {
            return Err(PatchError::OutOfRange { offset, len: units.len() });
        }
        if offset < units.len() && is_low_surrogate(units[offset]) {
            return Err(PatchError::SplitsSurrogate { offset });
        }
    }
    Ok(())
}

/// Apply `diff` to `old`, returning the edited string. `old` is never modified.
pub fn patch(old: &str, diff: &Diff) -> Result<String, PatchError> {
    let (start, end, text) = match diff {
        Diff::None => return Ok(old.to_owned()),
        Diff::Insert { index, text } => (*index, *index, text.as_str()),
        Diff::Delete { start, end } => (*start, *end, ""),
        Diff::Replace { start, end, text } => (*start, *end, text.as_str()),
    };

    let units: Vec<u16> = old.encode_utf16().collect();
    validate(&units, diff)?;

    let mut out = Vec::with_capacity(units.len() - (end - start) + text.len());
    out.extend_from_slice(&units[..start]);
    out.extend(text.encode_utf16());
    out.extend_from_slice(&units[end..]);

    // Every cut point was checked against surrogate pairs above.
    Ok(String::from_utf16_lossy(&out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_splices_at_index() {
        let d = Diff::Insert { index: 2, text: "XY".to_string() };
        assert_eq!(patch("abcd", &d).unwrap(), "abXYcd");
        let d = Diff::Insert { index: 4, text: "!".to_string() };
        assert_eq!(patch("abcd", &d).unwrap(), "abcd!");
    }

    #[test]
    fn delete_removes_half_open_range() {
        let d = Diff::Delete { start: 1, end: 3 };
        assert_eq!(patch("abcd", &d).unwrap(), "ad");
    }

    #[test]
    fn replace_swaps_range() {
        let d = Diff::Replace { start: 1, end: 2, text: "X".to_string() };
        assert_eq!(patch("hello", &d).unwrap(), "hXllo");
    }

    #[test]
    fn none_returns_input() {
        assert_eq!(patch("keep", &Diff::None).unwrap(), "keep");
    }

    #[test]
    fn rejects_out_of_range_offsets() {
        let d = Diff::Insert { index: 5, text: "x".to_string() };
        assert_eq!(patch("abcd", &d), Err(PatchError::OutOfRange { offset: 5, len: 4 }));
        let d = Diff::Delete { start: 2, end: 9 };
        assert_eq!(patch("abcd", &d), Err(PatchError::OutOfRange { offset: 9, len: 4 }));
    }

    #[test]
    fn rejects_inverted_range() {
        let d = Diff::Replace { start: 3, end: 1, text: String::new() };
        assert_eq!(patch("abcd", &d), Err(PatchError::InvertedRange { start: 3, end: 1 }));
    }

    #[test]
    fn rejects_offsets_inside_surrogate_pairs() {
        let d = Diff::Insert { index: 2, text: "x".to_string() };
        assert_eq!(patch("a😀", &d), Err(PatchError::SplitsSurrogate { offset: 2 }));
        let d = Diff::Delete { start: 1, end: 3 };
        assert_eq!(patch("a😀", &d).unwrap(), "a");
    }
}
