use super::{is_high_surrogate, is_low_surrogate};

/// A single contiguous edit of one string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diff {
    None,
    Insert { index: usize, text: String },
    Delete { start: usize, end: usize },
    Replace { start: usize, end: usize, text: String },
}

impl Diff {
    /// The `[start, end)` range of the original string this diff removes.
    pub fn range(&self) -> Option<(usize, usize)> {
        match self {
            Diff::None => None,
            Diff::Insert { index, .. } => Some((*index, *index)),
            Diff::Delete { start, end } | Diff::Replace { start, end, .. } => Some((*start, *end)),
        }
    }
}

/// Compute the edit turning `old` into `new`.
///
/// Trims the longest common prefix, then the longest common suffix of what
/// remains, and reports the middle as a single insert, delete or replace.
/// This is not a general LCS: two disjoint edits in one call collapse into
/// one replace spanning both. Cut points never fall inside a surrogate pair.
pub fn diff(old: &str, new: &str) -> Diff {
    if old == new {
        return Diff::None;
    }

    let a: Vec<u16> = old.encode_utf16().collect();
    let b: Vec<u16> = new.encode_utf16().collect();

    let max_prefix = a.len().min(b.len());
    let mut prefix = 0;
    while prefix < max_prefix && a[prefix] == b[prefix] {
        prefix += 1;
    }
    // Shared high surrogate with differing low halves.
    if prefix > 0 && is_high_surrogate(a[prefix - 1]) {
        prefix -= 1;
    }

    let max_suffix = (a.len() - prefix).min(b.len() - prefix);
    let mut suffix = 0;
    while suffix < max_suffix && a[a.len() - 1 - suffix] == b[b.len() - 1 - suffix] {
        suffix += 1;
    }
    // Shared low surrogate with differing high halves.
    if suffix > 0 && is_low_surrogate(a[a.len() - suffix]) {
        suffix -= 1;
    }

    let removed = &a[prefix..a.len() - suffix];
    let inserted = &b[prefix..b.len() - suffix];

    match (removed.is_empty(), inserted.is_empty()) {
        (true, true) => Diff::None,
        (true, false) => Diff::Insert {
            index: prefix,
            text: String::from_utf16_lossy(inserted),
        },
        (false, true) => Diff::Delete {
            start: prefix,
            end: prefix + removed.len(),
        },
        (false, false) => Diff::Replace {
            start: prefix,
            end: prefix + removed.len(),
            text: String::from_utf16_lossy(inserted),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::patch;
    use proptest::prelude::*;

    #[test]
    fn identical_strings_produce_none() {
        assert_eq!(diff("", ""), Diff::None);
        assert_eq!(diff("same", "same"), Diff::None);
    }

    #[test]
    fn single_character_change_is_minimal_replace() {
        assert_eq!(
            diff("hello", "hXllo"),
            Diff::Replace { start: 1, end: 2, text: "X".to_string() }
        );
    }

    #[test]
    fn typing_at_the_end_is_an_insert() {
        assert_eq!(diff("hi", "hi!"), Diff::Insert { index: 2, text: "!".to_string() });
        assert_eq!(diff("", "hi"), Diff::Insert { index: 0, text: "hi".to_string() });
    }

    #[test]
    fn backspace_is_a_delete() {
        assert_eq!(diff("hello", "helo"), Diff::Delete { start: 3, end: 4 });
        assert_eq!(diff("abc", ""), Diff::Delete { start: 0, end: 3 });
    }

    #[test]
    fn repeated_characters_prefer_the_prefix() {
        // The suffix scan stops at the prefix, so the deleted run sits at the end.
        assert_eq!(diff("aaa", "aa"), Diff::Delete { start: 2, end: 3 });
        assert_eq!(diff("aa", "aaa"), Diff::Insert { index: 2, text: "a".to_string() });
    }

    #[test]
    fn disjoint_edits_collapse_into_one_replace() {
        assert_eq!(
            diff("abcdef", "XbcdeY"),
            Diff::Replace { start: 0, end: 6, text: "XbcdeY".to_string() }
        );
    }

    #[test]
    fn offsets_are_utf16_code_units() {
        // U+1F600 takes two code units, so 'b' sits at offset 3.
        assert_eq!(diff("a😀b", "a😀Xb"), Diff::Insert { index: 3, text: "X".to_string() });
        assert_eq!(diff("é", "éé"), Diff::Insert { index: 1, text: "é".to_string() });
    }

    #[test]
    fn never_cuts_inside_a_surrogate_pair() {
        // U+1F600 and U+1F601 share their high surrogate.
        assert_eq!(
            diff("😀a", "😁a"),
            Diff::Replace { start: 0, end: 2, text: "😁".to_string() }
        );
        // U+1F600 and U+1F200 share their low surrogate.
        assert_eq!(
            diff("a😀", "a\u{1F200}"),
            Diff::Replace { start: 1, end: 3, text: "\u{1F200}".to_string() }
        );
    }

    proptest! {
        #[test]
        fn patching_with_the_diff_reproduces_the_target(a in any::<String>(), b in any::<String>()) {
            let d = diff(&a, &b);
            prop_assert_eq!(patch(&a, &d).unwrap(), b);
        }

        #[test]
        fn keystroke_edits_round_trip(base in "[a-z😀é ]{0,16}", at in 0usize..17, ins in "[A-Z😁]{0,3}", del in 0usize..4) {
            let chars: Vec<char> = base.chars().collect();
            let at = at.min(chars.len());
            let end = (at + del).min(chars.len());
            let mut target: String = chars[..at].iter().collect();
            target.push_str(&ins);
            target.extend(&chars[end..]);
            let d = diff(&base, &target);
            prop_assert_eq!(patch(&base, &d).unwrap(), target);
        }

        #[test]
        fn diff_of_a_string_with_itself_is_none(a in any::<String>()) {
            prop_assert_eq!(diff(&a, &a), Diff::None);
            prop_assert_eq!(patch(&a, &Diff::None).unwrap(), a);
        }
    }
}
