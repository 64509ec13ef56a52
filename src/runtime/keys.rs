//! Structured key grammar for the property bag.
//!
//! Every action and the chain executor build and decode bag keys through
//! this module, so the addressing convention lives in one place:
//!
//! | Key              | Meaning                                           |
//! |------------------|---------------------------------------------------|
//! | `Key`            | scalar value                                      |
//! | `Key[i]`         | i-th element (0-based) of a list result           |
//! | `Key.Length`     | decimal count of `Key[i]` elements                |
//! | `Key.Valid`      | `"true"` iff `Length > 0`                         |
//! | `Key.Clean`      | residual text after a destructive extraction      |
//! | `Key.3.<group>`  | named capture group of the latest match under Key |
//! | `assign:Key`     | deferred assignment promoted by the chain executor|
//!
//! The `3` segment of the group form is a fixed marker, not an index.

/// Reserved input key that resolves to the raw cell text.
pub const TEXT: &str = "Text";

const LENGTH_SUFFIX: &str = ".Length";
const VALID_SUFFIX: &str = ".Valid";
const CLEAN_SUFFIX: &str = ".Clean";
const GROUP_MARKER: &str = ".3.";
const DEFERRED_PREFIX: &str = "assign:";

/// `Key[i]`
pub fn indexed(key: &str, index: usize) -> String {
    format!("{}[{}]", key, index)
}

/// `Key.Length`
pub fn length(key: &str) -> String {
    format!("{}{}", key, LENGTH_SUFFIX)
}

/// `Key.Valid`
pub fn valid(key: &str) -> String {
    format!("{}{}", key, VALID_SUFFIX)
}

/// `Key.Clean`
pub fn clean(key: &str) -> String {
    format!("{}{}", key, CLEAN_SUFFIX)
}

/// `Key.3.<group>`
pub fn group(key: &str, group_name: &str) -> String {
    format!("{}{}{}", key, GROUP_MARKER, group_name)
}

/// `assign:Key`
pub fn deferred(key: &str) -> String {
    format!("{}{}", DEFERRED_PREFIX, key)
}

/// Decode a deferred key, returning the target property.
///
/// The prefix is matched case-insensitively, like every other bag key.
pub fn strip_deferred(key: &str) -> Option<&str> {
    let prefix = key.get(..DEFERRED_PREFIX.len())?;
    if prefix.eq_ignore_ascii_case(DEFERRED_PREFIX) {
        Some(&key[DEFERRED_PREFIX.len()..])
    } else {
        None
    }
}

/// True if `key` is the reserved raw-text input.
pub fn is_text(key: &str) -> bool {
    key.eq_ignore_ascii_case(TEXT)
}

/// True for keys shaped like an entity property (`Product.Name`).
///
/// Keys produced by the grammar itself (`[i]`, `.Length`, `.Valid`,
/// `.Clean`, `.3.` groups, `assign:`) are never property paths.
pub fn is_property_path(key: &str) -> bool {
    if key.is_empty() || key.contains('[') || strip_deferred(key).is_some() {
        return false;
    }

    let lower = key.to_ascii_lowercase();
    if lower.contains(GROUP_MARKER) {
        return false;
    }
    for suffix in [LENGTH_SUFFIX, VALID_SUFFIX, CLEAN_SUFFIX] {
        if lower.ends_with(&suffix.to_ascii_lowercase()) {
            return false;
        }
    }

    let mut segments = key.split('.');
    let first = segments.next().unwrap_or_default();
    !first.is_empty() && segments.clone().count() > 0 && segments.all(|s| !s.is_empty())
}
