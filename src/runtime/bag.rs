//! Property bag shared by the actions of a row.
//!
//! An insertion-ordered, case-insensitive string store. Keys follow the
//! grammar in [`crate::runtime::keys`]; the bag itself only enforces the list
//! invariant (every list write rewrites `Length` and `Valid` together).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::runtime::context::NumberFormat;
use crate::runtime::keys;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    /// Key as first written, used for iteration and serialization
    key: String,
    value: String,
}

/// Mutable, ordered, case-insensitive `String -> String` store.
///
/// # Example
/// ```
/// use cellrules::runtime::PropertyBag;
///
/// let mut bag = PropertyBag::new();
/// bag.set("Product.Brand", "CHANEL");
/// assert_eq!(bag.get("product.brand"), Some("CHANEL"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IndexMap<String, String>", into = "IndexMap<String, String>")]
pub struct PropertyBag {
    entries: IndexMap<String, Entry>,
}

fn fold(key: &str) -> String {
    key.to_lowercase()
}

impl PropertyBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key (case-insensitive).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&fold(key)).map(|e| e.value.as_str())
    }

    /// Get a value by key, treating an empty string as absent.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Insert or overwrite a scalar value.
    ///
    /// Overwriting keeps the entry's original position and casing.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.get_mut(&fold(&key)) {
            Some(entry) => entry.value = value,
            None => {
                self.entries.insert(fold(&key), Entry { key, value });
            }
        }
    }

    /// Remove a key, returning its value. Order of the remaining keys is kept.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(&fold(key)).map(|e| e.value)
    }

    /// Check whether a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&fold(key))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the bag holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|e| (e.key.as_str(), e.value.as_str()))
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Write a list result under `key`.
    ///
    /// Writes `key[0..n]`, `key.Length` and `key.Valid` in one step. Slots left
    /// over from an earlier, longer list under the same key are removed so
    /// that the element count always agrees with `Length`.
    pub fn write_list<I, S>(&mut self, key: &str, items: I, format: &NumberFormat)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let previous = self.list_len(key);

        let mut count = 0;
        for item in items {
            self.set(keys::indexed(key, count), item);
            count += 1;
        }
        for stale in count..previous {
            self.remove(&keys::indexed(key, stale));
        }

        self.set(keys::length(key), format.format_count(count));
        self.set(keys::valid(key), if count > 0 { "true" } else { "false" });
    }

    /// Write an empty list under `key` (`Length = 0`, `Valid = false`).
    pub fn write_empty_list(&mut self, key: &str, format: &NumberFormat) {
        self.write_list(key, std::iter::empty::<String>(), format);
    }

    /// Number of elements recorded under `key`, from `key.Length`.
    pub fn list_len(&self, key: &str) -> usize {
        self.get(&keys::length(key))
            .and_then(|n| n.parse().ok())
            .unwrap_or(0)
    }

    /// Read back the elements of a list written with [`write_list`](Self::write_list).
    pub fn read_list(&self, key: &str) -> Vec<String> {
        (0..self.list_len(key))
            .filter_map(|i| self.get(&keys::indexed(key, i)).map(str::to_string))
            .collect()
    }

    /// Remove every `assign:Key` entry, returning `(Key, value)` in order.
    pub fn drain_deferred(&mut self) -> Vec<(String, String)> {
        let folded: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| keys::strip_deferred(&e.key).is_some())
            .map(|(k, _)| k.clone())
            .collect();

        folded
            .into_iter()
            .filter_map(|k| self.entries.shift_remove(&k))
            .filter_map(|e| {
                keys::strip_deferred(&e.key).map(|target| (target.to_string(), e.value.clone()))
            })
            .collect()
    }
}

impl From<IndexMap<String, String>> for PropertyBag {
    fn from(map: IndexMap<String, String>) -> Self {
        let mut bag = PropertyBag::new();
        for (key, value) in map {
            bag.set(key, value);
        }
        bag
    }
}

impl From<PropertyBag> for IndexMap<String, String> {
    fn from(bag: PropertyBag) -> Self {
        bag.entries
            .into_values()
            .map(|e| (e.key, e.value))
            .collect()
    }
}
