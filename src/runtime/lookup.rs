//! Lookup tables: case-insensitive alias -> canonical mappings.
//!
//! Tables come from two places. The parser configuration declares global
//! tables; supplier configurations contribute extra aliases (or whole
//! tables) that are merged in place before the engine is built. Every entry
//! remembers who contributed it so a supplier's contributions can be
//! reverted without touching anyone else's.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Who contributed a table or an entry. Supplier ids are stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Global,
    Supplier(String),
}

impl Origin {
    fn supplier(id: &str) -> Self {
        Origin::Supplier(fold(id))
    }

    fn is_supplier(&self, id: &str) -> bool {
        matches!(self, Origin::Supplier(s) if *s == fold(id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LookupEntry {
    alias: String,
    canonical: String,
    origin: Origin,
    /// Entry this one overrode; restored when `origin` is reverted
    shadowed: Option<Box<LookupEntry>>,
}

impl LookupEntry {
    /// Drop every layer contributed by `supplier`, keeping the rest of the stack.
    fn without(mut self, supplier: &str) -> Option<LookupEntry> {
        let below = self.shadowed.take().and_then(|e| e.without(supplier));
        if self.origin.is_supplier(supplier) {
            below
        } else {
            self.shadowed = below.map(Box::new);
            Some(self)
        }
    }
}

fn fold(key: &str) -> String {
    key.to_lowercase()
}

/// A single named lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTable {
    name: String,
    origin: Origin,
    entries: IndexMap<String, LookupEntry>,
}

impl LookupTable {
    /// Create an empty global table.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_origin(name, Origin::Global)
    }

    fn with_origin(name: impl Into<String>, origin: Origin) -> Self {
        Self {
            name: name.into(),
            origin,
            entries: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Look up the canonical value for an alias (case-insensitive).
    pub fn get(&self, alias: &str) -> Option<&str> {
        self.entries.get(&fold(alias)).map(|e| e.canonical.as_str())
    }

    /// Insert or overwrite a global alias.
    pub fn insert(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        self.insert_from(alias.into(), canonical.into(), Origin::Global);
    }

    fn insert_from(&mut self, alias: String, canonical: String, origin: Origin) {
        let key = fold(&alias);
        let entry = LookupEntry {
            alias,
            canonical,
            origin,
            shadowed: None,
        };
        match self.entries.get_mut(&key) {
            Some(existing) => {
                let previous = std::mem::replace(existing, entry);
                existing.shadowed = if previous.origin == existing.origin {
                    previous.shadowed
                } else {
                    Some(Box::new(previous))
                };
            }
            None => {
                self.entries.insert(key, entry);
            }
        }
    }

    /// Revert every entry contributed by `supplier`.
    fn revert(&mut self, supplier: &str) {
        let entries = std::mem::take(&mut self.entries);
        self.entries = entries
            .into_iter()
            .filter_map(|(key, entry)| entry.without(supplier).map(|kept| (key, kept)))
            .collect();
    }

    /// Aliases as written, in insertion order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|e| e.alias.as_str())
    }

    /// `(alias, canonical)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|e| (e.alias.as_str(), e.canonical.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a regex alternation matching any alias of this table.
    ///
    /// Aliases are escaped and ordered longest-first so that the longest
    /// alias wins when several share a prefix. Returns `None` for an empty
    /// table.
    pub fn alias_pattern(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }

        let mut aliases: Vec<&str> = self.aliases().filter(|a| !a.is_empty()).collect();
        aliases.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        aliases.dedup();
        if aliases.is_empty() {
            return None;
        }

        let alternation: Vec<String> = aliases.iter().map(|a| regex::escape(a)).collect();
        Some(format!("(?:{})", alternation.join("|")))
    }
}

/// All lookup tables visible to a parser configuration, keyed by name
/// (case-insensitive).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "IndexMap<String, IndexMap<String, String>>",
    into = "IndexMap<String, IndexMap<String, String>>"
)]
pub struct LookupSet {
    tables: IndexMap<String, LookupTable>,
}

impl LookupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a table by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&LookupTable> {
        self.tables.get(&fold(name))
    }

    /// Get a table for in-place updates.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut LookupTable> {
        self.tables.get_mut(&fold(name))
    }

    /// Check whether a table exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(&fold(name))
    }

    /// Get the table called `name`, creating an empty global one if missing.
    pub fn table_mut(&mut self, name: &str) -> &mut LookupTable {
        self.tables
            .entry(fold(name))
            .or_insert_with(|| LookupTable::new(name))
    }

    /// Table names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.values().map(|t| t.name())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Merge a supplier's lookup tables into this set, in place.
    ///
    /// Existing tables are updated, never replaced, so their identity is
    /// preserved. Re-merging the same supplier first reverts that supplier's
    /// previous contribution, which makes the merge idempotent and drops
    /// aliases the supplier no longer declares.
    ///
    /// # Arguments
    /// * `supplier` - Supplier id, compared case-insensitively
    /// * `tables` - Table name -> (alias -> canonical)
    pub fn merge_supplier(
        &mut self,
        supplier: &str,
        tables: &IndexMap<String, IndexMap<String, String>>,
    ) {
        for table in self.tables.values_mut() {
            table.revert(supplier);
        }

        for (name, aliases) in tables {
            let origin = Origin::supplier(supplier);
            let table = self
                .tables
                .entry(fold(name))
                .or_insert_with(|| LookupTable::with_origin(name.clone(), origin.clone()));
            for (alias, canonical) in aliases {
                table.insert_from(alias.clone(), canonical.clone(), origin.clone());
            }
        }

        self.prune();
        tracing::info!(supplier, tables = tables.len(), "merged supplier lookup tables");
    }

    /// Remove everything a supplier contributed.
    ///
    /// Overridden aliases get their previous value back. Tables created by
    /// suppliers are dropped once nothing contributes to them any more.
    pub fn remove_supplier(&mut self, supplier: &str) {
        for table in self.tables.values_mut() {
            table.revert(supplier);
        }
        self.prune();
        tracing::info!(supplier, "removed supplier lookup tables");
    }

    /// Drop supplier-created tables nobody contributes to any more.
    fn prune(&mut self) {
        self.tables
            .retain(|_, t| !(matches!(t.origin, Origin::Supplier(_)) && t.is_empty()));
    }
}

impl From<IndexMap<String, IndexMap<String, String>>> for LookupSet {
    fn from(map: IndexMap<String, IndexMap<String, String>>) -> Self {
        let mut set = LookupSet::new();
        for (name, aliases) in map {
            let table = set.table_mut(&name);
            for (alias, canonical) in aliases {
                table.insert(alias, canonical);
            }
        }
        set
    }
}

impl From<LookupSet> for IndexMap<String, IndexMap<String, String>> {
    fn from(set: LookupSet) -> Self {
        set.tables
            .into_values()
            .map(|t| {
                let aliases = t
                    .iter()
                    .map(|(a, c)| (a.to_string(), c.to_string()))
                    .collect();
                (t.name, aliases)
            })
            .collect()
    }
}
