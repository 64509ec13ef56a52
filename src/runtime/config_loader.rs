//! Parser and supplier configuration, loaded from JSON or YAML.
//!
//! The configuration is purely declarative: per spreadsheet column an ordered
//! list of actions plus static assignments, and the lookup tables those
//! actions refer to. Nothing here is validated beyond what serde enforces;
//! the [`ParserEngine`](crate::runtime::ParserEngine) rejects invalid rules
//! when it is built.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::ConfigError;
use crate::runtime::keys;
use crate::runtime::lookup::LookupSet;

/// Declarative description of one action.
///
/// Keys other than `op`, `input` and `output` are collected into
/// `parameters` and interpreted by the actions factory.
///
/// ```yaml
/// op: split
/// input: Text
/// output: Parts
/// delimiter: ":"
/// expectedParts: 3
/// strict: true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Operation name (`assign`, `split`, `find`, `map`)
    #[serde(alias = "Op", alias = "operation", alias = "Operation")]
    pub op: String,

    /// Input key, `Text` for the raw cell
    #[serde(default = "default_input", alias = "Input")]
    pub input: String,

    /// Output key
    #[serde(default, alias = "Output")]
    pub output: String,

    /// Operation-specific parameters
    #[serde(flatten)]
    pub parameters: IndexMap<String, JsonValue>,
}

fn default_input() -> String {
    keys::TEXT.to_string()
}

impl ActionConfig {
    /// Create an action descriptor with no parameters.
    pub fn new(op: impl Into<String>, input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            input: input.into(),
            output: output.into(),
            parameters: IndexMap::new(),
        }
    }

    /// Builder-style parameter setter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

/// Rule for one column: ordered actions plus static assignments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default, alias = "Actions")]
    pub actions: Vec<ActionConfig>,

    /// Property -> literal value, applied unconditionally
    #[serde(default, alias = "Assign")]
    pub assign: IndexMap<String, String>,
}

/// Parser configuration: lookup tables and one rule per column letter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default, alias = "Lookups")]
    pub lookups: LookupSet,

    #[serde(default, alias = "Columns")]
    pub columns: IndexMap<String, RuleConfig>,
}

impl ParserConfig {
    /// Load parser configuration from a JSON or YAML file.
    ///
    /// Files ending in `.json` are read as JSON, anything else as YAML.
    ///
    /// # Example
    /// ```ignore
    /// use cellrules::runtime::ParserConfig;
    ///
    /// let config = ParserConfig::load_from_file("config/parser.yaml")?;
    /// println!("{} columns", config.columns.len());
    /// ```
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = load_document(path.as_ref())?;
        tracing::info!(
            path = %path.as_ref().display(),
            columns = config.columns.len(),
            lookups = config.lookups.len(),
            "loaded parser configuration"
        );
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Get the rule configured for a column letter (case-insensitive).
    pub fn rule(&self, column: &str) -> Option<&RuleConfig> {
        self.columns
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(column))
            .map(|(_, rule)| rule)
    }

    /// Merge a supplier's lookup tables into this configuration in place.
    pub fn merge_supplier(&mut self, supplier: &SupplierConfig) {
        self.lookups.merge_supplier(&supplier.id, &supplier.lookups);
    }

    /// Revert everything a supplier contributed to the lookup tables.
    pub fn remove_supplier(&mut self, supplier_id: &str) {
        self.lookups.remove_supplier(supplier_id);
    }
}

/// Supplier-level configuration: extra lookup aliases for one supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierConfig {
    #[serde(alias = "Id")]
    pub id: String,

    /// Table name -> (alias -> canonical)
    #[serde(default, alias = "Lookups")]
    pub lookups: IndexMap<String, IndexMap<String, String>>,
}

impl SupplierConfig {
    /// Load a supplier configuration from a JSON or YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        load_document(path.as_ref())
    }
}

fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        Ok(serde_json::from_str(&contents)?)
    } else {
        Ok(serde_yaml::from_str(&contents)?)
    }
}
