//! Builds actions from their declarative descriptors.
//!
//! Every check that can fail happens here, before a single row is parsed:
//! missing or malformed parameters, unknown lookup tables, invalid regular
//! expressions. Unknown operations are not an error; they become
//! [`Action::Noop`].

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use regex::RegexBuilder;
use serde_json::Value as JsonValue;

use crate::error::ConfigError;
use crate::runtime::actions::split::DEFAULT_DELIMITER;
use crate::runtime::actions::{
    Action, AssignAction, FindAction, MapAction, NoopAction, Selection, SplitAction,
};
use crate::runtime::config_loader::ActionConfig;
use crate::runtime::lookup::{LookupSet, LookupTable};

const LOOKUP_PREFIX: &str = "lookup:";

/// Factory over a resolved set of lookup tables.
///
/// Tables referenced by several actions are shared through one `Arc`, so a
/// compiled engine holds a read-only snapshot of every table it uses.
pub struct ActionsFactory<'a> {
    lookups: &'a LookupSet,
    shared: HashMap<String, Arc<LookupTable>>,
}

impl<'a> ActionsFactory<'a> {
    pub fn new(lookups: &'a LookupSet) -> Self {
        Self {
            lookups,
            shared: HashMap::new(),
        }
    }

    /// Build one action.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if a required parameter is missing or
    /// malformed, a lookup table does not exist, or a pattern does not compile.
    pub fn build(&mut self, config: &ActionConfig) -> Result<Action, ConfigError> {
        let params = Params {
            op: &config.op,
            values: &config.parameters,
        };
        let input = config.input.clone();
        let output = config.output.clone();

        let action = match config.op.to_ascii_lowercase().as_str() {
            "assign" => Action::Assign(AssignAction { input, output }),
            "split" => {
                let delimiter = params
                    .string("delimiter")
                    .unwrap_or_else(|| DEFAULT_DELIMITER.to_string());
                if delimiter.is_empty() {
                    return Err(params.invalid("delimiter", "must not be empty"));
                }
                let expected_parts = params.usize("expectedParts")?;
                let strict = params.bool("strict")?.unwrap_or(false);
                if strict && expected_parts.is_none() {
                    return Err(params.missing("expectedParts"));
                }
                Action::Split(SplitAction {
                    input,
                    output,
                    delimiter,
                    expected_parts,
                    strict,
                })
            }
            "find" => self.build_find(&params, input, output)?,
            "map" => {
                let name = params
                    .string("table")
                    .or_else(|| params.string("lookup"))
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| params.missing("table"))?;
                let table = self.table(&config.op, &name)?;
                let assign = params.bool("assign")?.unwrap_or(false);
                Action::Map(MapAction {
                    input,
                    output,
                    table,
                    assign,
                })
            }
            _ => {
                tracing::warn!(op = %config.op, "unknown action operation, using noop");
                Action::Noop(NoopAction {
                    op: config.op.clone(),
                    input,
                    output,
                })
            }
        };

        Ok(action)
    }

    fn build_find(
        &mut self,
        params: &Params<'_>,
        input: String,
        output: String,
    ) -> Result<Action, ConfigError> {
        let pattern = params
            .string("pattern")
            .filter(|p| !p.is_empty())
            .ok_or_else(|| params.missing("pattern"))?;

        let mut selection = Selection::default();
        let mut remove = false;
        let mut ignore_case = false;
        for option in params.list("options")? {
            match option.to_ascii_lowercase().as_str() {
                "first" => selection = Selection::First,
                "all" => selection = Selection::All,
                "remove" => remove = true,
                "ignorecase" => ignore_case = true,
                other => {
                    return Err(params.invalid("options", &format!("unknown option '{}'", other)))
                }
            }
        }

        let pattern = match strip_lookup_prefix(&pattern) {
            Some(name) => {
                let table = self.table(params.op, name)?;
                table.alias_pattern().ok_or_else(|| {
                    params.invalid("pattern", &format!("lookup table '{}' is empty", name))
                })?
            }
            None => pattern,
        };

        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;

        Ok(Action::Find(FindAction {
            input,
            output,
            regex,
            selection,
            remove,
        }))
    }

    /// Resolve a table by name, sharing one snapshot per table.
    fn table(&mut self, op: &str, name: &str) -> Result<Arc<LookupTable>, ConfigError> {
        let key = name.to_lowercase();
        if let Some(table) = self.shared.get(&key) {
            return Ok(Arc::clone(table));
        }

        let table = self
            .lookups
            .get(name)
            .ok_or_else(|| ConfigError::UnknownLookupTable {
                op: op.to_string(),
                table: name.to_string(),
            })?;
        let table = Arc::new(table.clone());
        self.shared.insert(key, Arc::clone(&table));
        Ok(table)
    }
}

fn strip_lookup_prefix(pattern: &str) -> Option<&str> {
    let prefix = pattern.get(..LOOKUP_PREFIX.len())?;
    prefix
        .eq_ignore_ascii_case(LOOKUP_PREFIX)
        .then(|| pattern[LOOKUP_PREFIX.len()..].trim())
}

/// Case-insensitive view over an action's parameters.
struct Params<'a> {
    op: &'a str,
    values: &'a IndexMap<String, JsonValue>,
}

impl Params<'_> {
    fn get(&self, name: &str) -> Option<&JsonValue> {
        self.values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
            .filter(|v| !v.is_null())
    }

    fn string(&self, name: &str) -> Option<String> {
        self.get(name).map(|v| match v {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    fn bool(&self, name: &str) -> Result<Option<bool>, ConfigError> {
        let Some(value) = self.get(name) else {
            return Ok(None);
        };
        match value {
            JsonValue::Bool(b) => Ok(Some(*b)),
            JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Some(true)),
                "false" | "no" | "0" | "" => Ok(Some(false)),
                _ => Err(self.invalid(name, "expected a boolean")),
            },
            _ => Err(self.invalid(name, "expected a boolean")),
        }
    }

    fn usize(&self, name: &str) -> Result<Option<usize>, ConfigError> {
        let Some(value) = self.get(name) else {
            return Ok(None);
        };
        let parsed = match value {
            JsonValue::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
            JsonValue::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed
            .filter(|n| *n > 0)
            .map(Some)
            .ok_or_else(|| self.invalid(name, "expected a positive integer"))
    }

    /// A list given either as an array or as one string separated by
    /// commas, semicolons, pipes or whitespace.
    fn list(&self, name: &str) -> Result<Vec<String>, ConfigError> {
        let Some(value) = self.get(name) else {
            return Ok(Vec::new());
        };
        match value {
            JsonValue::String(s) => Ok(s
                .split(|c: char| c == ',' || c == ';' || c == '|' || c.is_whitespace())
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()),
            JsonValue::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| self.invalid(name, "expected a list of strings"))
                })
                .collect(),
            _ => Err(self.invalid(name, "expected a list of strings")),
        }
    }

    fn missing(&self, name: &str) -> ConfigError {
        ConfigError::MissingParameter {
            op: self.op.to_string(),
            param: name.to_string(),
        }
    }

    fn invalid(&self, name: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidParameter {
            op: self.op.to_string(),
            param: name.to_string(),
            reason: reason.to_string(),
        }
    }
}
