//! Configuration errors.
//!
//! Only structurally invalid configuration is an error. Data that does not
//! fit a rule (no regex match, wrong part count, empty cell) is reported as
//! [`Outcome::Unmatched`](crate::runtime::Outcome) instead and never
//! surfaces here.

use std::path::PathBuf;
use thiserror::Error;

/// Error raised while loading configuration or building actions from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("action '{op}' is missing required parameter '{param}'")]
    MissingParameter { op: String, param: String },

    #[error("action '{op}' has an invalid value for '{param}': {reason}")]
    InvalidParameter {
        op: String,
        param: String,
        reason: String,
    },

    #[error("action '{op}' references unknown lookup table '{table}'")]
    UnknownLookupTable { op: String, table: String },

    #[error("invalid regular expression '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("column '{column}', action {index}: {source}")]
    InColumn {
        column: String,
        index: usize,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    /// Attach the column and action position to a build error.
    pub fn in_column(self, column: &str, index: usize) -> Self {
        ConfigError::InColumn {
            column: column.to_string(),
            index,
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ConfigError::MissingParameter {
            op: "find".to_string(),
            param: "Pattern".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "action 'find' is missing required parameter 'Pattern'"
        );

        let err = ConfigError::UnknownLookupTable {
            op: "map".to_string(),
            table: "Brands".to_string(),
        }
        .in_column("C", 2);
        assert_eq!(
            err.to_string(),
            "column 'C', action 2: action 'map' references unknown lookup table 'Brands'"
        );
    }
}
