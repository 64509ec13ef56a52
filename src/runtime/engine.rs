//! Parser engine: applies one rule chain per configured column to a row.
//!
//! The engine is compiled once from a [`ParserConfig`] and is read-only
//! afterwards, so one instance can serve many threads. Each row gets its own
//! property bag; the engine never holds row state.

use std::thread;

use serde::Serialize;

use crate::error::ConfigError;
use crate::runtime::actions::ActionsFactory;
use crate::runtime::bag::PropertyBag;
use crate::runtime::chain::CompiledRule;
use crate::runtime::config_loader::ParserConfig;
use crate::runtime::context::CellContext;
use crate::runtime::row::RowSource;

/// Output of parsing one row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowResult {
    /// Final property assignments, last write wins
    pub properties: PropertyBag,

    /// Diagnostic trace, one or more lines per column
    pub trace: Vec<String>,

    /// Working bag the actions wrote into
    #[serde(skip)]
    pub working: PropertyBag,
}

/// Compiled parser for one configuration snapshot.
///
/// # Example
/// ```
/// use cellrules::runtime::{ParserConfig, ParserEngine, Row};
///
/// let config = ParserConfig::from_yaml_str(r#"
/// columns:
///   A:
///     actions:
///       - op: split
///         output: Parts
///         delimiter: ":"
///       - op: assign
///         input: Parts[0]
///         output: Product.Brand
/// "#).unwrap();
///
/// let engine = ParserEngine::new(&config).unwrap();
/// let row: Row = ["CHANEL:MENS"].into_iter().collect();
/// let result = engine.parse_row(&row);
///
/// assert_eq!(result.properties.get("Product.Brand"), Some("CHANEL"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParserEngine {
    rules: Vec<(String, CompiledRule)>,
}

impl ParserEngine {
    /// Compile every column rule of a configuration.
    ///
    /// # Errors
    /// Rejects the whole configuration on the first invalid action.
    pub fn new(config: &ParserConfig) -> Result<Self, ConfigError> {
        let mut factory = ActionsFactory::new(&config.lookups);
        let rules = config
            .columns
            .iter()
            .map(|(column, rule)| {
                CompiledRule::build(column, rule, &mut factory).map(|c| (column.clone(), c))
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            columns = rules.len(),
            actions = rules.iter().map(|(_, r)| r.actions().len()).sum::<usize>(),
            "compiled parser engine"
        );

        Ok(Self { rules })
    }

    /// Column letters in configured order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(c, _)| c.as_str())
    }

    pub fn rule(&self, column: &str) -> Option<&CompiledRule> {
        self.rules
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(column))
            .map(|(_, r)| r)
    }

    /// Parse one row.
    ///
    /// Missing cells are treated as empty text. Never fails: the worst
    /// outcome is a row with no properties.
    pub fn parse_row<R: RowSource + ?Sized>(&self, row: &R) -> RowResult {
        let mut result = RowResult::default();

        for (column, rule) in &self.rules {
            let text = row.cell(column).unwrap_or_default();
            let chain = {
                let mut ctx = CellContext::new(column, text, &mut result.working);
                rule.execute(&mut ctx)
            };

            result.trace.push(format!(
                "{}: {} ({}/{} actions matched, {} assignments)",
                column,
                if chain.matched { "matched" } else { "unmatched" },
                chain.actions_matched,
                chain.actions_run,
                chain.assignments.len()
            ));
            result.trace.extend(chain.trace);

            for assignment in chain.assignments {
                result.properties.set(assignment.property, assignment.value);
            }
        }

        tracing::debug!(properties = result.properties.len(), "row parsed");
        result
    }

    /// Parse a batch of rows on up to `workers` threads.
    ///
    /// Results come back in input order. Every row still owns its own bag.
    pub fn parse_rows<R: RowSource + Sync>(&self, rows: &[R], workers: usize) -> Vec<RowResult> {
        let workers = workers.max(1);
        if workers == 1 || rows.len() < 2 {
            return rows.iter().map(|row| self.parse_row(row)).collect();
        }

        let chunk_size = rows.len().div_ceil(workers);
        thread::scope(|scope| {
            let handles: Vec<_> = rows
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|row| self.parse_row(row))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::row::Row;
    use std::collections::HashMap;

    const CONFIG: &str = r#"
lookups:
  Gender:
    MENS: Men
    WOMENS: Women
columns:
  A:
    actions:
      - op: split
        output: Parts
        delimiter: ":"
        expectedParts: 3
        strict: true
      - op: assign
        input: Parts[0]
        output: Product.Brand
      - op: map
        input: Parts[1]
        output: Product.Gender
        table: Gender
  B:
    actions:
      - op: find
        output: Price
        pattern: '\d+(?:\.\d+)?'
      - op: assign
        input: Price[0]
        output: Offer.Price
    assign:
      Offer.Currency: EUR
  C:
    actions:
      - op: assign
        output: Product.Brand
"#;

    fn engine() -> ParserEngine {
        ParserEngine::new(&ParserConfig::from_yaml_str(CONFIG).unwrap()).unwrap()
    }

    #[test]
    fn test_parse_row() {
        let row: Row = ["CHANEL:MENS:T123", "EUR 89.90"].into_iter().collect();
        let result = engine().parse_row(&row);

        assert_eq!(result.properties.get("Product.Brand"), Some("CHANEL"));
        assert_eq!(result.properties.get("Product.Gender"), Some("Men"));
        assert_eq!(result.properties.get("Offer.Price"), Some("89.90"));
        assert_eq!(result.properties.get("Offer.Currency"), Some("EUR"));
        assert_eq!(result.working.get("Parts[2]"), Some("T123"));
    }

    #[test]
    fn test_later_columns_overwrite_earlier() {
        let row: Row = ["CHANEL:MENS:T123", "", "Dior"].into_iter().collect();
        let result = engine().parse_row(&row);

        assert_eq!(result.properties.get("Product.Brand"), Some("Dior"));
    }

    #[test]
    fn test_missed_action_does_not_reemit_earlier_column() {
        let config = ParserConfig::from_yaml_str(
            r#"
lookups:
  Brands:
    chanel: Chanel
columns:
  A:
    actions:
      - op: assign
        output: Product.Brand
  B:
    assign:
      Product.Brand: FromB
  C:
    actions:
      - op: map
        input: Product.Brand[0]
        output: Product.Brand
        table: Brands
"#,
        )
        .unwrap();
        let engine = ParserEngine::new(&config).unwrap();

        let row: Row = ["X", "", ""].into_iter().collect();
        let result = engine.parse_row(&row);

        assert_eq!(result.properties.get("Product.Brand"), Some("FromB"));
        assert!(result
            .trace
            .iter()
            .any(|t| t == "C: unmatched (0/1 actions matched, 0 assignments)"));
    }

    #[test]
    fn test_unknown_op_does_not_reemit_earlier_column() {
        let config = ParserConfig::from_yaml_str(
            r#"
columns:
  A:
    actions:
      - op: assign
        output: Product.Name
  B:
    actions:
      - op: translate
        output: Product.Name
"#,
        )
        .unwrap();
        let engine = ParserEngine::new(&config).unwrap();

        let row: Row = ["Bleu", "Blue"].into_iter().collect();
        let result = engine.parse_row(&row);

        assert_eq!(result.properties.get("Product.Name"), Some("Bleu"));
        assert_eq!(result.trace[0], "A: matched (1/1 actions matched, 1 assignments)");
        assert!(result
            .trace
            .iter()
            .any(|t| t == "B: unmatched (0/1 actions matched, 0 assignments)"));
    }

    #[test]
    fn test_find_miss_does_not_leak_groups_across_columns() {
        let config = ParserConfig::from_yaml_str(
            r#"
columns:
  A:
    actions:
      - op: find
        output: Size
        pattern: '(?P<amount>\d+)ml'
  B:
    actions:
      - op: find
        output: Size
        pattern: '(?P<amount>\d+)ml'
      - op: assign
        input: Size.3.amount
        output: Offer.Volume
"#,
        )
        .unwrap();
        let engine = ParserEngine::new(&config).unwrap();

        let row: Row = ["50ml", "no size here"].into_iter().collect();
        let result = engine.parse_row(&row);

        assert_eq!(result.working.get("Size.Length"), Some("0"));
        assert_eq!(result.properties.get("Offer.Volume"), None);
    }

    #[test]
    fn test_blank_and_missing_cells() {
        let result = engine().parse_row(&Row::default());

        assert_eq!(result.properties.len(), 1);
        assert_eq!(result.properties.get("Offer.Currency"), Some("EUR"));
        assert!(result.trace.iter().any(|t| t.starts_with("A: unmatched")));
    }

    #[test]
    fn test_trace_lists_every_column() {
        let mut row = HashMap::new();
        row.insert("A".to_string(), "CHANEL:MENS".to_string());
        let result = engine().parse_row(&row);

        assert_eq!(result.trace[0], "A: unmatched (0/3 actions matched, 0 assignments)");
        assert!(result.trace.iter().any(|t| t.contains("expected 3 parts, found 2")));
        assert!(result.trace.iter().any(|t| t.starts_with("B: matched")));
        assert!(result.trace.iter().any(|t| t.starts_with("C: unmatched")));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ParserConfig::from_yaml_str(
            r#"
columns:
  A:
    actions:
      - op: map
        output: Product.Brand
        table: Brands
"#,
        )
        .unwrap();

        let err = ParserEngine::new(&config).unwrap_err();
        assert!(err.to_string().contains("unknown lookup table 'Brands'"));
    }

    #[test]
    fn test_parse_rows_keeps_order() {
        let engine = engine();
        let rows: Vec<Row> = (0..25)
            .map(|i| [format!("BRAND{}:MENS:R{}", i, i)].into_iter().collect())
            .collect();

        let results = engine.parse_rows(&rows, 4);

        assert_eq!(results.len(), 25);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(
                result.properties.get("Product.Brand"),
                Some(format!("BRAND{}", i).as_str())
            );
        }
        assert_eq!(results, engine.parse_rows(&rows, 1));
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ParserEngine>();
    }
}
