//! Chain executor: runs one column's actions and resolves its assignments.
//!
//! Execution has two phases. First the actions run in configured order
//! against one cell context, each free to read what earlier ones wrote.
//! Then the assignments are resolved, in this order:
//!
//! 1. the rule's static `assign` map,
//! 2. every deferred `assign:Key` entry left in the bag (drained),
//! 3. every output shaped like a property path (`Product.Name`) of an
//!    action that matched during this run, taking the scalar value or else
//!    element `[0]`.
//!
//! Values this chain did not write are missing from the result, even when
//! an earlier column left them in the row's bag.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::ConfigError;
use crate::runtime::actions::{Action, ActionsFactory, Outcome};
use crate::runtime::config_loader::RuleConfig;
use crate::runtime::context::CellContext;
use crate::runtime::keys;

/// A resolved `(property, value)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub property: String,
    pub value: String,
}

impl Assignment {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

/// Result of running a chain over one cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainResult {
    /// True iff at least one assignment was produced
    pub matched: bool,
    pub assignments: Vec<Assignment>,
    pub actions_run: usize,
    pub actions_matched: usize,
    /// Reasons for actions that did not match
    pub trace: Vec<String>,
}

/// A rule with its actions built and validated.
#[derive(Debug, Clone, Default)]
pub struct CompiledRule {
    actions: Vec<Action>,
    assign: IndexMap<String, String>,
}

impl CompiledRule {
    /// Build every action of a rule.
    ///
    /// # Errors
    /// The first action that fails to build, tagged with its column and
    /// position.
    pub fn build(
        column: &str,
        rule: &RuleConfig,
        factory: &mut ActionsFactory<'_>,
    ) -> Result<Self, ConfigError> {
        let actions = rule
            .actions
            .iter()
            .enumerate()
            .map(|(index, config)| {
                factory
                    .build(config)
                    .map_err(|err| err.in_column(column, index))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            actions,
            assign: rule.assign.clone(),
        })
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn static_assignments(&self) -> &IndexMap<String, String> {
        &self.assign
    }

    /// Run the chain against one cell.
    pub fn execute(&self, ctx: &mut CellContext<'_>) -> ChainResult {
        let mut result = ChainResult::default();
        let mut written: Vec<&str> = Vec::new();

        for action in &self.actions {
            let outcome = action.execute(ctx);
            result.actions_run += 1;

            tracing::debug!(
                column = ctx.column(),
                op = action.op(),
                input = action.input(),
                output = action.output(),
                matched = outcome.is_match(),
                "action executed"
            );

            match outcome {
                Outcome::Matched => {
                    result.actions_matched += 1;
                    written.push(action.output());
                }
                Outcome::Unmatched(miss) => result.trace.push(format!(
                    "{}: {} {} -> {}: {}",
                    ctx.column(),
                    action.op(),
                    action.input(),
                    action.output(),
                    miss
                )),
            }
        }

        for (property, value) in &self.assign {
            result.assignments.push(Assignment::new(property, value));
        }

        for (property, value) in ctx.bag_mut().drain_deferred() {
            result.assignments.push(Assignment::new(property, value));
        }

        let mut seen: Vec<String> = Vec::new();
        for output in written {
            if !keys::is_property_path(output) {
                continue;
            }
            let folded = output.to_lowercase();
            if seen.contains(&folded) {
                continue;
            }
            seen.push(folded);

            if let Some(value) = resolve_output(ctx, output) {
                result.assignments.push(Assignment::new(output, value));
            }
        }

        result.matched = !result.assignments.is_empty();
        result
    }
}

/// Value written under an output key: the scalar if present, else `[0]`.
fn resolve_output(ctx: &CellContext<'_>, output: &str) -> Option<String> {
    let bag = ctx.bag();
    if let Some(value) = bag.get_non_empty(output) {
        return Some(value.to_string());
    }
    if bag.list_len(output) == 0 {
        return None;
    }
    bag.get_non_empty(&keys::indexed(output, 0))
        .map(str::to_string)
}
