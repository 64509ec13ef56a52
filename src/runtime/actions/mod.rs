//! Actions: the text transformations a rule chain is built from.
//!
//! Actions form a closed set built once by the [`ActionsFactory`]. Running
//! one never fails; data that does not fit produces
//! [`Outcome::Unmatched`] with the reason, and the bag writes described on
//! each variant.

use std::fmt;

use crate::runtime::context::CellContext;

pub mod assign;
pub mod factory;
pub mod find;
pub mod map;
pub mod split;

pub use assign::AssignAction;
pub use factory::ActionsFactory;
pub use find::{FindAction, Selection};
pub use map::MapAction;
pub use split::SplitAction;

/// Why an action produced no result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Miss {
    /// Input key missing or empty
    EmptyInput,
    /// Pattern did not match
    NoMatch,
    /// Strict split saw a different number of parts
    PartCountMismatch { expected: usize, actual: usize },
    /// Input is not an alias of the lookup table
    NotInTable,
    /// Lookup table has no entries
    EmptyTable,
    /// Operation not understood by this interpreter
    Unsupported,
}

impl fmt::Display for Miss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Miss::EmptyInput => write!(f, "empty input"),
            Miss::NoMatch => write!(f, "no match"),
            Miss::PartCountMismatch { expected, actual } => {
                write!(f, "expected {} parts, found {}", expected, actual)
            }
            Miss::NotInTable => write!(f, "not in lookup table"),
            Miss::EmptyTable => write!(f, "lookup table is empty"),
            Miss::Unsupported => write!(f, "unsupported operation"),
        }
    }
}

/// Result of running one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Matched,
    Unmatched(Miss),
}

impl Outcome {
    pub fn is_match(&self) -> bool {
        matches!(self, Outcome::Matched)
    }
}

/// Action that records its operation name and does nothing else.
///
/// Unknown operations resolve to this so that newer configuration files
/// still load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoopAction {
    pub op: String,
    pub input: String,
    pub output: String,
}

/// One configured action.
#[derive(Debug, Clone)]
pub enum Action {
    Assign(AssignAction),
    Split(SplitAction),
    Find(FindAction),
    Map(MapAction),
    Noop(NoopAction),
}

impl Action {
    /// Run the action against a cell, writing results into its bag.
    pub fn execute(&self, ctx: &mut CellContext<'_>) -> Outcome {
        match self {
            Action::Assign(a) => a.execute(ctx),
            Action::Split(a) => a.execute(ctx),
            Action::Find(a) => a.execute(ctx),
            Action::Map(a) => a.execute(ctx),
            Action::Noop(_) => Outcome::Unmatched(Miss::Unsupported),
        }
    }

    /// Operation name, as configured for Noop.
    pub fn op(&self) -> &str {
        match self {
            Action::Assign(_) => "assign",
            Action::Split(_) => "split",
            Action::Find(_) => "find",
            Action::Map(_) => "map",
            Action::Noop(a) => &a.op,
        }
    }

    pub fn input(&self) -> &str {
        match self {
            Action::Assign(a) => &a.input,
            Action::Split(a) => &a.input,
            Action::Find(a) => &a.input,
            Action::Map(a) => &a.input,
            Action::Noop(a) => &a.input,
        }
    }

    pub fn output(&self) -> &str {
        match self {
            Action::Assign(a) => &a.output,
            Action::Split(a) => &a.output,
            Action::Find(a) => &a.output,
            Action::Map(a) => &a.output,
            Action::Noop(a) => &a.output,
        }
    }
}
