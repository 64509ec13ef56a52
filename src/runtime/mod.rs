//! Rule interpreter runtime.
//!
//! This module turns per-column cell text into named property assignments
//! using a declarative chain of actions per column.

pub mod actions;
pub mod bag;
pub mod chain;
pub mod config_loader;
pub mod context;
pub mod engine;
pub mod keys;
pub mod lookup;
pub mod row;

// Re-export key types
pub use actions::{Action, ActionsFactory, Miss, Outcome};
pub use bag::PropertyBag;
pub use chain::{Assignment, ChainResult, CompiledRule};
pub use config_loader::{ActionConfig, ParserConfig, RuleConfig, SupplierConfig};
pub use context::{CellContext, NumberFormat};
pub use engine::{ParserEngine, RowResult};
pub use lookup::{LookupSet, LookupTable, Origin};
pub use row::{Row, RowSource};
