//! # Cellrules: Declarative Rule Interpreter for Supplier Spreadsheets
//!
//! Cellrules turns arbitrary per-column spreadsheet text into normalized
//! product and offer properties (`Product.Brand`, `Offer.Price`, ...) without
//! writing code per supplier.
//!
//! ## Features
//!
//! - **Rule chains**: an ordered list of actions per column (`assign`, `split`,
//!   `find`, `map`) sharing one property bag
//! - **Lookup tables**: case-insensitive alias -> canonical mappings, with
//!   in-place, revertible supplier merges
//! - **Eager validation**: invalid configuration is rejected when the engine is
//!   built, never while parsing a row
//! - **Degrade, don't fail**: data that does not fit a rule yields fewer
//!   properties and a trace line, never an error
//!
//! ## Example: Split and Assign
//!
//! ```yaml
//! lookups:
//!   Gender:
//!     MENS: Men
//! columns:
//!   A:
//!     actions:
//!       - op: split
//!         input: Text
//!         output: Parts
//!         delimiter: ":"
//!         expectedParts: 3
//!         strict: true
//!       - op: assign
//!         input: Parts[0]
//!         output: Product.Brand
//!       - op: map
//!         input: Parts[1]
//!         output: Product.Gender
//!         table: Gender
//!         assign: true
//! ```
//!
//! ## Example: Find with Remove
//!
//! ```yaml
//! columns:
//!   B:
//!     actions:
//!       - op: find
//!         output: Size
//!         pattern: '(?P<amount>\d+)\s*ml'
//!         options: all remove ignorecase
//!       - op: assign
//!         input: Size.Clean
//!         output: Product.Name
//!     assign:
//!       Offer.Currency: EUR
//! ```

pub mod error;

// Interpreter runtime: bag, actions, chains and engine
pub mod runtime;

// Re-export key types
pub use error::ConfigError;
pub use runtime::{
    Action, ActionConfig, ActionsFactory, Assignment, CellContext, ChainResult, CompiledRule,
    LookupSet, LookupTable, Miss, Outcome, ParserConfig, ParserEngine, PropertyBag, Row,
    RowResult, RowSource, RuleConfig, SupplierConfig,
};
