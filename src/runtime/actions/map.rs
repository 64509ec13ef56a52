//! Map: translate an input through a lookup table.

use std::sync::Arc;

use crate::runtime::actions::{Miss, Outcome};
use crate::runtime::context::CellContext;
use crate::runtime::keys;
use crate::runtime::lookup::LookupTable;

#[derive(Debug, Clone)]
pub struct MapAction {
    pub input: String,
    pub output: String,
    pub table: Arc<LookupTable>,
    /// Write `assign:Output` for the chain executor instead of `Output`.
    pub assign: bool,
}

impl MapAction {
    /// Look the trimmed input up in the table.
    ///
    /// A hit writes the canonical value as a scalar; misses write nothing.
    pub fn execute(&self, ctx: &mut CellContext<'_>) -> Outcome {
        if self.table.is_empty() {
            return Outcome::Unmatched(Miss::EmptyTable);
        }

        let Some(input) = ctx.input(&self.input).map(str::trim).filter(|v| !v.is_empty()) else {
            return Outcome::Unmatched(Miss::EmptyInput);
        };

        let Some(canonical) = self.table.get(input) else {
            return Outcome::Unmatched(Miss::NotInTable);
        };

        let key = if self.assign {
            keys::deferred(&self.output)
        } else {
            self.output.clone()
        };
        ctx.bag_mut().set(key, canonical);
        Outcome::Matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::bag::PropertyBag;

    fn brands() -> Arc<LookupTable> {
        let mut table = LookupTable::new("Brands");
        table.insert("chanel", "Chanel");
        table.insert("YSL", "Yves Saint Laurent");
        Arc::new(table)
    }

    fn map(assign: bool) -> MapAction {
        MapAction {
            input: "Text".to_string(),
            output: "Product.Brand".to_string(),
            table: brands(),
            assign,
        }
    }

    #[test]
    fn test_map_hit_writes_scalar() {
        let mut bag = PropertyBag::new();
        let mut ctx = CellContext::new("A", "CHANEL", &mut bag);

        assert!(map(false).execute(&mut ctx).is_match());
        assert_eq!(bag.get("Product.Brand"), Some("Chanel"));
        assert!(!bag.contains("Product.Brand[0]"));
        assert!(!bag.contains("Product.Brand.Length"));
    }

    #[test]
    fn test_map_assign_writes_deferred_key() {
        let mut bag = PropertyBag::new();
        let mut ctx = CellContext::new("A", " ysl ", &mut bag);

        assert!(map(true).execute(&mut ctx).is_match());
        assert_eq!(bag.get("assign:Product.Brand"), Some("Yves Saint Laurent"));
        assert!(!bag.contains("Product.Brand"));
    }

    #[test]
    fn test_map_is_repeatable() {
        let action = map(false);
        for _ in 0..3 {
            let mut bag = PropertyBag::new();
            let mut ctx = CellContext::new("A", "Chanel", &mut bag);
            assert!(action.execute(&mut ctx).is_match());
            assert_eq!(bag.get("Product.Brand"), Some("Chanel"));
        }
    }

    #[test]
    fn test_map_miss_writes_nothing() {
        let mut bag = PropertyBag::new();
        let mut ctx = CellContext::new("A", "Dior", &mut bag);

        assert_eq!(map(false).execute(&mut ctx), Outcome::Unmatched(Miss::NotInTable));
        assert!(bag.is_empty());
    }

    #[test]
    fn test_map_empty_input_and_empty_table() {
        let mut bag = PropertyBag::new();
        let mut ctx = CellContext::new("A", "", &mut bag);
        assert_eq!(map(false).execute(&mut ctx), Outcome::Unmatched(Miss::EmptyInput));

        let mut ctx = CellContext::new("A", "chanel", &mut bag);
        let action = MapAction {
            table: Arc::new(LookupTable::new("Empty")),
            ..map(false)
        };
        assert_eq!(action.execute(&mut ctx), Outcome::Unmatched(Miss::EmptyTable));
        assert!(bag.is_empty());
    }
}
