//! Assign: copy an input verbatim into a one-element list.

use crate::runtime::actions::{Miss, Outcome};
use crate::runtime::context::CellContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignAction {
    pub input: String,
    pub output: String,
}

impl AssignAction {
    /// Write `Output[0]` with `Length = 1`, or an empty list when the input is
    /// missing or empty.
    pub fn execute(&self, ctx: &mut CellContext<'_>) -> Outcome {
        let value = ctx
            .input(&self.input)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        match value {
            Some(value) => {
                ctx.write_list(&self.output, [value]);
                Outcome::Matched
            }
            None => {
                ctx.write_empty_list(&self.output);
                Outcome::Unmatched(Miss::EmptyInput)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::bag::PropertyBag;

    fn assign(input: &str, output: &str) -> AssignAction {
        AssignAction {
            input: input.to_string(),
            output: output.to_string(),
        }
    }

    #[test]
    fn test_assign_raw_text() {
        let mut bag = PropertyBag::new();
        let mut ctx = CellContext::new("A", "Coco Mademoiselle", &mut bag);

        assert!(assign("Text", "Name").execute(&mut ctx).is_match());
        assert_eq!(bag.get("Name[0]"), Some("Coco Mademoiselle"));
        assert_eq!(bag.get("Name.Length"), Some("1"));
        assert_eq!(bag.get("Name.Valid"), Some("true"));
    }

    #[test]
    fn test_assign_from_bag_key() {
        let mut bag = PropertyBag::new();
        bag.set("Parts[1]", "MENS");
        let mut ctx = CellContext::new("A", "ignored", &mut bag);

        assert!(assign("Parts[1]", "Gender").execute(&mut ctx).is_match());
        assert_eq!(bag.read_list("Gender"), vec!["MENS"]);
    }

    #[test]
    fn test_assign_missing_input_writes_empty_list() {
        let mut bag = PropertyBag::new();
        let mut ctx = CellContext::new("A", "text", &mut bag);

        let outcome = assign("Parts[0]", "Brand").execute(&mut ctx);

        assert_eq!(outcome, Outcome::Unmatched(Miss::EmptyInput));
        assert_eq!(bag.get("Brand.Length"), Some("0"));
        assert_eq!(bag.get("Brand.Valid"), Some("false"));
        assert!(!bag.contains("Brand[0]"));
    }

    #[test]
    fn test_assign_empty_text() {
        let mut bag = PropertyBag::new();
        let mut ctx = CellContext::new("A", "", &mut bag);

        assert!(!assign("Text", "Name").execute(&mut ctx).is_match());
        assert_eq!(bag.get("Name.Length"), Some("0"));
    }
}
