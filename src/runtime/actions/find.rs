//! Find: regular expression search over an input.
//!
//! The default mode records matches positionally under `Output[i]`.
//! In remove mode every recorded match is also cut out of the input and the
//! residue is stored under `Output.Clean`. In both modes the named groups of
//! the last recorded match are written under `Output.3.<group>`. Group and
//! `Clean` keys left by an earlier write under the same output are cleared.

use regex::{Captures, Regex};

use crate::runtime::actions::{Miss, Outcome};
use crate::runtime::context::CellContext;
use crate::runtime::keys;

/// Which matches a Find records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    First,
    All,
}

#[derive(Debug, Clone)]
pub struct FindAction {
    pub input: String,
    pub output: String,
    pub regex: Regex,
    pub selection: Selection,
    pub remove: bool,
}

impl FindAction {
    pub fn execute(&self, ctx: &mut CellContext<'_>) -> Outcome {
        let text = ctx.input(&self.input).unwrap_or_default().to_string();

        // Zero-length matches carry no value and are skipped.
        let found = self
            .regex
            .captures_iter(&text)
            .filter(|caps| caps.get(0).is_some_and(|m| !m.is_empty()));
        let found: Vec<Captures<'_>> = match self.selection {
            Selection::First => found.take(1).collect(),
            Selection::All => found.collect(),
        };

        let matches: Vec<&str> = found
            .iter()
            .filter_map(|caps| caps.get(0))
            .map(|m| m.as_str())
            .collect();

        // Derived keys describe this match set only.
        for name in self.regex.capture_names().flatten() {
            ctx.bag_mut().remove(&keys::group(&self.output, name));
        }
        if self.remove {
            let clean = remove_spans(&text, &found);
            ctx.bag_mut().set(keys::clean(&self.output), clean);
        } else {
            ctx.bag_mut().remove(&keys::clean(&self.output));
        }

        ctx.write_list(&self.output, matches.iter().copied());

        if let Some(last) = found.last() {
            for name in self.regex.capture_names().flatten() {
                if let Some(m) = last.name(name) {
                    ctx.bag_mut().set(keys::group(&self.output, name), m.as_str());
                }
            }
        }

        tracing::trace!(
            column = ctx.column(),
            output = %self.output,
            matches = matches.len(),
            "find"
        );

        if matches.is_empty() {
            Outcome::Unmatched(Miss::NoMatch)
        } else {
            Outcome::Matched
        }
    }
}

/// Concatenate the parts of `text` not covered by any match.
fn remove_spans(text: &str, found: &[Captures<'_>]) -> String {
    let mut clean = String::with_capacity(text.len());
    let mut last = 0;
    for m in found.iter().filter_map(|caps| caps.get(0)) {
        clean.push_str(&text[last..m.start()]);
        last = m.end();
    }
    clean.push_str(&text[last..]);
    clean
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::bag::PropertyBag;

    fn find(pattern: &str, selection: Selection, remove: bool) -> FindAction {
        FindAction {
            input: "Text".to_string(),
            output: "Size".to_string(),
            regex: Regex::new(pattern).unwrap(),
            selection,
            remove,
        }
    }

    #[test]
    fn test_find_first() {
        let mut bag = PropertyBag::new();
        let mut ctx = CellContext::new("A", "EDP 50ml and 100ml", &mut bag);

        assert!(find(r"\d+ml", Selection::First, false).execute(&mut ctx).is_match());
        assert_eq!(bag.read_list("Size"), vec!["50ml"]);
        assert_eq!(bag.get("Size.Valid"), Some("true"));
        assert!(!bag.contains("Size.Clean"));
    }

    #[test]
    fn test_find_all() {
        let mut bag = PropertyBag::new();
        let mut ctx = CellContext::new("A", "EDP 50ml and 100ml", &mut bag);

        assert!(find(r"\d+ml", Selection::All, false).execute(&mut ctx).is_match());
        assert_eq!(bag.read_list("Size"), vec!["50ml", "100ml"]);
        assert_eq!(bag.get("Size.Length"), Some("2"));
    }

    #[test]
    fn test_find_all_remove() {
        let mut bag = PropertyBag::new();
        let mut ctx = CellContext::new("A", "abc123def45", &mut bag);

        assert!(find(r"\d+", Selection::All, true).execute(&mut ctx).is_match());
        assert_eq!(bag.get("Size.Clean"), Some("abcdef"));
        assert_eq!(bag.read_list("Size"), vec!["123", "45"]);
        assert_eq!(bag.get("Size.Length"), Some("2"));
    }

    #[test]
    fn test_find_first_remove_only_cuts_first() {
        let mut bag = PropertyBag::new();
        let mut ctx = CellContext::new("A", "abc123def45", &mut bag);

        assert!(find(r"\d+", Selection::First, true).execute(&mut ctx).is_match());
        assert_eq!(bag.get("Size.Clean"), Some("abcdef45"));
        assert_eq!(bag.read_list("Size"), vec!["123"]);
    }

    #[test]
    fn test_remove_reassembles_input() {
        let input = "12 Rose 7 Oud 300";
        let mut bag = PropertyBag::new();
        let mut ctx = CellContext::new("A", input, &mut bag);
        let action = find(r"\d+", Selection::All, true);
        action.execute(&mut ctx);

        // Put every removed match back at its original position.
        let removed = bag.read_list("Size");
        let mut rebuilt = bag.get("Size.Clean").unwrap().to_string();
        let positions: Vec<usize> = action.regex.find_iter(input).map(|m| m.start()).collect();
        for (pos, text) in positions.iter().zip(&removed) {
            rebuilt.insert_str(*pos, text);
        }
        assert_eq!(rebuilt, input);
    }

    #[test]
    fn test_no_match_keeps_clean_input() {
        let mut bag = PropertyBag::new();
        let mut ctx = CellContext::new("A", "no digits here", &mut bag);

        let outcome = find(r"\d+", Selection::All, true).execute(&mut ctx);

        assert_eq!(outcome, Outcome::Unmatched(Miss::NoMatch));
        assert_eq!(bag.get("Size.Clean"), Some("no digits here"));
        assert_eq!(bag.get("Size.Length"), Some("0"));
        assert_eq!(bag.get("Size.Valid"), Some("false"));
    }

    #[test]
    fn test_named_groups_track_last_match() {
        let mut bag = PropertyBag::new();
        let mut ctx = CellContext::new("A", "50ml / 1.7oz", &mut bag);

        let action = find(r"(?P<amount>[\d.]+)\s*(?P<unit>ml|oz)", Selection::All, false);
        assert!(action.execute(&mut ctx).is_match());

        assert_eq!(bag.read_list("Size"), vec!["50ml", "1.7oz"]);
        assert_eq!(bag.get("Size.3.amount"), Some("1.7"));
        assert_eq!(bag.get("Size.3.unit"), Some("oz"));
    }

    #[test]
    fn test_no_match_clears_previous_groups_and_clean() {
        let mut bag = PropertyBag::new();
        let action = find(r"(?P<amount>\d+)ml", Selection::First, false);
        bag.set("Size.Clean", "stale");

        let mut ctx = CellContext::new("A", "50ml", &mut bag);
        assert!(action.execute(&mut ctx).is_match());
        assert_eq!(bag.get("Size.3.amount"), Some("50"));
        assert!(!bag.contains("Size.Clean"));

        let mut ctx = CellContext::new("B", "no size here", &mut bag);
        assert!(!action.execute(&mut ctx).is_match());
        assert_eq!(bag.get("Size.Length"), Some("0"));
        assert!(!bag.contains("Size.3.amount"));
    }

    #[test]
    fn test_empty_matches_are_ignored() {
        let mut bag = PropertyBag::new();
        let mut ctx = CellContext::new("A", "abc", &mut bag);

        assert!(!find(r"\d*", Selection::All, false).execute(&mut ctx).is_match());
        assert_eq!(bag.get("Size.Length"), Some("0"));
    }

    #[test]
    fn test_missing_input_is_no_match() {
        let mut bag = PropertyBag::new();
        let mut ctx = CellContext::new("A", "50ml", &mut bag);
        let mut action = find(r"\d+", Selection::First, false);
        action.input = "Missing".to_string();

        assert!(!action.execute(&mut ctx).is_match());
    }
}
