//! Split: break an input on a literal delimiter into a list.

use crate::runtime::actions::{Miss, Outcome};
use crate::runtime::context::CellContext;

pub const DEFAULT_DELIMITER: &str = ",";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAction {
    pub input: String,
    pub output: String,
    /// Literal delimiter, never empty
    pub delimiter: String,
    /// Expected number of parts. Without `strict` this caps the split, the
    /// last part keeping the remainder.
    pub expected_parts: Option<usize>,
    /// Treat a part count other than `expected_parts` as a non-match.
    pub strict: bool,
}

impl SplitAction {
    pub fn execute(&self, ctx: &mut CellContext<'_>) -> Outcome {
        let Some(text) = ctx
            .input(&self.input)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
        else {
            ctx.write_empty_list(&self.output);
            return Outcome::Unmatched(Miss::EmptyInput);
        };

        let parts: Vec<&str> = match self.expected_parts {
            Some(n) if !self.strict && n > 0 => text.splitn(n, self.delimiter.as_str()).collect(),
            _ => text.split(self.delimiter.as_str()).collect(),
        };

        if self.strict {
            if let Some(expected) = self.expected_parts {
                if parts.len() != expected {
                    ctx.write_empty_list(&self.output);
                    return Outcome::Unmatched(Miss::PartCountMismatch {
                        expected,
                        actual: parts.len(),
                    });
                }
            }
        }

        if parts.iter().all(|p| p.is_empty()) {
            ctx.write_empty_list(&self.output);
            return Outcome::Unmatched(Miss::EmptyInput);
        }

        ctx.write_list(&self.output, parts);
        Outcome::Matched
    }
}
