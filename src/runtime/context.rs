//! Cell context handed to every action of a column's chain.
//!
//! A context is created once per (row, column) pair and dropped when the
//! chain finishes. It borrows the row's property bag; actions write through
//! it and never copy the bag.

use crate::runtime::bag::PropertyBag;
use crate::runtime::keys;

/// Locale-invariant number formatting.
///
/// Counts written into the bag (`Key.Length`) and decimal strings read by
/// downstream typed conversion always use this format, whatever the host
/// locale: ASCII digits, `.` as decimal separator, no digit grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    pub decimal_separator: char,
}

impl NumberFormat {
    /// The invariant format.
    pub const fn invariant() -> Self {
        Self {
            decimal_separator: '.',
        }
    }

    /// Format a list count.
    pub fn format_count(&self, count: usize) -> String {
        count.to_string()
    }

    /// Parse a decimal string written in this format.
    ///
    /// Surrounding whitespace is ignored. Grouping separators and a comma
    /// decimal separator are rejected.
    ///
    /// # Example
    /// ```
    /// use cellrules::runtime::NumberFormat;
    ///
    /// let format = NumberFormat::invariant();
    /// assert_eq!(format.parse_decimal(" 12.50 "), Some(12.5));
    /// assert_eq!(format.parse_decimal("12,50"), None);
    /// ```
    pub fn parse_decimal(&self, text: &str) -> Option<f64> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let mut seen_separator = false;
        for (i, c) in text.chars().enumerate() {
            match c {
                '0'..='9' => {}
                '-' | '+' if i == 0 => {}
                c if c == self.decimal_separator && !seen_separator => seen_separator = true,
                _ => return None,
            }
        }

        let normalized: String = text
            .chars()
            .map(|c| if c == self.decimal_separator { '.' } else { c })
            .collect();
        normalized.parse().ok()
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::invariant()
    }
}

/// Per-invocation view of one spreadsheet cell.
///
/// Column id, raw text and formatting are fixed for the lifetime of the
/// context; only the borrowed bag is written.
#[derive(Debug)]
pub struct CellContext<'a> {
    column: &'a str,
    text: &'a str,
    format: NumberFormat,
    bag: &'a mut PropertyBag,
}

impl<'a> CellContext<'a> {
    /// Create a context over `bag` for one cell.
    ///
    /// # Arguments
    /// * `column` - Column identifier (spreadsheet letter)
    /// * `text` - Raw cell text, empty for blank cells
    /// * `bag` - The row's property bag
    pub fn new(column: &'a str, text: &'a str, bag: &'a mut PropertyBag) -> Self {
        Self {
            column,
            text,
            format: NumberFormat::invariant(),
            bag,
        }
    }

    pub fn column(&self) -> &str {
        self.column
    }

    pub fn text(&self) -> &str {
        self.text
    }

    pub fn format(&self) -> &NumberFormat {
        &self.format
    }

    pub fn bag(&self) -> &PropertyBag {
        &*self.bag
    }

    pub fn bag_mut(&mut self) -> &mut PropertyBag {
        &mut *self.bag
    }

    /// Resolve an action input.
    ///
    /// The reserved `Text` key yields the raw cell text; any other key is a
    /// bag read. Missing keys resolve to `None`.
    pub fn input(&self, key: &str) -> Option<&str> {
        if keys::is_text(key) {
            Some(self.text)
        } else {
            self.bag.get(key)
        }
    }

    /// Write a list result under `key` using this context's format.
    pub fn write_list<I, S>(&mut self, key: &str, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let format = self.format;
        self.bag.write_list(key, items, &format);
    }

    /// Write an empty list under `key`.
    pub fn write_empty_list(&mut self, key: &str) {
        let format = self.format;
        self.bag.write_empty_list(key, &format);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_resolves_text_and_bag() {
        let mut bag = PropertyBag::new();
        bag.set("Parts[0]", "CHANEL");

        let ctx = CellContext::new("A", "CHANEL:MENS", &mut bag);

        assert_eq!(ctx.column(), "A");
        assert_eq!(ctx.input("Text"), Some("CHANEL:MENS"));
        assert_eq!(ctx.input("text"), Some("CHANEL:MENS"));
        assert_eq!(ctx.input("parts[0]"), Some("CHANEL"));
        assert_eq!(ctx.input("Parts[1]"), None);
    }

    #[test]
    fn test_write_list_through_context() {
        let mut bag = PropertyBag::new();
        {
            let mut ctx = CellContext::new("B", "", &mut bag);
            ctx.write_list("Sizes", ["50ml", "100ml"]);
        }

        assert_eq!(bag.get("Sizes.Length"), Some("2"));
        assert_eq!(bag.get("Sizes[1]"), Some("100ml"));
    }

    #[test]
    fn test_parse_decimal() {
        let format = NumberFormat::invariant();

        assert_eq!(format.parse_decimal("42"), Some(42.0));
        assert_eq!(format.parse_decimal("-3.25"), Some(-3.25));
        assert_eq!(format.parse_decimal("1.000.000"), None);
        assert_eq!(format.parse_decimal("1,5"), None);
        assert_eq!(format.parse_decimal(""), None);
        assert_eq!(format.parse_decimal("12a"), None);
    }
}
