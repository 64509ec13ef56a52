//! Row input surface.
//!
//! The file-reading layer hands rows to the engine through [`RowSource`].
//! Blank or missing cells are `None` (or empty) and never an error.

use std::collections::HashMap;

use indexmap::IndexMap;

/// Anything that exposes cell text by spreadsheet column letter.
pub trait RowSource {
    /// Cell text for a column letter; lookups are case-insensitive.
    fn cell(&self, column: &str) -> Option<&str>;
}

/// Convert spreadsheet column letters to a 0-based index.
///
/// `A` is 0, `Z` is 25, `AA` is 26. Returns `None` for anything that is not
/// a non-empty run of ASCII letters.
///
/// # Example
/// ```
/// use cellrules::runtime::row::column_index;
///
/// assert_eq!(column_index("A"), Some(0));
/// assert_eq!(column_index("ab"), Some(27));
/// assert_eq!(column_index("A1"), None);
/// ```
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0usize, |acc, c| {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })
    .map(|n| n - 1)
}

/// Convert a 0-based index back to spreadsheet column letters.
pub fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Positional row, as read from a spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<String>,
}

impl Row {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Row {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

impl RowSource for Row {
    fn cell(&self, column: &str) -> Option<&str> {
        column_index(column)
            .and_then(|i| self.cells.get(i))
            .map(String::as_str)
    }
}

impl RowSource for HashMap<String, String> {
    fn cell(&self, column: &str) -> Option<&str> {
        self.get(column)
            .or_else(|| {
                self.iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(column))
                    .map(|(_, v)| v)
            })
            .map(String::as_str)
    }
}

impl RowSource for IndexMap<String, String> {
    fn cell(&self, column: &str) -> Option<&str> {
        self.get(column)
            .or_else(|| {
                self.iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(column))
                    .map(|(_, v)| v)
            })
            .map(String::as_str)
    }
}
