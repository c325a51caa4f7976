//! Client-side quick filter over the rows of the current page.
//!
//! The query is split on whitespace and lower-cased; a row matches when every word occurs
//! somewhere in its visible text. The filter never contacts the store.

use crate::row::PatientRow;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuickFilter {
    text: String,
    words: Vec<String>,
}

impl QuickFilter {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let words = text
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        Self { text, words }
    }

    /// The text as typed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// True when the filter lets every row through.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn matches(&self, row: &PatientRow) -> bool {
        if self.words.is_empty() {
            return true;
        }
        let haystack = row.searchable_text();
        self.words.iter().all(|w| haystack.contains(w.as_str()))
    }

    /// Rows that pass the filter, in their original order.
    pub fn apply<'a>(&self, rows: &'a [PatientRow]) -> Vec<&'a PatientRow> {
        rows.iter().filter(|r| self.matches(r)).collect()
    }
}
