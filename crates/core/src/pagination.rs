//! Page navigation maths for the grid's manual pager.

use crate::{FinderError, FinderResult};

/// Snapshot of the pager: requested page, page size and the server-reported total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl Pagination {
    /// `ceil(total / page_size)`. Zero when there are no patients.
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        let pages = self.total.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Whether the Previous button is enabled.
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Whether the Next button is enabled.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Clamp a requested page to `[1, total_pages]`. With no pages at all the result is 1.
    pub fn clamp(&self, requested: i64) -> u32 {
        let upper = i64::from(self.total_pages());
        let clamped = requested.clamp(1, upper.max(1));
        u32::try_from(clamped).unwrap_or(1)
    }

    /// Parse and clamp the contents of the page-jump input.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::InvalidInput`] if the input is not an integer.
    pub fn parse_jump(&self, input: &str) -> FinderResult<u32> {
        let trimmed = input.trim();
        let requested = trimmed
            .parse::<i64>()
            .map_err(|_| FinderError::InvalidInput(format!("'{trimmed}' is not a page number")))?;
        Ok(self.clamp(requested))
    }

    /// `Page <p> of <n> (Total Patients: <t>)`
    pub fn status_text(&self) -> String {
        format!(
            "Page {} of {} (Total Patients: {})",
            self.page,
            self.total_pages(),
            self.total
        )
    }
}
