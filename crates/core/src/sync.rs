//! Patient list synchronisation.
//!
//! The synchroniser holds exactly one page of rows and the server-reported total. A fetch is
//! split in two halves so that several can be in flight:
//!
//! 1. [`PatientListSynchronizer::begin`] records the requested page and issues a
//!    [`SequenceToken`] together with the [`PageQuery`] to send.
//! 2. [`PatientListSynchronizer::complete`] applies the store's answer only if its token is the
//!    latest one issued. Older answers are discarded, so the last *requested* page wins no
//!    matter in which order responses arrive.
//!
//! Failures are logged and leave the held rows and total untouched.

use crate::pagination::Pagination;
use crate::row::PatientRow;
use crate::store::{PageQuery, PatientStore};
use crate::FinderResult;
use fhir::SearchPage;

/// Identifies one page request. Tokens are strictly increasing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SequenceToken(u64);

/// A page request issued by [`PatientListSynchronizer::begin`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub token: SequenceToken,
    pub page: u32,
    pub query: PageQuery,
}

/// What happened to a completed page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Rows and total were replaced.
    Applied { rows: usize, total: u64 },
    /// A newer request was issued after this one; the response was dropped.
    Stale,
    /// The request failed; rows and total were kept.
    Failed,
}

#[derive(Clone, Debug)]
pub struct PatientListSynchronizer {
    page_size: u32,
    page: u32,
    total: u64,
    rows: Vec<PatientRow>,
    last_issued: u64,
    loaded: bool,
}

impl PatientListSynchronizer {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            page: 1,
            total: 0,
            rows: Vec::new(),
            last_issued: 0,
            loaded: false,
        }
    }

    /// Current (most recently requested) 1-based page.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Total number of patients as last reported by the store.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn rows(&self) -> &[PatientRow] {
        &self.rows
    }

    /// Whether any page has been applied yet.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            page_size: self.page_size,
            total: self.total,
        }
    }

    /// Row with the given id on the current page.
    pub fn row(&self, id: &str) -> Option<&PatientRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// Start a request for `page` (page 0 is treated as 1).
    pub fn begin(&mut self, page: u32) -> PageRequest {
        let page = page.max(1);
        self.last_issued += 1;
        self.page = page;

        PageRequest {
            token: SequenceToken(self.last_issued),
            page,
            query: PageQuery::for_page(page, self.page_size),
        }
    }

    /// Apply the answer to the request identified by `token`.
    pub fn complete(
        &mut self,
        token: SequenceToken,
        result: FinderResult<SearchPage>,
    ) -> FetchOutcome {
        if token.0 != self.last_issued {
            tracing::debug!(
                token = token.0,
                latest = self.last_issued,
                "discarding stale page response"
            );
            return FetchOutcome::Stale;
        }

        let search = match result {
            Ok(search) => search,
            Err(e) => {
                tracing::error!(page = self.page, "Error fetching patient data: {e}");
                return FetchOutcome::Failed;
            }
        };

        if search.skipped > 0 {
            tracing::debug!(skipped = search.skipped, "ignored non-Patient bundle entries");
        }

        let skip = PageQuery::for_page(self.page, self.page_size).skip;
        let total = search
            .total
            .unwrap_or_else(|| skip + search.patients.len() as u64);

        let rows: Vec<PatientRow> = search
            .patients
            .iter()
            .filter_map(|p| {
                let row = PatientRow::project(p);
                if row.is_none() {
                    tracing::warn!("skipping patient resource without id");
                }
                row
            })
            .collect();

        self.total = total;
        self.rows = rows;
        self.loaded = true;

        FetchOutcome::Applied {
            rows: self.rows.len(),
            total,
        }
    }

    /// Request `page` from `store` and apply the answer.
    pub async fn fetch(&mut self, store: &dyn PatientStore, page: u32) -> FetchOutcome {
        let request = self.begin(page);
        let result = store.search(&request.query).await;
        self.complete(request.token, result)
    }

    /// Move to `page`, fetching only if it differs from the current page (or nothing has
    /// been loaded yet). Returns `None` when no fetch was needed.
    pub async fn set_page(&mut self, store: &dyn PatientStore, page: u32) -> Option<FetchOutcome> {
        let page = page.max(1);
        if page == self.page && self.loaded {
            return None;
        }
        Some(self.fetch(store, page).await)
    }

    /// Remove the row with `id` from the held page without refetching. The total is left
    /// as is.
    pub fn remove_row(&mut self, id: &str) -> Option<PatientRow> {
        let index = self.rows.iter().position(|r| r.id == id)?;
        Some(self.rows.remove(index))
    }
}
