//! Remote patient store.
//!
//! [`PatientStore`] is the seam between the finder and the FHIR server holding patient
//! records. [`HttpPatientStore`] talks to a real server; [`MemoryPatientStore`] keeps records in
//! memory for tests and offline demos.
//!
//! All operations are single requests. There is no caching and no retry.

mod http;
mod memory;

pub use http::HttpPatientStore;
pub use memory::{MemoryPatientStore, StoreCall};

use crate::constants::SORT_MOST_RECENTLY_UPDATED;
use crate::FinderResult;
use async_trait::async_trait;
use fhir::{PatientData, SearchPage};

/// Offset/limit paging parameters for a patient search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageQuery {
    /// Maximum number of records to return (`_count`).
    pub count: u32,
    /// Number of records to skip (`_skip`).
    pub skip: u64,
}

impl PageQuery {
    /// Query for a 1-based `page` of `page_size` records. Page 0 is treated as page 1.
    pub fn for_page(page: u32, page_size: u32) -> Self {
        Self {
            count: page_size,
            skip: u64::from(page.saturating_sub(1)) * u64::from(page_size),
        }
    }

    /// Search parameters in the order they are sent.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("_sort", SORT_MOST_RECENTLY_UPDATED.to_string()),
            ("_count", self.count.to_string()),
            ("_skip", self.skip.to_string()),
            ("_total", "accurate".to_string()),
        ]
    }
}

/// CRUD operations on `Patient` resources held by a remote store.
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Fetch one page of patients, most recently updated first, with an accurate total.
    async fn search(&self, query: &PageQuery) -> FinderResult<SearchPage>;

    /// Read a single patient by id.
    async fn read(&self, id: &str) -> FinderResult<PatientData>;

    /// Create a new patient. The returned resource carries the server-assigned id.
    async fn create(&self, patient: &PatientData) -> FinderResult<PatientData>;

    /// Replace the patient with `id` by `patient` (full-resource update).
    async fn update(&self, id: &str, patient: &PatientData) -> FinderResult<PatientData>;

    /// Delete the patient with `id`.
    async fn delete(&self, id: &str) -> FinderResult<()>;
}
