use super::{PageQuery, PatientStore};
use crate::{FinderError, FinderResult};
use async_trait::async_trait;
use chrono::Utc;
use fhir::{PatientData, SearchPage};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// A store operation as seen by [`MemoryPatientStore`], recorded in call order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreCall {
    Search(PageQuery),
    Read(String),
    Create,
    Update(String),
    Delete(String),
}

#[derive(Clone)]
struct Record {
    revision: u64,
    patient: PatientData,
}

#[derive(Default)]
struct Inner {
    records: Vec<Record>,
    next_revision: u64,
    calls: Vec<StoreCall>,
    fail_with: Option<u16>,
}

impl Inner {
    fn bump(&mut self) -> u64 {
        self.next_revision += 1;
        self.next_revision
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.patient.id.as_deref() == Some(id))
    }

    fn check_failure(&self) -> FinderResult<()> {
        match self.fail_with {
            Some(status) => Err(FinderError::Http { status }),
            None => Ok(()),
        }
    }
}

/// In-memory patient store for tests and offline use.
///
/// Records are ordered by a revision counter bumped on every create and update, so searches
/// return the most recently written patients first, like `_sort=-_lastUpdated` on a server.
/// Every call is recorded (including failed ones) and can be inspected with
/// [`MemoryPatientStore::calls`].
#[derive(Default)]
pub struct MemoryPatientStore {
    inner: Mutex<Inner>,
}

impl MemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with `patients`; the last one is the most recently updated.
    ///
    /// Patients without an id get a generated one.
    pub fn with_patients(patients: impl IntoIterator<Item = PatientData>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            for mut patient in patients {
                if patient.id.is_none() {
                    patient.id = Some(new_id());
                }
                let revision = inner.bump();
                inner.records.push(Record { revision, patient });
            }
        }
        store
    }

    /// Make every subsequent call fail with `status` (or succeed again with `None`).
    pub fn set_failure(&self, status: Option<u16>) {
        self.lock().fail_with = status;
    }

    /// Calls received so far, oldest first.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current stored state of the patient with `id`.
    pub fn get(&self, id: &str) -> Option<PatientData> {
        let inner = self.lock();
        inner.position(id).map(|i| inner.records[i].patient.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl PatientStore for MemoryPatientStore {
    async fn search(&self, query: &PageQuery) -> FinderResult<SearchPage> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Search(*query));
        inner.check_failure()?;

        let mut records = inner.records.clone();
        records.sort_by(|a, b| b.revision.cmp(&a.revision));

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let patients = records
            .into_iter()
            .skip(skip)
            .take(query.count as usize)
            .map(|r| r.patient)
            .collect();

        Ok(SearchPage {
            total: Some(inner.records.len() as u64),
            patients,
            skipped: 0,
        })
    }

    async fn read(&self, id: &str) -> FinderResult<PatientData> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Read(id.to_string()));
        inner.check_failure()?;

        inner
            .position(id)
            .map(|i| inner.records[i].patient.clone())
            .ok_or(FinderError::Http { status: 404 })
    }

    async fn create(&self, patient: &PatientData) -> FinderResult<PatientData> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Create);
        inner.check_failure()?;

        let mut stored = patient.clone();
        stored.id = Some(new_id());
        stored.last_updated = Some(Utc::now());

        let revision = inner.bump();
        inner.records.push(Record {
            revision,
            patient: stored.clone(),
        });
        Ok(stored)
    }

    async fn update(&self, id: &str, patient: &PatientData) -> FinderResult<PatientData> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Update(id.to_string()));
        inner.check_failure()?;

        let index = inner
            .position(id)
            .ok_or(FinderError::Http { status: 404 })?;

        let mut stored = patient.clone();
        stored.id = Some(id.to_string());
        stored.last_updated = Some(Utc::now());

        let revision = inner.bump();
        inner.records[index] = Record {
            revision,
            patient: stored.clone(),
        };
        Ok(stored)
    }

    async fn delete(&self, id: &str) -> FinderResult<()> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Delete(id.to_string()));
        inner.check_failure()?;

        let index = inner
            .position(id)
            .ok_or(FinderError::Http { status: 404 })?;
        inner.records.remove(index);
        Ok(())
    }
}
