//! HTTP(S) implementation of [`PatientStore`] for a FHIR R4 server.

use super::{PageQuery, PatientStore};
use crate::config::FinderConfig;
use crate::constants::{FHIR_JSON_CONTENT_TYPE, PREFER_OFFSET_PAGINATION};
use crate::{FinderError, FinderResult};
use async_trait::async_trait;
use fhir::{Bundle, Patient, PatientData, SearchPage};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response, Url};

/// Patient store backed by a FHIR server's REST API.
#[derive(Clone, Debug)]
pub struct HttpPatientStore {
    client: Client,
    base_url: String,
    base: Url,
}

impl HttpPatientStore {
    /// Build a store for the server named in `cfg`.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Transport`] if the HTTP client cannot be constructed, or
    /// [`FinderError::Config`] if the base URL cannot carry path segments.
    pub fn new(cfg: &FinderConfig) -> FinderResult<Self> {
        let base = Url::parse(cfg.base_url())
            .map_err(|e| FinderError::Config(format!("invalid FHIR base URL: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(FinderError::Config(format!(
                "FHIR base URL '{}' cannot carry a path",
                cfg.base_url()
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = cfg.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: cfg.base_url().to_string(),
            base,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn patient_type_url(&self) -> String {
        format!("{}/Patient", self.base_url)
    }

    /// `{base}/Patient/{id}` with `id` percent-encoded as a single path segment.
    fn patient_instance_url(&self, id: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("Patient").push(id);
        }
        url
    }
}

/// Turn a non-success status into [`FinderError::Http`].
fn ensure_success(response: Response) -> FinderResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(FinderError::Http {
            status: status.as_u16(),
        })
    }
}

/// Decode a returned patient, falling back to `sent` when the server answered with no body.
fn returned_patient(body: &str, sent: &PatientData) -> FinderResult<PatientData> {
    if body.trim().is_empty() {
        return Ok(sent.clone());
    }
    Ok(Patient::parse(body)?)
}

#[async_trait]
impl PatientStore for HttpPatientStore {
    async fn search(&self, query: &PageQuery) -> FinderResult<SearchPage> {
        tracing::debug!(count = query.count, skip = query.skip, "searching patients");

        let response = self
            .client
            .get(self.patient_type_url())
            .query(&query.query_pairs())
            .header("Prefer", PREFER_OFFSET_PAGINATION)
            .header(ACCEPT, FHIR_JSON_CONTENT_TYPE)
            .send()
            .await?;
        let body = ensure_success(response)?.text().await?;

        Ok(Bundle::parse(&body)?)
    }

    async fn read(&self, id: &str) -> FinderResult<PatientData> {
        tracing::debug!(patient_id = %id, "reading patient");

        let response = self
            .client
            .get(self.patient_instance_url(id))
            .header(ACCEPT, FHIR_JSON_CONTENT_TYPE)
            .send()
            .await?;
        let body = ensure_success(response)?.text().await?;

        Ok(Patient::parse(&body)?)
    }

    async fn create(&self, patient: &PatientData) -> FinderResult<PatientData> {
        let payload = Patient::render(patient)?;
        tracing::debug!("creating patient");

        let response = self
            .client
            .post(self.patient_type_url())
            .header(CONTENT_TYPE, FHIR_JSON_CONTENT_TYPE)
            .header(ACCEPT, FHIR_JSON_CONTENT_TYPE)
            .body(payload)
            .send()
            .await?;
        let body = ensure_success(response)?.text().await?;

        returned_patient(&body, patient)
    }

    async fn update(&self, id: &str, patient: &PatientData) -> FinderResult<PatientData> {
        let payload = Patient::render(patient)?;
        tracing::debug!(patient_id = %id, "updating patient");

        let response = self
            .client
            .put(self.patient_instance_url(id))
            .header(CONTENT_TYPE, FHIR_JSON_CONTENT_TYPE)
            .header(ACCEPT, FHIR_JSON_CONTENT_TYPE)
            .body(payload)
            .send()
            .await?;
        let body = ensure_success(response)?.text().await?;

        returned_patient(&body, patient)
    }

    async fn delete(&self, id: &str) -> FinderResult<()> {
        tracing::debug!(patient_id = %id, "deleting patient");

        let response = self
            .client
            .delete(self.patient_instance_url(id))
            .send()
            .await?;
        ensure_success(response)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(base_url: &str) -> HttpPatientStore {
        let cfg = FinderConfig::new(base_url, 10, None, false).expect("config");
        HttpPatientStore::new(&cfg).expect("store")
    }

    #[test]
    fn plain_ids_are_appended() {
        let store = store("http://localhost:8080/fhir/");
        assert_eq!(
            store.patient_instance_url("p-1").as_str(),
            "http://localhost:8080/fhir/Patient/p-1"
        );
    }

    #[test]
    fn ids_stay_inside_one_path_segment() {
        let store = store("http://localhost:8080/fhir");
        assert_eq!(
            store.patient_instance_url("a/b").as_str(),
            "http://localhost:8080/fhir/Patient/a%2Fb"
        );
        assert_eq!(
            store.patient_instance_url("x?y#z").as_str(),
            "http://localhost:8080/fhir/Patient/x%3Fy%23z"
        );
    }

    #[test]
    fn root_base_url_has_no_double_slash() {
        let store = store("https://hapi.example.org");
        assert_eq!(
            store.patient_instance_url("p1").as_str(),
            "https://hapi.example.org/Patient/p1"
        );
    }
}
