//! Search-result bundles.
//!
//! A `Patient` search returns a `Bundle` of type `searchset`: an optional `total` and a list of
//! entries, each wrapping a resource. Servers may interleave non-Patient resources (for example
//! an `OperationOutcome` entry with search mode `outcome`); those are skipped and counted.

use crate::patient::{Patient, PatientData};
use crate::{deserialize_with_path, FhirError, FhirResult};
use serde::Deserialize;

/// One page of search results.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// Total number of matches across all pages, when the server reported it.
    pub total: Option<u64>,

    /// Patients on this page, in server order.
    pub patients: Vec<PatientData>,

    /// Number of entries skipped because they were not Patient resources.
    pub skipped: usize,
}

/// Bundle resource operations.
pub struct Bundle;

impl Bundle {
    /// Parse a search-result bundle from JSON text.
    ///
    /// A bundle without `entry` is an empty page.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the JSON does not match the bundle schema, resourceType is not
    /// "Bundle", or a Patient entry fails to translate.
    pub fn parse(json_text: &str) -> FhirResult<SearchPage> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);
        let wire: BundleWire = deserialize_with_path(&mut deserializer, "Bundle")?;
        deserializer.end()?;

        if wire.resource_type != "Bundle" {
            return Err(FhirError::InvalidInput(format!(
                "Expected resourceType 'Bundle', got '{}'",
                wire.resource_type
            )));
        }

        let mut page = SearchPage {
            total: wire.total,
            ..SearchPage::default()
        };

        for (index, entry) in wire.entry.into_iter().enumerate() {
            let Some(resource) = entry.resource else {
                page.skipped += 1;
                continue;
            };
            let is_patient = resource
                .get("resourceType")
                .and_then(serde_json::Value::as_str)
                == Some("Patient");
            if !is_patient {
                page.skipped += 1;
                continue;
            }
            let patient = Patient::from_value(resource)
                .map_err(|e| FhirError::Translation(format!("entry[{index}].resource: {e}")))?;
            page.patients.push(patient);
        }

        Ok(page)
    }
}

#[derive(Debug, Deserialize)]
struct BundleWire {
    #[serde(rename = "resourceType")]
    resource_type: String,

    #[serde(default)]
    total: Option<u64>,

    #[serde(default)]
    entry: Vec<BundleEntryWire>,
}

#[derive(Debug, Deserialize)]
struct BundleEntryWire {
    #[serde(default)]
    resource: Option<serde_json::Value>,
}
