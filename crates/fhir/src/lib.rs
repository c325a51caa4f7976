//! FHIR wire/boundary support for the patient finder.
//!
//! This crate provides **wire models** and **translation helpers** for the FHIR R4 JSON that a
//! remote FHIR server sends and accepts:
//! - `Patient` resources (read, create, full update)
//! - search-result `Bundle` resources (paged `Patient` searches)
//!
//! This crate focuses on:
//! - serialisation/deserialisation of the JSON wire format
//! - translation between domain-level structs and wire structs
//!
//! HTTP transport lives in `finder-core`; this crate never performs I/O.

pub mod bundle;
pub mod patient;

// Re-export facades
pub use bundle::{Bundle, SearchPage};
pub use patient::Patient;

// Re-export public domain-level types
pub use patient::{
    AdministrativeGender, ContactPoint, ContactPointSystem, ContactPointUse, HumanName, NameUse,
    PatientData,
};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;

/// Deserialise `T` from a JSON deserializer, reporting the path of the failing field.
///
/// `what` names the resource being decoded and is used as the message prefix.
pub(crate) fn deserialize_with_path<'de, D, T>(deserializer: D, what: &str) -> FhirResult<T>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    serde_path_to_error::deserialize::<_, T>(deserializer).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>"
        } else {
            path.as_str()
        };
        FhirError::Translation(format!("{what} schema mismatch at {path}: {source}"))
    })
}
