//! FHIR-aligned patient wire models and translation helpers.
//!
//! This module provides both domain-level types and wire models for `Patient` resources as
//! exchanged with a remote FHIR server in JSON.
//!
//! Responsibilities:
//! - Define public domain-level types for use by the finder core
//! - Define a wire model for serialisation/deserialisation
//! - Provide translation helpers between domain types and the wire model
//!
//! Notes:
//! - Remote servers return many more Patient elements than are modelled here. Unknown members
//!   are ignored on read and are not written back on update.
//! - Unrecognised codes (gender, name use, contact system/use) translate to `None`.

use crate::{deserialize_with_path, FhirError, FhirResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// Purpose of a human name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameUse {
    /// Official name.
    Official,
    /// Usual/preferred name.
    Usual,
    /// Temporary name.
    Temp,
    /// Nickname or informal name.
    Nickname,
    /// Anonymous name.
    Anonymous,
    /// Old name (no longer in use).
    Old,
    /// Maiden name.
    Maiden,
}

impl NameUse {
    /// Convert to FHIR wire format string.
    pub fn to_wire(self) -> &'static str {
        match self {
            NameUse::Official => "official",
            NameUse::Usual => "usual",
            NameUse::Temp => "temp",
            NameUse::Nickname => "nickname",
            NameUse::Anonymous => "anonymous",
            NameUse::Old => "old",
            NameUse::Maiden => "maiden",
        }
    }

    /// Parse from FHIR wire format string.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "official" => Some(NameUse::Official),
            "usual" => Some(NameUse::Usual),
            "temp" => Some(NameUse::Temp),
            "nickname" => Some(NameUse::Nickname),
            "anonymous" => Some(NameUse::Anonymous),
            "old" => Some(NameUse::Old),
            "maiden" => Some(NameUse::Maiden),
            _ => None,
        }
    }
}

/// Administrative gender of a patient.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdministrativeGender {
    Male,
    Female,
    Other,
    Unknown,
}

impl AdministrativeGender {
    /// Convert to FHIR wire format string.
    pub fn to_wire(self) -> &'static str {
        match self {
            AdministrativeGender::Male => "male",
            AdministrativeGender::Female => "female",
            AdministrativeGender::Other => "other",
            AdministrativeGender::Unknown => "unknown",
        }
    }

    /// Parse from FHIR wire format string.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "male" => Some(AdministrativeGender::Male),
            "female" => Some(AdministrativeGender::Female),
            "other" => Some(AdministrativeGender::Other),
            "unknown" => Some(AdministrativeGender::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for AdministrativeGender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_wire())
    }
}

/// Telecommunications form of a contact point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactPointSystem {
    Phone,
    Fax,
    Email,
    Pager,
    Url,
    Sms,
    Other,
}

impl ContactPointSystem {
    /// Convert to FHIR wire format string.
    pub fn to_wire(self) -> &'static str {
        match self {
            ContactPointSystem::Phone => "phone",
            ContactPointSystem::Fax => "fax",
            ContactPointSystem::Email => "email",
            ContactPointSystem::Pager => "pager",
            ContactPointSystem::Url => "url",
            ContactPointSystem::Sms => "sms",
            ContactPointSystem::Other => "other",
        }
    }

    /// Parse from FHIR wire format string.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "phone" => Some(ContactPointSystem::Phone),
            "fax" => Some(ContactPointSystem::Fax),
            "email" => Some(ContactPointSystem::Email),
            "pager" => Some(ContactPointSystem::Pager),
            "url" => Some(ContactPointSystem::Url),
            "sms" => Some(ContactPointSystem::Sms),
            "other" => Some(ContactPointSystem::Other),
            _ => None,
        }
    }
}

/// Purpose of a contact point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactPointUse {
    Home,
    Work,
    Temp,
    Old,
    Mobile,
}

impl ContactPointUse {
    /// Convert to FHIR wire format string.
    pub fn to_wire(self) -> &'static str {
        match self {
            ContactPointUse::Home => "home",
            ContactPointUse::Work => "work",
            ContactPointUse::Temp => "temp",
            ContactPointUse::Old => "old",
            ContactPointUse::Mobile => "mobile",
        }
    }

    /// Parse from FHIR wire format string.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "home" => Some(ContactPointUse::Home),
            "work" => Some(ContactPointUse::Work),
            "temp" => Some(ContactPointUse::Temp),
            "old" => Some(ContactPointUse::Old),
            "mobile" => Some(ContactPointUse::Mobile),
            _ => None,
        }
    }
}

/// A human name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HumanName {
    /// Purpose of the name (official, usual, nickname, etc.).
    pub use_type: Option<NameUse>,

    /// Full name as a single display string.
    pub text: Option<String>,

    /// Family name (surname).
    pub family: Option<String>,

    /// Given names (first name, middle names).
    pub given: Vec<String>,
}

/// A phone number, email address or other contact detail.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactPoint {
    pub system: Option<ContactPointSystem>,
    pub use_type: Option<ContactPointUse>,
    pub value: Option<String>,
}

impl ContactPoint {
    /// A work phone number.
    pub fn work_phone(value: impl Into<String>) -> Self {
        Self {
            system: Some(ContactPointSystem::Phone),
            use_type: Some(ContactPointUse::Work),
            value: Some(value.into()),
        }
    }
}

/// Domain-level carrier for a patient resource.
///
/// `id` is `None` for a resource that has not yet been created on the server.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientData {
    /// Server-assigned logical id.
    pub id: Option<String>,

    /// Whether this patient record is in active use.
    pub active: Option<bool>,

    /// Names, in server order. The first one is treated as primary.
    pub names: Vec<HumanName>,

    pub gender: Option<AdministrativeGender>,

    /// FHIR date (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`).
    pub birth_date: Option<String>,

    /// Contact points, in server order.
    pub telecom: Vec<ContactPoint>,

    /// `meta.lastUpdated` as reported by the server.
    pub last_updated: Option<DateTime<Utc>>,
}

impl PatientData {
    /// The first name entry, if any.
    pub fn primary_name(&self) -> Option<&HumanName> {
        self.names.first()
    }

    /// The first contact point with the given system.
    pub fn first_contact(&self, system: ContactPointSystem) -> Option<&ContactPoint> {
        self.telecom.iter().find(|c| c.system == Some(system))
    }
}

// ============================================================================
// Public Patient operations
// ============================================================================

/// Patient resource operations.
///
/// This is a zero-sized type used for namespacing patient-related operations.
/// All methods are associated functions.
pub struct Patient;

impl Patient {
    /// Parse a patient resource from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the JSON does not match the wire schema (the message names the failing path),
    /// - resourceType is not "Patient".
    pub fn parse(json_text: &str) -> FhirResult<PatientData> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);
        let wire: PatientWire = deserialize_with_path(&mut deserializer, "Patient")?;
        deserializer.end()?;
        wire_to_domain(wire)
    }

    /// Translate an already-decoded JSON value (for example a bundle entry) into a patient.
    ///
    /// # Errors
    ///
    /// Same as [`Patient::parse`].
    pub fn from_value(value: serde_json::Value) -> FhirResult<PatientData> {
        let wire: PatientWire = deserialize_with_path(value, "Patient")?;
        wire_to_domain(wire)
    }

    /// Render a patient resource as a JSON value ready to send to a server.
    pub fn to_value(data: &PatientData) -> FhirResult<serde_json::Value> {
        let wire = domain_to_wire(data);
        serde_json::to_value(&wire)
            .map_err(|e| FhirError::Translation(format!("Failed to serialise patient: {e}")))
    }

    /// Render a patient resource as JSON text.
    pub fn render(data: &PatientData) -> FhirResult<String> {
        let wire = domain_to_wire(data);
        serde_json::to_string(&wire)
            .map_err(|e| FhirError::Translation(format!("Failed to serialise patient: {e}")))
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

/// Wire representation of a patient resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct PatientWire {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PatientMetaWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanNameWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPointWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(
        rename = "birthDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub birth_date: Option<String>,
}

/// Wire representation of a human name.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct HumanNameWire {
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

/// Wire representation of a contact point.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct ContactPointWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Wire representation of patient metadata.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct PatientMetaWire {
    #[serde(
        rename = "lastUpdated",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<String>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

/// Convert wire format patient to domain type.
fn wire_to_domain(wire: PatientWire) -> FhirResult<PatientData> {
    if wire.resource_type != "Patient" {
        return Err(FhirError::InvalidInput(format!(
            "Expected resourceType 'Patient', got '{}'",
            wire.resource_type
        )));
    }

    let names = wire
        .name
        .into_iter()
        .map(|n| HumanName {
            use_type: n.use_type.as_deref().and_then(NameUse::from_wire),
            text: n.text,
            family: n.family,
            given: n.given,
        })
        .collect();

    let telecom = wire
        .telecom
        .into_iter()
        .map(|c| ContactPoint {
            system: c.system.as_deref().and_then(ContactPointSystem::from_wire),
            use_type: c.use_type.as_deref().and_then(ContactPointUse::from_wire),
            value: c.value,
        })
        .collect();

    let last_updated = wire
        .meta
        .and_then(|m| m.last_updated)
        .and_then(|s| s.parse::<DateTime<Utc>>().ok());

    Ok(PatientData {
        id: wire.id,
        active: wire.active,
        names,
        gender: wire.gender.as_deref().and_then(AdministrativeGender::from_wire),
        birth_date: wire.birth_date,
        telecom,
        last_updated,
    })
}

/// Convert domain type to wire format patient.
fn domain_to_wire(data: &PatientData) -> PatientWire {
    PatientWire {
        resource_type: "Patient".to_string(),
        id: data.id.clone(),
        meta: data.last_updated.map(|lu| PatientMetaWire {
            last_updated: Some(lu.to_rfc3339()),
        }),
        active: data.active,
        name: data
            .names
            .iter()
            .map(|n| HumanNameWire {
                use_type: n.use_type.map(|u| u.to_wire().to_string()),
                text: n.text.clone(),
                family: n.family.clone(),
                given: n.given.clone(),
            })
            .collect(),
        telecom: data
            .telecom
            .iter()
            .map(|c| ContactPointWire {
                system: c.system.map(|s| s.to_wire().to_string()),
                use_type: c.use_type.map(|u| u.to_wire().to_string()),
                value: c.value.clone(),
            })
            .collect(),
        gender: data.gender.map(|g| g.to_wire().to_string()),
        birth_date: data.birth_date.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_server_patient_with_extra_members() {
        let input = r#"{
            "resourceType": "Patient",
            "id": "7b1c2a",
            "meta": {"versionId": "3", "lastUpdated": "2024-05-01T10:15:00.123Z"},
            "identifier": [{"system": "urn:oid:1.2.36", "value": "12345"}],
            "active": true,
            "name": [{"use": "official", "family": "Doe", "given": ["Jane", "A"]}],
            "telecom": [
                {"system": "email", "value": "jane@example.org"},
                {"system": "phone", "use": "work", "value": "555-0100"}
            ],
            "gender": "female",
            "birthDate": "1980-04-12",
            "address": [{"city": "Leeds"}]
        }"#;

        let patient = Patient::parse(input).expect("parse patient");
        assert_eq!(patient.id.as_deref(), Some("7b1c2a"));
        assert_eq!(patient.active, Some(true));
        assert_eq!(patient.gender, Some(AdministrativeGender::Female));
        assert_eq!(patient.birth_date.as_deref(), Some("1980-04-12"));

        let name = patient.primary_name().expect("has a name");
        assert_eq!(name.use_type, Some(NameUse::Official));
        assert_eq!(name.family.as_deref(), Some("Doe"));
        assert_eq!(name.given, vec!["Jane", "A"]);

        let phone = patient
            .first_contact(ContactPointSystem::Phone)
            .expect("has a phone");
        assert_eq!(phone.value.as_deref(), Some("555-0100"));
        assert_eq!(phone.use_type, Some(ContactPointUse::Work));
        assert!(patient.last_updated.is_some());
    }

    #[test]
    fn parses_minimal_patient() {
        let patient = Patient::parse(r#"{"resourceType":"Patient"}"#).expect("minimal");
        assert!(patient.id.is_none());
        assert!(patient.names.is_empty());
        assert!(patient.telecom.is_empty());
        assert!(patient.gender.is_none());
    }

    #[test]
    fn rejects_invalid_resource_type() {
        let err = Patient::parse(r#"{"resourceType":"Observation","id":"1"}"#)
            .expect_err("should reject");
        match err {
            FhirError::InvalidInput(msg) => {
                assert!(msg.contains("Patient"));
                assert!(msg.contains("Observation"));
            }
            other => panic!("expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn reports_path_of_wrong_type() {
        let input = r#"{"resourceType":"Patient","name":[{"given":"Jane"}]}"#;
        let err = Patient::parse(input).expect_err("should reject wrong type");
        match err {
            FhirError::Translation(msg) => assert!(msg.contains("name[0].given"), "{msg}"),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_gender_code_is_dropped() {
        let patient =
            Patient::parse(r#"{"resourceType":"Patient","gender":"robot"}"#).expect("parse");
        assert!(patient.gender.is_none());
    }

    #[test]
    fn renders_create_body() {
        let data = PatientData {
            active: Some(true),
            names: vec![HumanName {
                use_type: Some(NameUse::Official),
                text: Some("Jane Doe".into()),
                family: Some("Doe".into()),
                given: vec!["Jane".into()],
            }],
            gender: Some(AdministrativeGender::Female),
            birth_date: Some("1980-04-12".into()),
            telecom: vec![ContactPoint::work_phone("555-0100")],
            ..Default::default()
        };

        let value = Patient::to_value(&data).expect("render");
        assert_eq!(
            value,
            serde_json::json!({
                "resourceType": "Patient",
                "active": true,
                "name": [{"use": "official", "text": "Jane Doe", "family": "Doe", "given": ["Jane"]}],
                "telecom": [{"system": "phone", "use": "work", "value": "555-0100"}],
                "gender": "female",
                "birthDate": "1980-04-12"
            })
        );
    }

    #[test]
    fn render_omits_absent_fields() {
        let data = PatientData {
            id: Some("abc".into()),
            ..Default::default()
        };
        let json = Patient::render(&data).expect("render");
        assert_eq!(json, r#"{"resourceType":"Patient","id":"abc"}"#);
    }
}
