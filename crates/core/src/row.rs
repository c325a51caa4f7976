//! Flat, display-ready projection of a patient resource.

use crate::constants::NOT_AVAILABLE;
use fhir::{ContactPointSystem, PatientData};
use serde::Serialize;

/// One grid row.
///
/// Built from a [`PatientData`] by [`PatientRow::project`]. The projection is lossy: only the
/// first name entry and the first phone contact survive, and missing values become `"N/A"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRow {
    pub id: String,
    pub first_name: String,
    pub family_name: String,
    pub gender: String,
    pub birth_date: String,
    pub phone_number: String,
}

impl PatientRow {
    /// Project a patient resource into a row. Returns `None` when the resource has no id,
    /// since rows are correlated with the server by id.
    pub fn project(patient: &PatientData) -> Option<Self> {
        let id = patient.id.as_deref().filter(|id| !id.is_empty())?;
        let name = patient.primary_name();

        let first_name = name.map(|n| n.given.join(" ")).unwrap_or_default();
        let family_name = name.and_then(|n| n.family.clone()).unwrap_or_default();
        let phone_number = patient
            .first_contact(ContactPointSystem::Phone)
            .and_then(|c| c.value.clone())
            .unwrap_or_default();

        Some(Self {
            id: id.to_string(),
            first_name: or_not_available(first_name),
            family_name: or_not_available(family_name),
            gender: or_not_available(
                patient
                    .gender
                    .map(|g| g.to_wire().to_string())
                    .unwrap_or_default(),
            ),
            birth_date: or_not_available(patient.birth_date.clone().unwrap_or_default()),
            phone_number: or_not_available(phone_number),
        })
    }

    /// Lower-cased text of the visible columns, used by the quick filter.
    ///
    /// The id column is hidden in the grid and therefore not included.
    pub fn searchable_text(&self) -> String {
        [
            self.first_name.as_str(),
            self.family_name.as_str(),
            self.gender.as_str(),
            self.birth_date.as_str(),
            self.phone_number.as_str(),
        ]
        .join("\n")
        .to_lowercase()
    }
}

/// Return the value itself, or an empty string if it is the `"N/A"` placeholder.
pub fn editable_value(value: &str) -> String {
    if value == NOT_AVAILABLE {
        String::new()
    } else {
        value.to_string()
    }
}

fn or_not_available(value: String) -> String {
    if value.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhir::{AdministrativeGender, ContactPoint, HumanName, Patient};

    #[test]
    fn joins_given_names_of_first_name() {
        let patient = Patient::parse(
            r#"{"resourceType":"Patient","id":"x",
                "name":[{"given":["Jane","A"],"family":"Doe"},{"given":["JD"]}]}"#,
        )
        .expect("parse");

        let row = PatientRow::project(&patient).expect("row");
        assert_eq!(row.first_name, "Jane A");
        assert_eq!(row.family_name, "Doe");
    }

    #[test]
    fn missing_telecom_is_not_available() {
        let patient = PatientData {
            id: Some("x".into()),
            ..Default::default()
        };
        let row = PatientRow::project(&patient).expect("row");
        assert_eq!(row.phone_number, "N/A");
        assert_eq!(row.first_name, "N/A");
        assert_eq!(row.family_name, "N/A");
        assert_eq!(row.gender, "N/A");
        assert_eq!(row.birth_date, "N/A");
    }

    #[test]
    fn surfaces_only_the_first_phone() {
        let patient = PatientData {
            id: Some("x".into()),
            telecom: vec![
                ContactPoint {
                    system: Some(ContactPointSystem::Email),
                    use_type: None,
                    value: Some("a@b.c".into()),
                },
                ContactPoint::work_phone("111"),
                ContactPoint::work_phone("222"),
            ],
            ..Default::default()
        };
        assert_eq!(PatientRow::project(&patient).expect("row").phone_number, "111");
    }

    #[test]
    fn empty_given_list_and_family_are_not_available() {
        let patient = PatientData {
            id: Some("x".into()),
            names: vec![HumanName {
                family: Some(String::new()),
                ..Default::default()
            }],
            gender: Some(AdministrativeGender::Unknown),
            ..Default::default()
        };
        let row = PatientRow::project(&patient).expect("row");
        assert_eq!(row.first_name, "N/A");
        assert_eq!(row.family_name, "N/A");
        assert_eq!(row.gender, "unknown");
    }

    #[test]
    fn resource_without_id_has_no_row() {
        assert!(PatientRow::project(&PatientData::default()).is_none());
    }

    #[test]
    fn searchable_text_excludes_id() {
        let row = PatientRow {
            id: "secret-id".into(),
            first_name: "Jane".into(),
            family_name: "DOE".into(),
            gender: "female".into(),
            birth_date: "1980-04-12".into(),
            phone_number: "555".into(),
        };
        let text = row.searchable_text();
        assert!(text.contains("doe"));
        assert!(!text.contains("secret"));
    }

    #[test]
    fn editable_value_clears_placeholder() {
        assert_eq!(editable_value("N/A"), "");
        assert_eq!(editable_value("Doe"), "Doe");
    }
}
