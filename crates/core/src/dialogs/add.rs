use super::remote_failure;
use crate::store::PatientStore;
use crate::validation::{birth_date_not_in_future, given_names, require_all, selectable_gender};
use crate::FinderResult;
use chrono::NaiveDate;
use fhir::{ContactPoint, HumanName, NameUse, PatientData};

/// Fields of the add-patient dialog, as typed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddPatientForm {
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub birth_date: String,
    pub phone_number: String,
}

impl AddPatientForm {
    /// Validate the fields and build the resource to create.
    ///
    /// Checks run in order: all fields present, birth date well-formed and not after
    /// `today`, gender one of the offered choices.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FinderError::Validation`] with the message to show in the dialog.
    pub fn to_patient(&self, today: NaiveDate) -> FinderResult<PatientData> {
        let [first, last, gender, birth_date, phone] = require_all([
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.gender.as_str(),
            self.birth_date.as_str(),
            self.phone_number.as_str(),
        ])?;
        let birth_date = birth_date_not_in_future(birth_date.as_str(), today)?;
        let gender = selectable_gender(gender.as_str())?;

        Ok(PatientData {
            id: None,
            active: Some(true),
            names: vec![HumanName {
                use_type: Some(NameUse::Official),
                text: Some(format!("{first} {last}")),
                family: Some(last.into_inner()),
                given: given_names(first.as_str()),
            }],
            gender: Some(gender),
            birth_date: Some(birth_date.to_string()),
            telecom: vec![ContactPoint::work_phone(phone.into_inner())],
            last_updated: None,
        })
    }
}

/// The add-patient dialog.
#[derive(Clone, Debug, Default)]
pub struct AddPatientDialog {
    open: bool,
    form: AddPatientForm,
    error: Option<String>,
}

impl AddPatientDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Close the dialog and clear all fields and the error.
    pub fn close(&mut self) {
        self.open = false;
        self.form = AddPatientForm::default();
        self.error = None;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn form(&self) -> &AddPatientForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut AddPatientForm {
        &mut self.form
    }

    pub fn set_form(&mut self, form: AddPatientForm) {
        self.form = form;
    }

    /// Inline error from the last submit, if it failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Validate and create the patient.
    ///
    /// On success the dialog closes and clears. On failure the dialog stays open, keeps its
    /// fields and shows the error; validation failures never reach the store.
    pub async fn submit(
        &mut self,
        store: &dyn PatientStore,
        today: NaiveDate,
    ) -> FinderResult<PatientData> {
        let patient = match self.form.to_patient(today) {
            Ok(patient) => patient,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        match store.create(&patient).await {
            Ok(created) => {
                tracing::info!(
                    patient_id = created.id.as_deref().unwrap_or_default(),
                    "Patient added"
                );
                self.close();
                Ok(created)
            }
            Err(e) => {
                let message = remote_failure("Error adding patient: ", &e);
                tracing::warn!("{message}");
                self.error = Some(message);
                Err(e)
            }
        }
    }
}
