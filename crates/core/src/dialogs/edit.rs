use super::remote_failure;
use crate::avatar::{Avatar, AvatarGenerator, AvatarOptions};
use crate::constants::EDIT_AVATAR_SIZE;
use crate::row::{editable_value, PatientRow};
use crate::store::PatientStore;
use crate::validation::{given_names, partial_birth_date_not_in_future, phone_not_blank};
use crate::{FinderError, FinderResult};
use chrono::NaiveDate;
use fhir::{AdministrativeGender, ContactPoint, HumanName, NameUse, PatientData};

/// Fields of the edit dialog, as typed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditPatientForm {
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub birth_date: String,
    pub phone_number: String,
}

impl EditPatientForm {
    /// Pre-populate from a grid row. `"N/A"` placeholders become empty fields.
    pub fn from_row(row: &PatientRow) -> Self {
        Self {
            first_name: editable_value(&row.first_name),
            last_name: editable_value(&row.family_name),
            gender: editable_value(&row.gender),
            birth_date: editable_value(&row.birth_date),
            phone_number: editable_value(&row.phone_number),
        }
    }

    /// Validate the fields and build the full replacement resource for `id`.
    ///
    /// Only the birth date (when given) and the phone number are checked. A partial birth date
    /// such as `1980` is sent back as stored. An empty gender or birth date is left out of the
    /// resource.
    pub fn to_patient(&self, id: &str, today: NaiveDate) -> FinderResult<PatientData> {
        let birth_date = match self.birth_date.trim() {
            "" => None,
            value => Some(partial_birth_date_not_in_future(value, today)?),
        };
        let phone = phone_not_blank(&self.phone_number)?;

        let gender = match self.gender.trim().to_lowercase().as_str() {
            "" => None,
            code => {
                let parsed = AdministrativeGender::from_wire(code);
                if parsed.is_none() {
                    tracing::warn!(gender = code, "dropping unrecognised gender code");
                }
                parsed
            }
        };

        let family = Some(self.last_name.trim().to_string()).filter(|f| !f.is_empty());

        Ok(PatientData {
            id: Some(id.to_string()),
            active: None,
            names: vec![HumanName {
                use_type: Some(NameUse::Official),
                text: None,
                family,
                given: given_names(&self.first_name),
            }],
            gender,
            birth_date,
            telecom: vec![ContactPoint::work_phone(phone.into_inner())],
            last_updated: None,
        })
    }
}

/// The edit-patient dialog.
#[derive(Clone, Debug, Default)]
pub struct EditPatientDialog {
    open: bool,
    patient_id: Option<String>,
    form: EditPatientForm,
    avatar: Option<Avatar>,
    error: Option<String>,
}

impl EditPatientDialog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open for `row`: pre-populate the fields and generate the patient's avatar.
    pub fn open_for(&mut self, row: &PatientRow, avatars: &dyn AvatarGenerator) {
        self.open = true;
        self.patient_id = Some(row.id.clone());
        self.form = EditPatientForm::from_row(row);
        self.avatar = Some(avatars.generate(&row.id, AvatarOptions::new(EDIT_AVATAR_SIZE, 0)));
        self.error = None;
    }

    /// Close the dialog and clear fields, avatar and error.
    pub fn close(&mut self) {
        *self = Self::default();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn patient_id(&self) -> Option<&str> {
        self.patient_id.as_deref()
    }

    pub fn form(&self) -> &EditPatientForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut EditPatientForm {
        &mut self.form
    }

    pub fn set_form(&mut self, form: EditPatientForm) {
        self.form = form;
    }

    pub fn avatar(&self) -> Option<&Avatar> {
        self.avatar.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Validate and send the full-resource update.
    ///
    /// On success the dialog closes and clears. On failure it stays open with the error.
    pub async fn submit(
        &mut self,
        store: &dyn PatientStore,
        today: NaiveDate,
    ) -> FinderResult<PatientData> {
        let Some(id) = self.patient_id.clone() else {
            return Err(FinderError::InvalidInput("no patient selected for edit".into()));
        };

        let patient = match self.form.to_patient(&id, today) {
            Ok(patient) => patient,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        match store.update(&id, &patient).await {
            Ok(updated) => {
                tracing::info!(patient_id = %id, "Patient updated");
                self.close();
                Ok(updated)
            }
            Err(e) => {
                let message = remote_failure("Error updating patient: ", &e);
                tracing::warn!(patient_id = %id, "{message}");
                self.error = Some(message);
                Err(e)
            }
        }
    }
}
