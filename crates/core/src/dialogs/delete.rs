use crate::row::PatientRow;
use crate::store::PatientStore;

/// The delete confirmation dialog.
///
/// Unlike add and edit, a failed delete is only logged: the dialog closes either way.
#[derive(Clone, Debug, Default)]
pub struct DeletePatientDialog {
    target: Option<PatientRow>,
}

impl DeletePatientDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_for(&mut self, row: &PatientRow) {
        self.target = Some(row.clone());
    }

    pub fn close(&mut self) {
        self.target = None;
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<&PatientRow> {
        self.target.as_ref()
    }

    /// Labelled fields shown for confirmation.
    pub fn summary(&self) -> Vec<(&'static str, &str)> {
        match &self.target {
            Some(row) => vec![
                ("First Name", row.first_name.as_str()),
                ("Last Name", row.family_name.as_str()),
                ("Gender", row.gender.as_str()),
                ("Date of Birth", row.birth_date.as_str()),
            ],
            None => Vec::new(),
        }
    }

    /// Delete the target and close. Returns the deleted id, or `None` if nothing was open or
    /// the store refused.
    pub async fn confirm(&mut self, store: &dyn PatientStore) -> Option<String> {
        let target = self.target.take()?;

        match store.delete(&target.id).await {
            Ok(()) => {
                tracing::info!(patient_id = %target.id, "Patient deleted successfully");
                Some(target.id)
            }
            Err(e) => {
                tracing::error!(patient_id = %target.id, "Error deleting patient: {e}");
                None
            }
        }
    }
}
