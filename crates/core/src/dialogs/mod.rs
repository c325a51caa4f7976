//! Add, edit and delete dialogs.
//!
//! Each dialog owns its fields and its inline error, validates before touching the store and
//! performs exactly one store request. None of them refresh the patient list themselves; the
//! controller decides what to do with the outcome.

mod add;
mod delete;
mod edit;

pub use add::{AddPatientDialog, AddPatientForm};
pub use delete::DeletePatientDialog;
pub use edit::{EditPatientDialog, EditPatientForm};

use crate::FinderError;

/// Inline message for a failed store request.
fn remote_failure(prefix: &str, err: &FinderError) -> String {
    format!("{prefix}{err}")
}
