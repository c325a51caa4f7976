//! Application controller.
//!
//! [`AppController`] owns the whole UI state ([`AppState`]) and is the only thing that changes
//! it. Front ends translate user input into [`Command`]s and report the returned [`Outcome`].

use crate::avatar::AvatarGenerator;
use crate::dialogs::{
    AddPatientDialog, AddPatientForm, DeletePatientDialog, EditPatientDialog, EditPatientForm,
};
use crate::filter::QuickFilter;
use crate::grid::{self, Column, SortDirection, SortState};
use crate::pagination::Pagination;
use crate::row::PatientRow;
use crate::store::PatientStore;
use crate::sync::{FetchOutcome, PatientListSynchronizer};
use crate::{FinderError, FinderResult};
use chrono::NaiveDate;
use fhir::PatientData;
use std::sync::Arc;

/// The dialog currently shown. At most one is open at a time.
#[derive(Clone, Debug)]
pub enum ActiveDialog {
    Add(AddPatientDialog),
    Edit(EditPatientDialog),
    Delete(DeletePatientDialog),
}

#[derive(Clone, Debug)]
pub struct AppState {
    pub list: PatientListSynchronizer,
    pub filter: QuickFilter,
    pub sort: Option<SortState>,
    pub dialog: Option<ActiveDialog>,
    /// Last message worth showing to the user.
    pub status: Option<String>,
}

impl AppState {
    pub fn new(page_size: u32) -> Self {
        Self {
            list: PatientListSynchronizer::new(page_size),
            filter: QuickFilter::default(),
            sort: None,
            dialog: None,
            status: None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Command {
    /// Fetch the current page.
    Load,
    /// Refetch the current page.
    Refresh,
    NextPage,
    PreviousPage,
    /// Raw contents of the page-jump input.
    JumpToPage(String),
    SetQuickFilter(String),
    SortBy(Column, SortDirection),
    ClearSort,
    OpenAdd,
    OpenEdit(String),
    OpenDelete(String),
    SubmitAdd(AddPatientForm),
    SaveEdit(EditPatientForm),
    ConfirmDelete,
    CloseDialog,
}

/// What a command did.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// A page fetch ran.
    Fetched(FetchOutcome),
    /// Nothing needed doing (already on that page, nothing open, ...).
    Unchanged,
    /// The quick filter changed; `visible` rows now pass it.
    Filtered { visible: usize },
    Sorted,
    DialogOpened,
    DialogClosed,
    /// The open dialog rejected the submit; the message is shown inline.
    DialogError(String),
    PatientAdded(PatientData),
    PatientUpdated(PatientData),
    PatientDeleted(String),
    /// The delete request failed. The dialog closed and the failure was logged.
    DeleteFailed,
}

pub struct AppController {
    store: Arc<dyn PatientStore>,
    avatars: Arc<dyn AvatarGenerator>,
    refresh_after_mutation: bool,
    today: fn() -> NaiveDate,
    state: AppState,
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

impl AppController {
    pub fn new(
        store: Arc<dyn PatientStore>,
        avatars: Arc<dyn AvatarGenerator>,
        page_size: u32,
    ) -> Self {
        Self {
            store,
            avatars,
            refresh_after_mutation: false,
            today: local_today,
            state: AppState::new(page_size),
        }
    }

    /// Refetch the current page after every successful add, edit or delete.
    pub fn with_refresh_after_mutation(mut self, refresh: bool) -> Self {
        self.refresh_after_mutation = refresh;
        self
    }

    /// Replace the clock used for birth-date checks.
    pub fn with_today_fn(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn avatars(&self) -> &dyn AvatarGenerator {
        self.avatars.as_ref()
    }

    pub fn pagination(&self) -> Pagination {
        self.state.list.pagination()
    }

    /// Rows of the current page that pass the quick filter, in sort order.
    pub fn visible_rows(&self) -> Vec<&PatientRow> {
        let mut rows = self.state.filter.apply(self.state.list.rows());
        if let Some(sort) = self.state.sort {
            grid::sort_rows(&mut rows, sort);
        }
        rows
    }

    /// The grid as a text table.
    pub fn render(&self) -> String {
        grid::render_table(
            &self.visible_rows(),
            self.avatars.as_ref(),
            &self.pagination(),
        )
    }

    /// Apply one command.
    ///
    /// # Errors
    ///
    /// - [`FinderError::InvalidInput`] for malformed input (page jump, sort column) or a
    ///   submit with no matching dialog open.
    /// - [`FinderError::NotFound`] when opening a dialog for an id not on the current page.
    ///
    /// Dialog validation and store failures are not errors here: they are reported through
    /// [`Outcome::DialogError`] and [`Outcome::DeleteFailed`].
    pub async fn dispatch(&mut self, command: Command) -> FinderResult<Outcome> {
        // The status describes the previous command only.
        self.state.status = None;

        match command {
            Command::Load | Command::Refresh => {
                let page = self.state.list.page();
                Ok(self.fetch(page).await)
            }
            Command::NextPage => {
                let pagination = self.pagination();
                if !pagination.has_next() {
                    return Ok(Outcome::Unchanged);
                }
                Ok(self.set_page(pagination.page + 1).await)
            }
            Command::PreviousPage => {
                let pagination = self.pagination();
                if !pagination.has_previous() {
                    return Ok(Outcome::Unchanged);
                }
                Ok(self.set_page(pagination.page - 1).await)
            }
            Command::JumpToPage(input) => {
                let page = self.pagination().parse_jump(&input)?;
                Ok(self.set_page(page).await)
            }
            Command::SetQuickFilter(text) => {
                self.state.filter = QuickFilter::new(text);
                Ok(Outcome::Filtered {
                    visible: self.visible_rows().len(),
                })
            }
            Command::SortBy(column, direction) => {
                self.state.sort = Some(SortState::new(column, direction)?);
                Ok(Outcome::Sorted)
            }
            Command::ClearSort => {
                self.state.sort = None;
                Ok(Outcome::Sorted)
            }
            Command::OpenAdd => {
                let mut dialog = AddPatientDialog::new();
                dialog.open();
                self.state.dialog = Some(ActiveDialog::Add(dialog));
                Ok(Outcome::DialogOpened)
            }
            Command::OpenEdit(id) => {
                let row = self.current_row(&id)?;
                let mut dialog = EditPatientDialog::new();
                dialog.open_for(&row, self.avatars.as_ref());
                self.state.dialog = Some(ActiveDialog::Edit(dialog));
                Ok(Outcome::DialogOpened)
            }
            Command::OpenDelete(id) => {
                let row = self.current_row(&id)?;
                let mut dialog = DeletePatientDialog::new();
                dialog.open_for(&row);
                self.state.dialog = Some(ActiveDialog::Delete(dialog));
                Ok(Outcome::DialogOpened)
            }
            Command::SubmitAdd(form) => self.submit_add(form).await,
            Command::SaveEdit(form) => self.save_edit(form).await,
            Command::ConfirmDelete => self.confirm_delete().await,
            Command::CloseDialog => match self.state.dialog.take() {
                Some(_) => Ok(Outcome::DialogClosed),
                None => Ok(Outcome::Unchanged),
            },
        }
    }

    /// Page fetch failures are logged by the synchroniser and never surfaced in the status.
    async fn fetch(&mut self, page: u32) -> Outcome {
        Outcome::Fetched(self.state.list.fetch(self.store.as_ref(), page).await)
    }

    async fn set_page(&mut self, page: u32) -> Outcome {
        match self.state.list.set_page(self.store.as_ref(), page).await {
            Some(outcome) => Outcome::Fetched(outcome),
            None => Outcome::Unchanged,
        }
    }

    fn current_row(&self, id: &str) -> FinderResult<PatientRow> {
        self.state
            .list
            .row(id)
            .cloned()
            .ok_or_else(|| FinderError::NotFound(id.to_string()))
    }

    async fn refresh_if_configured(&mut self) {
        if self.refresh_after_mutation {
            let page = self.state.list.page();
            self.fetch(page).await;
        }
    }

    async fn submit_add(&mut self, form: AddPatientForm) -> FinderResult<Outcome> {
        let today = (self.today)();
        let Some(ActiveDialog::Add(dialog)) = self.state.dialog.as_mut() else {
            return Err(FinderError::InvalidInput("the add dialog is not open".into()));
        };

        dialog.set_form(form);
        match dialog.submit(self.store.as_ref(), today).await {
            Ok(created) => {
                self.state.dialog = None;
                self.state.status = Some("Patient added".into());
                self.refresh_if_configured().await;
                Ok(Outcome::PatientAdded(created))
            }
            Err(e) => Ok(Outcome::DialogError(
                dialog.error().map_or_else(|| e.to_string(), str::to_string),
            )),
        }
    }

    async fn save_edit(&mut self, form: EditPatientForm) -> FinderResult<Outcome> {
        let today = (self.today)();
        let Some(ActiveDialog::Edit(dialog)) = self.state.dialog.as_mut() else {
            return Err(FinderError::InvalidInput("the edit dialog is not open".into()));
        };

        dialog.set_form(form);
        match dialog.submit(self.store.as_ref(), today).await {
            Ok(updated) => {
                self.state.dialog = None;
                self.state.status = Some("Patient updated".into());
                self.refresh_if_configured().await;
                Ok(Outcome::PatientUpdated(updated))
            }
            Err(e) => Ok(Outcome::DialogError(
                dialog.error().map_or_else(|| e.to_string(), str::to_string),
            )),
        }
    }

    async fn confirm_delete(&mut self) -> FinderResult<Outcome> {
        if !matches!(self.state.dialog, Some(ActiveDialog::Delete(_))) {
            return Err(FinderError::InvalidInput("the delete dialog is not open".into()));
        }
        let Some(ActiveDialog::Delete(mut dialog)) = self.state.dialog.take() else {
            return Ok(Outcome::Unchanged);
        };

        match dialog.confirm(self.store.as_ref()).await {
            Some(id) => {
                self.state.list.remove_row(&id);
                self.state.status = Some("Patient deleted".into());
                self.refresh_if_configured().await;
                Ok(Outcome::PatientDeleted(id))
            }
            None => Ok(Outcome::DeleteFailed),
        }
    }
}
