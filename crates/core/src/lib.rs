//! # Finder Core
//!
//! Core logic for browsing and maintaining the `Patient` resources held by a FHIR server.
//!
//! This crate contains:
//! - the [`PatientStore`] seam with HTTP and in-memory implementations
//! - the paged patient list with stale-response protection ([`sync`])
//! - the quick filter, the grid layout and the pager maths
//! - the add, edit and delete dialogs with their validation rules
//! - deterministic avatars
//! - the [`AppController`] tying the above together behind [`Command`]s
//!
//! **No presentation concerns**: terminal input and output belong in the binaries.

pub mod avatar;
pub mod config;
pub mod constants;
pub mod controller;
pub mod dialogs;
pub mod error;
pub mod filter;
pub mod grid;
pub mod pagination;
pub mod row;
pub mod store;
pub mod sync;
pub mod validation;

pub use avatar::{Avatar, AvatarGenerator, AvatarOptions, IdenticonAvatars};
pub use config::FinderConfig;
pub use controller::{ActiveDialog, AppController, AppState, Command, Outcome};
pub use dialogs::{
    AddPatientDialog, AddPatientForm, DeletePatientDialog, EditPatientDialog, EditPatientForm,
};
pub use error::{FinderError, FinderResult};
pub use filter::QuickFilter;
pub use grid::{Column, SortDirection, SortState};
pub use pagination::Pagination;
pub use row::PatientRow;
pub use store::{HttpPatientStore, MemoryPatientStore, PageQuery, PatientStore, StoreCall};
pub use sync::{FetchOutcome, PatientListSynchronizer, SequenceToken};
