//! Input validation for the patient dialogs.
//!
//! Every check runs before the store is contacted. Failures are reported as
//! [`FinderError::Validation`] carrying the message shown in the dialog.

use crate::{FinderError, FinderResult};
use chrono::NaiveDate;
use fhir::AdministrativeGender;
use finder_types::{fhir_date_start, BirthDate, BirthDateError, NonEmptyText};

pub const ALL_FIELDS_REQUIRED: &str = "All fields are required.";
pub const BIRTH_DATE_IN_FUTURE: &str = "Date of birth cannot be in the future.";
pub const BIRTH_DATE_MALFORMED: &str = "Date of birth must be a valid date (YYYY-MM-DD).";
pub const PHONE_REQUIRED: &str = "Phone number cannot be empty.";
pub const GENDER_INVALID: &str = "Gender must be one of male, female or unknown.";

/// Require every field to contain non-whitespace text.
pub fn require_all<const N: usize>(fields: [&str; N]) -> FinderResult<[NonEmptyText; N]> {
    let mut out = Vec::with_capacity(N);
    for field in fields {
        out.push(
            NonEmptyText::new(field)
                .map_err(|_| FinderError::Validation(ALL_FIELDS_REQUIRED.into()))?,
        );
    }
    out.try_into()
        .map_err(|_| FinderError::Validation(ALL_FIELDS_REQUIRED.into()))
}

/// Parse a date of birth and check it is not after `today`.
pub fn birth_date_not_in_future(input: &str, today: NaiveDate) -> FinderResult<BirthDate> {
    BirthDate::parse(input, today).map_err(|e| match e {
        BirthDateError::InFuture(_) => FinderError::Validation(BIRTH_DATE_IN_FUTURE.into()),
        BirthDateError::Malformed(_) => FinderError::Validation(BIRTH_DATE_MALFORMED.into()),
    })
}

/// Check a stored FHIR date (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`) does not start after `today`.
///
/// Returns the trimmed input unchanged so partial dates survive an edit.
pub fn partial_birth_date_not_in_future(input: &str, today: NaiveDate) -> FinderResult<String> {
    let start = fhir_date_start(input)
        .map_err(|_| FinderError::Validation(BIRTH_DATE_MALFORMED.into()))?;
    if start > today {
        return Err(FinderError::Validation(BIRTH_DATE_IN_FUTURE.into()));
    }
    Ok(input.trim().to_string())
}

/// Require a non-blank phone number.
pub fn phone_not_blank(input: &str) -> FinderResult<NonEmptyText> {
    NonEmptyText::new(input).map_err(|_| FinderError::Validation(PHONE_REQUIRED.into()))
}

/// Gender choices offered when adding a patient (case-insensitive).
pub fn selectable_gender(input: &str) -> FinderResult<AdministrativeGender> {
    match AdministrativeGender::from_wire(&input.trim().to_lowercase()) {
        Some(g @ (AdministrativeGender::Male
        | AdministrativeGender::Female
        | AdministrativeGender::Unknown)) => Ok(g),
        _ => Err(FinderError::Validation(GENDER_INVALID.into())),
    }
}

/// Split the first-name field into FHIR given names.
pub fn given_names(first_name: &str) -> Vec<String> {
    first_name.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
    }

    fn message(err: FinderError) -> String {
        match err {
            FinderError::Validation(msg) => msg,
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn require_all_rejects_any_blank() {
        let err = require_all(["Jane", " ", "x"]).expect_err("blank field");
        assert_eq!(message(err), ALL_FIELDS_REQUIRED);
        let [a, b] = require_all([" Jane ", "Doe"]).expect("all present");
        assert_eq!(a.as_str(), "Jane");
        assert_eq!(b.as_str(), "Doe");
    }

    #[test]
    fn future_birth_date_message() {
        let err = birth_date_not_in_future("2024-06-02", today()).expect_err("future");
        assert_eq!(message(err), BIRTH_DATE_IN_FUTURE);
        assert!(birth_date_not_in_future("2024-06-01", today()).is_ok());
    }

    #[test]
    fn malformed_birth_date_message() {
        let err = birth_date_not_in_future("June 1st", today()).expect_err("malformed");
        assert_eq!(message(err), BIRTH_DATE_MALFORMED);
    }

    #[test]
    fn partial_birth_dates_are_kept_as_entered() {
        assert_eq!(
            partial_birth_date_not_in_future(" 1980 ", today()).expect("year"),
            "1980"
        );
        assert_eq!(
            partial_birth_date_not_in_future("1980-04", today()).expect("month"),
            "1980-04"
        );
        assert_eq!(
            partial_birth_date_not_in_future("2024-06", today()).expect("current month"),
            "2024-06"
        );
        assert_eq!(
            message(partial_birth_date_not_in_future("2025", today()).expect_err("future")),
            BIRTH_DATE_IN_FUTURE
        );
        assert_eq!(
            message(partial_birth_date_not_in_future("80", today()).expect_err("short")),
            BIRTH_DATE_MALFORMED
        );
    }

    #[test]
    fn gender_choices_are_case_insensitive() {
        assert_eq!(selectable_gender("Male").expect("ok"), AdministrativeGender::Male);
        assert_eq!(
            selectable_gender(" UNKNOWN ").expect("ok"),
            AdministrativeGender::Unknown
        );
        assert_eq!(message(selectable_gender("other").expect_err("not offered")), GENDER_INVALID);
    }

    #[test]
    fn phone_must_not_be_blank() {
        assert_eq!(message(phone_not_blank("  ").expect_err("blank")), PHONE_REQUIRED);
    }

    #[test]
    fn given_names_split_on_whitespace() {
        assert_eq!(given_names(" Jane  A "), vec!["Jane", "A"]);
        assert!(given_names("").is_empty());
    }
}
