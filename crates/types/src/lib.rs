//! Small validated value types shared by the patient finder crates.
//!
//! Values are checked once at construction; holders of a constructed value can rely on the
//! invariant without re-validating.

use chrono::NaiveDate;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the trimmed string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when creating a [`BirthDate`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BirthDateError {
    /// The input was not a calendar date in `YYYY-MM-DD` form.
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    Malformed(String),

    /// The date lies after the reference day.
    #[error("date {0} is in the future")]
    InFuture(NaiveDate),
}

/// A calendar date of birth that is not after a reference day.
///
/// The reference day is supplied by the caller so that validation stays deterministic in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BirthDate(NaiveDate);

impl BirthDate {
    /// Parses `input` as `YYYY-MM-DD` and checks it is on or before `today`.
    ///
    /// # Errors
    ///
    /// Returns [`BirthDateError::Malformed`] if the input is not a valid calendar date and
    /// [`BirthDateError::InFuture`] if it is strictly after `today`.
    pub fn parse(input: &str, today: NaiveDate) -> Result<Self, BirthDateError> {
        let trimmed = input.trim();
        let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map_err(|_| BirthDateError::Malformed(trimmed.to_owned()))?;
        if date > today {
            return Err(BirthDateError::InFuture(date));
        }
        Ok(Self(date))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

/// First day covered by a FHIR `date` (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`).
///
/// # Errors
///
/// Returns [`BirthDateError::Malformed`] for anything else.
pub fn fhir_date_start(input: &str) -> Result<NaiveDate, BirthDateError> {
    let trimmed = input.trim();
    let malformed = || BirthDateError::Malformed(trimmed.to_owned());

    let parts: Vec<&str> = trimmed.split('-').collect();
    let (year, month, day) = match parts[..] {
        [y] if digits(y, 4) => (y, "01", "01"),
        [y, m] if digits(y, 4) && digits(m, 2) => (y, m, "01"),
        [y, m, d] if digits(y, 4) && digits(m, 2) && digits(d, 2) => (y, m, d),
        _ => return Err(malformed()),
    };

    NaiveDate::from_ymd_opt(
        year.parse().map_err(|_| malformed())?,
        month.parse().map_err(|_| malformed())?,
        day.parse().map_err(|_| malformed())?,
    )
    .ok_or_else(malformed)
}

fn digits(part: &str, len: usize) -> bool {
    part.len() == len && part.bytes().all(|b| b.is_ascii_digit())
}

impl std::fmt::Display for BirthDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn fhir_date_start_accepts_partial_dates() {
        assert_eq!(fhir_date_start("1980").expect("year"), day(1980, 1, 1));
        assert_eq!(fhir_date_start("1980-04").expect("month"), day(1980, 4, 1));
        assert_eq!(fhir_date_start(" 1980-04-12 ").expect("day"), day(1980, 4, 12));
    }

    #[test]
    fn fhir_date_start_rejects_other_forms() {
        for input in ["80", "1980-4", "1980-13", "1980-02-30", "12/04/1980", ""] {
            assert!(
                matches!(fhir_date_start(input), Err(BirthDateError::Malformed(_))),
                "{input}"
            );
        }
    }

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  +44 7700 900123 ").expect("non-empty");
        assert_eq!(text.as_str(), "+44 7700 900123");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
        assert_eq!(NonEmptyText::new(""), Err(TextError::Empty));
    }

    #[test]
    fn non_empty_text_deserialize_rejects_blank() {
        let err = serde_json::from_str::<NonEmptyText>("\"  \"");
        assert!(err.is_err());
        let ok: NonEmptyText = serde_json::from_str("\" Doe \"").expect("valid");
        assert_eq!(ok.as_str(), "Doe");
    }

    #[test]
    fn birth_date_accepts_today() {
        let today = day(2024, 2, 29);
        let parsed = BirthDate::parse("2024-02-29", today).expect("today is allowed");
        assert_eq!(parsed.date(), today);
        assert_eq!(parsed.to_string(), "2024-02-29");
    }

    #[test]
    fn birth_date_rejects_tomorrow() {
        let today = day(2024, 2, 28);
        assert_eq!(
            BirthDate::parse("2024-02-29", today),
            Err(BirthDateError::InFuture(day(2024, 2, 29)))
        );
    }

    #[test]
    fn birth_date_rejects_malformed() {
        let today = day(2024, 1, 1);
        assert!(matches!(
            BirthDate::parse("29/02/2020", today),
            Err(BirthDateError::Malformed(_))
        ));
        assert!(matches!(
            BirthDate::parse("2023-02-30", today),
            Err(BirthDateError::Malformed(_))
        ));
    }
}
