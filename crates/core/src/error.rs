#[derive(Debug, thiserror::Error)]
pub enum FinderError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A dialog rejected its fields before contacting the store.
    #[error("{0}")]
    Validation(String),

    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),

    #[error("patient not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl FinderError {
    /// The HTTP status code, when the store answered with a non-success status.
    pub fn status(&self) -> Option<u16> {
        match self {
            FinderError::Http { status } => Some(*status),
            FinderError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type FinderResult<T> = std::result::Result<T, FinderError>;
