use thiserror::Error;

/// Failures of a fetch submission that are reported back to the user.
///
/// Scraper failures are not errors at this level: they are recorded on the
/// log row and returned as [`crate::fetch::FetchOutcome::Failed`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Missing required fields")]
    MissingFields,
    #[error("Unknown court")]
    UnknownCourt(String),
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl FetchError {
    /// Stable code for logs and the JSON API.
    pub fn code(&self) -> &'static str {
        match self {
            FetchError::MissingFields => "E_MISSING_FIELDS",
            FetchError::UnknownCourt(_) => "E_UNKNOWN_COURT",
            FetchError::Storage(_) => "E_STORAGE",
        }
    }
}
