use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Invalid JSON object passed in query: {raw}. {reason}")]
    MalformedQuery { raw: String, reason: String },
    #[error("No records found.")]
    NoRecords,
    #[error("record not found: {0}")]
    RecordNotFound(String),
    #[error("Script tags are not allowed.")]
    ScriptInjection,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("admin access required")]
    Forbidden,
    #[error("operation failed: {0}")]
    Provider(String),
}

impl ContentError {
    pub fn malformed(raw: &str, reason: impl ToString) -> Self {
        ContentError::MalformedQuery {
            raw: raw.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ContentError>;
