use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("subject must not be empty")]
    MissingSubject,
    #[error("invalid date/time: {0}")]
    InvalidDateTime(String),
    #[error("invalid range: end {end} is not after start {start}")]
    InvalidRange { start: String, end: String },
    #[error("invalid cost amount '{0}': expected a non-negative number")]
    InvalidCost(String),
    #[error("invalid relation id '{0}': expected 15 or 18 alphanumeric characters")]
    InvalidRelationId(String),
}
