use thiserror::Error;

use super::engine::EngineError;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Read engine error: {0}")]
    Engine(#[from] EngineError),

    /// The engine answered but reported errors; never treated as an empty result
    #[error("Query failed: {}", .0.join("; "))]
    QueryFailed(Vec<String>),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid field {field}: {reason}")]
    Decode { field: String, reason: String },
}

impl QueryError {
    pub(crate) fn decode(field: &str, reason: impl ToString) -> Self {
        QueryError::Decode {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
