use thiserror::Error;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Min count ({min}) cannot exceed max count ({max})")]
    InvalidRange { min: i64, max: i64 },

    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Invalid date '{input}': expected YYYY-MM-DD")]
    InvalidDate { input: String },

    #[error("Profile '{profile_id}' already has a rule for category '{category}'")]
    DuplicateCategory { profile_id: String, category: String },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl JournalError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { entity, id: id.into() }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation { field, message: message.into() }
    }

    /// True for input problems rejected before any write.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidRange { .. } | Self::Validation { .. } | Self::InvalidDate { .. }
        )
    }
}

pub type JournalResult<T> = Result<T, JournalError>;

/// Trimmed, non-empty text or a field-level validation error.
pub(crate) fn require_text(field: &'static str, value: &str) -> JournalResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(JournalError::validation(field, "must not be blank"));
    }
    Ok(value.to_string())
}
