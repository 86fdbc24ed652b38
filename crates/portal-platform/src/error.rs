//! Platform Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        /// Ids of the entities blocking the operation, when known.
        blocking: Vec<String>,
    },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Gateway provider error: {message}")]
    Upstream { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PortalError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            blocking: Vec::new(),
        }
    }

    pub fn conflict_with(message: impl Into<String>, blocking: Vec<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            blocking,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Wire error code, per the admin API response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::Validation { .. } => "INVALID_PARAMETER",
            Self::Upstream { .. } => "GATEWAY_ERROR",
            Self::Database(_) | Self::Json(_) | Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, PortalError>;

/// Whether a sqlx error is a unique-constraint violation, used to map
/// duplicate inserts onto [`PortalError::Conflict`].
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}
