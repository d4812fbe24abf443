//! Error types for schema reconciliation.

use sqlforge_core::SqlGenError;

use crate::metadata::ObjectType;

/// Errors that can occur while planning a schema upgrade.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Statement generation failed.
    #[error("Generation error: {0}")]
    Generation(#[from] SqlGenError),

    /// A database object has the name of a managed table or view but is of
    /// the other kind.
    #[error("Cannot manage '{name}': it exists as a {found}")]
    TableTypeConflict {
        /// Name of the conflicting object.
        name: String,
        /// What the database reports it to be.
        found: ObjectType,
    },

    /// IO error (reading snapshot files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for schema reconciliation.
pub type Result<T> = std::result::Result<T, MigrateError>;
