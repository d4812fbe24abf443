//! Error types for SQL text generation.

use crate::criteria::RestrictionType;
use crate::dialect::TimeBucket;
use crate::types::ColumnType;

/// Errors that can occur while resolving schemas or generating SQL.
#[derive(Debug, thiserror::Error)]
pub enum SqlGenError {
    /// A dialect has no type policy for a column type.
    #[error("Dialect '{dialect}' has no type policy for column type {column_type}")]
    MissingTypePolicy {
        /// The dialect being assembled.
        dialect: String,
        /// The uncovered column type.
        column_type: ColumnType,
    },

    /// A dialect has no criteria policy for a restriction type.
    #[error("Dialect '{dialect}' has no criteria policy for restriction {restriction}")]
    MissingCriteriaPolicy {
        /// The dialect being assembled.
        dialect: String,
        /// The uncovered restriction.
        restriction: RestrictionType,
    },

    /// Result offsets were requested from a dialect that cannot express them.
    #[error("Dialect '{dialect}' does not support a result offset (requested offset {offset})")]
    OffsetNotSupported {
        /// The dialect rendering the query.
        dialect: String,
        /// The requested offset.
        offset: u32,
    },

    /// No dialect is registered under a key.
    #[error("Unknown dialect '{0}'")]
    UnknownDialect(String),

    /// A restriction received the wrong number of operands.
    #[error("Restriction {restriction} expects {expected} operand(s), got {actual}")]
    OperandCount {
        /// The restriction being rendered.
        restriction: RestrictionType,
        /// Expected operand count, as text (`"2"`, `"at least 1"`).
        expected: String,
        /// Supplied operand count.
        actual: usize,
    },

    /// A dialect cannot express a time bucket.
    #[error("Dialect '{dialect}' cannot render time bucket {bucket}")]
    UnsupportedTimeBucket {
        /// The dialect rendering the expression.
        dialect: String,
        /// The requested bucket.
        bucket: TimeBucket,
    },

    /// A field's resolution step was invoked twice.
    #[error("Field '{0}' has already been resolved")]
    AlreadyResolved(String),

    /// A column alteration cannot be expressed safely.
    #[error("Cannot alter column '{column}' of table '{table}': {reason}")]
    UnsupportedAlteration {
        /// Table holding the column.
        table: String,
        /// The column being altered.
        column: String,
        /// Why the alteration was refused.
        reason: String,
    },

    /// An entity does not declare a field.
    #[error("Entity '{entity}' has no field '{field}'")]
    UnknownField {
        /// The entity name.
        entity: String,
        /// The missing field name.
        field: String,
    },

    /// An entity was referenced before being registered.
    #[error("Entity '{0}' is not registered")]
    UnknownEntity(String),

    /// A configured default cannot be rendered for its column type.
    #[error("Invalid default '{value}' for {column_type} column: {reason}")]
    InvalidDefault {
        /// The target column type.
        column_type: ColumnType,
        /// The raw default text.
        value: String,
        /// Parse failure detail.
        reason: String,
    },

    /// A value cannot be bound to or read from a column type.
    #[error("Value of kind {value_kind} cannot be used as {column_type}")]
    ValueMismatch {
        /// The target column type.
        column_type: ColumnType,
        /// Kind of the offending value.
        value_kind: &'static str,
    },

    /// A statement received the wrong number of parameter values.
    #[error("Statement expects {expected} parameter(s), got {actual}")]
    ParameterCount {
        /// Number of parameter slots.
        expected: usize,
        /// Number of supplied values.
        actual: usize,
    },

    /// Failure reported by a caller-supplied parameter sink or result row.
    #[error("Driver error: {0}")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Invalid generator configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error (reading configuration or streaming LOB values).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SqlGenError {
    /// Wraps an arbitrary driver error.
    pub fn driver<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Driver(Box::new(err))
    }
}

/// Result type for SQL generation.
pub type Result<T> = std::result::Result<T, SqlGenError>;
