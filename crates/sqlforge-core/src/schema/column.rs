//! Observed column metadata and detected alterations.

use serde::{Deserialize, Serialize};

use crate::types::NativeType;

/// An existing column as reported by database metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name as stored.
    pub name: String,
    /// Native type code.
    pub native_type: NativeType,
    /// Native type name (`VARCHAR2`, `int8`, ...), informational.
    #[serde(default)]
    pub type_name: String,
    /// Column size: length for strings, precision for numerics.
    #[serde(default)]
    pub size: u32,
    /// Decimal digits.
    #[serde(default)]
    pub decimal_digits: u32,
    /// Whether NULL is accepted.
    pub nullable: bool,
    /// Default expression exactly as read back, if any.
    #[serde(default)]
    pub default_val: Option<String>,
}

/// Facets of an existing column that differ from the desired field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnAlterInfo {
    /// Native type or length/precision/scale differs.
    pub type_change: bool,
    /// Default differs after normalization.
    pub default_change: bool,
    /// Nullability differs.
    pub nullable_change: bool,
}

impl ColumnAlterInfo {
    /// Returns `true` if any facet changed.
    #[must_use]
    pub const fn is_altered(&self) -> bool {
        self.type_change || self.default_change || self.nullable_change
    }
}
