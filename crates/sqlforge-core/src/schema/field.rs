//! Field schema descriptions.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SqlGenError};
use crate::types::ColumnType;

/// Reference from a field to the primary key of another entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    /// Referenced entity name.
    pub entity: String,
    /// Referenced field name in that entity.
    pub field: String,
}

/// Source of a list-only field: a column of another entity reached through
/// a foreign key of this entity. List-only fields exist only in the view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListOnlySource {
    /// Local foreign key field used for the join.
    pub key_field: String,
    /// Field of the referenced entity whose column is projected.
    pub source_field: String,
}

/// Derives the default column name for a field: upper snake case.
///
/// `createdOn` becomes `CREATED_ON`, `line2` stays `LINE2`.
#[must_use]
pub fn schema_element_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        out.push(c.to_ascii_uppercase());
    }
    out
}

/// Immutable description of one entity field.
///
/// Built with [`FieldSchemaInfo::builder`]. The only mutation allowed after
/// construction is the one-shot [`resolve`](Self::resolve) step that fixes
/// the type of an enumeration-backed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchemaInfo {
    name: String,
    column: String,
    column_type: ColumnType,
    #[serde(default)]
    enum_type: Option<String>,
    #[serde(default)]
    length: u32,
    #[serde(default)]
    precision: u32,
    #[serde(default)]
    scale: u32,
    #[serde(default)]
    nullable: bool,
    #[serde(default)]
    default_val: Option<String>,
    #[serde(default)]
    primary_key: bool,
    #[serde(default)]
    foreign_key: Option<ForeignKeyRef>,
    #[serde(default)]
    list_only: Option<ListOnlySource>,
    #[serde(default)]
    version: bool,
    #[serde(default)]
    marker: Option<String>,
    #[serde(default, skip_serializing)]
    resolved: bool,
}

impl FieldSchemaInfo {
    /// Starts a field description.
    #[must_use]
    pub fn builder(name: impl Into<String>, column_type: ColumnType) -> FieldBuilder {
        FieldBuilder::new(name, column_type)
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw (unquoted, not case folded) column name.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Logical column type.
    #[must_use]
    pub const fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Enumeration type backing an `ENUMCONST` field.
    #[must_use]
    pub fn enum_type(&self) -> Option<&str> {
        self.enum_type.as_deref()
    }

    /// Declared length, `0` when unspecified.
    #[must_use]
    pub const fn length(&self) -> u32 {
        self.length
    }

    /// Declared precision, `0` when unspecified.
    #[must_use]
    pub const fn precision(&self) -> u32 {
        self.precision
    }

    /// Declared scale, `0` when unspecified.
    #[must_use]
    pub const fn scale(&self) -> u32 {
        self.scale
    }

    /// Whether the column accepts NULL.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Raw configured default, never blank.
    #[must_use]
    pub fn default_val(&self) -> Option<&str> {
        self.default_val.as_deref()
    }

    /// Whether the field is the entity's primary key.
    #[must_use]
    pub const fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// Foreign key target, if any.
    #[must_use]
    pub const fn foreign_key(&self) -> Option<&ForeignKeyRef> {
        self.foreign_key.as_ref()
    }

    /// List-only source, if the field exists only in the entity view.
    #[must_use]
    pub const fn list_only(&self) -> Option<&ListOnlySource> {
        self.list_only.as_ref()
    }

    /// Returns `true` for list-only fields.
    #[must_use]
    pub const fn is_list_only(&self) -> bool {
        self.list_only.is_some()
    }

    /// Whether the field holds the optimistic-locking version number.
    #[must_use]
    pub const fn is_version(&self) -> bool {
        self.version
    }

    /// Stable identity of the field across renames. Defaults to the field
    /// name.
    #[must_use]
    pub fn marker(&self) -> &str {
        self.marker.as_deref().unwrap_or(&self.name)
    }

    /// Whether [`resolve`](Self::resolve) has run.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Fixes the field's column type and enumeration type.
    ///
    /// Fails with [`SqlGenError::AlreadyResolved`] on a second call.
    pub fn resolve(&mut self, column_type: ColumnType, enum_type: Option<String>) -> Result<()> {
        if self.resolved {
            return Err(SqlGenError::AlreadyResolved(self.name.clone()));
        }
        self.column_type = column_type;
        self.enum_type = enum_type;
        self.resolved = true;
        Ok(())
    }
}

/// Builder for [`FieldSchemaInfo`].
#[derive(Debug, Clone)]
#[must_use]
pub struct FieldBuilder {
    inner: FieldSchemaInfo,
}

impl FieldBuilder {
    fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        let name = name.into();
        let column = schema_element_name(&name);
        Self {
            inner: FieldSchemaInfo {
                name,
                column,
                column_type,
                enum_type: None,
                length: 0,
                precision: 0,
                scale: 0,
                nullable: false,
                default_val: None,
                primary_key: false,
                foreign_key: None,
                list_only: None,
                version: false,
                marker: None,
                resolved: false,
            },
        }
    }

    /// Overrides the derived column name.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.inner.column = column.into();
        self
    }

    /// Sets the backing enumeration type.
    pub fn enum_type(mut self, enum_type: impl Into<String>) -> Self {
        self.inner.enum_type = Some(enum_type.into());
        self
    }

    /// Sets the declared length.
    pub const fn length(mut self, length: u32) -> Self {
        self.inner.length = length;
        self
    }

    /// Sets precision and scale.
    pub const fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.inner.precision = precision;
        self.inner.scale = scale;
        self
    }

    /// Marks the column nullable.
    pub const fn nullable(mut self) -> Self {
        self.inner.nullable = true;
        self
    }

    /// Sets the raw default. Blank defaults are ignored.
    pub fn default_val(mut self, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        self.inner.default_val = if raw.trim().is_empty() {
            None
        } else {
            Some(raw)
        };
        self
    }

    /// Marks the field as the primary key.
    pub const fn primary_key(mut self) -> Self {
        self.inner.primary_key = true;
        self.inner.nullable = false;
        self
    }

    /// References the primary key field of another entity.
    pub fn foreign_key(mut self, entity: impl Into<String>, field: impl Into<String>) -> Self {
        self.inner.foreign_key = Some(ForeignKeyRef {
            entity: entity.into(),
            field: field.into(),
        });
        self
    }

    /// Makes the field list-only, projected from `source_field` of the
    /// entity referenced by `key_field`.
    pub fn list_only(mut self, key_field: impl Into<String>, source_field: impl Into<String>) -> Self {
        self.inner.list_only = Some(ListOnlySource {
            key_field: key_field.into(),
            source_field: source_field.into(),
        });
        self
    }

    /// Marks the field as the version number checked by the
    /// `*_by_pk_version` statements.
    pub const fn version(mut self) -> Self {
        self.inner.version = true;
        self
    }

    /// Sets a marker that survives renames of the field or its column.
    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.inner.marker = Some(marker.into());
        self
    }

    /// Finishes the description.
    #[must_use]
    pub fn build(self) -> FieldSchemaInfo {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_element_name() {
        assert_eq!(schema_element_name("createdOn"), "CREATED_ON");
        assert_eq!(schema_element_name("id"), "ID");
        assert_eq!(schema_element_name("addressLine2"), "ADDRESS_LINE2");
        assert_eq!(schema_element_name("URL"), "URL");
    }

    #[test]
    fn test_builder_defaults() {
        let f = FieldSchemaInfo::builder("firstName", ColumnType::String)
            .length(64)
            .build();
        assert_eq!(f.column(), "FIRST_NAME");
        assert_eq!(f.length(), 64);
        assert!(!f.is_nullable());
        assert!(f.default_val().is_none());
        assert!(!f.is_resolved());
    }

    #[test]
    fn test_marker_defaults_to_name() {
        let plain = FieldSchemaInfo::builder("code", ColumnType::String).build();
        assert_eq!(plain.marker(), "code");
        let marked = FieldSchemaInfo::builder("reference", ColumnType::String)
            .marker("f7")
            .build();
        assert_eq!(marked.marker(), "f7");
        assert!(!marked.is_version());
    }

    #[test]
    fn test_blank_default_is_dropped() {
        let f = FieldSchemaInfo::builder("code", ColumnType::String)
            .default_val("   ")
            .build();
        assert!(f.default_val().is_none());
    }

    #[test]
    fn test_resolve_is_one_shot() {
        let mut f = FieldSchemaInfo::builder("status", ColumnType::String).build();
        f.resolve(ColumnType::EnumConstant, Some("RecordStatus".into()))
            .unwrap();
        assert_eq!(f.column_type(), ColumnType::EnumConstant);
        assert_eq!(f.enum_type(), Some("RecordStatus"));

        let err = f.resolve(ColumnType::String, None).unwrap_err();
        assert!(matches!(err, SqlGenError::AlreadyResolved(name) if name == "status"));
        assert_eq!(f.column_type(), ColumnType::EnumConstant);
    }
}
