//! Observed database objects.
//!
//! A [`DatabaseSnapshot`] is what a driver read from the catalog: tables and
//! views with their columns and constraints. Names are compared without
//! regard to case, since catalogs report them folded.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sqlforge_core::ColumnInfo;

use crate::error::Result;

/// Kind of a catalog object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    /// A base table.
    #[default]
    Table,
    /// A view.
    View,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::View => write!(f, "view"),
        }
    }
}

/// An existing foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyMetadata {
    /// Constraint name.
    pub name: String,
    /// Referenced table.
    pub ref_table: String,
    /// Referenced columns.
    pub ref_columns: Vec<String>,
}

/// An existing index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Index name.
    pub name: String,
    /// Indexed columns.
    pub columns: Vec<String>,
    /// Whether the index is unique.
    #[serde(default)]
    pub unique: bool,
}

/// An existing unique constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueConstraintMetadata {
    /// Constraint name.
    pub name: String,
    /// Constrained columns.
    pub columns: Vec<String>,
}

/// A table or view as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Object name as stored.
    pub name: String,
    /// Table or view.
    #[serde(default)]
    pub object_type: ObjectType,
    /// Columns, in ordinal order.
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
    /// Foreign keys declared on the table.
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyMetadata>,
    /// Indexes, excluding those backing constraints.
    #[serde(default)]
    pub indexes: Vec<IndexMetadata>,
    /// Unique constraints.
    #[serde(default)]
    pub unique_constraints: Vec<UniqueConstraintMetadata>,
    /// Names of check constraints.
    #[serde(default)]
    pub check_constraints: Vec<String>,
}

impl TableMetadata {
    /// An empty table.
    #[must_use]
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            object_type: ObjectType::Table,
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
            unique_constraints: Vec::new(),
            check_constraints: Vec::new(),
        }
    }

    /// An empty view.
    #[must_use]
    pub fn view(name: impl Into<String>) -> Self {
        Self {
            object_type: ObjectType::View,
            ..Self::table(name)
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: ColumnInfo) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds a foreign key.
    #[must_use]
    pub fn foreign_key(mut self, name: &str, ref_table: &str, ref_columns: &[&str]) -> Self {
        self.foreign_keys.push(ForeignKeyMetadata {
            name: name.to_string(),
            ref_table: ref_table.to_string(),
            ref_columns: ref_columns.iter().map(|c| (*c).to_string()).collect(),
        });
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, name: &str, columns: &[&str], unique: bool) -> Self {
        self.indexes.push(IndexMetadata {
            name: name.to_string(),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            unique,
        });
        self
    }

    /// Adds a unique constraint.
    #[must_use]
    pub fn unique_constraint(mut self, name: &str, columns: &[&str]) -> Self {
        self.unique_constraints.push(UniqueConstraintMetadata {
            name: name.to_string(),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
        });
        self
    }

    /// Adds a check constraint name.
    #[must_use]
    pub fn check_constraint(mut self, name: &str) -> Self {
        self.check_constraints.push(name.to_string());
        self
    }

    /// Looks a column up by name.
    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// The catalog objects of one schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    /// Tables and views.
    #[serde(default)]
    pub tables: Vec<TableMetadata>,
}

impl DatabaseSnapshot {
    /// An empty snapshot, as of a fresh database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table or view.
    #[must_use]
    pub fn with(mut self, table: TableMetadata) -> Self {
        self.tables.push(table);
        self
    }

    /// Parses a JSON snapshot.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON snapshot file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Looks an object up by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&TableMetadata> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }
}
