//! Entity schema descriptions.

use serde::{Deserialize, Serialize};

use super::field::{schema_element_name, FieldSchemaInfo};
use crate::error::{Result, SqlGenError};
use crate::types::ColumnType;

/// A named index over one or more fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchemaInfo {
    /// Index name.
    pub name: String,
    /// Indexed field names, in order.
    pub field_names: Vec<String>,
    /// Whether the index is unique.
    #[serde(default)]
    pub unique: bool,
}

/// A named unique constraint over one or more fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueConstraintSchemaInfo {
    /// Constraint name.
    pub name: String,
    /// Constrained field names, in order.
    pub field_names: Vec<String>,
}

/// A named check constraint restricting a field to a set of values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckConstraintSchemaInfo {
    /// Constraint name.
    pub name: String,
    /// Checked field.
    pub field_name: String,
    /// Allowed values, rendered as literals of the field's type.
    pub allowed: Vec<String>,
}

/// Immutable description of an entity: its table, optional view, fields and
/// constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchemaInfo {
    name: String,
    table: String,
    #[serde(default)]
    view: Option<String>,
    #[serde(default)]
    schema: Option<String>,
    fields: Vec<FieldSchemaInfo>,
    #[serde(default)]
    indexes: Vec<IndexSchemaInfo>,
    #[serde(default)]
    unique_constraints: Vec<UniqueConstraintSchemaInfo>,
    #[serde(default)]
    check_constraints: Vec<CheckConstraintSchemaInfo>,
}

impl EntitySchemaInfo {
    /// Starts an entity description.
    pub fn builder(name: impl Into<String>) -> EntityBuilder {
        EntityBuilder::new(name)
    }

    /// Parses an entity description from JSON and validates it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entity: Self = serde_json::from_str(json)?;
        entity.validate()?;
        Ok(entity)
    }

    /// Entity name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Raw view name, when the entity has list-only fields or asks for one.
    #[must_use]
    pub fn view(&self) -> Option<&str> {
        self.view.as_deref()
    }

    /// Explicit schema, overriding the dialect default.
    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// All fields, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSchemaInfo] {
        &self.fields
    }

    /// Mutable access to a field, used by the one-shot resolution step.
    pub fn field_mut(&mut self, name: &str) -> Result<&mut FieldSchemaInfo> {
        let entity = self.name.clone();
        self.fields
            .iter_mut()
            .find(|f| f.name() == name)
            .ok_or(SqlGenError::UnknownField {
                entity,
                field: name.to_string(),
            })
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Result<&FieldSchemaInfo> {
        self.fields
            .iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| SqlGenError::UnknownField {
                entity: self.name.clone(),
                field: name.to_string(),
            })
    }

    /// Index declarations.
    #[must_use]
    pub fn indexes(&self) -> &[IndexSchemaInfo] {
        &self.indexes
    }

    /// Unique constraint declarations.
    #[must_use]
    pub fn unique_constraints(&self) -> &[UniqueConstraintSchemaInfo] {
        &self.unique_constraints
    }

    /// Check constraint declarations.
    #[must_use]
    pub fn check_constraints(&self) -> &[CheckConstraintSchemaInfo] {
        &self.check_constraints
    }

    fn validate(&self) -> Result<()> {
        let names = self
            .indexes
            .iter()
            .flat_map(|i| &i.field_names)
            .chain(self.unique_constraints.iter().flat_map(|u| &u.field_names))
            .chain(self.check_constraints.iter().map(|c| &c.field_name));
        for name in names {
            let field = self.field(name)?;
            if field.is_list_only() {
                return Err(SqlGenError::UnknownField {
                    entity: self.name.clone(),
                    field: name.clone(),
                });
            }
        }
        let mut markers = std::collections::HashSet::new();
        let mut versions = 0;
        for field in &self.fields {
            if !markers.insert(field.marker()) {
                return Err(SqlGenError::Config(format!(
                    "entity '{}' has duplicate field marker '{}'",
                    self.name,
                    field.marker()
                )));
            }
            if field.is_version() {
                versions += 1;
                let integral = matches!(
                    field.column_type(),
                    ColumnType::Short | ColumnType::Integer | ColumnType::Long
                );
                if versions > 1 || !integral || field.is_list_only() {
                    return Err(SqlGenError::Config(format!(
                        "entity '{}' needs a single integral table field as version, got '{}'",
                        self.name,
                        field.name()
                    )));
                }
            }
            if let Some(src) = field.list_only() {
                let key = self.field(&src.key_field)?;
                if key.foreign_key().is_none() {
                    return Err(SqlGenError::UnknownField {
                        entity: self.name.clone(),
                        field: src.key_field.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Builder for [`EntitySchemaInfo`].
#[derive(Debug, Clone)]
#[must_use]
pub struct EntityBuilder {
    inner: EntitySchemaInfo,
}

impl EntityBuilder {
    fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let table = schema_element_name(&name);
        Self {
            inner: EntitySchemaInfo {
                name,
                table,
                view: None,
                schema: None,
                fields: Vec::new(),
                indexes: Vec::new(),
                unique_constraints: Vec::new(),
                check_constraints: Vec::new(),
            },
        }
    }

    /// Overrides the derived table name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.inner.table = table.into();
        self
    }

    /// Sets the view name.
    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.inner.view = Some(view.into());
        self
    }

    /// Sets an explicit schema.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.inner.schema = Some(schema.into());
        self
    }

    /// Adds a field.
    pub fn field(mut self, field: FieldSchemaInfo) -> Self {
        self.inner.fields.push(field);
        self
    }

    /// Adds an index.
    pub fn index(mut self, name: impl Into<String>, field_names: &[&str], unique: bool) -> Self {
        self.inner.indexes.push(IndexSchemaInfo {
            name: name.into(),
            field_names: field_names.iter().map(|s| (*s).to_string()).collect(),
            unique,
        });
        self
    }

    /// Adds a unique constraint.
    pub fn unique_constraint(mut self, name: impl Into<String>, field_names: &[&str]) -> Self {
        self.inner
            .unique_constraints
            .push(UniqueConstraintSchemaInfo {
                name: name.into(),
                field_names: field_names.iter().map(|s| (*s).to_string()).collect(),
            });
        self
    }

    /// Adds a check constraint limiting `field_name` to `allowed` literals.
    pub fn check_constraint(
        mut self,
        name: impl Into<String>,
        field_name: impl Into<String>,
        allowed: &[&str],
    ) -> Self {
        self.inner.check_constraints.push(CheckConstraintSchemaInfo {
            name: name.into(),
            field_name: field_name.into(),
            allowed: allowed.iter().map(|s| (*s).to_string()).collect(),
        });
        self
    }

    /// Validates references and finishes the description.
    ///
    /// A view name is derived (`V_<table>`) when a list-only field exists
    /// and none was given.
    pub fn build(mut self) -> Result<EntitySchemaInfo> {
        if self.inner.view.is_none() && self.inner.fields.iter().any(FieldSchemaInfo::is_list_only)
        {
            self.inner.view = Some(format!("V_{}", self.inner.table));
        }
        self.inner.validate()?;
        Ok(self.inner)
    }
}
