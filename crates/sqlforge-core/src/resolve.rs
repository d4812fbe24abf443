//! Dialect-resolved entity descriptions.
//!
//! [`SqlEntityInfo::resolve`] turns an [`EntitySchemaInfo`] into names,
//! effective types and rendered defaults for one dialect. The result is
//! immutable; [`EntityRegistry`] resolves each entity once and shares it.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::dialect::Dialect;
use crate::error::{Result, SqlGenError};
use crate::schema::{
    CheckConstraintSchemaInfo, EntitySchemaInfo, FieldSchemaInfo, ForeignKeyRef, IndexSchemaInfo,
    ListOnlySource, UniqueConstraintSchemaInfo,
};
use crate::types::ColumnType;

/// A field resolved against a dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFieldInfo {
    name: String,
    column: String,
    column_name: String,
    declared_type: ColumnType,
    column_type: ColumnType,
    type_decl: String,
    length: u32,
    precision: u32,
    scale: u32,
    nullable: bool,
    primary_key: bool,
    default_val: Option<String>,
    default_literal: Option<String>,
    foreign_key: Option<ForeignKeyRef>,
    list_only: Option<ListOnlySource>,
    version: bool,
    marker: String,
}

impl SqlFieldInfo {
    /// Resolves one field. Fails when its default cannot be rendered.
    pub fn resolve(dialect: &Dialect, field: &FieldSchemaInfo) -> Result<Self> {
        let column_type = dialect.effective_type(field.column_type(), field.length());
        let policy = dialect.type_policy(column_type);
        let default_literal = field
            .default_val()
            .map(|raw| policy.render_default(raw))
            .transpose()?;
        Ok(Self {
            name: field.name().to_string(),
            column: dialect.identifiers().preferred(field.column()),
            column_name: field.column().to_string(),
            declared_type: field.column_type(),
            column_type,
            type_decl: policy.render_type(field.length(), field.precision(), field.scale()),
            length: field.length(),
            precision: field.precision(),
            scale: field.scale(),
            nullable: field.is_nullable(),
            primary_key: field.is_primary_key(),
            default_val: field.default_val().map(str::to_string),
            default_literal,
            foreign_key: field.foreign_key().cloned(),
            list_only: field.list_only().cloned(),
            version: field.is_version(),
            marker: field.marker().to_string(),
        })
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Preferred column name: case folded and quoted when needed.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Raw column name.
    #[must_use]
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// Type as declared by the schema.
    #[must_use]
    pub const fn declared_type(&self) -> ColumnType {
        self.declared_type
    }

    /// Type after the dialect's string overflow rule.
    #[must_use]
    pub const fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Rendered type declaration.
    #[must_use]
    pub fn type_decl(&self) -> &str {
        &self.type_decl
    }

    #[must_use]
    pub const fn length(&self) -> u32 {
        self.length
    }

    #[must_use]
    pub const fn precision(&self) -> u32 {
        self.precision
    }

    #[must_use]
    pub const fn scale(&self) -> u32 {
        self.scale
    }

    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[must_use]
    pub const fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// Integral primary keys are generated by the database.
    #[must_use]
    pub const fn is_identity(&self) -> bool {
        self.primary_key && matches!(self.column_type, ColumnType::Integer | ColumnType::Long)
    }

    /// Raw configured default.
    #[must_use]
    pub fn default_val(&self) -> Option<&str> {
        self.default_val.as_deref()
    }

    /// Configured default rendered as a literal of this dialect.
    #[must_use]
    pub fn default_literal(&self) -> Option<&str> {
        self.default_literal.as_deref()
    }

    #[must_use]
    pub const fn foreign_key(&self) -> Option<&ForeignKeyRef> {
        self.foreign_key.as_ref()
    }

    #[must_use]
    pub const fn list_only(&self) -> Option<&ListOnlySource> {
        self.list_only.as_ref()
    }

    #[must_use]
    pub const fn is_list_only(&self) -> bool {
        self.list_only.is_some()
    }

    /// Whether the field holds the optimistic-locking version number.
    #[must_use]
    pub const fn is_version(&self) -> bool {
        self.version
    }

    /// Identity of the field across renames.
    #[must_use]
    pub fn marker(&self) -> &str {
        &self.marker
    }
}

/// An entity resolved against a dialect.
#[derive(Debug, Clone)]
pub struct SqlEntityInfo {
    name: String,
    schema: Option<String>,
    table: String,
    table_name: String,
    view: Option<String>,
    view_name: Option<String>,
    fields: Vec<SqlFieldInfo>,
    by_name: HashMap<String, usize>,
    source: EntitySchemaInfo,
}

impl SqlEntityInfo {
    /// Resolves an entity. The entity's schema wins over the dialect's
    /// default schema.
    pub fn resolve(dialect: &Dialect, entity: &EntitySchemaInfo) -> Result<Self> {
        let rules = dialect.identifiers();
        let schema = entity
            .schema()
            .map(str::to_string)
            .or_else(|| rules.schema().map(str::to_string));
        let fields = entity
            .fields()
            .iter()
            .map(|f| SqlFieldInfo::resolve(dialect, f))
            .collect::<Result<Vec<_>>>()?;
        let by_name = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        debug!(
            dialect = %dialect.name(),
            entity = entity.name(),
            fields = fields.len(),
            "Entity resolved"
        );
        Ok(Self {
            name: entity.name().to_string(),
            table: rules.qualified(schema.as_deref(), entity.table()),
            table_name: entity.table().to_string(),
            view: entity
                .view()
                .map(|v| rules.qualified(schema.as_deref(), v)),
            view_name: entity.view().map(str::to_string),
            schema,
            fields,
            by_name,
            source: entity.clone(),
        })
    }

    /// Entity name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effective schema.
    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Preferred, schema-qualified table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Raw table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Preferred, schema-qualified view name.
    #[must_use]
    pub fn view(&self) -> Option<&str> {
        self.view.as_deref()
    }

    /// Raw view name.
    #[must_use]
    pub fn view_name(&self) -> Option<&str> {
        self.view_name.as_deref()
    }

    /// All fields, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[SqlFieldInfo] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Result<&SqlFieldInfo> {
        self.by_name
            .get(name)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| SqlGenError::UnknownField {
                entity: self.name.clone(),
                field: name.to_string(),
            })
    }

    /// Looks up a field by raw column name, ignoring case.
    #[must_use]
    pub fn field_by_column(&self, column: &str) -> Option<&SqlFieldInfo> {
        self.fields
            .iter()
            .find(|f| f.column_name.eq_ignore_ascii_case(column))
    }

    /// The primary key field.
    #[must_use]
    pub fn id_field(&self) -> Option<&SqlFieldInfo> {
        self.fields.iter().find(|f| f.primary_key)
    }

    /// The version number field, for entities under optimistic locking.
    #[must_use]
    pub fn version_field(&self) -> Option<&SqlFieldInfo> {
        self.fields.iter().find(|f| f.version)
    }

    /// Looks up a field by marker.
    #[must_use]
    pub fn field_by_marker(&self, marker: &str) -> Option<&SqlFieldInfo> {
        self.fields.iter().find(|f| f.marker == marker)
    }

    /// Fields stored in the table.
    pub fn table_fields(&self) -> impl Iterator<Item = &SqlFieldInfo> {
        self.fields.iter().filter(|f| !f.is_list_only())
    }

    /// Fields that exist only in the view.
    pub fn list_fields(&self) -> impl Iterator<Item = &SqlFieldInfo> {
        self.fields.iter().filter(|f| f.is_list_only())
    }

    /// Preferred column names of `field_names`, joined with `", "`.
    pub fn column_list(&self, field_names: &[String]) -> Result<String> {
        let columns = field_names
            .iter()
            .map(|n| self.field(n).map(SqlFieldInfo::column))
            .collect::<Result<Vec<_>>>()?;
        Ok(columns.join(", "))
    }

    /// Index declarations.
    #[must_use]
    pub fn indexes(&self) -> &[IndexSchemaInfo] {
        self.source.indexes()
    }

    /// Unique constraint declarations.
    #[must_use]
    pub fn unique_constraints(&self) -> &[UniqueConstraintSchemaInfo] {
        self.source.unique_constraints()
    }

    /// Check constraint declarations.
    #[must_use]
    pub fn check_constraints(&self) -> &[CheckConstraintSchemaInfo] {
        self.source.check_constraints()
    }

    /// The description this entity was resolved from.
    #[must_use]
    pub const fn source(&self) -> &EntitySchemaInfo {
        &self.source
    }
}

/// Resolved entities of one dialect, shared across threads.
///
/// Each entity is resolved at most once; concurrent first registrations of
/// the same entity all receive the same [`Arc`].
#[derive(Debug)]
pub struct EntityRegistry {
    dialect: Arc<Dialect>,
    entities: RwLock<HashMap<String, Arc<SqlEntityInfo>>>,
}

impl EntityRegistry {
    /// Creates an empty registry for `dialect`.
    #[must_use]
    pub fn new(dialect: Arc<Dialect>) -> Self {
        Self {
            dialect,
            entities: RwLock::new(HashMap::new()),
        }
    }

    /// The dialect entities are resolved against.
    #[must_use]
    pub fn dialect(&self) -> &Arc<Dialect> {
        &self.dialect
    }

    /// Resolves and stores `entity`, or returns the stored resolution.
    pub fn register(&self, entity: &EntitySchemaInfo) -> Result<Arc<SqlEntityInfo>> {
        if let Some(found) = self
            .entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity.name())
        {
            return Ok(Arc::clone(found));
        }
        let mut entities = self
            .entities
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(found) = entities.get(entity.name()) {
            return Ok(Arc::clone(found));
        }
        let resolved = Arc::new(SqlEntityInfo::resolve(&self.dialect, entity)?);
        entities.insert(entity.name().to_string(), Arc::clone(&resolved));
        Ok(resolved)
    }

    /// Looks up a registered entity.
    pub fn get(&self, name: &str) -> Result<Arc<SqlEntityInfo>> {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| SqlGenError::UnknownEntity(name.to_string()))
    }

    /// Number of registered entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::dialect::{hsqldb, oracle, postgresql};

    fn account() -> EntitySchemaInfo {
        EntitySchemaInfo::builder("account")
            .table("ACCOUNT")
            .field(
                FieldSchemaInfo::builder("id", ColumnType::Long)
                    .primary_key()
                    .build(),
            )
            .field(
                FieldSchemaInfo::builder("notes", ColumnType::String)
                    .length(5000)
                    .nullable()
                    .build(),
            )
            .field(
                FieldSchemaInfo::builder("order", ColumnType::Integer)
                    .default_val("0")
                    .build(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_resolve_names_and_types() {
        let d = postgresql().unwrap();
        let e = SqlEntityInfo::resolve(&d, &account()).unwrap();
        assert_eq!(e.table(), "public.account");
        assert_eq!(e.field("order").unwrap().column(), "\"order\"");
        assert_eq!(e.field("order").unwrap().default_literal(), Some("0"));
        assert_eq!(e.field("notes").unwrap().type_decl(), "VARCHAR(5000)");
        assert!(e.id_field().unwrap().is_identity());
    }

    #[test]
    fn test_long_string_becomes_clob_on_oracle() {
        let d = oracle().unwrap();
        let e = SqlEntityInfo::resolve(&d, &account()).unwrap();
        let notes = e.field("notes").unwrap();
        assert_eq!(notes.declared_type(), ColumnType::String);
        assert_eq!(notes.column_type(), ColumnType::Clob);
        assert_eq!(notes.type_decl(), "CLOB");
        assert_eq!(e.table(), "ACCOUNT");
    }

    #[test]
    fn test_invalid_default_fails_resolution() {
        let bad = EntitySchemaInfo::builder("bad")
            .field(
                FieldSchemaInfo::builder("count", ColumnType::Short)
                    .default_val("70000")
                    .build(),
            )
            .build()
            .unwrap();
        let err = SqlEntityInfo::resolve(&hsqldb().unwrap(), &bad).unwrap_err();
        assert!(matches!(err, SqlGenError::InvalidDefault { .. }));
    }

    #[test]
    fn test_concurrent_registration_resolves_once() {
        let registry = EntityRegistry::new(Arc::new(hsqldb().unwrap()));
        let entity = account();
        let resolved: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| registry.register(&entity).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(registry.len(), 1);
        assert!(resolved.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert!(Arc::ptr_eq(&resolved[0], &registry.get("account").unwrap()));
        assert!(matches!(
            registry.get("missing"),
            Err(SqlGenError::UnknownEntity(_))
        ));
    }
}
