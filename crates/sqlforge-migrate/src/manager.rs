//! Table-level schema reconciliation.
//!
//! [`SchemaManager`] compares registered entities with a
//! [`DatabaseSnapshot`] and plans the statements that bring each table, its
//! constraints and its view in line. Entities are processed after the
//! entities they reference, so that foreign keys always find their target.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use sqlforge_core::{
    ColumnInfo, Dialect, Emitter, EntityRegistry, EntitySchemaInfo, PrintFormat, SqlEntityInfo,
    SqlFieldInfo,
};

use crate::error::{MigrateError, Result};
use crate::metadata::{DatabaseSnapshot, ObjectType, TableMetadata};

/// Options for schema reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaManagerOptions {
    /// Statement layout.
    pub format: PrintFormat,
    /// Whether foreign key constraints are created. When off, existing
    /// foreign keys on managed tables are dropped.
    pub force_constraints: bool,
}

impl Default for SchemaManagerOptions {
    fn default() -> Self {
        Self {
            format: PrintFormat::Compact,
            force_constraints: true,
        }
    }
}

impl SchemaManagerOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the statement layout.
    #[must_use]
    pub const fn format(mut self, format: PrintFormat) -> Self {
        self.format = format;
        self
    }

    /// Stops creating foreign key constraints.
    #[must_use]
    pub const fn without_constraints(mut self) -> Self {
        self.force_constraints = false;
        self
    }
}

/// Statements for one entity: its table first, then its view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableScript {
    /// Entity name.
    pub entity: String,
    /// Statements, in execution order.
    pub statements: Vec<String>,
}

/// An ordered upgrade script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradePlan {
    /// Views dropped before any table changes, for dialects that cannot
    /// alter tables under a view.
    pub view_drops: Vec<String>,
    /// Per-entity scripts, referenced entities first.
    pub scripts: Vec<TableScript>,
}

impl UpgradePlan {
    /// Every statement, in execution order.
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.view_drops
            .iter()
            .chain(self.scripts.iter().flat_map(|s| s.statements.iter()))
            .map(String::as_str)
    }

    /// Total number of statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.view_drops.len() + self.scripts.iter().map(|s| s.statements.len()).sum::<usize>()
    }

    /// Returns `true` when the database is already up to date.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The script of `entity`, if it has any statements.
    #[must_use]
    pub fn script(&self, entity: &str) -> Option<&TableScript> {
        self.scripts
            .iter()
            .find(|s| s.entity == entity && !s.statements.is_empty())
    }
}

/// Existing constraint not claimed by any desired constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstraintKind {
    ForeignKey,
    Unique,
    Index,
}

fn same_columns(observed: &[String], desired: &[&str]) -> bool {
    observed.len() == desired.len()
        && desired
            .iter()
            .all(|d| observed.iter().any(|o| o.eq_ignore_ascii_case(d)))
}

/// Removes `name` from the leftovers; returns whether it was there.
fn claim(leftovers: &mut Vec<(String, ConstraintKind)>, name: &str, kind: ConstraintKind) -> bool {
    match leftovers
        .iter()
        .position(|(n, k)| *k == kind && n.eq_ignore_ascii_case(name))
    {
        Some(i) => {
            leftovers.remove(i);
            true
        }
        None => false,
    }
}

/// The column `field` declares, as the catalog would report it.
fn declared_column(dialect: &Dialect, field: &SqlFieldInfo) -> ColumnInfo {
    let policy = dialect.type_policy(field.column_type());
    let (size, decimal_digits) = policy
        .native_dimensions(field.length(), field.precision(), field.scale())
        .unwrap_or((0, 0));
    ColumnInfo {
        name: field.column_name().to_string(),
        native_type: policy.native_type(),
        type_name: field.type_decl().to_string(),
        size,
        decimal_digits,
        nullable: field.is_nullable(),
        default_val: field.default_literal().map(str::to_string),
    }
}

/// Plain stored columns, the ones an upgrade may rename, alter, add or drop.
fn upgradable(field: &SqlFieldInfo) -> bool {
    !field.is_primary_key() && !field.is_list_only()
}

// ================================================================
// Manager
// ================================================================

/// Plans schema upgrades for the entities of one registry.
#[derive(Debug)]
pub struct SchemaManager<'r> {
    registry: &'r EntityRegistry,
    options: SchemaManagerOptions,
}

impl<'r> SchemaManager<'r> {
    /// Creates a manager with default options.
    #[must_use]
    pub fn new(registry: &'r EntityRegistry) -> Self {
        Self::with_options(registry, SchemaManagerOptions::default())
    }

    /// Creates a manager with custom options.
    #[must_use]
    pub const fn with_options(registry: &'r EntityRegistry, options: SchemaManagerOptions) -> Self {
        Self { registry, options }
    }

    fn emitter(&self) -> Emitter<'_> {
        Emitter::new(self.registry.dialect(), self.options.format)
    }

    /// Orders `names` so that every entity follows the entities its
    /// foreign keys reference. Referenced entities not listed are included.
    /// Self references are ignored; cycles are broken at the first entity
    /// revisited.
    pub fn dependency_order(&self, names: &[&str]) -> Result<Vec<Arc<SqlEntityInfo>>> {
        let mut ordered = Vec::new();
        let mut visited = HashSet::new();
        for name in names {
            self.visit(name, &mut ordered, &mut visited)?;
        }
        Ok(ordered)
    }

    fn visit(
        &self,
        name: &str,
        ordered: &mut Vec<Arc<SqlEntityInfo>>,
        visited: &mut HashSet<String>,
    ) -> Result<()> {
        if !visited.insert(name.to_string()) {
            return Ok(());
        }
        debug!(entity = name, "Building dependency list");
        let entity = self.registry.get(name)?;
        for field in entity.table_fields() {
            if let Some(reference) = field.foreign_key() {
                if reference.entity != entity.name() {
                    self.visit(&reference.entity, ordered, visited)?;
                }
            }
        }
        ordered.push(entity);
        Ok(())
    }

    /// Plans the upgrade of `names` (and the entities they reference)
    /// against `snapshot`.
    pub fn plan_upgrade(&self, names: &[&str], snapshot: &DatabaseSnapshot) -> Result<UpgradePlan> {
        let entities = self.dependency_order(names)?;
        let dialect = self.registry.dialect();
        info!(
            dialect = %dialect.name(),
            entities = entities.len(),
            "Scanning schema"
        );

        let mut table_scripts = Vec::with_capacity(entities.len());
        for entity in &entities {
            table_scripts.push(self.table_statements(entity, snapshot)?);
        }

        let reconstruct =
            dialect.reconstructs_views() && table_scripts.iter().any(|s| !s.is_empty());
        let view_drops = if reconstruct {
            self.drop_views(&entities, snapshot)?
        } else {
            Vec::new()
        };

        let mut scripts = Vec::with_capacity(entities.len());
        for (entity, mut statements) in entities.iter().zip(table_scripts) {
            let changed = !statements.is_empty();
            statements.extend(self.view_statements(entity, snapshot, changed, reconstruct)?);
            if !statements.is_empty() {
                info!(
                    table = entity.table(),
                    statements = statements.len(),
                    "Table schema updated"
                );
            }
            scripts.push(TableScript {
                entity: entity.name().to_string(),
                statements,
            });
        }

        let plan = UpgradePlan { view_drops, scripts };
        info!(statements = plan.len(), "Schema upgrade planned");
        Ok(plan)
    }

    /// Plans the upgrade of entity `name` from a previous version of its
    /// schema, `old`, without reading the catalog.
    ///
    /// Fields are paired across versions by marker: a paired field whose
    /// column name changed is renamed in place and then altered, unpaired
    /// new fields are added and unpaired old fields are dropped. A changed
    /// table name is renamed first. The view is rebuilt whenever anything
    /// changed.
    pub fn plan_schema_upgrade(&self, old: &EntitySchemaInfo, name: &str) -> Result<TableScript> {
        let entity = self.registry.get(name)?;
        let dialect = self.registry.dialect();
        let previous = SqlEntityInfo::resolve(dialect, old)?;
        let emitter = self.emitter();

        let mut statements = Vec::new();
        if !previous.table_name().eq_ignore_ascii_case(entity.table_name()) {
            info!(from = previous.table(), to = entity.table(), "Renaming table");
            statements.push(emitter.rename_table(&previous, entity.table_name()));
        }

        let mut renames = Vec::new();
        let mut alterations = Vec::new();
        let mut additions = Vec::new();
        for field in entity.table_fields().filter(|f| upgradable(f)) {
            match previous
                .field_by_marker(field.marker())
                .filter(|f| upgradable(f))
            {
                Some(before) => {
                    if !before.column_name().eq_ignore_ascii_case(field.column_name()) {
                        debug!(
                            table = entity.table(),
                            from = before.column(),
                            to = field.column(),
                            "Renaming column"
                        );
                        renames.push(emitter.rename_column(&entity, field.name(), before.column_name())?);
                    }
                    alterations.extend(emitter.alter_column(
                        &entity,
                        field.name(),
                        &declared_column(dialect, before),
                    )?);
                }
                None => additions.extend(emitter.add_column(&entity, field.name())?),
            }
        }
        let drops = previous
            .table_fields()
            .filter(|f| upgradable(f))
            .filter(|f| !entity.field_by_marker(f.marker()).is_some_and(upgradable))
            .map(|f| {
                warn!(table = entity.table(), column = f.column(), "Dropping column");
                emitter.drop_column(&entity, f.column_name())
            });
        statements.extend(renames);
        statements.extend(alterations);
        statements.extend(additions);
        statements.extend(drops);

        if !statements.is_empty() {
            if let Some(drop) = emitter.drop_view(&previous) {
                statements.insert(0, drop);
            }
            if entity.view().is_some() {
                statements.extend(emitter.create_view(&entity, self.registry)?);
            }
            info!(
                table = entity.table(),
                statements = statements.len(),
                "Table schema upgraded"
            );
        }
        Ok(TableScript {
            entity: entity.name().to_string(),
            statements,
        })
    }

    /// Drops the existing views of `entities`.
    pub fn drop_views(
        &self,
        entities: &[Arc<SqlEntityInfo>],
        snapshot: &DatabaseSnapshot,
    ) -> Result<Vec<String>> {
        let emitter = self.emitter();
        let mut statements = Vec::new();
        for entity in entities {
            let Some(view_name) = entity.view_name() else {
                continue;
            };
            if let Some(existing) = snapshot.find(view_name) {
                if existing.object_type != ObjectType::View {
                    return Err(MigrateError::TableTypeConflict {
                        name: view_name.to_string(),
                        found: existing.object_type,
                    });
                }
                statements.extend(emitter.drop_view(entity));
            }
        }
        Ok(statements)
    }

    /// Statements creating or converging the table of `entity`.
    fn table_statements(&self, entity: &SqlEntityInfo, snapshot: &DatabaseSnapshot) -> Result<Vec<String>> {
        debug!(table = entity.table_name(), "Getting metadata for table");
        match snapshot.find(entity.table_name()) {
            Some(existing) if existing.object_type != ObjectType::Table => {
                Err(MigrateError::TableTypeConflict {
                    name: entity.table_name().to_string(),
                    found: existing.object_type,
                })
            }
            Some(existing) => {
                let mut statements = self.column_statements(entity, existing)?;
                statements.extend(self.constraint_statements(entity, existing)?);
                Ok(statements)
            }
            None => {
                info!(table = entity.table(), "Creating table");
                self.create_statements(entity)
            }
        }
    }

    fn create_statements(&self, entity: &SqlEntityInfo) -> Result<Vec<String>> {
        let emitter = self.emitter();
        let mut statements = emitter.create_table(entity)?;
        if self.options.force_constraints {
            for field in entity.table_fields().filter(|f| f.foreign_key().is_some()) {
                statements.push(emitter.add_foreign_key(entity, field.name(), self.registry)?);
            }
        }
        if !emitter.generates_constraints_on_create() {
            for constraint in entity.unique_constraints() {
                statements.push(emitter.add_unique_constraint(entity, constraint)?);
            }
            for index in entity.indexes() {
                statements.push(emitter.create_index(entity, index)?);
            }
        }
        for check in entity.check_constraints() {
            statements.push(emitter.create_check_constraint(entity, check)?);
        }
        Ok(statements)
    }

    /// Added and altered columns, then abandoned NOT NULL columns relaxed.
    fn column_statements(&self, entity: &SqlEntityInfo, existing: &TableMetadata) -> Result<Vec<String>> {
        let emitter = self.emitter();
        let mut remaining: Vec<_> = existing.columns.iter().collect();
        let mut statements = Vec::new();
        for field in entity.table_fields() {
            let found = remaining
                .iter()
                .position(|c| c.name.eq_ignore_ascii_case(field.column_name()));
            match found {
                Some(i) => {
                    let observed = remaining.remove(i);
                    statements.extend(emitter.alter_column(entity, field.name(), observed)?);
                }
                None => {
                    debug!(table = entity.table(), column = field.column(), "Adding column");
                    statements.extend(emitter.add_column(entity, field.name())?);
                }
            }
        }
        for abandoned in remaining.into_iter().filter(|c| !c.nullable) {
            warn!(
                table = entity.table(),
                column = %abandoned.name,
                "Column has no field; making it nullable"
            );
            statements.push(emitter.alter_column_nullable(entity, abandoned));
        }
        Ok(statements)
    }

    /// Constraint drops first, then additions. Existing constraints that
    /// match a desired one are left alone; the rest are dropped.
    fn constraint_statements(
        &self,
        entity: &SqlEntityInfo,
        existing: &TableMetadata,
    ) -> Result<Vec<String>> {
        let emitter = self.emitter();
        let mut leftovers: Vec<(String, ConstraintKind)> = existing
            .foreign_keys
            .iter()
            .map(|fk| (fk.name.clone(), ConstraintKind::ForeignKey))
            .chain(
                existing
                    .unique_constraints
                    .iter()
                    .map(|uc| (uc.name.clone(), ConstraintKind::Unique)),
            )
            .chain(
                existing
                    .indexes
                    .iter()
                    .map(|idx| (idx.name.clone(), ConstraintKind::Index)),
            )
            .collect();
        let mut additions = Vec::new();

        if self.options.force_constraints {
            for field in entity.table_fields() {
                let Some(reference) = field.foreign_key() else {
                    continue;
                };
                let name = Emitter::foreign_key_name(entity, field);
                let target = self.registry.get(&reference.entity)?;
                let target_column = target.field(&reference.field)?.column_name();
                let matches = existing.foreign_keys.iter().any(|fk| {
                    fk.name.eq_ignore_ascii_case(&name)
                        && fk.ref_table.eq_ignore_ascii_case(target.table_name())
                        && fk.ref_columns.iter().any(|c| c.eq_ignore_ascii_case(target_column))
                });
                if !(matches && claim(&mut leftovers, &name, ConstraintKind::ForeignKey)) {
                    additions.push(emitter.add_foreign_key(entity, field.name(), self.registry)?);
                }
            }
        }

        for constraint in entity.unique_constraints() {
            let columns = Self::column_names(entity, &constraint.field_names)?;
            let matches = existing.unique_constraints.iter().any(|uc| {
                uc.name.eq_ignore_ascii_case(&constraint.name) && same_columns(&uc.columns, &columns)
            });
            if !(matches && claim(&mut leftovers, &constraint.name, ConstraintKind::Unique)) {
                additions.push(emitter.add_unique_constraint(entity, constraint)?);
            }
        }

        for index in entity.indexes() {
            let columns = Self::column_names(entity, &index.field_names)?;
            let matches = existing.indexes.iter().any(|idx| {
                idx.name.eq_ignore_ascii_case(&index.name)
                    && idx.unique == index.unique
                    && same_columns(&idx.columns, &columns)
            });
            if !(matches && claim(&mut leftovers, &index.name, ConstraintKind::Index)) {
                additions.push(emitter.create_index(entity, index)?);
            }
        }

        for check in entity.check_constraints() {
            let present = existing
                .check_constraints
                .iter()
                .any(|name| name.eq_ignore_ascii_case(&check.name));
            if !present {
                additions.push(emitter.create_check_constraint(entity, check)?);
            }
        }

        let mut statements: Vec<String> = leftovers
            .into_iter()
            .map(|(name, kind)| {
                debug!(table = entity.table(), constraint = %name, ?kind, "Dropping constraint");
                match kind {
                    ConstraintKind::ForeignKey => emitter.drop_foreign_key(entity, &name),
                    ConstraintKind::Unique => emitter.drop_unique_constraint(entity, &name),
                    ConstraintKind::Index => emitter.drop_index(entity, &name),
                }
            })
            .collect();
        statements.extend(additions);
        Ok(statements)
    }

    fn column_names<'e>(entity: &'e SqlEntityInfo, field_names: &[String]) -> Result<Vec<&'e str>> {
        field_names
            .iter()
            .map(|f| Ok(entity.field(f)?.column_name()))
            .collect()
    }

    /// View statements for `entity`. A view is (re)created when missing,
    /// when its table changed, or when it lacks a list-only column.
    fn view_statements(
        &self,
        entity: &SqlEntityInfo,
        snapshot: &DatabaseSnapshot,
        table_changed: bool,
        views_dropped: bool,
    ) -> Result<Vec<String>> {
        let Some(view_name) = entity.view_name() else {
            return Ok(Vec::new());
        };
        let emitter = self.emitter();
        let mut statements = Vec::new();
        let create = match snapshot.find(view_name) {
            Some(existing) if existing.object_type != ObjectType::View => {
                return Err(MigrateError::TableTypeConflict {
                    name: view_name.to_string(),
                    found: existing.object_type,
                });
            }
            Some(_) if views_dropped => true,
            Some(existing) => {
                let stale = table_changed
                    || !entity
                        .list_fields()
                        .all(|f| existing.find_column(f.column_name()).is_some());
                if stale {
                    statements.extend(emitter.drop_view(entity));
                }
                stale
            }
            None => true,
        };
        if create {
            statements.extend(emitter.create_view(entity, self.registry)?);
        }
        Ok(statements)
    }
}
