//! DDL and DML statement generation.
//!
//! [`Emitter`] is the entry point used by schema managers and query
//! builders. It renders names, types and defaults through a [`Dialect`] and
//! delegates column alterations to [`SchemaAlterationPlanner`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::binding::{BindingPlan, ColumnRef, ExtractionPlan, ParameterSlot, ResultSlot};
use crate::criteria::RestrictionType;
use crate::dialect::{ColumnTarget, Dialect, TimeBucket, TimeBucketExpr};
use crate::error::{Result, SqlGenError};
use crate::planner::SchemaAlterationPlanner;
use crate::resolve::{EntityRegistry, SqlEntityInfo, SqlFieldInfo};
use crate::schema::{CheckConstraintSchemaInfo, ColumnInfo, IndexSchemaInfo, UniqueConstraintSchemaInfo};
use crate::types::{ColumnType, NativeType};
use crate::value::SqlValue;

// ================================================================
// Layout
// ================================================================

/// Statement layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintFormat {
    /// Single line.
    #[default]
    Compact,
    /// One clause per line, continuation lines indented with a tab.
    Pretty,
}

impl PrintFormat {
    /// Separator between a statement head and its clauses.
    #[must_use]
    pub const fn separator(self) -> &'static str {
        match self {
            Self::Compact => " ",
            Self::Pretty => "\n\t",
        }
    }

    /// Separator between items of a parenthesized list (column definitions).
    const fn item_separator(self) -> &'static str {
        match self {
            Self::Compact => ", ",
            Self::Pretty => ",\n\t",
        }
    }

    const fn open_list(self) -> &'static str {
        match self {
            Self::Compact => "(",
            Self::Pretty => "(\n\t",
        }
    }

    const fn close_list(self) -> &'static str {
        match self {
            Self::Compact => ")",
            Self::Pretty => "\n)",
        }
    }
}

// ================================================================
// Statements and criteria
// ================================================================

/// A generated statement with its typed parameters and result columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    /// Statement text with `?` placeholders.
    pub sql: String,
    /// Parameters, in placeholder order.
    pub parameters: Vec<ParameterSlot>,
    /// Result columns, in select order.
    pub results: Vec<ResultSlot>,
}

impl SqlStatement {
    /// Pairs `values` with the statement's parameters.
    pub fn bind(&self, values: Vec<SqlValue>) -> Result<BindingPlan> {
        BindingPlan::new(&self.parameters, values)
    }

    /// Plan for reading the statement's result rows.
    #[must_use]
    pub fn extraction_plan(&self) -> ExtractionPlan {
        ExtractionPlan::new(self.results.clone())
    }
}

/// A rendered WHERE condition and the parameters its placeholders stand for.
///
/// Parameter indexes are relative to the clause and renumbered when the
/// clause is placed in a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereClause {
    /// Condition text.
    pub sql: String,
    /// Parameters, in placeholder order.
    pub parameters: Vec<ParameterSlot>,
    /// Whether the condition names list-only columns, which only exist in
    /// the entity's view.
    pub view_only: bool,
}

/// Shape of a paginated SELECT.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct SelectQuery {
    fields: Vec<String>,
    where_clause: Option<WhereClause>,
    order_by: Vec<(String, bool)>,
    offset: u32,
    limit: u32,
    distinct: bool,
    from_view: bool,
}

impl SelectQuery {
    /// Selects every table field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the selected fields.
    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| (*f).to_string()).collect();
        self
    }

    /// Sets the WHERE condition.
    pub fn filter(mut self, clause: WhereClause) -> Self {
        self.where_clause = Some(clause);
        self
    }

    /// Orders by `field`, ascending or descending.
    pub fn order_by(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.order_by.push((field.into(), ascending));
        self
    }

    /// Skips the first `offset` rows.
    pub const fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Returns at most `limit` rows. Zero means no limit.
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Adds `DISTINCT`.
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Reads from the entity view, which also carries list-only fields.
    pub const fn from_view(mut self) -> Self {
        self.from_view = true;
        self
    }
}

fn renumber(parameters: &[ParameterSlot], start: usize) -> Vec<ParameterSlot> {
    parameters
        .iter()
        .enumerate()
        .map(|(i, p)| ParameterSlot {
            index: start + i,
            ..p.clone()
        })
        .collect()
}

fn parameter(field: &SqlFieldInfo, index: usize) -> ParameterSlot {
    ParameterSlot {
        index,
        column_type: field.declared_type(),
        length: field.length(),
        field: Some(field.name().to_string()),
    }
}

fn result(field: &SqlFieldInfo, index: usize) -> ResultSlot {
    ResultSlot {
        column: ColumnRef::Index(index),
        column_type: field.declared_type(),
        length: field.length(),
        field: field.name().to_string(),
    }
}

/// Type declaration of an existing column, rebuilt from its metadata.
fn observed_type_decl(observed: &ColumnInfo) -> String {
    match observed.native_type {
        NativeType::Char | NativeType::Varchar | NativeType::Binary | NativeType::Varbinary
            if observed.size > 0 =>
        {
            format!("{}({})", observed.type_name, observed.size)
        }
        NativeType::Decimal | NativeType::Numeric if observed.size > 0 => format!(
            "{}({},{})",
            observed.type_name, observed.size, observed.decimal_digits
        ),
        _ => observed.type_name.clone(),
    }
}

// ================================================================
// Emitter
// ================================================================

/// Statement generator for one dialect and layout.
#[derive(Debug, Clone, Copy)]
pub struct Emitter<'d> {
    dialect: &'d Dialect,
    format: PrintFormat,
}

impl<'d> Emitter<'d> {
    /// Creates an emitter.
    #[must_use]
    pub const fn new(dialect: &'d Dialect, format: PrintFormat) -> Self {
        Self { dialect, format }
    }

    /// The dialect statements are rendered for.
    #[must_use]
    pub const fn dialect(&self) -> &'d Dialect {
        self.dialect
    }

    /// The layout.
    #[must_use]
    pub const fn format(&self) -> PrintFormat {
        self.format
    }

    /// Whether [`create_table`](Self::create_table) already declares unique
    /// constraints and indexes.
    #[must_use]
    pub const fn generates_constraints_on_create(&self) -> bool {
        self.dialect.constraints_on_create()
    }

    /// Whether views must be rebuilt when their table changes.
    #[must_use]
    pub const fn reconstructs_views(&self) -> bool {
        self.dialect.reconstructs_views()
    }

    fn sep(&self) -> &'static str {
        self.format.separator()
    }

    fn preferred(&self, name: &str) -> String {
        self.dialect.identifiers().preferred(name)
    }

    fn target<'a>(entity: &'a SqlEntityInfo, field: &'a SqlFieldInfo) -> ColumnTarget<'a> {
        ColumnTarget {
            table: entity.table(),
            table_name: entity.table_name(),
            column: field.column(),
            column_name: field.column_name(),
            type_decl: field.type_decl(),
            nullable: field.is_nullable(),
            default_literal: field.default_literal(),
            had_default: false,
        }
    }

    fn table_field<'a>(entity: &'a SqlEntityInfo, field_name: &str) -> Result<&'a SqlFieldInfo> {
        let field = entity.field(field_name)?;
        if field.is_list_only() {
            return Err(SqlGenError::UnknownField {
                entity: entity.name().to_string(),
                field: field_name.to_string(),
            });
        }
        Ok(field)
    }

    fn id_field(entity: &SqlEntityInfo) -> Result<&SqlFieldInfo> {
        entity.id_field().ok_or_else(|| SqlGenError::UnknownField {
            entity: entity.name().to_string(),
            field: "<primary key>".to_string(),
        })
    }

    fn version_field(entity: &SqlEntityInfo) -> Result<&SqlFieldInfo> {
        entity.version_field().ok_or_else(|| SqlGenError::UnknownField {
            entity: entity.name().to_string(),
            field: "<version>".to_string(),
        })
    }

    // ------------------------------------------------------------
    // Tables and columns
    // ------------------------------------------------------------

    /// Column definition as used in `CREATE TABLE` and `ADD COLUMN`.
    #[must_use]
    pub fn column_definition(&self, entity: &SqlEntityInfo, field: &SqlFieldInfo) -> String {
        let syntax = self.dialect.syntax();
        let mut def = format!("{} {}", field.column(), field.type_decl());
        if field.is_identity() {
            def.push(' ');
            def.push_str(syntax.identity_clause());
            return def;
        }
        if let Some(literal) = field.default_literal() {
            def.push_str(&syntax.column_default_clause(&Self::target(entity, field), literal));
        }
        if !field.is_nullable() {
            def.push_str(" NOT NULL");
        } else if syntax.explicit_null() {
            def.push_str(" NULL");
        }
        if field.is_primary_key() {
            def.push_str(" PRIMARY KEY");
        }
        def
    }

    /// `CREATE TABLE`, followed by identity support statements.
    ///
    /// Unique constraints and indexes are declared inline when the dialect
    /// generates them on create.
    pub fn create_table(&self, entity: &SqlEntityInfo) -> Result<Vec<String>> {
        let mut items: Vec<String> = entity
            .table_fields()
            .map(|f| self.column_definition(entity, f))
            .collect();
        if self.dialect.constraints_on_create() {
            for uc in entity.unique_constraints() {
                items.push(format!(
                    "CONSTRAINT {} UNIQUE ({})",
                    self.preferred(&uc.name),
                    entity.column_list(&uc.field_names)?
                ));
            }
            for index in entity.indexes() {
                items.push(self.dialect.syntax().inline_index(
                    &self.preferred(&index.name),
                    &entity.column_list(&index.field_names)?,
                    index.unique,
                ));
            }
        }
        let mut statements = vec![format!(
            "CREATE TABLE {} {}{}{}",
            entity.table(),
            self.format.open_list(),
            items.join(self.format.item_separator()),
            self.format.close_list()
        )];
        if let Some(id) = entity.id_field().filter(|f| f.is_identity()) {
            statements.extend(self.dialect.syntax().identity_statements(
                entity.table(),
                entity.table_name(),
                id.column(),
            ));
        }
        debug!(
            dialect = %self.dialect.name(),
            table = entity.table(),
            statements = statements.len(),
            "Generated CREATE TABLE"
        );
        Ok(statements)
    }

    /// `DROP TABLE`, followed by identity cleanup statements.
    #[must_use]
    pub fn drop_table(&self, entity: &SqlEntityInfo) -> Vec<String> {
        let mut statements = vec![format!("DROP TABLE {}", entity.table())];
        if entity.id_field().is_some_and(SqlFieldInfo::is_identity) {
            statements.extend(
                self.dialect
                    .syntax()
                    .drop_identity_statements(entity.table_name()),
            );
        }
        statements
    }

    /// Adds a column.
    ///
    /// A NOT NULL column without a default is added nullable, backfilled,
    /// then tightened, so that existing rows do not reject it.
    pub fn add_column(&self, entity: &SqlEntityInfo, field_name: &str) -> Result<Vec<String>> {
        let field = Self::table_field(entity, field_name)?;
        let syntax = self.dialect.syntax();
        let keyword = syntax.add_column_keyword();
        if field.is_nullable() || field.default_literal().is_some() {
            return Ok(vec![crate::dialect::alter_table(
                entity.table(),
                self.sep(),
                &format!("{keyword} {}", self.column_definition(entity, field)),
            )]);
        }
        let policy = self.dialect.type_policy(field.column_type());
        let mut def = format!("{} {}", field.column(), field.type_decl());
        if syntax.explicit_null() {
            def.push_str(" NULL");
        }
        let tightened = Self::target(entity, field);
        Ok(vec![
            crate::dialect::alter_table(entity.table(), self.sep(), &format!("{keyword} {def}")),
            format!(
                "UPDATE {}{}SET {col} = {}{}WHERE {col} IS NULL",
                entity.table(),
                self.sep(),
                policy.backfill_literal(None)?,
                self.sep(),
                col = field.column()
            ),
            syntax.set_nullable(&tightened, self.sep()),
        ])
    }

    /// Converges an existing column to its field description.
    pub fn alter_column(
        &self,
        entity: &SqlEntityInfo,
        field_name: &str,
        observed: &ColumnInfo,
    ) -> Result<Vec<String>> {
        let field = Self::table_field(entity, field_name)?;
        SchemaAlterationPlanner::new(self.dialect).plan(entity, field, observed, self.format)
    }

    /// Makes an existing column nullable. Used for columns that no longer
    /// have a field, so that inserts that omit them keep working.
    #[must_use]
    pub fn alter_column_nullable(&self, entity: &SqlEntityInfo, observed: &ColumnInfo) -> String {
        let column = self.preferred(&observed.name);
        let type_decl = observed_type_decl(observed);
        let target = ColumnTarget {
            table: entity.table(),
            table_name: entity.table_name(),
            column: &column,
            column_name: &observed.name,
            type_decl: &type_decl,
            nullable: true,
            default_literal: observed.default_val.as_deref(),
            had_default: observed.default_val.is_some(),
        };
        self.dialect.syntax().set_nullable(&target, self.sep())
    }

    /// Renames the entity's table to `new_table`.
    #[must_use]
    pub fn rename_table(&self, entity: &SqlEntityInfo, new_table: &str) -> String {
        self.dialect
            .syntax()
            .rename_table(entity.table(), &self.preferred(new_table), self.sep())
    }

    /// Renames column `old_column` to the column of `field_name`.
    pub fn rename_column(
        &self,
        entity: &SqlEntityInfo,
        field_name: &str,
        old_column: &str,
    ) -> Result<String> {
        let field = Self::table_field(entity, field_name)?;
        let old = self.preferred(old_column);
        let mut target = Self::target(entity, field);
        target.column = &old;
        target.column_name = old_column;
        Ok(self
            .dialect
            .syntax()
            .rename_column(&target, field.column(), self.sep()))
    }

    /// Drops column `column`.
    #[must_use]
    pub fn drop_column(&self, entity: &SqlEntityInfo, column: &str) -> String {
        self.dialect
            .syntax()
            .drop_column(entity.table(), &self.preferred(column), self.sep())
    }

    // ------------------------------------------------------------
    // Constraints and indexes
    // ------------------------------------------------------------

    /// `CREATE [UNIQUE] INDEX`.
    pub fn create_index(&self, entity: &SqlEntityInfo, index: &IndexSchemaInfo) -> Result<String> {
        let unique = if index.unique { "UNIQUE " } else { "" };
        Ok(format!(
            "CREATE {unique}INDEX {} ON {} ({})",
            self.preferred(&index.name),
            entity.table(),
            entity.column_list(&index.field_names)?
        ))
    }

    /// Drops index `name`.
    #[must_use]
    pub fn drop_index(&self, entity: &SqlEntityInfo, name: &str) -> String {
        self.dialect
            .syntax()
            .drop_index(entity.table(), &self.preferred(name))
    }

    /// Adds a unique constraint.
    pub fn add_unique_constraint(
        &self,
        entity: &SqlEntityInfo,
        constraint: &UniqueConstraintSchemaInfo,
    ) -> Result<String> {
        Ok(crate::dialect::alter_table(
            entity.table(),
            self.sep(),
            &format!(
                "ADD CONSTRAINT {} UNIQUE ({})",
                self.preferred(&constraint.name),
                entity.column_list(&constraint.field_names)?
            ),
        ))
    }

    /// Drops unique constraint `name`.
    #[must_use]
    pub fn drop_unique_constraint(&self, entity: &SqlEntityInfo, name: &str) -> String {
        self.dialect.syntax().drop_unique_constraint(
            entity.table(),
            &self.preferred(name),
            self.sep(),
        )
    }

    /// Name of the foreign key constraint backing `field`.
    #[must_use]
    pub fn foreign_key_name(entity: &SqlEntityInfo, field: &SqlFieldInfo) -> String {
        format!("FK_{}_{}", entity.table_name(), field.column_name()).to_ascii_uppercase()
    }

    /// Adds the foreign key of `field_name`, referencing the primary key of
    /// the registered target entity.
    pub fn add_foreign_key(
        &self,
        entity: &SqlEntityInfo,
        field_name: &str,
        registry: &EntityRegistry,
    ) -> Result<String> {
        let field = Self::table_field(entity, field_name)?;
        let reference = field.foreign_key().ok_or_else(|| SqlGenError::UnknownField {
            entity: entity.name().to_string(),
            field: field_name.to_string(),
        })?;
        let target = registry.get(&reference.entity)?;
        let target_field = target.field(&reference.field)?;
        Ok(crate::dialect::alter_table(
            entity.table(),
            self.sep(),
            &format!(
                "ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
                self.preferred(&Self::foreign_key_name(entity, field)),
                field.column(),
                target.table(),
                target_field.column()
            ),
        ))
    }

    /// Drops foreign key constraint `name`.
    #[must_use]
    pub fn drop_foreign_key(&self, entity: &SqlEntityInfo, name: &str) -> String {
        self.dialect
            .syntax()
            .drop_foreign_key(entity.table(), &self.preferred(name), self.sep())
    }

    /// Adds a check constraint restricting a field to its allowed values.
    pub fn create_check_constraint(
        &self,
        entity: &SqlEntityInfo,
        constraint: &CheckConstraintSchemaInfo,
    ) -> Result<String> {
        let field = Self::table_field(entity, &constraint.field_name)?;
        let policy = self.dialect.type_policy(field.column_type());
        let literals = constraint
            .allowed
            .iter()
            .map(|v| policy.render_default(v))
            .collect::<Result<Vec<_>>>()?;
        Ok(crate::dialect::alter_table(
            entity.table(),
            self.sep(),
            &format!(
                "ADD CONSTRAINT {} CHECK ({} IN ({}))",
                self.preferred(&constraint.name),
                field.column(),
                literals.join(", ")
            ),
        ))
    }

    /// Drops check constraint `name`.
    #[must_use]
    pub fn drop_check_constraint(&self, entity: &SqlEntityInfo, name: &str) -> String {
        self.dialect.syntax().drop_check_constraint(
            entity.table(),
            &self.preferred(name),
            self.sep(),
        )
    }

    // ------------------------------------------------------------
    // Views
    // ------------------------------------------------------------

    /// `CREATE VIEW` projecting every table field plus the list-only fields,
    /// which are read from foreign entities through LEFT JOINs. `None` when
    /// the entity has no view.
    pub fn create_view(
        &self,
        entity: &SqlEntityInfo,
        registry: &EntityRegistry,
    ) -> Result<Option<String>> {
        let Some(view) = entity.view() else {
            return Ok(None);
        };
        let mut columns: Vec<String> = entity
            .table_fields()
            .map(|f| format!("T1.{}", f.column()))
            .collect();
        let mut aliases: HashMap<&str, String> = HashMap::new();
        let mut joins = Vec::new();
        for field in entity.list_fields() {
            let Some(source) = field.list_only() else {
                continue;
            };
            let key = Self::table_field(entity, &source.key_field)?;
            let reference = key.foreign_key().ok_or_else(|| SqlGenError::UnknownField {
                entity: entity.name().to_string(),
                field: source.key_field.clone(),
            })?;
            let foreign = registry.get(&reference.entity)?;
            let alias = match aliases.get(source.key_field.as_str()) {
                Some(alias) => alias.clone(),
                None => {
                    let alias = format!("T{}", aliases.len() + 2);
                    joins.push(format!(
                        "LEFT JOIN {} {alias} ON T1.{} = {alias}.{}",
                        foreign.table(),
                        key.column(),
                        foreign.field(&reference.field)?.column()
                    ));
                    aliases.insert(source.key_field.as_str(), alias.clone());
                    alias
                }
            };
            let projected = foreign.field(&source.source_field)?;
            columns.push(format!("{alias}.{} AS {}", projected.column(), field.column()));
        }
        let sep = self.sep();
        let mut sql = format!(
            "CREATE VIEW {view} AS SELECT {}{sep}FROM {} T1",
            columns.join(", "),
            entity.table()
        );
        for join in joins {
            sql.push_str(sep);
            sql.push_str(&join);
        }
        debug!(dialect = %self.dialect.name(), view, "Generated CREATE VIEW");
        Ok(Some(sql))
    }

    /// `DROP VIEW`, `None` when the entity has no view.
    #[must_use]
    pub fn drop_view(&self, entity: &SqlEntityInfo) -> Option<String> {
        entity.view().map(|v| format!("DROP VIEW {v}"))
    }

    // ------------------------------------------------------------
    // Criteria
    // ------------------------------------------------------------

    /// Renders a restriction on table field `field_name` with `operands`
    /// placeholders. List-only fields are rejected; use
    /// [`view_restriction`](Self::view_restriction) for those.
    ///
    /// `IN` lists longer than the dialect accepts are split into several
    /// lists joined with `OR` (`AND` for `NOT IN`).
    pub fn restriction(
        &self,
        entity: &SqlEntityInfo,
        field_name: &str,
        restriction: RestrictionType,
        operands: usize,
    ) -> Result<WhereClause> {
        let field = Self::table_field(entity, field_name)?;
        self.render_restriction(field, restriction, operands)
    }

    /// Like [`restriction`](Self::restriction), but also accepts list-only
    /// fields. The clause is only valid in a SELECT from the entity's view.
    pub fn view_restriction(
        &self,
        entity: &SqlEntityInfo,
        field_name: &str,
        restriction: RestrictionType,
        operands: usize,
    ) -> Result<WhereClause> {
        let field = entity.field(field_name)?;
        self.render_restriction(field, restriction, operands)
    }

    fn render_restriction(
        &self,
        field: &SqlFieldInfo,
        restriction: RestrictionType,
        operands: usize,
    ) -> Result<WhereClause> {
        if restriction.is_compound() {
            return Err(SqlGenError::OperandCount {
                restriction,
                expected: "sub-clauses".to_string(),
                actual: operands,
            });
        }
        let policy = self.dialect.criteria_policy(restriction);
        let placeholders = vec![SqlValue::placeholder(); operands];
        let chunks = match restriction {
            RestrictionType::Amongst | RestrictionType::NotAmongst => {
                self.dialect.clause_value_chunks(&placeholders)
            }
            _ => vec![placeholders.as_slice()],
        };
        let rendered = chunks
            .into_iter()
            .map(|chunk| policy.render(field.column(), chunk))
            .collect::<Result<Vec<_>>>()?;
        let sql = if rendered.len() == 1 {
            rendered.into_iter().collect()
        } else {
            let glue = if restriction == RestrictionType::NotAmongst {
                " AND "
            } else {
                " OR "
            };
            format!("({})", rendered.join(glue))
        };
        Ok(WhereClause {
            sql,
            parameters: (1..=operands).map(|i| parameter(field, i)).collect(),
            view_only: field.is_list_only(),
        })
    }

    /// Joins clauses with `AND` or `OR`.
    pub fn compound(&self, restriction: RestrictionType, clauses: Vec<WhereClause>) -> Result<WhereClause> {
        if !restriction.is_compound() {
            return Err(SqlGenError::OperandCount {
                restriction,
                expected: "0 sub-clauses".to_string(),
                actual: clauses.len(),
            });
        }
        let parts: Vec<&str> = clauses.iter().map(|c| c.sql.as_str()).collect();
        let sql = self.dialect.criteria_policy(restriction).render("", &parts)?;
        let parameters: Vec<ParameterSlot> = clauses
            .iter()
            .flat_map(|c| c.parameters.iter().cloned())
            .collect();
        Ok(WhereClause {
            sql,
            parameters: renumber(&parameters, 1),
            view_only: clauses.iter().any(|c| c.view_only),
        })
    }

    /// Prepares an operand value for `restriction` (wraps LIKE patterns).
    #[must_use]
    pub fn operand(&self, restriction: RestrictionType, value: SqlValue) -> SqlValue {
        self.dialect.criteria_policy(restriction).transform_operand(value)
    }

    /// Time bucket expressions over a temporal field.
    pub fn time_bucket(
        &self,
        entity: &SqlEntityInfo,
        field_name: &str,
        bucket: TimeBucket,
    ) -> Result<TimeBucketExpr> {
        let field = entity.field(field_name)?;
        self.dialect.time_bucket(field.column(), bucket)
    }

    // ------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------

    /// Builds a SELECT with the dialect's result window.
    ///
    /// The window is offered to the pagination strategy after `SELECT`,
    /// at the end of the WHERE clause and after ORDER BY; the first stage
    /// that writes it wins.
    pub fn build_paginated_select(
        &self,
        entity: &SqlEntityInfo,
        query: &SelectQuery,
    ) -> Result<SqlStatement> {
        let use_view = query.from_view && entity.view().is_some();
        let fields: Vec<&SqlFieldInfo> = if query.fields.is_empty() {
            entity
                .fields()
                .iter()
                .filter(|f| use_view || !f.is_list_only())
                .collect()
        } else {
            query
                .fields
                .iter()
                .map(|name| {
                    if use_view {
                        entity.field(name)
                    } else {
                        Self::table_field(entity, name)
                    }
                })
                .collect::<Result<_>>()?
        };
        if let Some(clause) = query.where_clause.as_ref().filter(|c| c.view_only && !use_view) {
            let field = clause
                .parameters
                .iter()
                .filter_map(|p| p.field.as_deref())
                .find(|f| entity.field(f).is_ok_and(SqlFieldInfo::is_list_only))
                .unwrap_or_default();
            return Err(SqlGenError::UnknownField {
                entity: entity.name().to_string(),
                field: field.to_string(),
            });
        }
        let pagination = self.dialect.pagination();
        let sep = self.sep();
        let (offset, limit) = (query.offset, query.limit);

        let mut sql = String::from("SELECT ");
        if query.distinct {
            sql.push_str("DISTINCT ");
        }
        let mut windowed = pagination.append_infix(&mut sql, offset, limit)?;
        let columns: Vec<&str> = fields.iter().map(|f| f.column()).collect();
        sql.push_str(&columns.join(", "));
        sql.push_str(sep);
        sql.push_str("FROM ");
        sql.push_str(match entity.view() {
            Some(view) if use_view => view,
            _ => entity.table(),
        });
        let mut parameters = Vec::new();
        if let Some(clause) = &query.where_clause {
            sql.push_str(sep);
            sql.push_str("WHERE ");
            sql.push_str(&clause.sql);
            parameters = renumber(&clause.parameters, 1);
        }
        if !windowed {
            windowed =
                pagination.append_where_suffix(&mut sql, offset, limit, query.where_clause.is_some())?;
        }
        if !query.order_by.is_empty() {
            let order = query
                .order_by
                .iter()
                .map(|(name, ascending)| {
                    let field = if use_view {
                        entity.field(name)?
                    } else {
                        Self::table_field(entity, name)?
                    };
                    let direction = if *ascending { "ASC" } else { "DESC" };
                    Ok(format!("{} {direction}", field.column()))
                })
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(sep);
            sql.push_str("ORDER BY ");
            sql.push_str(&order.join(", "));
        }
        if !windowed {
            pagination.append_trailing_suffix(&mut sql, offset, limit)?;
        }
        debug!(
            dialect = %self.dialect.name(),
            entity = entity.name(),
            offset,
            limit,
            "Generated SELECT"
        );
        Ok(SqlStatement {
            sql,
            parameters,
            results: fields
                .iter()
                .enumerate()
                .map(|(i, f)| result(f, i + 1))
                .collect(),
        })
    }

    /// `INSERT` of every table field except a generated primary key.
    pub fn insert(&self, entity: &SqlEntityInfo) -> Result<SqlStatement> {
        let fields: Vec<&SqlFieldInfo> = entity
            .table_fields()
            .filter(|f| !f.is_identity())
            .collect();
        let columns: Vec<&str> = fields.iter().map(|f| f.column()).collect();
        let placeholders = vec![SqlValue::placeholder(); fields.len()];
        Ok(SqlStatement {
            sql: format!(
                "INSERT INTO {} ({}){}VALUES ({})",
                entity.table(),
                columns.join(", "),
                self.sep(),
                placeholders.join(", ")
            ),
            parameters: fields
                .iter()
                .enumerate()
                .map(|(i, f)| parameter(f, i + 1))
                .collect(),
            results: Vec::new(),
        })
    }

    /// SELECT of one row by primary key.
    pub fn find_by_pk(&self, entity: &SqlEntityInfo) -> Result<SqlStatement> {
        let id = Self::id_field(entity)?;
        let fields: Vec<&SqlFieldInfo> = entity.table_fields().collect();
        let columns: Vec<&str> = fields.iter().map(|f| f.column()).collect();
        Ok(SqlStatement {
            sql: format!(
                "SELECT {}{sep}FROM {}{sep}WHERE {} = ?",
                columns.join(", "),
                entity.table(),
                id.column(),
                sep = self.sep()
            ),
            parameters: vec![parameter(id, 1)],
            results: fields
                .iter()
                .enumerate()
                .map(|(i, f)| result(f, i + 1))
                .collect(),
        })
    }

    /// UPDATE of every non-key table field by primary key.
    pub fn update_by_pk(&self, entity: &SqlEntityInfo) -> Result<SqlStatement> {
        let id = Self::id_field(entity)?;
        let fields: Vec<&SqlFieldInfo> = entity
            .table_fields()
            .filter(|f| !f.is_primary_key())
            .collect();
        let assignments: Vec<String> = fields
            .iter()
            .map(|f| format!("{} = ?", f.column()))
            .collect();
        let mut parameters: Vec<ParameterSlot> = fields
            .iter()
            .enumerate()
            .map(|(i, f)| parameter(f, i + 1))
            .collect();
        parameters.push(parameter(id, fields.len() + 1));
        Ok(SqlStatement {
            sql: format!(
                "UPDATE {}{sep}SET {}{sep}WHERE {} = ?",
                entity.table(),
                assignments.join(", "),
                id.column(),
                sep = self.sep()
            ),
            parameters,
            results: Vec::new(),
        })
    }

    /// DELETE by primary key.
    pub fn delete_by_pk(&self, entity: &SqlEntityInfo) -> Result<SqlStatement> {
        let id = Self::id_field(entity)?;
        Ok(SqlStatement {
            sql: format!(
                "DELETE FROM {}{}WHERE {} = ?",
                entity.table(),
                self.sep(),
                id.column()
            ),
            parameters: vec![parameter(id, 1)],
            results: Vec::new(),
        })
    }

    /// SELECT by primary key and the expected version number.
    pub fn find_by_pk_version(&self, entity: &SqlEntityInfo) -> Result<SqlStatement> {
        let version = Self::version_field(entity)?;
        let mut stmt = self.find_by_pk(entity)?;
        stmt.sql.push_str(&format!(" AND {} = ?", version.column()));
        stmt.parameters.push(parameter(version, 2));
        Ok(stmt)
    }

    /// UPDATE by primary key, guarded by the old version number.
    ///
    /// Binds the new field values (the new version included), the key,
    /// and last the version number the row is expected to still carry.
    pub fn update_by_pk_version(&self, entity: &SqlEntityInfo) -> Result<SqlStatement> {
        let version = Self::version_field(entity)?;
        let mut stmt = self.update_by_pk(entity)?;
        stmt.sql.push_str(&format!(" AND {} = ?", version.column()));
        let index = stmt.parameters.len() + 1;
        stmt.parameters.push(parameter(version, index));
        Ok(stmt)
    }

    /// DELETE by primary key and the expected version number.
    pub fn delete_by_pk_version(&self, entity: &SqlEntityInfo) -> Result<SqlStatement> {
        let version = Self::version_field(entity)?;
        let mut stmt = self.delete_by_pk(entity)?;
        stmt.sql.push_str(&format!(" AND {} = ?", version.column()));
        stmt.parameters.push(parameter(version, 2));
        Ok(stmt)
    }

    /// `SELECT COUNT(*)`, optionally filtered.
    #[must_use]
    pub fn count(&self, entity: &SqlEntityInfo, filter: Option<&WhereClause>) -> SqlStatement {
        let mut sql = format!("SELECT COUNT(*){}FROM {}", self.sep(), entity.table());
        let mut parameters = Vec::new();
        if let Some(clause) = filter {
            sql.push_str(self.sep());
            sql.push_str("WHERE ");
            sql.push_str(&clause.sql);
            parameters = renumber(&clause.parameters, 1);
        }
        SqlStatement {
            sql,
            parameters,
            results: vec![ResultSlot {
                column: ColumnRef::Index(1),
                column_type: ColumnType::Long,
                length: 0,
                field: "count".to_string(),
            }],
        }
    }
}
