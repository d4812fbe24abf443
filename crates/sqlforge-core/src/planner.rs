//! Column alteration planning.
//!
//! Compares an existing column with its desired field and produces the
//! statements that converge one to the other, in an order every dialect
//! accepts: existing NULLs are backfilled before a column is tightened, the
//! type is changed before the default, and nullability comes last.

use tracing::debug;

use crate::dialect::{ColumnTarget, Dialect};
use crate::emitter::PrintFormat;
use crate::error::{Result, SqlGenError};
use crate::resolve::{SqlEntityInfo, SqlFieldInfo};
use crate::schema::{ColumnAlterInfo, ColumnInfo};

/// Plans column alterations for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct SchemaAlterationPlanner<'d> {
    dialect: &'d Dialect,
}

impl<'d> SchemaAlterationPlanner<'d> {
    /// Creates a planner.
    #[must_use]
    pub const fn new(dialect: &'d Dialect) -> Self {
        Self { dialect }
    }

    /// Detects which facets of `observed` differ from `desired`.
    ///
    /// Native type codes in the same swap group never count as a type
    /// change; sizes are compared only when the type declares one. Defaults
    /// of generated keys are ignored.
    #[must_use]
    pub fn check_column_altered(&self, observed: &ColumnInfo, desired: &SqlFieldInfo) -> ColumnAlterInfo {
        let policy = self.dialect.type_policy(desired.column_type());
        let dimensions = policy.native_dimensions(desired.length(), desired.precision(), desired.scale());
        let type_change = !observed.native_type.is_swappable_with(policy.native_type())
            || dimensions.is_some_and(|dims| dims != (observed.size, observed.decimal_digits));
        let default_change = !desired.is_identity()
            && !self.dialect.default_matcher().matches(
                observed.default_val.as_deref(),
                desired.default_val(),
                policy,
            );
        ColumnAlterInfo {
            type_change,
            default_change,
            nullable_change: observed.nullable != desired.is_nullable(),
        }
    }

    /// Statements converging `observed` to `desired`. Empty when nothing
    /// differs.
    ///
    /// A type change is refused unless the existing column's logical type
    /// can be converted to the desired one.
    pub fn plan(
        &self,
        entity: &SqlEntityInfo,
        desired: &SqlFieldInfo,
        observed: &ColumnInfo,
        format: PrintFormat,
    ) -> Result<Vec<String>> {
        let alter = self.check_column_altered(observed, desired);
        if !alter.is_altered() {
            return Ok(Vec::new());
        }
        let refuse = |reason: String| SqlGenError::UnsupportedAlteration {
            table: entity.table_name().to_string(),
            column: desired.column_name().to_string(),
            reason,
        };
        if alter.type_change {
            let from = observed
                .native_type
                .column_type(observed.size, observed.decimal_digits)
                .ok_or_else(|| refuse(format!("unknown native type {}", observed.type_name)))?;
            if !desired.column_type().is_convertible_from(from) {
                return Err(refuse(format!(
                    "{from} cannot be converted to {}",
                    desired.column_type()
                )));
            }
        }

        let sep = format.separator();
        let syntax = self.dialect.syntax();
        let policy = self.dialect.type_policy(desired.column_type());
        let target = ColumnTarget {
            table: entity.table(),
            table_name: entity.table_name(),
            column: desired.column(),
            column_name: desired.column_name(),
            type_decl: desired.type_decl(),
            nullable: desired.is_nullable(),
            default_literal: desired.default_literal(),
            had_default: observed
                .default_val
                .as_deref()
                .is_some_and(|d| !d.trim().is_empty()),
        };

        let mut statements = Vec::new();
        if alter.nullable_change && !desired.is_nullable() {
            statements.push(format!(
                "UPDATE {}{sep}SET {col} = {}{sep}WHERE {col} IS NULL",
                entity.table(),
                policy.backfill_literal(desired.default_val())?,
                col = desired.column()
            ));
        }
        if alter.type_change {
            debug!(table = entity.table(), column = desired.column(), "Column type changed");
            statements.push(syntax.alter_column_type(&target, sep));
        }
        if alter.default_change {
            debug!(table = entity.table(), column = desired.column(), "Column default changed");
            match desired.default_literal() {
                Some(literal) => statements.extend(syntax.set_default(&target, literal, sep)),
                None => statements.extend(syntax.drop_default(&target, sep)),
            }
        }
        if alter.nullable_change && !(alter.type_change && syntax.bundles_nullability()) {
            debug!(
                table = entity.table(),
                column = desired.column(),
                nullable = desired.is_nullable(),
                "Column nullability changed"
            );
            statements.push(syntax.set_nullable(&target, sep));
        }
        Ok(statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{hsqldb, mssql, mysql, oracle, oracle12, postgresql};
    use crate::schema::{EntitySchemaInfo, FieldSchemaInfo};
    use crate::types::{ColumnType, NativeType};

    fn ledger() -> EntitySchemaInfo {
        EntitySchemaInfo::builder("ledger")
            .field(FieldSchemaInfo::builder("id", ColumnType::Long).primary_key().build())
            .field(
                FieldSchemaInfo::builder("retries", ColumnType::Integer)
                    .default_val("0")
                    .build(),
            )
            .field(FieldSchemaInfo::builder("memo", ColumnType::String).length(200).nullable().build())
            .field(FieldSchemaInfo::builder("code", ColumnType::String).length(20).build())
            .build()
            .unwrap()
    }

    fn column(name: &str, native_type: NativeType, size: u32, nullable: bool, default_val: Option<&str>) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            native_type,
            type_name: String::new(),
            size,
            decimal_digits: 0,
            nullable,
            default_val: default_val.map(str::to_string),
        }
    }

    #[test]
    fn test_unchanged_column_plans_nothing() {
        let dialect = postgresql().unwrap();
        let entity = SqlEntityInfo::resolve(&dialect, &ledger()).unwrap();
        let planner = SchemaAlterationPlanner::new(&dialect);
        let retries = column("retries", NativeType::Integer, 10, false, Some("0"));
        let memo = column("memo", NativeType::Varchar, 200, true, None);
        for (field, observed) in [("retries", &retries), ("memo", &memo)] {
            let field = entity.field(field).unwrap();
            assert!(!planner.check_column_altered(observed, field).is_altered());
            assert!(planner
                .plan(&entity, field, observed, PrintFormat::Compact)
                .unwrap()
                .is_empty());
        }
    }

    #[test]
    fn test_tightening_backfills_first() {
        let dialect = hsqldb().unwrap();
        let entity = SqlEntityInfo::resolve(&dialect, &ledger()).unwrap();
        let observed = column("RETRIES", NativeType::Integer, 32, true, None);
        let statements = SchemaAlterationPlanner::new(&dialect)
            .plan(&entity, entity.field("retries").unwrap(), &observed, PrintFormat::Compact)
            .unwrap();
        assert_eq!(
            statements,
            vec![
                "UPDATE PUBLIC.LEDGER SET RETRIES = 0 WHERE RETRIES IS NULL",
                "ALTER TABLE PUBLIC.LEDGER ALTER COLUMN RETRIES SET DEFAULT 0",
                "ALTER TABLE PUBLIC.LEDGER ALTER COLUMN RETRIES SET NOT NULL",
            ]
        );
    }

    #[test]
    fn test_oracle_backfill_is_not_empty_string() {
        for dialect in [oracle().unwrap(), oracle12().unwrap()] {
            let entity = SqlEntityInfo::resolve(&dialect, &ledger()).unwrap();
            let observed = column("CODE", NativeType::Varchar, 20, true, None);
            let statements = SchemaAlterationPlanner::new(&dialect)
                .plan(&entity, entity.field("code").unwrap(), &observed, PrintFormat::Compact)
                .unwrap();
            // Oracle reads '' back as NULL.
            assert_eq!(
                statements,
                vec![
                    "UPDATE LEDGER SET CODE = ' ' WHERE CODE IS NULL",
                    "ALTER TABLE LEDGER MODIFY (CODE NOT NULL)",
                ]
            );
        }
    }

    #[test]
    fn test_identity_default_is_ignored() {
        let dialect = postgresql().unwrap();
        let entity = SqlEntityInfo::resolve(&dialect, &ledger()).unwrap();
        let observed = column("id", NativeType::BigInt, 19, false, Some("nextval('ledger_id_seq'::regclass)"));
        let alter = SchemaAlterationPlanner::new(&dialect)
            .check_column_altered(&observed, entity.field("id").unwrap());
        assert!(!alter.is_altered());
    }

    #[test]
    fn test_widening_string() {
        let dialect = oracle().unwrap();
        let entity = SqlEntityInfo::resolve(&dialect, &ledger()).unwrap();
        let observed = column("MEMO", NativeType::Varchar, 100, true, None);
        let statements = SchemaAlterationPlanner::new(&dialect)
            .plan(&entity, entity.field("memo").unwrap(), &observed, PrintFormat::Pretty)
            .unwrap();
        assert_eq!(statements, vec!["ALTER TABLE LEDGER\n\tMODIFY (MEMO VARCHAR2(200))"]);
    }

    #[test]
    fn test_mysql_bundles_nullability_with_type() {
        let dialect = mysql().unwrap();
        let entity = SqlEntityInfo::resolve(&dialect, &ledger()).unwrap();
        let observed = column("MEMO", NativeType::Varchar, 100, false, None);
        let statements = SchemaAlterationPlanner::new(&dialect)
            .plan(&entity, entity.field("memo").unwrap(), &observed, PrintFormat::Compact)
            .unwrap();
        assert_eq!(statements, vec!["ALTER TABLE LEDGER MODIFY MEMO VARCHAR(200) NULL"]);
    }

    #[test]
    fn test_mssql_replaces_named_default() {
        let dialect = mssql().unwrap();
        let entity = SqlEntityInfo::resolve(&dialect, &ledger()).unwrap();
        let observed = column("RETRIES", NativeType::Integer, 10, false, Some("((1))"));
        let statements = SchemaAlterationPlanner::new(&dialect)
            .plan(&entity, entity.field("retries").unwrap(), &observed, PrintFormat::Compact)
            .unwrap();
        assert_eq!(
            statements,
            vec![
                "ALTER TABLE dbo.LEDGER DROP CONSTRAINT DF_LEDGER_RETRIES",
                "ALTER TABLE dbo.LEDGER ADD CONSTRAINT DF_LEDGER_RETRIES DEFAULT 0 FOR RETRIES",
            ]
        );
    }

    #[test]
    fn test_inconvertible_type_is_refused() {
        let dialect = postgresql().unwrap();
        let entity = SqlEntityInfo::resolve(&dialect, &ledger()).unwrap();
        let observed = column("retries", NativeType::Blob, 0, false, Some("0"));
        let err = SchemaAlterationPlanner::new(&dialect)
            .plan(&entity, entity.field("retries").unwrap(), &observed, PrintFormat::Compact)
            .unwrap_err();
        assert!(matches!(err, SqlGenError::UnsupportedAlteration { column, .. } if column == "RETRIES"));
    }
}
