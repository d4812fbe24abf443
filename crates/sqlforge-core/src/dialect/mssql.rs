//! SQL Server dialect.
//!
//! Column defaults are named constraints (`DF_<table>_<column>`) so that
//! they can be dropped again; renames go through `sp_rename`.

use super::syntax::{alter_table, ColumnTarget, DdlSyntax};
use super::{
    ConcatStyle, Dialect, DialectName, IdentifierRules, ParenthesizedDefaults, TimeBucket,
    TimeBucketRenderer, TopInfix,
};
use crate::error::Result;
use crate::policy::standard::{
    BlobPolicy, BooleanPolicy, BooleanStyle, ClobPolicy, FloatingPolicy, LobBinding,
    TemporalLiteral, TimestampPolicy,
};
use crate::types::{ColumnType, NativeType};

/// SQL Server spelling of column alterations.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsSqlSyntax;

impl MsSqlSyntax {
    fn default_constraint(t: &ColumnTarget<'_>) -> String {
        format!("DF_{}_{}", t.table_name, t.column_name).to_ascii_uppercase()
    }

    fn unquoted(name: &str) -> String {
        name.replace(['[', ']'], "")
    }
}

impl DdlSyntax for MsSqlSyntax {
    fn add_column_keyword(&self) -> &'static str {
        "ADD"
    }

    fn identity_clause(&self) -> &'static str {
        "IDENTITY(1,1) NOT NULL PRIMARY KEY"
    }

    fn column_default_clause(&self, target: &ColumnTarget<'_>, literal: &str) -> String {
        format!(
            " CONSTRAINT {} DEFAULT {literal}",
            Self::default_constraint(target)
        )
    }

    fn bundles_nullability(&self) -> bool {
        true
    }

    fn alter_column_type(&self, t: &ColumnTarget<'_>, sep: &str) -> String {
        alter_table(
            t.table,
            sep,
            &format!("ALTER COLUMN {} {} {}", t.column, t.type_decl, t.null_keyword()),
        )
    }

    fn set_default(&self, t: &ColumnTarget<'_>, literal: &str, sep: &str) -> Vec<String> {
        let name = Self::default_constraint(t);
        let mut statements = if t.had_default {
            self.drop_default(t, sep)
        } else {
            Vec::new()
        };
        statements.push(alter_table(
            t.table,
            sep,
            &format!("ADD CONSTRAINT {name} DEFAULT {literal} FOR {}", t.column),
        ));
        statements
    }

    fn drop_default(&self, t: &ColumnTarget<'_>, sep: &str) -> Vec<String> {
        vec![alter_table(
            t.table,
            sep,
            &format!("DROP CONSTRAINT {}", Self::default_constraint(t)),
        )]
    }

    fn set_nullable(&self, t: &ColumnTarget<'_>, sep: &str) -> String {
        self.alter_column_type(t, sep)
    }

    fn rename_table(&self, table: &str, new_table: &str, _sep: &str) -> String {
        format!(
            "EXEC sp_rename '{}', '{}'",
            Self::unquoted(table),
            Self::unquoted(new_table)
        )
    }

    fn rename_column(&self, t: &ColumnTarget<'_>, new_column: &str, _sep: &str) -> String {
        format!(
            "EXEC sp_rename '{}.{}', '{}', 'COLUMN'",
            Self::unquoted(t.table),
            Self::unquoted(t.column),
            Self::unquoted(new_column)
        )
    }

    fn drop_index(&self, table: &str, index: &str) -> String {
        format!("DROP INDEX {index} ON {table}")
    }
}

/// `DATEADD`/`DATEDIFF` truncation and `FORMAT` labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsSqlTimeBuckets;

impl TimeBucketRenderer for MsSqlTimeBuckets {
    fn truncate(&self, field: &str, bucket: TimeBucket) -> Option<String> {
        let floor = |part: &str| format!("DATEADD({part}, DATEDIFF({part}, 0, {field}), 0)");
        Some(match bucket {
            TimeBucket::Hour => floor("hour"),
            TimeBucket::Day => floor("day"),
            TimeBucket::Week => floor("week"),
            TimeBucket::Month => floor("month"),
            TimeBucket::Year => floor("year"),
            TimeBucket::DayOfWeek => format!("DATEPART(weekday, {field})"),
            TimeBucket::DayOfMonth => format!("DATEPART(day, {field})"),
            TimeBucket::DayOfYear => format!("DATEPART(dayofyear, {field})"),
        })
    }

    fn label(&self, field: &str, bucket: TimeBucket) -> Option<String> {
        let pattern = match bucket {
            TimeBucket::Hour => "yyyy-MM-dd HH",
            TimeBucket::Day => "yyyy-MM-dd",
            TimeBucket::Week => {
                return Some(format!(
                    "CONCAT(DATEPART(year, {field}), '-', DATEPART(iso_week, {field}))"
                ))
            }
            TimeBucket::Month => "yyyy-MM",
            TimeBucket::Year => "yyyy",
            TimeBucket::DayOfWeek => "ddd",
            TimeBucket::DayOfMonth => "dd",
            TimeBucket::DayOfYear => return Some(format!("DATEPART(dayofyear, {field})")),
        };
        Some(format!("FORMAT({field}, '{pattern}')"))
    }
}

/// Builds the SQL Server dialect.
pub fn mssql() -> Result<Dialect> {
    let identifiers = IdentifierRules::new('[', ']').default_schema("dbo").reserved(&[
        "FILE", "IDENTITY", "OPEN", "PERCENT", "PLAN", "RULE", "TOP", "TRAN",
    ]);
    Dialect::builder(DialectName::MsSql, identifiers)
        .type_policy(BooleanPolicy::new(BooleanStyle::Bit))
        .type_policy(FloatingPolicy::new(ColumnType::Float, "REAL", NativeType::Real))
        .type_policy(FloatingPolicy::new(ColumnType::Double, "FLOAT(53)", NativeType::Double))
        .type_policy(TimestampPolicy::new(
            ColumnType::Timestamp,
            "DATETIME",
            TemporalLiteral::Quoted,
        ))
        .type_policy(TimestampPolicy::new(
            ColumnType::TimestampUtc,
            "DATETIME",
            TemporalLiteral::Quoted,
        ))
        .type_policy(ClobPolicy::new(
            "VARCHAR(MAX)",
            NativeType::LongVarchar,
            LobBinding::Plain,
            "CAST('' AS VARCHAR(MAX))",
        ))
        .type_policy(BlobPolicy::new(
            "VARBINARY(MAX)",
            NativeType::LongVarbinary,
            LobBinding::Plain,
            "CAST('' AS VARBINARY(MAX))",
        ))
        .syntax(MsSqlSyntax)
        .defaults(ParenthesizedDefaults)
        .pagination(TopInfix::new("mssql"))
        .time_buckets(MsSqlTimeBuckets)
        .concat(ConcatStyle::Operator("+"))
        .max_clause_values(2000)
        .max_inline_string(8000)
        .now_sql("SELECT GETDATE()", "SELECT GETUTCDATE()")
        .build()
}
