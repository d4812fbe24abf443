//! PostgreSQL dialect.

use super::syntax::{alter_table, ColumnTarget, DdlSyntax};
use super::{CastSuffixDefaults, Dialect, DialectName, IdentifierRules, TimeBucket, TimeBucketRenderer};
use crate::error::Result;
use crate::policy::standard::{BlobPolicy, BooleanPolicy, BooleanStyle, ClobPolicy, FloatingPolicy, LobBinding};
use crate::types::{ColumnType, NativeType};

/// PostgreSQL spelling of column alterations.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresSyntax;

impl DdlSyntax for PostgresSyntax {
    fn identity_clause(&self) -> &'static str {
        "GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY"
    }

    fn alter_column_type(&self, t: &ColumnTarget<'_>, sep: &str) -> String {
        alter_table(
            t.table,
            sep,
            &format!("ALTER COLUMN {} TYPE {}", t.column, t.type_decl),
        )
    }

    fn set_nullable(&self, t: &ColumnTarget<'_>, sep: &str) -> String {
        let action = if t.nullable { "DROP NOT NULL" } else { "SET NOT NULL" };
        alter_table(t.table, sep, &format!("ALTER COLUMN {} {action}", t.column))
    }

    fn rename_column(&self, t: &ColumnTarget<'_>, new_column: &str, sep: &str) -> String {
        alter_table(
            t.table,
            sep,
            &format!("RENAME COLUMN {} TO {new_column}", t.column),
        )
    }
}

/// `DATE_TRUNC`, `EXTRACT` and `TO_CHAR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresTimeBuckets;

impl TimeBucketRenderer for PostgresTimeBuckets {
    fn truncate(&self, field: &str, bucket: TimeBucket) -> Option<String> {
        Some(match bucket {
            TimeBucket::Hour => format!("DATE_TRUNC('hour', {field})"),
            TimeBucket::Day => format!("DATE_TRUNC('day', {field})"),
            TimeBucket::Week => format!("DATE_TRUNC('week', {field})"),
            TimeBucket::Month => format!("DATE_TRUNC('month', {field})"),
            TimeBucket::Year => format!("DATE_TRUNC('year', {field})"),
            TimeBucket::DayOfWeek => format!("EXTRACT(DOW FROM {field})"),
            TimeBucket::DayOfMonth => format!("EXTRACT(DAY FROM {field})"),
            TimeBucket::DayOfYear => format!("EXTRACT(DOY FROM {field})"),
        })
    }

    fn label(&self, field: &str, bucket: TimeBucket) -> Option<String> {
        let pattern = match bucket {
            TimeBucket::Hour => "YYYY-MM-DD HH24",
            TimeBucket::Day => "YYYY-MM-DD",
            TimeBucket::Week => "IYYY-IW",
            TimeBucket::Month => "YYYY-MM",
            TimeBucket::Year => "YYYY",
            TimeBucket::DayOfWeek => "Dy",
            TimeBucket::DayOfMonth => "DD",
            TimeBucket::DayOfYear => "DDD",
        };
        Some(format!("TO_CHAR({field}, '{pattern}')"))
    }
}

/// Builds the PostgreSQL dialect.
pub fn postgresql() -> Result<Dialect> {
    let identifiers = IdentifierRules::new('"', '"')
        .lower_case()
        .default_schema("public")
        .reserved(&[
            "ANALYSE", "ANALYZE", "ARRAY", "LIMIT", "OFFSET", "ONLY", "PLACING", "RETURNING",
            "SYMMETRIC", "VARIADIC",
        ]);
    Dialect::builder(DialectName::PostgreSql, identifiers)
        .type_policy(BooleanPolicy::new(BooleanStyle::YesNo))
        .type_policy(FloatingPolicy::new(ColumnType::Float, "REAL", NativeType::Real))
        .type_policy(FloatingPolicy::new(
            ColumnType::Double,
            "DOUBLE PRECISION",
            NativeType::Double,
        ))
        .type_policy(ClobPolicy::new(
            "TEXT",
            NativeType::Varchar,
            LobBinding::Plain,
            "CAST('' AS TEXT)",
        ))
        .type_policy(BlobPolicy::new(
            "BYTEA",
            NativeType::Binary,
            LobBinding::Stream,
            "CAST('' AS BYTEA)",
        ))
        .syntax(PostgresSyntax)
        .defaults(CastSuffixDefaults)
        .time_buckets(PostgresTimeBuckets)
        .max_inline_string(10_485_760)
        .reconstructs_views()
        .now_sql("SELECT LOCALTIMESTAMP", "SELECT NOW() AT TIME ZONE 'utc'")
        .build()
}
