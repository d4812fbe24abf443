//! MySQL dialect.
//!
//! MySQL restates the whole column definition (`MODIFY`, `CHANGE COLUMN`)
//! for any change, so type and nullability always travel together and
//! indexes are declared inline when a table is created.

use super::syntax::{alter_table, ColumnTarget, DdlSyntax};
use super::{
    BareDefaults, ConcatStyle, Dialect, DialectName, IdentifierRules, LimitOffset, TimeBucket,
    TimeBucketRenderer,
};
use crate::criteria::{ComparisonPolicy, RestrictionType};
use crate::error::Result;
use crate::policy::standard::{
    BlobPolicy, ClobPolicy, FloatingPolicy, LobBinding, TemporalLiteral, TimestampPolicy,
};
use crate::types::{ColumnType, NativeType};

/// MySQL spelling of column alterations.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlSyntax;

impl MySqlSyntax {
    fn column_definition(t: &ColumnTarget<'_>, column: &str) -> String {
        let mut def = format!("{column} {}", t.type_decl);
        if let Some(literal) = t.default_literal {
            def.push_str(&format!(" DEFAULT {literal}"));
        }
        def.push(' ');
        def.push_str(t.null_keyword());
        def
    }
}

impl DdlSyntax for MySqlSyntax {
    fn add_column_keyword(&self) -> &'static str {
        "ADD"
    }

    fn identity_clause(&self) -> &'static str {
        "NOT NULL AUTO_INCREMENT PRIMARY KEY"
    }

    fn explicit_null(&self) -> bool {
        true
    }

    fn bundles_nullability(&self) -> bool {
        true
    }

    fn alter_column_type(&self, t: &ColumnTarget<'_>, sep: &str) -> String {
        alter_table(
            t.table,
            sep,
            &format!("MODIFY {}", Self::column_definition(t, t.column)),
        )
    }

    fn set_nullable(&self, t: &ColumnTarget<'_>, sep: &str) -> String {
        self.alter_column_type(t, sep)
    }

    fn rename_table(&self, table: &str, new_table: &str, _sep: &str) -> String {
        format!("RENAME TABLE {table} TO {new_table}")
    }

    fn rename_column(&self, t: &ColumnTarget<'_>, new_column: &str, sep: &str) -> String {
        alter_table(
            t.table,
            sep,
            &format!(
                "CHANGE COLUMN {} {}",
                t.column,
                Self::column_definition(t, new_column)
            ),
        )
    }

    fn drop_index(&self, table: &str, index: &str) -> String {
        format!("DROP INDEX {index} ON {table}")
    }

    fn drop_unique_constraint(&self, table: &str, name: &str, sep: &str) -> String {
        alter_table(table, sep, &format!("DROP INDEX {name}"))
    }

    fn drop_foreign_key(&self, table: &str, name: &str, sep: &str) -> String {
        alter_table(table, sep, &format!("DROP FOREIGN KEY {name}"))
    }

    fn drop_check_constraint(&self, table: &str, name: &str, sep: &str) -> String {
        alter_table(table, sep, &format!("DROP CHECK {name}"))
    }
}

/// `DATE_FORMAT` and the `DAYOF*` functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlTimeBuckets;

impl TimeBucketRenderer for MySqlTimeBuckets {
    fn truncate(&self, field: &str, bucket: TimeBucket) -> Option<String> {
        Some(match bucket {
            TimeBucket::Hour => format!("DATE_FORMAT({field}, '%Y-%m-%d %H:00:00')"),
            TimeBucket::Day => format!("DATE({field})"),
            TimeBucket::Week => format!("YEARWEEK({field}, 3)"),
            TimeBucket::Month => format!("DATE_FORMAT({field}, '%Y-%m-01')"),
            TimeBucket::Year => format!("YEAR({field})"),
            TimeBucket::DayOfWeek => format!("DAYOFWEEK({field})"),
            TimeBucket::DayOfMonth => format!("DAYOFMONTH({field})"),
            TimeBucket::DayOfYear => format!("DAYOFYEAR({field})"),
        })
    }

    fn label(&self, field: &str, bucket: TimeBucket) -> Option<String> {
        let pattern = match bucket {
            TimeBucket::Hour => "%Y-%m-%d %H",
            TimeBucket::Day => "%Y-%m-%d",
            TimeBucket::Week => "%x-%v",
            TimeBucket::Month => "%Y-%m",
            TimeBucket::Year => "%Y",
            TimeBucket::DayOfWeek => "%a",
            TimeBucket::DayOfMonth => "%d",
            TimeBucket::DayOfYear => "%j",
        };
        Some(format!("DATE_FORMAT({field}, '{pattern}')"))
    }
}

/// Builds the MySQL dialect.
pub fn mysql() -> Result<Dialect> {
    let identifiers = IdentifierRules::new('`', '`').reserved(&[
        "DESCRIBE", "INTERVAL", "LIMIT", "RANK", "READ", "SHOW", "SIGNAL", "USAGE",
    ]);
    Dialect::builder(DialectName::MySql, identifiers)
        .type_policy(FloatingPolicy::new(ColumnType::Float, "FLOAT", NativeType::Real))
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
            "MEDIUMTEXT",
            NativeType::LongVarchar,
            LobBinding::Plain,
            "''",
        ))
        .type_policy(BlobPolicy::new(
            "MEDIUMBLOB",
            NativeType::LongVarbinary,
            LobBinding::Plain,
            "''",
        ))
        .criteria_policy(ComparisonPolicy::new(RestrictionType::NotEquals, "!="))
        .syntax(MySqlSyntax)
        .defaults(BareDefaults)
        .pagination(LimitOffset::new().limit_required())
        .time_buckets(MySqlTimeBuckets)
        .concat(ConcatStyle::Function)
        .max_inline_string(65_535)
        .constraints_on_create()
        .now_sql("SELECT NOW()", "SELECT UTC_TIMESTAMP")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::syntax::target;

    #[test]
    fn test_modify_restates_definition() {
        let mut t = target("STATUS", "VARCHAR(16)", false);
        t.default_literal = Some("'NEW'");
        assert_eq!(
            MySqlSyntax.alter_column_type(&t, " "),
            "ALTER TABLE ACCOUNT MODIFY STATUS VARCHAR(16) DEFAULT 'NEW' NOT NULL"
        );
        assert_eq!(
            MySqlSyntax.set_nullable(&t, " "),
            MySqlSyntax.alter_column_type(&t, " ")
        );
    }

    #[test]
    fn test_change_column_renames() {
        let t = target("NM", "VARCHAR(40)", true);
        assert_eq!(
            MySqlSyntax.rename_column(&t, "NAME", "\n"),
            "ALTER TABLE ACCOUNT\nCHANGE COLUMN NM NAME VARCHAR(40) NULL"
        );
    }

    #[test]
    fn test_constraint_drops() {
        assert_eq!(
            MySqlSyntax.drop_foreign_key("ACCOUNT", "FK_ACCOUNT_1", " "),
            "ALTER TABLE ACCOUNT DROP FOREIGN KEY FK_ACCOUNT_1"
        );
        assert_eq!(
            MySqlSyntax.drop_unique_constraint("ACCOUNT", "UQ_ACCOUNT_1", " "),
            "ALTER TABLE ACCOUNT DROP INDEX UQ_ACCOUNT_1"
        );
        assert_eq!(
            MySqlSyntax.drop_index("ACCOUNT", "IX_ACCOUNT_1"),
            "DROP INDEX IX_ACCOUNT_1 ON ACCOUNT"
        );
    }

    #[test]
    fn test_mysql_dialect() {
        let d = mysql().unwrap();
        assert_eq!(d.identifiers().preferred("ORDER"), "`ORDER`");
        assert_eq!(d.type_policy(ColumnType::Clob).render_type(0, 0, 0), "MEDIUMTEXT");
        assert_eq!(
            d.criteria_policy(RestrictionType::NotEquals)
                .render("A", &["?"])
                .unwrap(),
            "A != ?"
        );
        assert_eq!(d.concat(&["A", "B"]), "CONCAT(A, B)");
        assert!(d.constraints_on_create());
        assert_eq!(d.utc_now_sql(), "SELECT UTC_TIMESTAMP");
    }
}
