//! Oracle dialects.
//!
//! [`oracle`] targets releases without identity columns or row limiting
//! clauses: keys are fed by a sequence and trigger, and result windows use
//! `ROWNUM`. [`oracle12`] uses `GENERATED BY DEFAULT AS IDENTITY` and
//! `OFFSET ... FETCH NEXT`.

use super::syntax::{alter_table, ColumnTarget, DdlSyntax};
use super::{
    Dialect, DialectBuilder, DialectName, IdentifierRules, OffsetFetch, RowNumFilter,
};
use crate::error::Result;
use crate::policy::standard::{
    BlobPolicy, BooleanPolicy, BooleanStyle, ClobPolicy, DatePolicy, DecimalPolicy,
    FloatingPolicy, IntegerPolicy, LobBinding, StringPolicy, TemporalLiteral, TimestampPolicy,
};
use crate::types::{ColumnType, NativeType};

/// How generated keys are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleIdentity {
    /// `<TABLE>_SEQ` sequence plus a `BEFORE INSERT` trigger.
    SequenceTrigger,
    /// Identity column.
    Generated,
}

/// Oracle spelling of column alterations.
#[derive(Debug, Clone, Copy)]
pub struct OracleSyntax {
    identity: OracleIdentity,
}

impl OracleSyntax {
    /// Creates the templates for the given key generation.
    #[must_use]
    pub const fn new(identity: OracleIdentity) -> Self {
        Self { identity }
    }

    fn sequence(table_name: &str) -> String {
        format!("{}_SEQ", table_name.to_ascii_uppercase())
    }
}

impl DdlSyntax for OracleSyntax {
    fn add_column_keyword(&self) -> &'static str {
        "ADD"
    }

    fn identity_clause(&self) -> &'static str {
        match self.identity {
            OracleIdentity::SequenceTrigger => "NOT NULL PRIMARY KEY",
            OracleIdentity::Generated => "GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY",
        }
    }

    fn identity_statements(&self, table: &str, table_name: &str, column: &str) -> Vec<String> {
        if self.identity == OracleIdentity::Generated {
            return Vec::new();
        }
        let sequence = Self::sequence(table_name);
        let trigger = format!("{}_TRG", table_name.to_ascii_uppercase());
        vec![
            format!("CREATE SEQUENCE {sequence} START WITH 1 INCREMENT BY 1"),
            format!(
                "CREATE OR REPLACE TRIGGER {trigger} BEFORE INSERT ON {table} FOR EACH ROW \
                 WHEN (NEW.{column} IS NULL) BEGIN SELECT {sequence}.NEXTVAL INTO :NEW.{column} \
                 FROM DUAL; END;"
            ),
        ]
    }

    fn drop_identity_statements(&self, table_name: &str) -> Vec<String> {
        match self.identity {
            OracleIdentity::SequenceTrigger => {
                vec![format!("DROP SEQUENCE {}", Self::sequence(table_name))]
            }
            OracleIdentity::Generated => Vec::new(),
        }
    }

    fn alter_column_type(&self, t: &ColumnTarget<'_>, sep: &str) -> String {
        alter_table(t.table, sep, &format!("MODIFY ({} {})", t.column, t.type_decl))
    }

    fn set_default(&self, t: &ColumnTarget<'_>, literal: &str, sep: &str) -> Vec<String> {
        vec![alter_table(
            t.table,
            sep,
            &format!("MODIFY ({} DEFAULT {literal})", t.column),
        )]
    }

    fn drop_default(&self, t: &ColumnTarget<'_>, sep: &str) -> Vec<String> {
        vec![alter_table(
            t.table,
            sep,
            &format!("MODIFY ({} DEFAULT NULL)", t.column),
        )]
    }

    fn set_nullable(&self, t: &ColumnTarget<'_>, sep: &str) -> String {
        alter_table(
            t.table,
            sep,
            &format!("MODIFY ({} {})", t.column, t.null_keyword()),
        )
    }

    fn rename_column(&self, t: &ColumnTarget<'_>, new_column: &str, sep: &str) -> String {
        alter_table(
            t.table,
            sep,
            &format!("RENAME COLUMN {} TO {new_column}", t.column),
        )
    }
}

fn base(name: DialectName, identity: OracleIdentity) -> DialectBuilder {
    let identifiers = IdentifierRules::new('"', '"').reserved(&[
        "ACCESS", "AUDIT", "COMMENT", "FILE", "LEVEL", "MODE", "NUMBER", "RAW", "RESOURCE",
        "ROWID", "ROWNUM", "SESSION", "SIZE", "START", "SYSDATE", "UID", "VARCHAR2",
    ]);
    Dialect::builder(name, identifiers)
        .type_policy(BooleanPolicy::new(BooleanStyle::YesNo))
        .type_policy(
            IntegerPolicy::new(ColumnType::Short, "NUMBER(5)", NativeType::Numeric).with_digits(5),
        )
        .type_policy(
            IntegerPolicy::new(ColumnType::Integer, "NUMBER(10)", NativeType::Numeric)
                .with_digits(10),
        )
        .type_policy(
            IntegerPolicy::new(ColumnType::Long, "NUMBER(19)", NativeType::Numeric)
                .with_digits(19),
        )
        .type_policy(FloatingPolicy::new(ColumnType::Float, "FLOAT", NativeType::Float))
        .type_policy(FloatingPolicy::new(
            ColumnType::Double,
            "DOUBLE PRECISION",
            NativeType::Float,
        ))
        .type_policy(DecimalPolicy::new("NUMBER", NativeType::Numeric))
        .type_policy(DatePolicy::new(TemporalLiteral::OracleFunction))
        .type_policy(TimestampPolicy::new(
            ColumnType::Timestamp,
            "TIMESTAMP",
            TemporalLiteral::OracleFunction,
        ))
        .type_policy(TimestampPolicy::new(
            ColumnType::TimestampUtc,
            "TIMESTAMP",
            TemporalLiteral::OracleFunction,
        ))
        .type_policy(ClobPolicy::new(
            "CLOB",
            NativeType::Clob,
            LobBinding::StreamEmptyAsNull,
            "EMPTY_CLOB()",
        ))
        .type_policy(BlobPolicy::new(
            "BLOB",
            NativeType::Blob,
            LobBinding::StreamEmptyAsNull,
            "EMPTY_BLOB()",
        ))
        .type_policy(StringPolicy::new(ColumnType::String, "VARCHAR2").with_alt_default(" "))
        .type_policy(StringPolicy::new(ColumnType::EnumConstant, "VARCHAR2").with_alt_default(" "))
        .syntax(OracleSyntax::new(identity))
        .max_clause_values(1000)
        .max_inline_string(4000)
        .reconstructs_views()
        .test_sql("SELECT 1 FROM DUAL")
        .now_sql(
            "SELECT LOCALTIMESTAMP FROM DUAL",
            "SELECT SYS_EXTRACT_UTC(SYSTIMESTAMP) FROM DUAL",
        )
}

/// Builds the Oracle dialect for releases before 12c.
pub fn oracle() -> Result<Dialect> {
    base(DialectName::Oracle, OracleIdentity::SequenceTrigger)
        .pagination(RowNumFilter::new("oracle"))
        .build()
}

/// Builds the Oracle 12c dialect.
pub fn oracle12() -> Result<Dialect> {
    base(DialectName::Oracle12, OracleIdentity::Generated)
        .pagination(OffsetFetch)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::syntax::target;

    #[test]
    fn test_sequence_and_trigger() {
        let syntax = OracleSyntax::new(OracleIdentity::SequenceTrigger);
        let statements = syntax.identity_statements("ACCOUNT", "account", "ID");
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[0],
            "CREATE SEQUENCE ACCOUNT_SEQ START WITH 1 INCREMENT BY 1"
        );
        assert!(statements[1].starts_with("CREATE OR REPLACE TRIGGER ACCOUNT_TRG"));
        assert!(statements[1].contains("ACCOUNT_SEQ.NEXTVAL INTO :NEW.ID"));
        assert_eq!(
            syntax.drop_identity_statements("ACCOUNT"),
            vec!["DROP SEQUENCE ACCOUNT_SEQ"]
        );
        let modern = OracleSyntax::new(OracleIdentity::Generated);
        assert!(modern.identity_statements("ACCOUNT", "ACCOUNT", "ID").is_empty());
    }

    #[test]
    fn test_modify_clauses() {
        let syntax = OracleSyntax::new(OracleIdentity::Generated);
        let t = target("NAME", "VARCHAR2(80)", false);
        assert_eq!(
            syntax.alter_column_type(&t, " "),
            "ALTER TABLE ACCOUNT MODIFY (NAME VARCHAR2(80))"
        );
        assert_eq!(
            syntax.set_nullable(&t, " "),
            "ALTER TABLE ACCOUNT MODIFY (NAME NOT NULL)"
        );
        assert_eq!(
            syntax.drop_default(&t, " "),
            vec!["ALTER TABLE ACCOUNT MODIFY (NAME DEFAULT NULL)"]
        );
    }

    #[test]
    fn test_oracle_types() {
        let d = oracle().unwrap();
        assert_eq!(d.type_policy(ColumnType::Integer).render_type(0, 0, 0), "NUMBER(10)");
        assert_eq!(d.type_policy(ColumnType::Decimal).render_type(0, 12, 4), "NUMBER(12,4)");
        assert_eq!(d.type_policy(ColumnType::String).render_type(80, 0, 0), "VARCHAR2(80)");
        assert_eq!(
            d.type_policy(ColumnType::Date).render_default("2024-02-29").unwrap(),
            "TO_DATE('2024-02-29', 'YYYY-MM-DD')"
        );
        assert_eq!(d.type_policy(ColumnType::Clob).render_default("").unwrap(), "EMPTY_CLOB()");
        assert_eq!(d.effective_type(ColumnType::String, 5000), ColumnType::Clob);
        assert_eq!(d.test_sql(), "SELECT 1 FROM DUAL");
    }

    #[test]
    fn test_oracle12_differs_in_window_and_identity() {
        let legacy = oracle().unwrap();
        let modern = oracle12().unwrap();
        let mut sql = String::new();
        assert!(modern.pagination().append_trailing_suffix(&mut sql, 20, 10).unwrap());
        assert_eq!(sql, " OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY");
        assert!(legacy.pagination().append_where_suffix(&mut sql, 20, 10, false).is_err());
        assert_ne!(
            legacy.syntax().identity_clause(),
            modern.syntax().identity_clause()
        );
    }
}
