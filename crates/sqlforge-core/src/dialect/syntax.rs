//! DDL statement templates.
//!
//! [`DdlSyntax`] carries the ANSI/HSQLDB form of every ALTER/DROP statement
//! as a default method; dialects override only what they spell differently.

use std::fmt;

/// A column being altered, with everything the templates may need.
///
/// Names are already in preferred form (case folded, quoted if needed).
#[derive(Debug, Clone, Copy)]
pub struct ColumnTarget<'a> {
    /// Preferred, schema-qualified table name.
    pub table: &'a str,
    /// Raw table name, for deriving constraint names.
    pub table_name: &'a str,
    /// Preferred column name.
    pub column: &'a str,
    /// Raw column name, for deriving constraint names.
    pub column_name: &'a str,
    /// Full type declaration.
    pub type_decl: &'a str,
    /// Desired nullability.
    pub nullable: bool,
    /// Desired default, rendered as a literal.
    pub default_literal: Option<&'a str>,
    /// Whether the existing column has a default.
    pub had_default: bool,
}

impl ColumnTarget<'_> {
    /// `NULL` or `NOT NULL`.
    #[must_use]
    pub const fn null_keyword(&self) -> &'static str {
        if self.nullable {
            "NULL"
        } else {
            "NOT NULL"
        }
    }
}

/// Joins an `ALTER TABLE` head and clause with the layout separator.
#[must_use]
pub fn alter_table(table: &str, sep: &str, clause: &str) -> String {
    format!("ALTER TABLE {table}{sep}{clause}")
}

/// Dialect spelling of DDL statements.
///
/// `sep` is the separator between `ALTER TABLE <t>` and its clause: a
/// space for compact output, a newline for pretty output.
pub trait DdlSyntax: fmt::Debug + Send + Sync {
    /// Keyword introducing an added column.
    fn add_column_keyword(&self) -> &'static str {
        "ADD COLUMN"
    }

    /// Clause following the type of an integral primary key column.
    fn identity_clause(&self) -> &'static str {
        "GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY NOT NULL"
    }

    /// Extra statements creating identity support after `CREATE TABLE`.
    fn identity_statements(&self, _table: &str, _table_name: &str, _column: &str) -> Vec<String> {
        Vec::new()
    }

    /// Extra statements removing identity support after `DROP TABLE`.
    fn drop_identity_statements(&self, _table_name: &str) -> Vec<String> {
        Vec::new()
    }

    /// Whether nullable columns are declared with an explicit `NULL`.
    fn explicit_null(&self) -> bool {
        false
    }

    /// Default clause of a column definition, including the leading space.
    fn column_default_clause(&self, _target: &ColumnTarget<'_>, literal: &str) -> String {
        format!(" DEFAULT {literal}")
    }

    /// Whether [`alter_column_type`](Self::alter_column_type) also states
    /// the column's nullability.
    fn bundles_nullability(&self) -> bool {
        false
    }

    /// Changes a column's data type.
    fn alter_column_type(&self, t: &ColumnTarget<'_>, sep: &str) -> String {
        alter_table(
            t.table,
            sep,
            &format!("ALTER COLUMN {} SET DATA TYPE {}", t.column, t.type_decl),
        )
    }

    /// Sets a column default.
    fn set_default(&self, t: &ColumnTarget<'_>, literal: &str, sep: &str) -> Vec<String> {
        vec![alter_table(
            t.table,
            sep,
            &format!("ALTER COLUMN {} SET DEFAULT {literal}", t.column),
        )]
    }

    /// Removes a column default.
    fn drop_default(&self, t: &ColumnTarget<'_>, sep: &str) -> Vec<String> {
        vec![alter_table(
            t.table,
            sep,
            &format!("ALTER COLUMN {} DROP DEFAULT", t.column),
        )]
    }

    /// Changes a column's nullability to `t.nullable`.
    fn set_nullable(&self, t: &ColumnTarget<'_>, sep: &str) -> String {
        alter_table(
            t.table,
            sep,
            &format!("ALTER COLUMN {} SET {}", t.column, t.null_keyword()),
        )
    }

    /// Renames a table.
    fn rename_table(&self, table: &str, new_table: &str, sep: &str) -> String {
        alter_table(table, sep, &format!("RENAME TO {new_table}"))
    }

    /// Renames a column; `t` describes the column under its old name.
    fn rename_column(&self, t: &ColumnTarget<'_>, new_column: &str, sep: &str) -> String {
        alter_table(
            t.table,
            sep,
            &format!("ALTER COLUMN {} RENAME TO {new_column}", t.column),
        )
    }

    /// Drops a column.
    fn drop_column(&self, table: &str, column: &str, sep: &str) -> String {
        alter_table(table, sep, &format!("DROP COLUMN {column}"))
    }

    /// Drops an index.
    fn drop_index(&self, _table: &str, index: &str) -> String {
        format!("DROP INDEX {index}")
    }

    /// Drops a unique constraint.
    fn drop_unique_constraint(&self, table: &str, name: &str, sep: &str) -> String {
        alter_table(table, sep, &format!("DROP CONSTRAINT {name}"))
    }

    /// Drops a foreign key constraint.
    fn drop_foreign_key(&self, table: &str, name: &str, sep: &str) -> String {
        alter_table(table, sep, &format!("DROP CONSTRAINT {name}"))
    }

    /// Drops a check constraint.
    fn drop_check_constraint(&self, table: &str, name: &str, sep: &str) -> String {
        alter_table(table, sep, &format!("DROP CONSTRAINT {name}"))
    }

    /// Index line inside `CREATE TABLE`, for dialects that create indexes
    /// inline.
    fn inline_index(&self, name: &str, columns: &str, unique: bool) -> String {
        let unique = if unique { "UNIQUE " } else { "" };
        format!("{unique}INDEX {name} ({columns})")
    }
}

/// The default templates, as spoken by HSQLDB.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardSyntax;

impl DdlSyntax for StandardSyntax {}

#[cfg(test)]
pub(crate) fn target<'a>(column: &'a str, type_decl: &'a str, nullable: bool) -> ColumnTarget<'a> {
    ColumnTarget {
        table: "ACCOUNT",
        table_name: "ACCOUNT",
        column,
        column_name: column,
        type_decl,
        nullable,
        default_literal: None,
        had_default: false,
    }
}
