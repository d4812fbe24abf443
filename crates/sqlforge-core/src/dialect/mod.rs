//! SQL dialects.
//!
//! A [`Dialect`] is composed from small per-responsibility pieces (type
//! policies, criteria policies, pagination, default matching, time
//! buckets and DDL templates) through [`DialectBuilder`]. Every piece has a
//! standard implementation; the dialect modules override only what their
//! database does differently.

mod defaults;
mod hsqldb;
mod mssql;
mod mysql;
mod oracle;
mod pagination;
mod postgres;
mod registry;
mod syntax;
mod time_bucket;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use defaults::{
    fold_unquoted, BareDefaults, CastSuffixDefaults, DefaultMatcher, ParenthesizedDefaults,
    QuotedDefaults,
};
pub use hsqldb::hsqldb;
pub use mssql::mssql;
pub use mysql::mysql;
pub use oracle::{oracle, oracle12};
pub use pagination::{LimitOffset, OffsetFetch, PaginationStrategy, RowNumFilter, TopInfix};
pub use postgres::postgresql;
pub use registry::DialectRegistry;
pub use syntax::{alter_table, ColumnTarget, DdlSyntax, StandardSyntax};
pub use time_bucket::{TimeBucket, TimeBucketExpr, TimeBucketRenderer, TruncToCharBuckets};

use crate::criteria::{clause_value_chunks, CriteriaPolicy, CriteriaPolicyTable, RestrictionType};
use crate::error::{Result, SqlGenError};
use crate::policy::{TypePolicy, TypePolicyTable};
use crate::types::ColumnType;

/// Words every dialect treats as reserved.
const STANDARD_RESERVED: &[&str] = &[
    "ALL", "ALTER", "AND", "AS", "ASC", "BETWEEN", "BY", "CASE", "CHECK", "COLUMN", "CONSTRAINT",
    "CREATE", "CROSS", "CURRENT", "DATE", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP", "ELSE",
    "END", "EXISTS", "FOR", "FOREIGN", "FROM", "FULL", "GRANT", "GROUP", "HAVING", "IN", "INDEX",
    "INNER", "INSERT", "INTO", "IS", "JOIN", "KEY", "LEFT", "LIKE", "NOT", "NULL", "OF", "ON",
    "OR", "ORDER", "OUTER", "PRIMARY", "REFERENCES", "RIGHT", "SELECT", "SET", "TABLE", "THEN",
    "TO", "UNION", "UNIQUE", "UPDATE", "USER", "VALUES", "VIEW", "WHEN", "WHERE", "WITH",
];

/// Name of a built-in dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectName {
    HsqlDb,
    PostgreSql,
    MySql,
    MsSql,
    Oracle,
    Oracle12,
}

impl DialectName {
    /// Every built-in dialect.
    pub const ALL: [Self; 6] = [
        Self::HsqlDb,
        Self::PostgreSql,
        Self::MySql,
        Self::MsSql,
        Self::Oracle,
        Self::Oracle12,
    ];

    /// Registry key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HsqlDb => "hsqldb",
            Self::PostgreSql => "postgresql",
            Self::MySql => "mysql",
            Self::MsSql => "mssql",
            Self::Oracle => "oracle",
            Self::Oracle12 => "oracle12",
        }
    }
}

impl fmt::Display for DialectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectName {
    type Err = SqlGenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hsqldb" => Ok(Self::HsqlDb),
            "postgresql" | "postgres" => Ok(Self::PostgreSql),
            "mysql" => Ok(Self::MySql),
            "mssql" | "sqlserver" => Ok(Self::MsSql),
            "oracle" => Ok(Self::Oracle),
            "oracle12" | "oracle12c" => Ok(Self::Oracle12),
            _ => Err(SqlGenError::UnknownDialect(s.to_string())),
        }
    }
}

/// Identifier quoting and case rules.
#[derive(Debug, Clone)]
pub struct IdentifierRules {
    open_quote: char,
    close_quote: char,
    lower_case: bool,
    default_schema: Option<&'static str>,
    reserved: HashSet<&'static str>,
}

impl IdentifierRules {
    /// Rules quoting with `open`/`close` and reserving the standard words.
    #[must_use]
    pub fn new(open_quote: char, close_quote: char) -> Self {
        Self {
            open_quote,
            close_quote,
            lower_case: false,
            default_schema: None,
            reserved: STANDARD_RESERVED.iter().copied().collect(),
        }
    }

    /// Folds every identifier to lower case.
    #[must_use]
    pub const fn lower_case(mut self) -> Self {
        self.lower_case = true;
        self
    }

    /// Sets the schema used when an entity names none.
    #[must_use]
    pub const fn default_schema(mut self, schema: &'static str) -> Self {
        self.default_schema = Some(schema);
        self
    }

    /// Adds dialect-specific reserved words (upper case).
    #[must_use]
    pub fn reserved(mut self, words: &[&'static str]) -> Self {
        self.reserved.extend(words.iter().copied());
        self
    }

    /// Whether identifiers are folded to lower case.
    #[must_use]
    pub const fn is_lower_case(&self) -> bool {
        self.lower_case
    }

    /// Schema used when an entity names none.
    #[must_use]
    pub const fn schema(&self) -> Option<&'static str> {
        self.default_schema
    }

    /// Applies the dialect's case folding.
    #[must_use]
    pub fn fold(&self, name: &str) -> String {
        if self.lower_case {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }

    /// Quotes unconditionally, doubling embedded closing quotes.
    #[must_use]
    pub fn quote(&self, name: &str) -> String {
        let close = self.close_quote;
        let escaped = name.replace(close, &format!("{close}{close}"));
        format!("{}{escaped}{close}", self.open_quote)
    }

    /// Returns `true` if `name` must be quoted to be used as an identifier.
    #[must_use]
    pub fn needs_quoting(&self, name: &str) -> bool {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return true;
        };
        !(first.is_ascii_alphabetic() || first == '_')
            || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            || self.reserved.contains(name.to_ascii_uppercase().as_str())
    }

    /// Preferred form: folded, and quoted only when required.
    #[must_use]
    pub fn preferred(&self, name: &str) -> String {
        let folded = self.fold(name);
        if self.needs_quoting(&folded) {
            self.quote(&folded)
        } else {
            folded
        }
    }

    /// Preferred form qualified by a schema, when there is one.
    #[must_use]
    pub fn qualified(&self, schema: Option<&str>, name: &str) -> String {
        match schema {
            Some(schema) => format!("{}.{}", self.preferred(schema), self.preferred(name)),
            None => self.preferred(name),
        }
    }
}

/// How string concatenation is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatStyle {
    /// Infix operator (`||`, `+`).
    Operator(&'static str),
    /// `CONCAT(a, b, ...)`.
    Function,
}

/// A complete SQL dialect.
#[derive(Debug)]
pub struct Dialect {
    name: DialectName,
    identifiers: IdentifierRules,
    types: Vec<Arc<dyn TypePolicy>>,
    criteria: Vec<Arc<dyn CriteriaPolicy>>,
    pagination: Box<dyn PaginationStrategy>,
    defaults: Box<dyn DefaultMatcher>,
    time_buckets: Box<dyn TimeBucketRenderer>,
    syntax: Box<dyn DdlSyntax>,
    concat: ConcatStyle,
    max_clause_values: Option<usize>,
    max_inline_string: Option<u32>,
    constraints_on_create: bool,
    reconstructs_views: bool,
    test_sql: &'static str,
    now_sql: &'static str,
    utc_now_sql: &'static str,
}

impl Dialect {
    /// Starts a dialect with the standard pieces.
    pub fn builder(name: DialectName, identifiers: IdentifierRules) -> DialectBuilder {
        DialectBuilder::new(name, identifiers)
    }

    /// Dialect name.
    #[must_use]
    pub const fn name(&self) -> DialectName {
        self.name
    }

    /// Identifier rules.
    #[must_use]
    pub const fn identifiers(&self) -> &IdentifierRules {
        &self.identifiers
    }

    /// Type policy for a column type.
    #[must_use]
    pub fn type_policy(&self, column_type: ColumnType) -> &dyn TypePolicy {
        self.types[column_type as usize].as_ref()
    }

    /// Type actually used for a field of `column_type` and `length`:
    /// strings longer than the dialect's inline maximum become CLOBs.
    #[must_use]
    pub fn effective_type(&self, column_type: ColumnType, length: u32) -> ColumnType {
        match (column_type, self.max_inline_string) {
            (ColumnType::String, Some(max)) if length > max => ColumnType::Clob,
            _ => column_type,
        }
    }

    /// Type policy for a field of `column_type` and `length`, honoring the
    /// string overflow rule of [`effective_type`](Self::effective_type).
    #[must_use]
    pub fn type_policy_for(&self, column_type: ColumnType, length: u32) -> &dyn TypePolicy {
        self.type_policy(self.effective_type(column_type, length))
    }

    /// Criteria policy for a restriction type.
    #[must_use]
    pub fn criteria_policy(&self, restriction: RestrictionType) -> &dyn CriteriaPolicy {
        self.criteria[restriction as usize].as_ref()
    }

    /// Pagination strategy.
    #[must_use]
    pub fn pagination(&self) -> &dyn PaginationStrategy {
        self.pagination.as_ref()
    }

    /// Default matcher.
    #[must_use]
    pub fn default_matcher(&self) -> &dyn DefaultMatcher {
        self.defaults.as_ref()
    }

    /// DDL templates.
    #[must_use]
    pub fn syntax(&self) -> &dyn DdlSyntax {
        self.syntax.as_ref()
    }

    /// Renders a time bucket over `field`.
    pub fn time_bucket(&self, field: &str, bucket: TimeBucket) -> Result<TimeBucketExpr> {
        let unsupported = || SqlGenError::UnsupportedTimeBucket {
            dialect: self.name.to_string(),
            bucket,
        };
        let truncated = self
            .time_buckets
            .truncate(field, bucket)
            .ok_or_else(unsupported)?;
        let label = self.time_buckets.label(field, bucket).ok_or_else(unsupported)?;
        Ok(TimeBucketExpr { truncated, label })
    }

    /// Concatenates string expressions.
    #[must_use]
    pub fn concat(&self, parts: &[&str]) -> String {
        match self.concat {
            ConcatStyle::Operator(op) => parts.join(&format!(" {op} ")),
            ConcatStyle::Function => format!("CONCAT({})", parts.join(", ")),
        }
    }

    /// Largest number of values in one `IN (...)` list, `None` if unbounded.
    #[must_use]
    pub const fn max_clause_values(&self) -> Option<usize> {
        self.max_clause_values
    }

    /// Splits IN-list values into chunks the dialect accepts.
    #[must_use]
    pub fn clause_value_chunks<'v, T>(&self, values: &'v [T]) -> Vec<&'v [T]> {
        clause_value_chunks(values, self.max_clause_values)
    }

    /// Largest inline string length, `None` if unbounded.
    #[must_use]
    pub const fn max_inline_string(&self) -> Option<u32> {
        self.max_inline_string
    }

    /// Whether unique constraints and indexes are declared inside
    /// `CREATE TABLE`.
    #[must_use]
    pub const fn constraints_on_create(&self) -> bool {
        self.constraints_on_create
    }

    /// Whether views must be dropped and recreated when their table changes.
    #[must_use]
    pub const fn reconstructs_views(&self) -> bool {
        self.reconstructs_views
    }

    /// Connection test query.
    #[must_use]
    pub const fn test_sql(&self) -> &'static str {
        self.test_sql
    }

    /// Query returning the database's current local timestamp.
    #[must_use]
    pub const fn now_sql(&self) -> &'static str {
        self.now_sql
    }

    /// Query returning the database's current UTC timestamp.
    #[must_use]
    pub const fn utc_now_sql(&self) -> &'static str {
        self.utc_now_sql
    }
}

/// Builder for [`Dialect`]. Starts from the standard pieces.
#[derive(Debug)]
#[must_use]
pub struct DialectBuilder {
    name: DialectName,
    identifiers: IdentifierRules,
    types: TypePolicyTable,
    criteria: CriteriaPolicyTable,
    pagination: Box<dyn PaginationStrategy>,
    defaults: Box<dyn DefaultMatcher>,
    time_buckets: Box<dyn TimeBucketRenderer>,
    syntax: Box<dyn DdlSyntax>,
    concat: ConcatStyle,
    max_clause_values: Option<usize>,
    max_inline_string: Option<u32>,
    constraints_on_create: bool,
    reconstructs_views: bool,
    test_sql: &'static str,
    now_sql: &'static str,
    utc_now_sql: &'static str,
}

impl DialectBuilder {
    fn new(name: DialectName, identifiers: IdentifierRules) -> Self {
        Self {
            name,
            identifiers,
            types: TypePolicyTable::standard(),
            criteria: CriteriaPolicyTable::standard(),
            pagination: Box::new(LimitOffset::new()),
            defaults: Box::new(QuotedDefaults),
            time_buckets: Box::new(TruncToCharBuckets),
            syntax: Box::new(StandardSyntax),
            concat: ConcatStyle::Operator("||"),
            max_clause_values: None,
            max_inline_string: None,
            constraints_on_create: false,
            reconstructs_views: false,
            test_sql: "SELECT 1",
            now_sql: "SELECT CURRENT_TIMESTAMP",
            utc_now_sql: "SELECT CURRENT_TIMESTAMP",
        }
    }

    /// Replaces the whole type policy table.
    pub fn types(mut self, types: TypePolicyTable) -> Self {
        self.types = types;
        self
    }

    /// Overrides one type policy.
    pub fn type_policy(mut self, policy: impl TypePolicy + 'static) -> Self {
        self.types = self.types.with(policy);
        self
    }

    /// Replaces the whole criteria policy table.
    pub fn criteria(mut self, criteria: CriteriaPolicyTable) -> Self {
        self.criteria = criteria;
        self
    }

    /// Overrides one criteria policy.
    pub fn criteria_policy(mut self, policy: impl CriteriaPolicy + 'static) -> Self {
        self.criteria = self.criteria.with(policy);
        self
    }

    /// Sets the pagination strategy.
    pub fn pagination(mut self, pagination: impl PaginationStrategy + 'static) -> Self {
        self.pagination = Box::new(pagination);
        self
    }

    /// Sets the default matcher.
    pub fn defaults(mut self, defaults: impl DefaultMatcher + 'static) -> Self {
        self.defaults = Box::new(defaults);
        self
    }

    /// Sets the time bucket renderer.
    pub fn time_buckets(mut self, renderer: impl TimeBucketRenderer + 'static) -> Self {
        self.time_buckets = Box::new(renderer);
        self
    }

    /// Sets the DDL templates.
    pub fn syntax(mut self, syntax: impl DdlSyntax + 'static) -> Self {
        self.syntax = Box::new(syntax);
        self
    }

    /// Sets the concatenation style.
    pub const fn concat(mut self, concat: ConcatStyle) -> Self {
        self.concat = concat;
        self
    }

    /// Limits the values of one `IN (...)` list.
    pub const fn max_clause_values(mut self, max: usize) -> Self {
        self.max_clause_values = Some(max);
        self
    }

    /// Limits inline string length; longer strings are stored as CLOBs.
    pub const fn max_inline_string(mut self, max: u32) -> Self {
        self.max_inline_string = Some(max);
        self
    }

    /// Declares unique constraints and indexes inside `CREATE TABLE`.
    pub const fn constraints_on_create(mut self) -> Self {
        self.constraints_on_create = true;
        self
    }

    /// Drops and recreates views when their table changes.
    pub const fn reconstructs_views(mut self) -> Self {
        self.reconstructs_views = true;
        self
    }

    /// Sets the connection test query.
    pub const fn test_sql(mut self, sql: &'static str) -> Self {
        self.test_sql = sql;
        self
    }

    /// Sets the local and UTC timestamp queries.
    pub const fn now_sql(mut self, now: &'static str, utc_now: &'static str) -> Self {
        self.now_sql = now;
        self.utc_now_sql = utc_now;
        self
    }

    /// Checks completeness and assembles the dialect.
    ///
    /// Fails with [`SqlGenError::MissingTypePolicy`] or
    /// [`SqlGenError::MissingCriteriaPolicy`] when a type or restriction is
    /// not covered.
    pub fn build(self) -> Result<Dialect> {
        let dialect = self.name.to_string();
        let types = ColumnType::ALL
            .iter()
            .map(|&ct| {
                self.types
                    .get(ct)
                    .cloned()
                    .ok_or_else(|| SqlGenError::MissingTypePolicy {
                        dialect: dialect.clone(),
                        column_type: ct,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        let criteria = RestrictionType::ALL
            .iter()
            .map(|&r| {
                self.criteria
                    .get(r)
                    .cloned()
                    .ok_or_else(|| SqlGenError::MissingCriteriaPolicy {
                        dialect: dialect.clone(),
                        restriction: r,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(dialect = %self.name, "Dialect assembled");
        Ok(Dialect {
            name: self.name,
            identifiers: self.identifiers,
            types,
            criteria,
            pagination: self.pagination,
            defaults: self.defaults,
            time_buckets: self.time_buckets,
            syntax: self.syntax,
            concat: self.concat,
            max_clause_values: self.max_clause_values,
            max_inline_string: self.max_inline_string,
            constraints_on_create: self.constraints_on_create,
            reconstructs_views: self.reconstructs_views,
            test_sql: self.test_sql,
            now_sql: self.now_sql,
            utc_now_sql: self.utc_now_sql,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::standard::StringPolicy;

    #[derive(Debug)]
    struct DailyOnly;

    impl TimeBucketRenderer for DailyOnly {
        fn truncate(&self, field: &str, bucket: TimeBucket) -> Option<String> {
            (bucket == TimeBucket::Day).then(|| format!("CAST({field} AS DATE)"))
        }

        fn label(&self, field: &str, bucket: TimeBucket) -> Option<String> {
            self.truncate(field, bucket)
        }
    }

    #[test]
    fn test_identifier_quoting() {
        let rules = IdentifierRules::new('[', ']');
        assert_eq!(rules.preferred("ACCOUNT"), "ACCOUNT");
        assert_eq!(rules.preferred("ORDER"), "[ORDER]");
        assert_eq!(rules.preferred("MY TABLE"), "[MY TABLE]");
        assert_eq!(rules.quote("A]B"), "[A]]B]");
    }

    #[test]
    fn test_lower_case_folding() {
        let rules = IdentifierRules::new('"', '"')
            .lower_case()
            .default_schema("public");
        assert_eq!(rules.preferred("CREATED_ON"), "created_on");
        assert_eq!(rules.preferred("user"), "\"user\"");
        assert_eq!(rules.qualified(Some("public"), "ACCOUNT"), "public.account");
    }

    #[test]
    fn test_dialect_name_parsing() {
        assert_eq!("Postgres".parse::<DialectName>().unwrap(), DialectName::PostgreSql);
        assert_eq!("oracle12".parse::<DialectName>().unwrap(), DialectName::Oracle12);
        let err = "db2".parse::<DialectName>().unwrap_err();
        assert!(matches!(err, SqlGenError::UnknownDialect(k) if k == "db2"));
    }

    #[test]
    fn test_incomplete_type_table_is_rejected() {
        let err = Dialect::builder(DialectName::HsqlDb, IdentifierRules::new('"', '"'))
            .types(TypePolicyTable::new().with(StringPolicy::new(ColumnType::String, "VARCHAR")))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            SqlGenError::MissingTypePolicy {
                column_type: ColumnType::Character,
                ..
            }
        ));
    }

    #[test]
    fn test_incomplete_criteria_table_is_rejected() {
        let err = Dialect::builder(DialectName::HsqlDb, IdentifierRules::new('"', '"'))
            .criteria(CriteriaPolicyTable::new())
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            SqlGenError::MissingCriteriaPolicy {
                restriction: RestrictionType::Equals,
                ..
            }
        ));
    }

    #[test]
    fn test_unsupported_time_bucket() {
        let dialect = Dialect::builder(DialectName::HsqlDb, IdentifierRules::new('"', '"'))
            .time_buckets(DailyOnly)
            .build()
            .unwrap();
        assert_eq!(
            dialect.time_bucket("D", TimeBucket::Day).unwrap().truncated,
            "CAST(D AS DATE)"
        );
        let err = dialect.time_bucket("D", TimeBucket::Week).unwrap_err();
        assert!(matches!(
            err,
            SqlGenError::UnsupportedTimeBucket {
                bucket: TimeBucket::Week,
                ..
            }
        ));
    }

    #[test]
    fn test_string_overflow_becomes_clob() {
        let dialect = Dialect::builder(DialectName::HsqlDb, IdentifierRules::new('"', '"'))
            .max_inline_string(4000)
            .build()
            .unwrap();
        assert_eq!(dialect.effective_type(ColumnType::String, 4000), ColumnType::String);
        assert_eq!(dialect.effective_type(ColumnType::String, 4001), ColumnType::Clob);
        assert_eq!(
            dialect.type_policy_for(ColumnType::String, 5000).column_type(),
            ColumnType::Clob
        );
    }

    #[test]
    fn test_concat_styles() {
        let function = Dialect::builder(DialectName::MySql, IdentifierRules::new('`', '`'))
            .concat(ConcatStyle::Function)
            .build()
            .unwrap();
        assert_eq!(function.concat(&["A", "'-'", "B"]), "CONCAT(A, '-', B)");
        let operator = Dialect::builder(DialectName::HsqlDb, IdentifierRules::new('"', '"'))
            .build()
            .unwrap();
        assert_eq!(operator.concat(&["A", "B"]), "A || B");
    }
}
