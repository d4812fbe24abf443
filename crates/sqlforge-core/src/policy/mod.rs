//! Per-column-type rendering, default and binding rules.
//!
//! Every dialect owns one [`TypePolicy`] per [`ColumnType`], collected in a
//! [`TypePolicyTable`]. The standard policies in [`standard`] are
//! parameterized so that a dialect overrides only the few types whose
//! declaration, literal syntax or binding differs.

pub mod standard;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::binding::{BindContext, ColumnRef, ParameterSink, ResultRow};
use crate::error::{Result, SqlGenError};
use crate::types::{ColumnType, NativeType};
use crate::value::SqlValue;

/// Dialect rules for one logical column type.
pub trait TypePolicy: fmt::Debug + Send + Sync {
    /// The column type this policy serves.
    fn column_type(&self) -> ColumnType;

    /// Native type code the database reports for columns declared by
    /// [`render_type`](Self::render_type).
    fn native_type(&self) -> NativeType;

    /// Renders the column type declaration (`VARCHAR(64)`, `NUMBER(18,2)`).
    ///
    /// Zero `length`, `precision` or `scale` means "use the default".
    fn render_type(&self, length: u32, precision: u32, scale: u32) -> String;

    /// Size and decimal digits the database will report for a declaration,
    /// or `None` when the type has a fixed size that is not compared.
    fn native_dimensions(&self, _length: u32, _precision: u32, _scale: u32) -> Option<(u32, u32)> {
        None
    }

    /// Returns `true` when declared sizes are never compared.
    fn is_fixed_length(&self) -> bool {
        self.native_dimensions(0, 0, 0).is_none()
    }

    /// Renders a raw configured default as a SQL literal.
    fn render_default(&self, raw: &str) -> Result<String>;

    /// Raw default substituted when a NOT NULL column without a configured
    /// default needs a value for existing rows.
    fn alt_default(&self) -> &'static str;

    /// Literal written into existing NULL cells before a column becomes
    /// NOT NULL.
    fn backfill_literal(&self, raw: Option<&str>) -> Result<String> {
        match raw {
            Some(raw) if !raw.trim().is_empty() => self.render_default(raw),
            _ => self.render_default(self.alt_default()),
        }
    }

    /// Binds `value` at `index`.
    fn bind(
        &self,
        sink: &mut dyn ParameterSink,
        index: usize,
        value: &SqlValue,
        _ctx: &BindContext,
    ) -> Result<()> {
        if value.is_null() {
            return sink.set_null(index, self.native_type());
        }
        let value = value.clone().coerce(self.column_type())?;
        sink.set_value(index, &value)
    }

    /// Reads the value of `column` from `row`.
    fn extract(&self, row: &dyn ResultRow, column: &ColumnRef, _ctx: &BindContext) -> Result<SqlValue> {
        row.get_value(column, self.native_type())
    }
}

/// Quotes a string literal, doubling embedded single quotes.
#[must_use]
pub fn quote_literal(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}

/// Builds the error for an unparsable default.
pub(crate) fn invalid_default(column_type: ColumnType, raw: &str, reason: impl fmt::Display) -> SqlGenError {
    SqlGenError::InvalidDefault {
        column_type,
        value: raw.to_string(),
        reason: reason.to_string(),
    }
}

/// The type policies of one dialect, keyed by column type.
#[derive(Debug, Clone, Default)]
pub struct TypePolicyTable {
    policies: HashMap<ColumnType, Arc<dyn TypePolicy>>,
}

impl TypePolicyTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding the standard policy for every column type.
    #[must_use]
    pub fn standard() -> Self {
        standard::standard_policies()
    }

    /// Adds or replaces the policy for its column type.
    #[must_use]
    pub fn with(mut self, policy: impl TypePolicy + 'static) -> Self {
        self.insert(Arc::new(policy));
        self
    }

    /// Adds or replaces a shared policy.
    pub fn insert(&mut self, policy: Arc<dyn TypePolicy>) {
        self.policies.insert(policy.column_type(), policy);
    }

    /// Looks up the policy for a column type.
    #[must_use]
    pub fn get(&self, column_type: ColumnType) -> Option<&Arc<dyn TypePolicy>> {
        self.policies.get(&column_type)
    }

    /// Column types without a policy, in declaration order.
    #[must_use]
    pub fn missing(&self) -> Vec<ColumnType> {
        ColumnType::ALL
            .into_iter()
            .filter(|ct| !self.policies.contains_key(ct))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::standard::{IntegerPolicy, StringPolicy};
    use super::*;

    #[test]
    fn test_standard_table_is_complete() {
        assert!(TypePolicyTable::standard().missing().is_empty());
    }

    #[test]
    fn test_with_replaces_policy() {
        let table = TypePolicyTable::standard().with(IntegerPolicy::new(
            ColumnType::Long,
            "NUMBER(19)",
            NativeType::Numeric,
        ));
        let long = table.get(ColumnType::Long).unwrap();
        assert_eq!(long.render_type(0, 0, 0), "NUMBER(19)");
    }

    #[test]
    fn test_missing_lists_uncovered_types() {
        let table = TypePolicyTable::new().with(StringPolicy::new(ColumnType::String, "VARCHAR"));
        let missing = table.missing();
        assert_eq!(missing.len(), ColumnType::ALL.len() - 1);
        assert!(!missing.contains(&ColumnType::String));
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("O'Hara"), "'O''Hara'");
    }

    #[test]
    fn test_backfill_uses_alt_default() {
        let table = TypePolicyTable::standard();
        let int = table.get(ColumnType::Integer).unwrap();
        assert_eq!(int.backfill_literal(None).unwrap(), "0");
        assert_eq!(int.backfill_literal(Some("7")).unwrap(), "7");
        let s = table.get(ColumnType::String).unwrap();
        assert_eq!(s.backfill_literal(None).unwrap(), "''");
    }
}
