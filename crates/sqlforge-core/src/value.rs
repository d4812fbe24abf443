//! Typed SQL values moved between callers and statements.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Result, SqlGenError};
use crate::types::ColumnType;

/// A SQL value bound to a parameter or read from a result column.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Single character.
    Char(char),
    /// 16-bit integer.
    Short(i16),
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    Long(i64),
    /// Single precision float.
    Float(f32),
    /// Double precision float.
    Double(f64),
    /// Decimal kept in its textual form to avoid rounding.
    Decimal(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Timestamp without zone.
    Timestamp(NaiveDateTime),
    /// Text value.
    Text(String),
    /// Binary value.
    Bytes(Vec<u8>),
}

impl SqlValue {
    /// Returns `true` for [`SqlValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the value kind, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "BOOL",
            Self::Char(_) => "CHAR",
            Self::Short(_) => "SHORT",
            Self::Int(_) => "INT",
            Self::Long(_) => "LONG",
            Self::Float(_) => "FLOAT",
            Self::Double(_) => "DOUBLE",
            Self::Decimal(_) => "DECIMAL",
            Self::Date(_) => "DATE",
            Self::Timestamp(_) => "TIMESTAMP",
            Self::Text(_) => "TEXT",
            Self::Bytes(_) => "BYTES",
        }
    }

    /// Logical column type that naturally holds this value.
    #[must_use]
    pub const fn natural_type(&self) -> Option<ColumnType> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(ColumnType::Boolean),
            Self::Char(_) => Some(ColumnType::Character),
            Self::Short(_) => Some(ColumnType::Short),
            Self::Int(_) => Some(ColumnType::Integer),
            Self::Long(_) => Some(ColumnType::Long),
            Self::Float(_) => Some(ColumnType::Float),
            Self::Double(_) => Some(ColumnType::Double),
            Self::Decimal(_) => Some(ColumnType::Decimal),
            Self::Date(_) => Some(ColumnType::Date),
            Self::Timestamp(_) => Some(ColumnType::Timestamp),
            Self::Text(_) => Some(ColumnType::String),
            Self::Bytes(_) => Some(ColumnType::Blob),
        }
    }

    /// Converts the value into the representation used for `target`.
    ///
    /// Conversions follow [`ColumnType::is_convertible_from`]; text is
    /// additionally accepted for enumeration constants and CLOBs.
    pub fn coerce(self, target: ColumnType) -> Result<Self> {
        let mismatch = |v: &Self| SqlGenError::ValueMismatch {
            column_type: target,
            value_kind: v.kind(),
        };
        let Some(natural) = self.natural_type() else {
            return Ok(self);
        };
        if natural == target {
            return Ok(self);
        }
        let text_target = matches!(
            target,
            ColumnType::String | ColumnType::Clob | ColumnType::EnumConstant
        );
        if !target.is_convertible_from(natural) && !(text_target && matches!(self, Self::Text(_)))
        {
            return Err(mismatch(&self));
        }
        let converted = match (target, self) {
            (ColumnType::String | ColumnType::Clob | ColumnType::EnumConstant, v) => {
                Self::Text(v.to_plain_string())
            }
            (ColumnType::Boolean, Self::Char(c)) => Self::Bool(matches!(c, 'Y' | 'y' | 'T' | 't' | '1')),
            (ColumnType::Integer, Self::Short(n)) => Self::Int(i32::from(n)),
            (ColumnType::Long, Self::Short(n)) => Self::Long(i64::from(n)),
            (ColumnType::Long, Self::Int(n)) => Self::Long(i64::from(n)),
            (ColumnType::Float, Self::Short(n)) => Self::Float(f32::from(n)),
            #[allow(clippy::cast_precision_loss)]
            (ColumnType::Float, Self::Int(n)) => Self::Float(n as f32),
            #[allow(clippy::cast_precision_loss)]
            (ColumnType::Float, Self::Long(n)) => Self::Float(n as f32),
            (ColumnType::Double, Self::Short(n)) => Self::Double(f64::from(n)),
            (ColumnType::Double, Self::Int(n)) => Self::Double(f64::from(n)),
            #[allow(clippy::cast_precision_loss)]
            (ColumnType::Double, Self::Long(n)) => Self::Double(n as f64),
            (ColumnType::Double, Self::Float(n)) => Self::Double(f64::from(n)),
            (ColumnType::Decimal, v) => Self::Decimal(v.to_plain_string()),
            (ColumnType::Timestamp | ColumnType::TimestampUtc, Self::Date(d)) => {
                Self::Timestamp(d.and_time(NaiveTime::MIN))
            }
            (ColumnType::TimestampUtc, v @ Self::Timestamp(_)) => v,
            (_, v) => return Err(mismatch(&v)),
        };
        Ok(converted)
    }

    /// Unquoted textual form, as used when widening to text.
    #[must_use]
    pub fn to_plain_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Char(c) => c.to_string(),
            Self::Short(n) => n.to_string(),
            Self::Int(n) => n.to_string(),
            Self::Long(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Double(f) => f.to_string(),
            Self::Decimal(s) | Self::Text(s) => s.clone(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            Self::Bytes(b) => b.iter().map(|byte| format!("{byte:02X}")).collect(),
        }
    }

    /// Returns the SQL representation for inline use (escaped).
    ///
    /// **Warning**: Prefer parameter placeholders and a binding plan.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Short(_)
            | Self::Int(_)
            | Self::Long(_)
            | Self::Float(_)
            | Self::Double(_)
            | Self::Decimal(_) => self.to_plain_string(),
            Self::Bytes(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
            Self::Char(_) | Self::Date(_) | Self::Timestamp(_) | Self::Text(_) => {
                let escaped = self.to_plain_string().replace('\'', "''");
                format!("'{escaped}'")
            }
        }
    }

    /// Returns the parameter placeholder.
    #[must_use]
    pub const fn placeholder() -> &'static str {
        "?"
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for char {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Char(self)
    }
}

impl ToSqlValue for i16 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Short(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Long(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Double(self)
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for NaiveDate {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Date(self)
    }
}

impl ToSqlValue for NaiveDateTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Timestamp(self)
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bytes(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bytes(self.to_vec())
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_text_escaping() {
        assert_eq!("it's".to_sql_value().to_sql_inline(), "'it''s'");
    }

    #[test]
    fn test_inline_bytes() {
        assert_eq!(vec![0x01u8, 0xAB].to_sql_value().to_sql_inline(), "X'01AB'");
    }

    #[test]
    fn test_inline_date() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(d.to_sql_value().to_sql_inline(), "'2024-02-29'");
    }

    #[test]
    fn test_coerce_widens_integers() {
        assert_eq!(
            SqlValue::Int(7).coerce(ColumnType::Long).unwrap(),
            SqlValue::Long(7)
        );
        assert_eq!(
            SqlValue::Short(3).coerce(ColumnType::Double).unwrap(),
            SqlValue::Double(3.0)
        );
    }

    #[test]
    fn test_coerce_rejects_narrowing() {
        let err = SqlValue::Long(7).coerce(ColumnType::Integer).unwrap_err();
        assert!(matches!(
            err,
            SqlGenError::ValueMismatch {
                column_type: ColumnType::Integer,
                value_kind: "LONG"
            }
        ));
    }

    #[test]
    fn test_coerce_date_to_timestamp() {
        let d = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();
        let v = SqlValue::Date(d).coerce(ColumnType::Timestamp).unwrap();
        assert_eq!(v, SqlValue::Timestamp(d.and_time(NaiveTime::MIN)));
    }

    #[test]
    fn test_coerce_text_targets() {
        assert_eq!(
            SqlValue::Int(12).coerce(ColumnType::String).unwrap(),
            SqlValue::Text("12".into())
        );
        assert_eq!(
            SqlValue::Text("ACTIVE".into())
                .coerce(ColumnType::EnumConstant)
                .unwrap(),
            SqlValue::Text("ACTIVE".into())
        );
        assert!(SqlValue::Bytes(vec![1]).coerce(ColumnType::String).is_err());
    }

    #[test]
    fn test_null_passes_through() {
        assert_eq!(
            None::<i32>.to_sql_value().coerce(ColumnType::Blob).unwrap(),
            SqlValue::Null
        );
    }
}
