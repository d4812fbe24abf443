//! Logical column types and the native type codes reported by databases.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Horizontal alignment hint for presenting values of a column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    /// Left aligned.
    Left,
    /// Centered.
    Center,
    /// Right aligned.
    Right,
}

/// Logical, dialect-independent column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    /// Single character.
    Character,
    /// Boolean flag.
    Boolean,
    /// 16-bit integer.
    Short,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    Long,
    /// Single precision floating point.
    Float,
    /// Double precision floating point.
    Double,
    /// Fixed point decimal.
    Decimal,
    /// Calendar date.
    Date,
    /// Local timestamp.
    Timestamp,
    /// Timestamp stored in UTC and shifted on bind/extract.
    TimestampUtc,
    /// Character large object.
    Clob,
    /// Binary large object.
    Blob,
    /// Variable length string.
    String,
    /// Enumeration constant stored as its code.
    EnumConstant,
}

impl ColumnType {
    /// Every column type, in declaration order.
    pub const ALL: [Self; 15] = [
        Self::Character,
        Self::Boolean,
        Self::Short,
        Self::Integer,
        Self::Long,
        Self::Float,
        Self::Double,
        Self::Decimal,
        Self::Date,
        Self::Timestamp,
        Self::TimestampUtc,
        Self::Clob,
        Self::Blob,
        Self::String,
        Self::EnumConstant,
    ];

    /// Returns the canonical upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Character => "CHARACTER",
            Self::Boolean => "BOOLEAN",
            Self::Short => "SHORT",
            Self::Integer => "INTEGER",
            Self::Long => "LONG",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Decimal => "DECIMAL",
            Self::Date => "DATE",
            Self::Timestamp => "TIMESTAMP",
            Self::TimestampUtc => "TIMESTAMP_UTC",
            Self::Clob => "CLOB",
            Self::Blob => "BLOB",
            Self::String => "STRING",
            Self::EnumConstant => "ENUMCONST",
        }
    }

    /// Returns the default presentation alignment.
    #[must_use]
    pub const fn alignment(self) -> HAlign {
        match self {
            Self::Character | Self::Boolean | Self::Date | Self::Timestamp | Self::TimestampUtc => {
                HAlign::Center
            }
            Self::Short
            | Self::Integer
            | Self::Long
            | Self::Float
            | Self::Double
            | Self::Decimal => HAlign::Right,
            Self::Clob | Self::Blob | Self::String | Self::EnumConstant => HAlign::Left,
        }
    }

    /// Returns the types whose stored values this type can hold without loss.
    ///
    /// The relation is a strict partial order: it never lists `self`, it is
    /// transitive, and it never lists a type that accepts `self` in turn.
    #[must_use]
    pub const fn convertible_from(self) -> &'static [Self] {
        use ColumnType::{
            Boolean, Character, Clob, Date, Decimal, Double, EnumConstant, Float, Integer, Long,
            Short, String, Timestamp, TimestampUtc,
        };
        match self {
            Integer => &[Short],
            Long => &[Integer, Short],
            Float => &[Long, Integer, Short],
            Double => &[Float, Long, Integer, Short],
            Decimal => &[Double, Float, Long, Integer, Short],
            Timestamp => &[Date],
            TimestampUtc => &[Timestamp, Date],
            Boolean | EnumConstant => &[Character],
            String => &[
                Character,
                Boolean,
                Short,
                Integer,
                Long,
                Float,
                Double,
                Decimal,
                Date,
                Timestamp,
                TimestampUtc,
                EnumConstant,
            ],
            Clob => &[
                String,
                Character,
                Boolean,
                Short,
                Integer,
                Long,
                Float,
                Double,
                Decimal,
                Date,
                Timestamp,
                TimestampUtc,
                EnumConstant,
            ],
            Character | Short | Date | Self::Blob => &[],
        }
    }

    /// Returns `true` if a column of type `from` can be converted to this type.
    ///
    /// Every type is trivially convertible from itself.
    #[must_use]
    pub fn is_convertible_from(self, from: Self) -> bool {
        self == from || self.convertible_from().contains(&from)
    }

    /// Returns `true` for the large object types.
    #[must_use]
    pub const fn is_lob(self) -> bool {
        matches!(self, Self::Clob | Self::Blob)
    }

    /// Returns `true` for the integral and floating point types.
    #[must_use]
    pub const fn is_number(self) -> bool {
        matches!(
            self,
            Self::Short | Self::Integer | Self::Long | Self::Float | Self::Double | Self::Decimal
        )
    }

    /// Returns `true` for the integral types.
    #[must_use]
    pub const fn is_integral(self) -> bool {
        matches!(self, Self::Short | Self::Integer | Self::Long)
    }

    /// Returns `true` for the date and timestamp types.
    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::Date | Self::Timestamp | Self::TimestampUtc)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Native type code reported by database metadata for an existing column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NativeType {
    Char,
    Varchar,
    LongVarchar,
    Clob,
    Boolean,
    Bit,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Float,
    Double,
    Decimal,
    Numeric,
    Date,
    Timestamp,
    Binary,
    Varbinary,
    LongVarbinary,
    Blob,
    Other,
}

impl NativeType {
    /// Representative of the swap group this type belongs to.
    ///
    /// Drivers report some types interchangeably (a `TEXT` column may come
    /// back as `LONGVARCHAR` or `CLOB`). Types in the same group never count
    /// as a data-type change.
    const fn swap_group(self) -> Self {
        match self {
            Self::LongVarchar | Self::Clob => Self::Clob,
            Self::Binary | Self::Varbinary | Self::LongVarbinary | Self::Blob => Self::Blob,
            Self::Bit | Self::Boolean => Self::Boolean,
            Self::Numeric | Self::Decimal => Self::Decimal,
            Self::Float | Self::Double => Self::Double,
            other => other,
        }
    }

    /// Returns `true` if the two codes denote the same storage.
    #[must_use]
    pub fn is_swappable_with(self, other: Self) -> bool {
        self.swap_group() == other.swap_group()
    }

    /// Best-effort logical type of an existing column.
    ///
    /// `size` and `scale` are the reported column size and decimal digits;
    /// they narrow exact numerics to an integral type when possible.
    #[must_use]
    pub const fn column_type(self, size: u32, scale: u32) -> Option<ColumnType> {
        let ct = match self {
            Self::Char if size <= 1 => ColumnType::Character,
            Self::Char | Self::Varchar => ColumnType::String,
            Self::LongVarchar | Self::Clob => ColumnType::Clob,
            Self::Boolean | Self::Bit => ColumnType::Boolean,
            Self::TinyInt | Self::SmallInt => ColumnType::Short,
            Self::Integer => ColumnType::Integer,
            Self::BigInt => ColumnType::Long,
            Self::Real => ColumnType::Float,
            Self::Float | Self::Double => ColumnType::Double,
            Self::Decimal | Self::Numeric => {
                if scale > 0 || size == 0 || size > 19 {
                    ColumnType::Decimal
                } else if size <= 5 {
                    ColumnType::Short
                } else if size <= 10 {
                    ColumnType::Integer
                } else {
                    ColumnType::Long
                }
            }
            Self::Date => ColumnType::Date,
            Self::Timestamp => ColumnType::Timestamp,
            Self::Binary | Self::Varbinary | Self::LongVarbinary | Self::Blob => ColumnType::Blob,
            Self::Other => return None,
        };
        Some(ct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convertible_from_excludes_self() {
        for ct in ColumnType::ALL {
            assert!(
                !ct.convertible_from().contains(&ct),
                "{ct} lists itself as convertible"
            );
        }
    }

    #[test]
    fn test_convertible_from_is_transitive() {
        for a in ColumnType::ALL {
            for &b in a.convertible_from() {
                for &c in b.convertible_from() {
                    assert!(
                        a.convertible_from().contains(&c),
                        "{a} accepts {b} which accepts {c}, but {a} does not accept {c}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_convertible_from_is_acyclic() {
        for a in ColumnType::ALL {
            for &b in a.convertible_from() {
                assert!(
                    !b.convertible_from().contains(&a),
                    "{a} and {b} accept each other"
                );
            }
        }
    }

    #[test]
    fn test_widening_conversions() {
        assert!(ColumnType::Long.is_convertible_from(ColumnType::Integer));
        assert!(!ColumnType::Integer.is_convertible_from(ColumnType::Long));
        assert!(ColumnType::Clob.is_convertible_from(ColumnType::String));
        assert!(!ColumnType::Blob.is_convertible_from(ColumnType::String));
        assert!(ColumnType::Date.is_convertible_from(ColumnType::Date));
    }

    #[test]
    fn test_alignment() {
        assert_eq!(ColumnType::Boolean.alignment(), HAlign::Center);
        assert_eq!(ColumnType::Decimal.alignment(), HAlign::Right);
        assert_eq!(ColumnType::String.alignment(), HAlign::Left);
        assert_eq!(ColumnType::TimestampUtc.alignment(), HAlign::Center);
    }

    #[test]
    fn test_native_swappable() {
        assert!(NativeType::Clob.is_swappable_with(NativeType::LongVarchar));
        assert!(NativeType::Bit.is_swappable_with(NativeType::Boolean));
        assert!(NativeType::Numeric.is_swappable_with(NativeType::Decimal));
        assert!(!NativeType::Varchar.is_swappable_with(NativeType::Clob));
        assert!(!NativeType::Integer.is_swappable_with(NativeType::BigInt));
    }

    #[test]
    fn test_native_numeric_narrowing() {
        assert_eq!(
            NativeType::Numeric.column_type(10, 0),
            Some(ColumnType::Integer)
        );
        assert_eq!(NativeType::Numeric.column_type(19, 0), Some(ColumnType::Long));
        assert_eq!(
            NativeType::Numeric.column_type(18, 2),
            Some(ColumnType::Decimal)
        );
        assert_eq!(NativeType::Char.column_type(1, 0), Some(ColumnType::Character));
        assert_eq!(NativeType::Other.column_type(0, 0), None);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ColumnType::TimestampUtc).unwrap();
        assert_eq!(json, "\"TIMESTAMP_UTC\"");
        let nt: NativeType = serde_json::from_str("\"LONG_VARCHAR\"").unwrap();
        assert_eq!(nt, NativeType::LongVarchar);
    }
}
