//! Parameter binding and result extraction through caller-supplied adapters.
//!
//! The engine never touches a driver. Statements carry typed parameter and
//! result slots; a [`BindingPlan`] or [`ExtractionPlan`] applies the
//! dialect's type policies against a [`ParameterSink`] or [`ResultRow`]
//! implemented by the caller.

use std::io::Read;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::dialect::Dialect;
use crate::error::{Result, SqlGenError};
use crate::types::{ColumnType, NativeType};
use crate::value::SqlValue;

/// Reference to a result column, by 1-based position or by label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRef {
    /// 1-based column position.
    Index(usize),
    /// Column label.
    Name(String),
}

/// Destination for statement parameters (a prepared statement, in driver terms).
///
/// Parameter indexes are 1-based.
pub trait ParameterSink {
    /// Binds SQL NULL of the given native type.
    fn set_null(&mut self, index: usize, native: NativeType) -> Result<()>;

    /// Binds a plain value.
    fn set_value(&mut self, index: usize, value: &SqlValue) -> Result<()>;

    /// Binds a binary stream of `length` bytes.
    fn set_byte_stream(&mut self, index: usize, stream: &mut dyn Read, length: u64) -> Result<()>;

    /// Binds a character stream of `length` characters.
    fn set_character_stream(
        &mut self,
        index: usize,
        stream: &mut dyn Read,
        length: u64,
    ) -> Result<()>;
}

/// Source of result values (the current row of a result set).
pub trait ResultRow {
    /// Reads a plain value, converted by the driver from `native`.
    fn get_value(&self, column: &ColumnRef, native: NativeType) -> Result<SqlValue>;

    /// Opens a binary stream, `None` when the column is NULL.
    fn get_byte_stream(&self, column: &ColumnRef) -> Result<Option<Box<dyn Read + '_>>>;

    /// Opens a UTF-8 character stream, `None` when the column is NULL.
    fn get_character_stream(&self, column: &ColumnRef) -> Result<Option<Box<dyn Read + '_>>>;
}

/// Session values that influence binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindContext {
    /// Offset of the application's local time from UTC. `TIMESTAMP_UTC`
    /// values are shifted by it on bind and back on extract.
    pub utc_offset: FixedOffset,
}

impl BindContext {
    /// Creates a context for the given offset east of UTC.
    pub fn with_offset_seconds(seconds: i32) -> Result<Self> {
        let utc_offset = FixedOffset::east_opt(seconds).ok_or_else(|| {
            SqlGenError::Config(format!("UTC offset of {seconds} seconds is out of range"))
        })?;
        Ok(Self { utc_offset })
    }
}

impl Default for BindContext {
    fn default() -> Self {
        Self {
            utc_offset: Utc.fix(),
        }
    }
}

/// A typed `?` placeholder in a generated statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSlot {
    /// 1-based parameter index.
    pub index: usize,
    /// Logical type expected at this position.
    pub column_type: ColumnType,
    /// Declared length, used to pick the overflow policy for strings.
    pub length: u32,
    /// Field the slot stands for, when there is one.
    pub field: Option<String>,
}

/// A typed column in a generated statement's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSlot {
    /// Where the value is read from.
    pub column: ColumnRef,
    /// Logical type of the column.
    pub column_type: ColumnType,
    /// Declared length.
    pub length: u32,
    /// Field the column maps to.
    pub field: String,
}

/// Values matched to parameter slots, ready to be applied to a sink.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingPlan {
    bindings: Vec<(ParameterSlot, SqlValue)>,
}

impl BindingPlan {
    /// Pairs `values` with `slots` positionally.
    pub fn new(slots: &[ParameterSlot], values: Vec<SqlValue>) -> Result<Self> {
        if slots.len() != values.len() {
            return Err(SqlGenError::ParameterCount {
                expected: slots.len(),
                actual: values.len(),
            });
        }
        Ok(Self {
            bindings: slots.iter().cloned().zip(values).collect(),
        })
    }

    /// Number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` when there is nothing to bind.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Binds every value through the dialect's type policies.
    pub fn apply(
        &self,
        dialect: &Dialect,
        sink: &mut dyn ParameterSink,
        ctx: &BindContext,
    ) -> Result<()> {
        for (slot, value) in &self.bindings {
            let policy = dialect.type_policy_for(slot.column_type, slot.length);
            trace!(
                index = slot.index,
                column_type = %slot.column_type,
                kind = value.kind(),
                "Binding parameter"
            );
            policy.bind(sink, slot.index, value, ctx)?;
        }
        Ok(())
    }
}

/// Result slots to be read from each row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionPlan {
    slots: Vec<ResultSlot>,
}

impl ExtractionPlan {
    /// Creates a plan over the given slots.
    #[must_use]
    pub const fn new(slots: Vec<ResultSlot>) -> Self {
        Self { slots }
    }

    /// The slots, in result order.
    #[must_use]
    pub fn slots(&self) -> &[ResultSlot] {
        &self.slots
    }

    /// Reads one value per slot from `row`.
    pub fn apply(
        &self,
        dialect: &Dialect,
        row: &dyn ResultRow,
        ctx: &BindContext,
    ) -> Result<Vec<SqlValue>> {
        self.slots
            .iter()
            .map(|slot| {
                dialect
                    .type_policy_for(slot.column_type, slot.length)
                    .extract(row, &slot.column, ctx)
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory sink and row used by unit tests.

    use std::collections::HashMap;
    use std::io::Read;

    use super::{ColumnRef, ParameterSink, ResultRow};
    use crate::error::Result;
    use crate::types::NativeType;
    use crate::value::SqlValue;

    /// What a sink recorded for one parameter.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Bound {
        Null(NativeType),
        Value(SqlValue),
        Bytes(Vec<u8>),
        Chars(String),
    }

    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub bound: HashMap<usize, Bound>,
    }

    impl ParameterSink for RecordingSink {
        fn set_null(&mut self, index: usize, native: NativeType) -> Result<()> {
            self.bound.insert(index, Bound::Null(native));
            Ok(())
        }

        fn set_value(&mut self, index: usize, value: &SqlValue) -> Result<()> {
            self.bound.insert(index, Bound::Value(value.clone()));
            Ok(())
        }

        fn set_byte_stream(
            &mut self,
            index: usize,
            stream: &mut dyn Read,
            _length: u64,
        ) -> Result<()> {
            let mut buf = Vec::new();
            stream.read_to_end(&mut buf)?;
            self.bound.insert(index, Bound::Bytes(buf));
            Ok(())
        }

        fn set_character_stream(
            &mut self,
            index: usize,
            stream: &mut dyn Read,
            _length: u64,
        ) -> Result<()> {
            let mut buf = String::new();
            stream.read_to_string(&mut buf)?;
            self.bound.insert(index, Bound::Chars(buf));
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    pub struct MapRow {
        pub values: HashMap<ColumnRef, SqlValue>,
    }

    impl MapRow {
        pub fn with(mut self, column: ColumnRef, value: SqlValue) -> Self {
            self.values.insert(column, value);
            self
        }

        fn raw(&self, column: &ColumnRef) -> SqlValue {
            self.values.get(column).cloned().unwrap_or(SqlValue::Null)
        }
    }

    impl ResultRow for MapRow {
        fn get_value(&self, column: &ColumnRef, _native: NativeType) -> Result<SqlValue> {
            Ok(self.raw(column))
        }

        fn get_byte_stream(&self, column: &ColumnRef) -> Result<Option<Box<dyn Read + '_>>> {
            Ok(match self.raw(column) {
                SqlValue::Bytes(b) => Some(Box::new(std::io::Cursor::new(b))),
                _ => None,
            })
        }

        fn get_character_stream(&self, column: &ColumnRef) -> Result<Option<Box<dyn Read + '_>>> {
            Ok(match self.raw(column) {
                SqlValue::Text(s) => Some(Box::new(std::io::Cursor::new(s.into_bytes()))),
                _ => None,
            })
        }
    }
}
