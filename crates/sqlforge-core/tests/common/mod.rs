//! Shared fixtures for sqlforge-core integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use sqlforge_core::{
    ColumnRef, ColumnType, Dialect, DialectRegistry, EntityRegistry, EntitySchemaInfo,
    FieldSchemaInfo, NativeType, ParameterSink, ResultRow, SqlValue,
};

/// Every built-in dialect.
pub fn all_dialects() -> Vec<Arc<Dialect>> {
    let registry = DialectRegistry::shared().unwrap();
    registry
        .names()
        .into_iter()
        .map(|name| registry.get_by(name).unwrap())
        .collect()
}

pub fn customer() -> EntitySchemaInfo {
    EntitySchemaInfo::builder("customer")
        .field(FieldSchemaInfo::builder("id", ColumnType::Long).primary_key().build())
        .field(FieldSchemaInfo::builder("email", ColumnType::String).length(120).build())
        .field(
            FieldSchemaInfo::builder("active", ColumnType::Boolean)
                .default_val("true")
                .build(),
        )
        .field(
            FieldSchemaInfo::builder("visits", ColumnType::Integer)
                .default_val("0")
                .build(),
        )
        .field(
            FieldSchemaInfo::builder("credit", ColumnType::Decimal)
                .precision(12, 2)
                .default_val("0.00")
                .build(),
        )
        .field(
            FieldSchemaInfo::builder("tier", ColumnType::Character)
                .default_val("B")
                .build(),
        )
        .field(FieldSchemaInfo::builder("notes", ColumnType::String).length(5000).nullable().build())
        .field(FieldSchemaInfo::builder("lastSeen", ColumnType::TimestampUtc).nullable().build())
        .field(FieldSchemaInfo::builder("joined", ColumnType::Date).nullable().build())
        .field(FieldSchemaInfo::builder("avatar", ColumnType::Blob).nullable().build())
        .unique_constraint("UQ_CUSTOMER_EMAIL", &["email"])
        .build()
        .unwrap()
}

pub fn purchase() -> EntitySchemaInfo {
    EntitySchemaInfo::builder("purchase")
        .field(FieldSchemaInfo::builder("id", ColumnType::Long).primary_key().build())
        .field(
            FieldSchemaInfo::builder("customerId", ColumnType::Long)
                .foreign_key("customer", "id")
                .build(),
        )
        .field(
            FieldSchemaInfo::builder("customerEmail", ColumnType::String)
                .length(120)
                .list_only("customerId", "email")
                .build(),
        )
        .field(FieldSchemaInfo::builder("total", ColumnType::Decimal).precision(12, 2).build())
        .index("IX_PURCHASE_CUSTOMER", &["customerId"], false)
        .build()
        .unwrap()
}

/// A coupon under optimistic locking.
pub fn coupon() -> EntitySchemaInfo {
    EntitySchemaInfo::builder("coupon")
        .field(FieldSchemaInfo::builder("id", ColumnType::Long).primary_key().build())
        .field(FieldSchemaInfo::builder("code", ColumnType::String).length(12).build())
        .field(FieldSchemaInfo::builder("revision", ColumnType::Long).version().build())
        .build()
        .unwrap()
}

/// An entity registry for `dialect` holding the customer, purchase and
/// coupon entities.
pub fn shop(dialect: Arc<Dialect>) -> EntityRegistry {
    let registry = EntityRegistry::new(dialect);
    registry.register(&customer()).unwrap();
    registry.register(&purchase()).unwrap();
    registry.register(&coupon()).unwrap();
    registry
}

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
    fn set_null(&mut self, index: usize, native: NativeType) -> sqlforge_core::Result<()> {
        self.bound.insert(index, Bound::Null(native));
        Ok(())
    }

    fn set_value(&mut self, index: usize, value: &SqlValue) -> sqlforge_core::Result<()> {
        self.bound.insert(index, Bound::Value(value.clone()));
        Ok(())
    }

    fn set_byte_stream(
        &mut self,
        index: usize,
        stream: &mut dyn Read,
        _length: u64,
    ) -> sqlforge_core::Result<()> {
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
    ) -> sqlforge_core::Result<()> {
        let mut buf = String::new();
        stream.read_to_string(&mut buf)?;
        self.bound.insert(index, Bound::Chars(buf));
        Ok(())
    }
}

/// A result row backed by a map, returning NULL for absent columns.
#[derive(Debug, Default)]
pub struct MapRow {
    pub values: HashMap<ColumnRef, SqlValue>,
}

impl MapRow {
    pub fn with(mut self, column: usize, value: SqlValue) -> Self {
        self.values.insert(ColumnRef::Index(column), value);
        self
    }

    fn raw(&self, column: &ColumnRef) -> SqlValue {
        self.values.get(column).cloned().unwrap_or(SqlValue::Null)
    }
}

impl ResultRow for MapRow {
    fn get_value(&self, column: &ColumnRef, _native: NativeType) -> sqlforge_core::Result<SqlValue> {
        Ok(self.raw(column))
    }

    fn get_byte_stream(&self, column: &ColumnRef) -> sqlforge_core::Result<Option<Box<dyn Read + '_>>> {
        Ok(match self.raw(column) {
            SqlValue::Bytes(b) => Some(Box::new(std::io::Cursor::new(b))),
            _ => None,
        })
    }

    fn get_character_stream(
        &self,
        column: &ColumnRef,
    ) -> sqlforge_core::Result<Option<Box<dyn Read + '_>>> {
        Ok(match self.raw(column) {
            SqlValue::Text(s) => Some(Box::new(std::io::Cursor::new(s.into_bytes()))),
            _ => None,
        })
    }
}
