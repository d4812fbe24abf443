//! Schema descriptions of entities, fields and observed columns.

mod column;
mod entity;
mod field;

pub use column::{ColumnAlterInfo, ColumnInfo};
pub use entity::{
    CheckConstraintSchemaInfo, EntityBuilder, EntitySchemaInfo, IndexSchemaInfo,
    UniqueConstraintSchemaInfo,
};
pub use field::{schema_element_name, FieldBuilder, FieldSchemaInfo, ForeignKeyRef, ListOnlySource};
