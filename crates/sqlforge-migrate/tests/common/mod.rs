//! Shared fixtures for sqlforge-migrate integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use sqlforge_core::{
    ColumnInfo, ColumnType, Dialect, DialectRegistry, EntityRegistry, EntitySchemaInfo,
    FieldSchemaInfo, NativeType,
};

pub fn dialect(name: &str) -> Arc<Dialect> {
    DialectRegistry::shared().unwrap().get(name).unwrap()
}

pub fn agent() -> EntitySchemaInfo {
    EntitySchemaInfo::builder("agent")
        .field(FieldSchemaInfo::builder("id", ColumnType::Long).primary_key().build())
        .field(FieldSchemaInfo::builder("name", ColumnType::String).length(60).build())
        .build()
        .unwrap()
}

pub fn ticket() -> EntitySchemaInfo {
    EntitySchemaInfo::builder("ticket")
        .field(FieldSchemaInfo::builder("id", ColumnType::Long).primary_key().build())
        .field(FieldSchemaInfo::builder("title", ColumnType::String).length(100).build())
        .field(
            FieldSchemaInfo::builder("priority", ColumnType::Integer)
                .default_val("3")
                .build(),
        )
        .field(
            FieldSchemaInfo::builder("assigneeId", ColumnType::Long)
                .nullable()
                .foreign_key("agent", "id")
                .build(),
        )
        .field(
            FieldSchemaInfo::builder("assigneeName", ColumnType::String)
                .length(60)
                .list_only("assigneeId", "name")
                .build(),
        )
        .check_constraint("CK_TICKET_PRIORITY", "priority", &["1", "2", "3"])
        .build()
        .unwrap()
}

/// An entity registry for `dialect` holding the agent and ticket entities.
pub fn helpdesk(dialect: Arc<Dialect>) -> EntityRegistry {
    let registry = EntityRegistry::new(dialect);
    registry.register(&agent()).unwrap();
    registry.register(&ticket()).unwrap();
    registry
}

pub fn column(name: &str, native_type: NativeType, size: u32, nullable: bool) -> ColumnInfo {
    ColumnInfo {
        name: name.to_string(),
        native_type,
        type_name: String::new(),
        size,
        decimal_digits: 0,
        nullable,
        default_val: None,
    }
}
