//! Table-level schema reconciliation for `sqlforge-core`.
//!
//! Given registered entities and a [`DatabaseSnapshot`] of what the catalog
//! currently holds, [`SchemaManager`] plans the statements that create
//! missing tables, add and alter columns, relax abandoned columns, converge
//! constraints and indexes, and rebuild views.
//!
//! When the previous version of an entity's schema is known,
//! [`SchemaManager::plan_schema_upgrade`] pairs fields by marker instead,
//! so that a renamed field keeps its data.
//!
//! Reading the catalog and executing the plan are left to the caller.
//!
//! ```rust
//! use sqlforge_core::{ColumnType, DialectRegistry, EntityRegistry, EntitySchemaInfo, FieldSchemaInfo};
//! use sqlforge_migrate::{DatabaseSnapshot, SchemaManager};
//!
//! let dialect = DialectRegistry::shared()?.get("postgresql")?;
//! let entities = EntityRegistry::new(dialect);
//! entities.register(
//!     &EntitySchemaInfo::builder("account")
//!         .field(FieldSchemaInfo::builder("id", ColumnType::Long).primary_key().build())
//!         .build()?,
//! )?;
//!
//! let plan = SchemaManager::new(&entities).plan_upgrade(&["account"], &DatabaseSnapshot::new())?;
//! assert_eq!(plan.len(), 1);
//! # Ok::<(), sqlforge_migrate::MigrateError>(())
//! ```

pub mod error;
pub mod manager;
pub mod metadata;

pub use error::{MigrateError, Result};
pub use manager::{SchemaManager, SchemaManagerOptions, TableScript, UpgradePlan};
pub use metadata::{
    DatabaseSnapshot, ForeignKeyMetadata, IndexMetadata, ObjectType, TableMetadata,
    UniqueConstraintMetadata,
};
