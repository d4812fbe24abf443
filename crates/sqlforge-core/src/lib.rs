//! # sqlforge-core
//!
//! Cross-dialect SQL text generation for a logical schema.
//!
//! This crate provides:
//! - A closed vocabulary of logical column types and restriction types
//! - Per-dialect type and criteria policies composed into a [`Dialect`]
//! - Six built-in dialects: HSQLDB, PostgreSQL, MySQL, SQL Server, Oracle
//!   and Oracle 12c
//! - An [`Emitter`] for DDL (tables, columns, constraints, indexes, views)
//!   and DML (insert, update, delete, paginated select)
//! - A [`SchemaAlterationPlanner`] converging existing columns to their
//!   field descriptions
//! - Typed binding and extraction plans applied through caller adapters
//!
//! No connection is ever opened: statements are returned as text with `?`
//! placeholders.
//!
//! ```rust
//! use sqlforge_core::{ColumnType, DialectRegistry, EntityRegistry, EntitySchemaInfo};
//! use sqlforge_core::{Emitter, FieldSchemaInfo, PrintFormat, SelectQuery};
//!
//! let dialect = DialectRegistry::shared()?.get("postgresql")?;
//! let entities = EntityRegistry::new(dialect.clone());
//! let account = entities.register(
//!     &EntitySchemaInfo::builder("account")
//!         .field(FieldSchemaInfo::builder("id", ColumnType::Long).primary_key().build())
//!         .field(FieldSchemaInfo::builder("owner", ColumnType::String).length(64).build())
//!         .build()?,
//! )?;
//!
//! let emitter = Emitter::new(&dialect, PrintFormat::Compact);
//! let select = emitter.build_paginated_select(&account, &SelectQuery::new().offset(20).limit(10))?;
//! assert_eq!(select.sql, "SELECT id, owner FROM public.account LIMIT 10 OFFSET 20");
//! # Ok::<(), sqlforge_core::SqlGenError>(())
//! ```

pub mod binding;
pub mod config;
pub mod criteria;
pub mod dialect;
pub mod emitter;
pub mod error;
pub mod planner;
pub mod policy;
pub mod resolve;
pub mod schema;
pub mod types;
pub mod value;

pub use binding::{
    BindContext, BindingPlan, ColumnRef, ExtractionPlan, ParameterSink, ParameterSlot, ResultRow,
    ResultSlot,
};
pub use config::GeneratorConfig;
pub use criteria::{CriteriaPolicy, RestrictionType};
pub use dialect::{Dialect, DialectName, DialectRegistry, TimeBucket, TimeBucketExpr};
pub use emitter::{Emitter, PrintFormat, SelectQuery, SqlStatement, WhereClause};
pub use error::{Result, SqlGenError};
pub use planner::SchemaAlterationPlanner;
pub use policy::{TypePolicy, TypePolicyTable};
pub use resolve::{EntityRegistry, SqlEntityInfo, SqlFieldInfo};
pub use schema::{
    ColumnAlterInfo, ColumnInfo, EntitySchemaInfo, FieldSchemaInfo, IndexSchemaInfo,
    UniqueConstraintSchemaInfo,
};
pub use types::{ColumnType, NativeType};
pub use value::{SqlValue, ToSqlValue};
