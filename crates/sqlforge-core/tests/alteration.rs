//! Column alteration planning and DDL emission across dialects.

mod common;

use sqlforge_core::{
    ColumnInfo, DialectRegistry, Emitter, PrintFormat, SchemaAlterationPlanner, SqlFieldInfo,
    SqlGenError,
};

/// The column a database would report after creating `field`.
fn as_created(dialect: &sqlforge_core::Dialect, field: &SqlFieldInfo) -> ColumnInfo {
    let policy = dialect.type_policy(field.column_type());
    let (size, decimal_digits) = policy
        .native_dimensions(field.length(), field.precision(), field.scale())
        .unwrap_or((0, 0));
    ColumnInfo {
        name: field.column_name().to_string(),
        native_type: policy.native_type(),
        type_name: String::new(),
        size,
        decimal_digits,
        nullable: field.is_nullable(),
        default_val: field.default_literal().map(str::to_string),
    }
}

#[test]
fn test_created_columns_need_no_alteration() {
    for dialect in common::all_dialects() {
        let shop = common::shop(dialect.clone());
        let planner = SchemaAlterationPlanner::new(&dialect);
        for name in ["customer", "purchase"] {
            let entity = shop.get(name).unwrap();
            for field in entity.table_fields() {
                let observed = as_created(&dialect, field);
                let statements = planner
                    .plan(&entity, field, &observed, PrintFormat::Compact)
                    .unwrap();
                assert!(
                    statements.is_empty(),
                    "{}: {}.{} planned {statements:?}",
                    dialect.name(),
                    name,
                    field.name()
                );
            }
        }
    }
}

#[test]
fn test_tightening_backfills_before_constraint() {
    for dialect in common::all_dialects() {
        let shop = common::shop(dialect.clone());
        let customer = shop.get("customer").unwrap();
        let visits = customer.field("visits").unwrap();
        let mut observed = as_created(&dialect, visits);
        observed.nullable = true;

        let statements = Emitter::new(&dialect, PrintFormat::Compact)
            .alter_column(&customer, "visits", &observed)
            .unwrap();
        assert_eq!(statements.len(), 2, "{}: {statements:?}", dialect.name());
        assert_eq!(
            statements[0],
            format!(
                "UPDATE {} SET {col} = 0 WHERE {col} IS NULL",
                customer.table(),
                col = visits.column()
            )
        );
        assert!(statements[1].starts_with("ALTER TABLE "));
        assert!(statements[1].contains("NOT NULL"));
    }
}

#[test]
fn test_relaxing_does_not_backfill() {
    for dialect in common::all_dialects() {
        let shop = common::shop(dialect.clone());
        let customer = shop.get("customer").unwrap();
        let joined = customer.field("joined").unwrap();
        let mut observed = as_created(&dialect, joined);
        observed.nullable = false;

        let statements = SchemaAlterationPlanner::new(&dialect)
            .plan(&customer, joined, &observed, PrintFormat::Compact)
            .unwrap();
        assert_eq!(statements.len(), 1, "{}", dialect.name());
        assert!(!statements[0].starts_with("UPDATE"));
    }
}

#[test]
fn test_swappable_native_type_is_not_a_change() {
    let dialect = DialectRegistry::shared().unwrap().get("mssql").unwrap();
    let shop = common::shop(dialect.clone());
    let customer = shop.get("customer").unwrap();
    let active = customer.field("active").unwrap();
    let mut observed = as_created(&dialect, active);
    observed.native_type = sqlforge_core::NativeType::Boolean;
    let alter = SchemaAlterationPlanner::new(&dialect).check_column_altered(&observed, active);
    assert!(!alter.type_change);
}

#[test]
fn test_schema_conflict_names_table_and_column() {
    let dialect = DialectRegistry::shared().unwrap().get("hsqldb").unwrap();
    let shop = common::shop(dialect.clone());
    let customer = shop.get("customer").unwrap();
    let joined = customer.field("joined").unwrap();
    let mut observed = as_created(&dialect, joined);
    observed.native_type = sqlforge_core::NativeType::Timestamp;

    let err = SchemaAlterationPlanner::new(&dialect)
        .plan(&customer, joined, &observed, PrintFormat::Compact)
        .unwrap_err();
    assert!(matches!(
        err,
        SqlGenError::UnsupportedAlteration { ref table, ref column, .. }
            if table == "CUSTOMER" && column == "JOINED"
    ));
}

#[test]
fn test_full_schema_emits_for_every_dialect() {
    for dialect in common::all_dialects() {
        let shop = common::shop(dialect.clone());
        let emitter = Emitter::new(&dialect, PrintFormat::Pretty);
        let customer = shop.get("customer").unwrap();
        let purchase = shop.get("purchase").unwrap();

        let create = emitter.create_table(&customer).unwrap();
        assert!(create[0].starts_with(&format!("CREATE TABLE {} (\n\t", customer.table())));
        assert!(create[0].ends_with("\n)"));

        let fk = emitter.add_foreign_key(&purchase, "customerId", &shop).unwrap();
        assert!(fk.contains("FOREIGN KEY"));
        assert!(fk.contains(customer.table()));

        let view = emitter.create_view(&purchase, &shop).unwrap().unwrap();
        assert!(view.contains("LEFT JOIN"));
        assert_eq!(
            emitter.drop_view(&purchase).unwrap(),
            format!("DROP VIEW {}", purchase.view().unwrap())
        );

        let insert = emitter.insert(&purchase).unwrap();
        assert_eq!(insert.parameters.len(), 2);
        assert!(!insert.sql.contains("CUSTOMER_EMAIL"));
    }
}

#[test]
fn test_rename_statements() {
    let registry = DialectRegistry::shared().unwrap();
    let expectations = [
        ("hsqldb", "ALTER TABLE PUBLIC.CUSTOMER ALTER COLUMN MAIL RENAME TO EMAIL"),
        ("postgresql", "ALTER TABLE public.customer RENAME COLUMN mail TO email"),
        ("mssql", "EXEC sp_rename 'dbo.CUSTOMER.MAIL', 'EMAIL', 'COLUMN'"),
        ("oracle", "ALTER TABLE CUSTOMER RENAME COLUMN MAIL TO EMAIL"),
    ];
    for (name, expected) in expectations {
        let dialect = registry.get(name).unwrap();
        let shop = common::shop(dialect.clone());
        let customer = shop.get("customer").unwrap();
        let emitter = Emitter::new(&dialect, PrintFormat::Compact);
        assert_eq!(emitter.rename_column(&customer, "email", "MAIL").unwrap(), expected);
    }
}
