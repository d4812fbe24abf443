//! Properties every built-in dialect must satisfy.

mod common;

use sqlforge_core::{
    ColumnType, DialectName, DialectRegistry, Emitter, PrintFormat, RestrictionType, SelectQuery,
    SqlGenError,
};

#[test]
fn test_every_type_has_a_declaration() {
    for dialect in common::all_dialects() {
        for column_type in ColumnType::ALL {
            let policy = dialect.type_policy(column_type);
            assert_eq!(policy.column_type(), column_type, "{}", dialect.name());
            assert!(
                !policy.render_type(32, 10, 2).is_empty(),
                "{} has no declaration for {column_type}",
                dialect.name()
            );
        }
    }
}

#[test]
fn test_every_restriction_renders() {
    for dialect in common::all_dialects() {
        for restriction in RestrictionType::ALL {
            let policy = dialect.criteria_policy(restriction);
            assert_eq!(policy.restriction(), restriction);
            let operands: Vec<&str> = match restriction {
                RestrictionType::IsNull | RestrictionType::IsNotNull => vec![],
                RestrictionType::Between | RestrictionType::NotBetween => vec!["?", "?"],
                RestrictionType::And | RestrictionType::Or => vec!["A = ?", "B = ?"],
                _ => vec!["?"],
            };
            let sql = policy.render("COL", &operands).unwrap();
            assert!(!sql.is_empty());
        }
    }
}

#[test]
fn test_exactly_one_pagination_stage_writes_the_window() {
    for dialect in common::all_dialects() {
        let pagination = dialect.pagination();
        for has_where in [false, true] {
            let mut sql = String::new();
            let mut stages = 0;
            if pagination.append_infix(&mut sql, 0, 10).unwrap() {
                stages += 1;
            }
            if pagination.append_where_suffix(&mut sql, 0, 10, has_where).unwrap() {
                stages += 1;
            }
            if pagination.append_trailing_suffix(&mut sql, 0, 10).unwrap() {
                stages += 1;
            }
            assert_eq!(stages, 1, "{}", dialect.name());
            assert!(sql.contains("10"));
        }
        let mut sql = String::new();
        assert!(!pagination.append_infix(&mut sql, 0, 0).unwrap());
        assert!(!pagination.append_where_suffix(&mut sql, 0, 0, false).unwrap());
        assert!(!pagination.append_trailing_suffix(&mut sql, 0, 0).unwrap());
        assert!(sql.is_empty());
    }
}

#[test]
fn test_limit_and_offset() {
    let registry = DialectRegistry::shared().unwrap();
    let expectations = [
        ("postgresql", " LIMIT 10 OFFSET 20"),
        ("hsqldb", " LIMIT 10 OFFSET 20"),
        ("mysql", " LIMIT 10 OFFSET 20"),
        ("oracle12", " OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"),
    ];
    for (name, suffix) in expectations {
        let dialect = registry.get(name).unwrap();
        let shop = common::shop(dialect.clone());
        let customer = shop.get("customer").unwrap();
        let emitter = Emitter::new(&dialect, PrintFormat::Compact);
        let query = SelectQuery::new()
            .fields(&["id"])
            .order_by("id", true)
            .offset(20)
            .limit(10);
        let sql = emitter.build_paginated_select(&customer, &query).unwrap().sql;
        assert!(sql.ends_with(suffix), "{name}: {sql}");
    }
}

#[test]
fn test_offset_is_refused_without_emulation() {
    let registry = DialectRegistry::shared().unwrap();
    for name in ["mssql", "oracle"] {
        let dialect = registry.get(name).unwrap();
        let shop = common::shop(dialect.clone());
        let customer = shop.get("customer").unwrap();
        let emitter = Emitter::new(&dialect, PrintFormat::Compact);
        let err = emitter
            .build_paginated_select(&customer, &SelectQuery::new().offset(5).limit(10))
            .unwrap_err();
        assert!(matches!(err, SqlGenError::OffsetNotSupported { offset: 5, .. }));
    }
}

#[test]
fn test_mysql_offset_without_limit() {
    let dialect = DialectRegistry::shared().unwrap().get("mysql").unwrap();
    let shop = common::shop(dialect.clone());
    let customer = shop.get("customer").unwrap();
    let emitter = Emitter::new(&dialect, PrintFormat::Compact);
    let sql = emitter
        .build_paginated_select(&customer, &SelectQuery::new().fields(&["id"]).offset(5))
        .unwrap()
        .sql;
    assert_eq!(sql, format!("SELECT ID FROM CUSTOMER LIMIT {} OFFSET 5", u64::MAX));
}

#[test]
fn test_long_strings_overflow_to_clob() {
    let registry = DialectRegistry::shared().unwrap();
    let oracle = registry.get_by(DialectName::Oracle).unwrap();
    assert_eq!(oracle.effective_type(ColumnType::String, 5000), ColumnType::Clob);
    assert_eq!(oracle.effective_type(ColumnType::String, 4000), ColumnType::String);
    let shop = common::shop(oracle);
    let notes = shop.get("customer").unwrap();
    assert_eq!(notes.field("notes").unwrap().type_decl(), "CLOB");

    let postgres = registry.get_by(DialectName::PostgreSql).unwrap();
    assert_eq!(postgres.effective_type(ColumnType::String, 5000), ColumnType::String);
}

#[test]
fn test_rendered_defaults_read_back_as_unchanged() {
    let raws: &[(ColumnType, &str)] = &[
        (ColumnType::Boolean, "true"),
        (ColumnType::Boolean, "N"),
        (ColumnType::Character, "X"),
        (ColumnType::Short, "-3"),
        (ColumnType::Integer, "42"),
        (ColumnType::Long, "9000000000"),
        (ColumnType::Decimal, "12.50"),
        (ColumnType::String, "O'Hara"),
        (ColumnType::EnumConstant, "ACTIVE"),
        (ColumnType::Date, "2024-02-29"),
        (ColumnType::Timestamp, "2024-02-29 13:45:00"),
        (ColumnType::Timestamp, "CURRENT_TIMESTAMP"),
    ];
    for dialect in common::all_dialects() {
        let matcher = dialect.default_matcher();
        for (column_type, raw) in raws {
            let policy = dialect.type_policy(*column_type);
            let literal = policy.render_default(raw).unwrap();
            assert!(
                matcher.matches(Some(&literal), Some(raw), policy),
                "{}: {column_type} default {raw} read back as {literal}",
                dialect.name()
            );
            assert!(!matcher.matches(None, Some(raw), policy));
        }
        assert!(matcher.matches(None, None, dialect.type_policy(ColumnType::Integer)));
    }
}

#[test]
fn test_invalid_defaults_are_rejected() {
    for dialect in common::all_dialects() {
        assert!(dialect.type_policy(ColumnType::Integer).render_default("ten").is_err());
        assert!(dialect.type_policy(ColumnType::Date).render_default("yesterday").is_err());
        assert!(dialect.type_policy(ColumnType::Boolean).render_default("maybe").is_err());
    }
}

#[test]
fn test_dialect_aliases() {
    let registry = DialectRegistry::shared().unwrap();
    assert_eq!(registry.names().len(), 6);
    assert_eq!(registry.get("postgres").unwrap().name(), DialectName::PostgreSql);
    assert!(matches!(
        registry.get("sybase"),
        Err(SqlGenError::UnknownDialect(name)) if name == "sybase"
    ));
}
