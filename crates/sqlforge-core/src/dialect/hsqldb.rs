//! HSQLDB dialect.
//!
//! HSQLDB speaks the standard templates, so this is the baseline every other
//! dialect departs from.

use super::{Dialect, DialectName, IdentifierRules};
use crate::error::Result;

/// Builds the HSQLDB dialect.
pub fn hsqldb() -> Result<Dialect> {
    let identifiers = IdentifierRules::new('"', '"')
        .default_schema("PUBLIC")
        .reserved(&["LIMIT", "OFFSET", "POSITION", "TOP", "VALUE"]);
    Dialect::builder(DialectName::HsqlDb, identifiers)
        .reconstructs_views()
        .test_sql("VALUES CURRENT_TIMESTAMP")
        .now_sql(
            "VALUES LOCALTIMESTAMP",
            "VALUES TIMESTAMPADD(SQL_TSI_MINUTE, -EXTRACT(TIMEZONE_MINUTE FROM CURRENT_TIMESTAMP), \
             TIMESTAMPADD(SQL_TSI_HOUR, -EXTRACT(TIMEZONE_HOUR FROM CURRENT_TIMESTAMP), CURRENT_TIMESTAMP))",
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::RestrictionType;
    use crate::types::ColumnType;

    #[test]
    fn test_hsqldb_uses_standard_pieces() {
        let d = hsqldb().unwrap();
        assert_eq!(d.identifiers().schema(), Some("PUBLIC"));
        assert_eq!(d.type_policy(ColumnType::Boolean).render_type(0, 0, 0), "BOOLEAN");
        assert_eq!(d.type_policy(ColumnType::String).render_type(40, 0, 0), "VARCHAR(40)");
        assert_eq!(
            d.criteria_policy(RestrictionType::NotEquals)
                .render("A", &["?"])
                .unwrap(),
            "A <> ?"
        );
        assert_eq!(d.max_clause_values(), None);
        assert!(d.reconstructs_views());
    }
}
