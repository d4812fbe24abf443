//! Lookup of built-in dialects by name.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use tracing::info;

use super::{hsqldb, mssql, mysql, oracle, oracle12, postgresql, Dialect, DialectName};
use crate::error::{Result, SqlGenError};

static SHARED: OnceLock<DialectRegistry> = OnceLock::new();

/// Every built-in dialect, assembled once.
#[derive(Debug, Clone)]
pub struct DialectRegistry {
    dialects: HashMap<DialectName, Arc<Dialect>>,
}

impl DialectRegistry {
    /// Assembles every built-in dialect.
    pub fn standard() -> Result<Self> {
        let constructors: [(DialectName, fn() -> Result<Dialect>); 6] = [
            (DialectName::HsqlDb, hsqldb),
            (DialectName::PostgreSql, postgresql),
            (DialectName::MySql, mysql),
            (DialectName::MsSql, mssql),
            (DialectName::Oracle, oracle),
            (DialectName::Oracle12, oracle12),
        ];
        let dialects = constructors
            .into_iter()
            .map(|(name, build)| Ok((name, Arc::new(build()?))))
            .collect::<Result<HashMap<_, _>>>()?;
        info!(count = dialects.len(), "Dialect registry ready");
        Ok(Self { dialects })
    }

    /// Process-wide registry, assembled on first use.
    pub fn shared() -> Result<&'static Self> {
        if let Some(registry) = SHARED.get() {
            return Ok(registry);
        }
        let registry = Self::standard()?;
        Ok(SHARED.get_or_init(|| registry))
    }

    /// Looks a dialect up by name or alias (`postgres`, `sqlserver`, ...).
    pub fn get(&self, name: &str) -> Result<Arc<Dialect>> {
        self.get_by(name.parse()?)
    }

    /// Looks a dialect up by [`DialectName`].
    pub fn get_by(&self, name: DialectName) -> Result<Arc<Dialect>> {
        self.dialects
            .get(&name)
            .cloned()
            .ok_or_else(|| SqlGenError::UnknownDialect(name.to_string()))
    }

    /// Names of the registered dialects.
    #[must_use]
    pub fn names(&self) -> Vec<DialectName> {
        DialectName::ALL
            .into_iter()
            .filter(|n| self.dialects.contains_key(n))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_alias() {
        let registry = DialectRegistry::standard().unwrap();
        assert_eq!(registry.names().len(), 6);
        assert_eq!(registry.get("postgres").unwrap().name(), DialectName::PostgreSql);
        assert_eq!(registry.get("SQLSERVER").unwrap().name(), DialectName::MsSql);
        assert!(matches!(
            registry.get("sqlite"),
            Err(SqlGenError::UnknownDialect(_))
        ));
    }

    #[test]
    fn test_shared_registry_is_reused() {
        let a = DialectRegistry::shared().unwrap();
        let b = DialectRegistry::shared().unwrap();
        assert!(std::ptr::eq(a, b));
        assert!(Arc::ptr_eq(
            &a.get("oracle").unwrap(),
            &b.get_by(DialectName::Oracle).unwrap()
        ));
    }
}
