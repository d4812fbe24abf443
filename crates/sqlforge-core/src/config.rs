//! Generator configuration.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::binding::BindContext;
use crate::dialect::{Dialect, DialectRegistry};
use crate::emitter::PrintFormat;
use crate::error::Result;

/// Settings selecting a dialect and statement layout.
///
/// ```json
/// { "dialect": "postgresql", "format": "pretty", "utc_offset_seconds": 3600 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Dialect key or alias (`postgresql`, `postgres`, `sqlserver`, ...).
    pub dialect: String,
    /// Statement layout.
    #[serde(default)]
    pub format: PrintFormat,
    /// Offset of application local time east of UTC, used for
    /// `TIMESTAMP_UTC` columns.
    #[serde(default)]
    pub utc_offset_seconds: i32,
}

impl GeneratorConfig {
    /// Configuration for `dialect` with compact output and a UTC clock.
    #[must_use]
    pub fn new(dialect: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
            format: PrintFormat::default(),
            utc_offset_seconds: 0,
        }
    }

    /// Parses a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading generator configuration");
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Looks the configured dialect up in `registry`.
    pub fn dialect(&self, registry: &DialectRegistry) -> Result<Arc<Dialect>> {
        registry.get(&self.dialect)
    }

    /// Binding context for the configured UTC offset.
    pub fn bind_context(&self) -> Result<BindContext> {
        BindContext::with_offset_seconds(self.utc_offset_seconds)
    }
}
