//! Per-run options for the import and export pipelines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{ExportConfig, ImportConfig};
use crate::types::{Encoding, ErrorPolicy, ValidatePolicy};

/// Options controlling one import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportOptions {
    pub format: Encoding,
    /// Overwrite objects that already exist in the store.
    pub supersede: bool,
    pub error_policy: ErrorPolicy,
    pub validate_policy: ValidatePolicy,
}

impl ImportOptions {
    #[must_use]
    pub fn new(format: Encoding) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_supersede(mut self, supersede: bool) -> Self {
        self.supersede = supersede;
        self
    }

    #[must_use]
    pub const fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    #[must_use]
    pub const fn with_validate_policy(mut self, policy: ValidatePolicy) -> Self {
        self.validate_policy = policy;
        self
    }
}

impl From<&ImportConfig> for ImportOptions {
    fn from(config: &ImportConfig) -> Self {
        Self {
            format: config.format,
            supersede: config.supersede,
            error_policy: config.errors,
            validate_policy: config.validation,
        }
    }
}

/// Options controlling one export run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExportOptions {
    pub format: Encoding,
    /// Only objects modified at or after this instant are exported.
    pub range_start: Option<DateTime<Utc>>,
    /// Maximum number of objects to export.
    pub range_count: Option<u32>,
}

impl ExportOptions {
    #[must_use]
    pub fn new(format: Encoding) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_range(mut self, start: Option<DateTime<Utc>>, count: Option<u32>) -> Self {
        self.range_start = start;
        self.range_count = count;
        self
    }
}

impl From<&ExportConfig> for ExportOptions {
    fn from(config: &ExportConfig) -> Self {
        Self::new(config.format)
    }
}
