//! Analytics configuration
//!
//! Read from an optional JSON file, e.g.
//! `{ "pageSize": 200, "maxSnapshotRecords": 10000 }`. Missing keys take
//! their defaults; a missing file means all defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::snapshot::SnapshotLimits;

/// Snapshot paging settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyticsConfig {
    /// Records requested per page from the session source
    pub page_size: usize,
    /// Cap on records per snapshot; `None` fetches the complete history
    pub max_snapshot_records: Option<usize>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        let limits = SnapshotLimits::default();
        Self {
            page_size: limits.page_size,
            max_snapshot_records: limits.max_records,
        }
    }
}

impl AnalyticsConfig {
    /// Load from a JSON file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No analytics config, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(CoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = serde_json::from_str(&content).map_err(|source| CoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(CoreError::InvalidConfig {
                message: "pageSize must be greater than zero".to_string(),
            });
        }
        if self.max_snapshot_records == Some(0) {
            return Err(CoreError::InvalidConfig {
                message: "maxSnapshotRecords must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Apply command line or environment overrides on top of the file values
    pub fn with_overrides(mut self, page_size: Option<usize>, max_records: Option<usize>) -> Self {
        if let Some(page_size) = page_size {
            self.page_size = page_size;
        }
        if max_records.is_some() {
            self.max_snapshot_records = max_records;
        }
        self
    }

    pub fn limits(&self) -> SnapshotLimits {
        SnapshotLimits {
            page_size: self.page_size,
            max_records: self.max_snapshot_records,
        }
    }
}
