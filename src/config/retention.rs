//! Translog retention configuration
//!
//! Thresholds use the legacy `-1 disables` encoding so operators can switch a
//! criterion off from a TOML file or an environment variable:
//!
//! ```toml
//! [retention]
//! size_in_bytes = 536870912   # -1 disables
//! age_in_ms = 43200000        # -1 disables
//! total_files = -1            # -1 disables, 0 keeps only the active writer
//! ```

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::constants::DEFAULT_RETENTION_AGE_IN_MS;
use crate::constants::DEFAULT_RETENTION_SIZE_IN_BYTES;
use crate::constants::DEFAULT_RETENTION_TOTAL_FILES;
use crate::constants::RETENTION_DISABLED;
use crate::Result;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RetentionConfig {
    /// Maximum cumulative translog size to keep, counted from the newest generation
    ///
    /// Default: 512 MiB
    #[serde(default = "default_size_in_bytes")]
    pub size_in_bytes: i64,

    /// Maximum age of the oldest kept generation
    ///
    /// Default: 12 hours
    #[serde(default = "default_age_in_ms")]
    pub age_in_ms: i64,

    /// Maximum number of translog files (readers + writer) to keep
    ///
    /// Default: -1 (disabled)
    #[serde(default = "default_total_files")]
    pub total_files: i32,
}

fn default_size_in_bytes() -> i64 {
    DEFAULT_RETENTION_SIZE_IN_BYTES
}

fn default_age_in_ms() -> i64 {
    DEFAULT_RETENTION_AGE_IN_MS
}

fn default_total_files() -> i32 {
    DEFAULT_RETENTION_TOTAL_FILES
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            size_in_bytes: default_size_in_bytes(),
            age_in_ms: default_age_in_ms(),
            total_files: default_total_files(),
        }
    }
}

impl RetentionConfig {
    /// Config with every criterion switched off
    pub fn disabled() -> Self {
        Self {
            size_in_bytes: RETENTION_DISABLED,
            age_in_ms: RETENTION_DISABLED,
            total_files: RETENTION_DISABLED as i32,
        }
    }

    /// Retention thresholds are operator-settable at runtime and must never
    /// fail the retention computation. Out-of-range values are treated as
    /// disabled and only reported.
    pub fn validate(&self) -> Result<()> {
        if self.size_in_bytes < RETENTION_DISABLED {
            warn!(
                "retention.size_in_bytes = {} is treated as disabled",
                self.size_in_bytes
            );
        }
        if self.age_in_ms < RETENTION_DISABLED {
            warn!("retention.age_in_ms = {} is treated as disabled", self.age_in_ms);
        }
        if (self.total_files as i64) < RETENTION_DISABLED {
            warn!(
                "retention.total_files = {} is treated as disabled",
                self.total_files
            );
        }
        Ok(())
    }

    pub fn size_limit(&self) -> Option<u64> {
        size_limit(self.size_in_bytes)
    }

    pub fn age_limit(&self) -> Option<Duration> {
        age_limit(self.age_in_ms)
    }

    pub fn total_files_limit(&self) -> Option<u32> {
        total_files_limit(self.total_files)
    }
}

/// Decodes a legacy size threshold; negative disables.
#[inline]
pub(crate) fn size_limit(size_in_bytes: i64) -> Option<u64> {
    u64::try_from(size_in_bytes).ok()
}

/// Decodes a legacy age threshold; negative disables.
#[inline]
pub(crate) fn age_limit(age_in_ms: i64) -> Option<Duration> {
    u64::try_from(age_in_ms).ok().map(Duration::from_millis)
}

/// Decodes a legacy file-count threshold; negative disables, 0 keeps only the writer.
#[inline]
pub(crate) fn total_files_limit(total_files: i32) -> Option<u32> {
    u32::try_from(total_files).ok()
}
