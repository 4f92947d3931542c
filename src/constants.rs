// -
// Retention defaults

/// 512 MiB of translog kept around for operation-based recovery
pub(crate) const DEFAULT_RETENTION_SIZE_IN_BYTES: i64 = 512 * 1024 * 1024;

/// 12 hours
pub(crate) const DEFAULT_RETENTION_AGE_IN_MS: i64 = 12 * 60 * 60 * 1000;

/// File-count retention is off unless configured
pub(crate) const DEFAULT_RETENTION_TOTAL_FILES: i32 = -1;

/// Legacy encoding of a switched-off retention criterion
pub(crate) const RETENTION_DISABLED: i64 = -1;

// -
// Configuration sources

pub(crate) const CONFIG_ENV_PREFIX: &str = "TRANSLOG";
pub(crate) const CONFIG_ENV_SEPARATOR: &str = "__";
pub(crate) const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

// -
// Metrics

/// `translog` label value for policies that were not given one
pub(crate) const DEFAULT_METRICS_LABEL: &str = "default";
