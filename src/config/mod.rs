//! Translog settings. Only retention is configurable today; every field can
//! come from a TOML file or a `TRANSLOG__` environment variable.

mod retention;
pub use retention::*;


use std::env;
use std::fmt::Debug;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_ENV_PREFIX;
use crate::constants::CONFIG_ENV_SEPARATOR;
use crate::constants::CONFIG_PATH_ENV;
use crate::Result;

/// Main configuration container for the translog
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct TranslogConfig {
    /// Size, age and file-count retention thresholds
    #[serde(default)]
    pub retention: RetentionConfig,
}

impl Debug for TranslogConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("TranslogConfig").field("retention", &self.retention).finish()
    }
}

impl TranslogConfig {
    /// Builds the translog settings: built-in retention defaults, then the TOML
    /// file named by `CONFIG_PATH`, then `TRANSLOG__*` variables (e.g.
    /// `TRANSLOG__RETENTION__AGE_IN_MS=60000`). Call [`Self::validate`] last.
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Layers the TOML file at `path` over these settings; `TRANSLOG__*`
    /// variables still take precedence.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Checks the retention thresholds. Out-of-range values are only logged.
    pub fn validate(self) -> Result<Self> {
        self.retention.validate()?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(CONFIG_ENV_PREFIX)
        .separator(CONFIG_ENV_SEPARATOR)
        .ignore_empty(true)
        .try_parsing(true)
}
