use crate::Result;
use crate::activity::ActivityRange;
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up in the current directory
pub const CONFIG_FILE_NAME: &str = "promptdevkit.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Base URL of the managed database service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// How long a fetched result is served before it is fetched again
    #[serde(default = "default_stale_time", with = "humantime_serde")]
    pub stale_time: Duration,

    /// Maximum time to wait for a single request
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Activity range used when none is given on the command line
    #[serde(default)]
    pub default_range: ActivityRange,
}

const fn default_stale_time() -> Duration {
    crate::query::DEFAULT_STALE_TIME
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `promptdevkit.toml` in `base_dir` is used when it exists.
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!("no configuration file at '{path}', using defaults");
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.stale_time.is_zero() {
            bail!("stale_time must be greater than zero");
        }

        if self.request_timeout.is_zero() {
            bail!("request_timeout must be greater than zero");
        }

        if let Some(url) = &self.url {
            let parsed = url::Url::parse(url).into_app_err_with(|| format!("url '{url}' is not a valid URL"))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                bail!("url '{url}' must use http or https");
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: None,
            stale_time: default_stale_time(),
            request_timeout: default_request_timeout(),
            default_range: ActivityRange::default(),
        }
    }
}
