use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

pub const DEFAULT_CONFIG_FILE: &str = "climate-fact-data.json";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Settings shared by the HTTP and Drive transports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub user_agent: String,
    /// `None` keeps the HTTP client's own default.
    pub timeout: Option<Duration>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub data_dir: Option<Utf8PathBuf>,
    pub client: ClientSettings,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit `path` must exist. Without one, a missing
    /// `climate-fact-data.json` in the current directory means defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, FetchError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| FetchError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| FetchError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, FetchError> {
        let data_dir = match config.data_dir {
            Some(dir) if dir.trim().is_empty() => {
                return Err(FetchError::ConfigParse("data_dir must not be empty".to_string()));
            }
            Some(dir) => Some(Utf8PathBuf::from(dir)),
            None => None,
        };

        let timeout = match config.timeout_secs {
            Some(0) => {
                return Err(FetchError::ConfigParse(
                    "timeout_secs must be greater than zero".to_string(),
                ));
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        let user_agent = config
            .user_agent
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(default_user_agent);

        Ok(ResolvedConfig {
            data_dir,
            client: ClientSettings {
                user_agent,
                timeout,
            },
        })
    }
}

pub fn default_user_agent() -> String {
    format!("climate-fact-data/{}", env!("CARGO_PKG_VERSION"))
}
