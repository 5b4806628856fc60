use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::cache::{CachePolicy, HttpCache};
use crate::convert;

/// Cache settings stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheConfig {
    /// Override for the cache directory; platform cache dir when absent.
    pub dir: Option<PathBuf>,

    /// Entry lifetime in hours. Absent means entries never expire.
    pub expire_hours: Option<u64>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// timezone = "US/Eastern"
///
/// [cache]
/// expire_hours = 720
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// API key for the geocoding and current-weather service. Credentials
    /// live here, never in source.
    pub api_key: Option<String>,

    /// IANA timezone name used for local-time display and the archive
    /// request, e.g. "US/Eastern".
    pub timezone: Option<String>,

    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// API key, or an actionable error telling the user how to set one.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `wxdash configure` and enter your OpenWeatherMap API key."
            )
        })
    }

    /// The configured timezone as a strongly-typed value; `US/Eastern` when
    /// unset.
    pub fn timezone(&self) -> Result<Tz> {
        match self.timezone.as_deref() {
            None => Ok(convert::DEFAULT_TZ),
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| anyhow!("Unknown timezone '{name}' in configuration")),
        }
    }

    /// Build the response cache described by this configuration.
    pub fn http_cache(&self) -> Result<HttpCache> {
        let policy = match self.cache.expire_hours {
            None => CachePolicy::NeverExpire,
            Some(hours) => CachePolicy::ExpireAfter(chrono::Duration::hours(hours as i64)),
        };

        match &self.cache.dir {
            Some(dir) => Ok(HttpCache::with_dir(dir.clone(), policy)),
            None => HttpCache::new(policy),
        }
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wxdash", "wxdash")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
