// ABOUTME: Startup configuration assembled from the process environment
// ABOUTME: Each job validates only the variables it needs and fails fast on absence

use crate::error::{EtlError, Result};

pub const SO_WEB: &str = "SO_WEB";
pub const SO_TOKEN: &str = "SO_TOKEN";
pub const SO_KEY: &str = "SO_KEY";
pub const SO_SECRET: &str = "SO_SECRET";
pub const REALTIME_DATASET: &str = "REALTIME_DATASET";
pub const OPEN_311_API_KEY: &str = "OPEN_311_API_KEY";
pub const OPEN_311_API_BASE_URL: &str = "OPEN_311_API_BASE_URL";

/// Source of configuration values, keyed by environment variable name.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Reads a variable through `lookup`, treating blank values as absent.
pub fn require(lookup: Lookup<'_>, key: &str) -> Result<String> {
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(EtlError::MissingConfiguration(key.to_string())),
    }
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Credentials and domain of the Socrata open-data portal.
#[derive(Clone)]
pub struct SocrataConfig {
    /// Portal domain, e.g. `data.example.gov` (scheme optional)
    pub domain: String,
    pub app_token: String,
    pub username: String,
    pub password: String,
}

impl SocrataConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        Ok(Self {
            domain: require(lookup, SO_WEB)?,
            app_token: require(lookup, SO_TOKEN)?,
            username: require(lookup, SO_KEY)?,
            password: require(lookup, SO_SECRET)?,
        })
    }
}

impl std::fmt::Debug for SocrataConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocrataConfig")
            .field("domain", &self.domain)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Configuration for one report-backed dataset job.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub socrata: SocrataConfig,
    pub dataset_id: String,
    pub endpoint: String,
}

impl ReportConfig {
    pub fn from_env(dataset_var: &str, endpoint_var: &str) -> Result<Self> {
        Self::from_lookup(&process_env, dataset_var, endpoint_var)
    }

    pub fn from_lookup(lookup: Lookup<'_>, dataset_var: &str, endpoint_var: &str) -> Result<Self> {
        Ok(Self {
            socrata: SocrataConfig::from_lookup(lookup)?,
            dataset_id: require(lookup, dataset_var)?,
            endpoint: require(lookup, endpoint_var)?,
        })
    }
}

/// Configuration for the Open311 incremental poller.
#[derive(Clone)]
pub struct Open311Config {
    pub socrata: SocrataConfig,
    pub dataset_id: String,
    pub api_key: String,
    pub base_url: String,
}

impl Open311Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        Ok(Self {
            socrata: SocrataConfig::from_lookup(lookup)?,
            dataset_id: require(lookup, REALTIME_DATASET)?,
            api_key: require(lookup, OPEN_311_API_KEY)?,
            base_url: require(lookup, OPEN_311_API_BASE_URL)?
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

impl std::fmt::Debug for Open311Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Open311Config")
            .field("socrata", &self.socrata)
            .field("dataset_id", &self.dataset_id)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
