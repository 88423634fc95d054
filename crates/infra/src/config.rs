//! Configuration loading and representation.
//!
//! Everything is read from `STOCKROOM_*` environment variables once at startup.
//! [`PosConfig::from_lookup`] takes the variable source as a closure so parsing can
//! be exercised without touching the process environment.

use std::time::Duration;

use stockroom_products::DEFAULT_LOW_STOCK_THRESHOLD;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PRODUCT_TABLE: &str = "product_c";
pub const DEFAULT_SALE_TABLE: &str = "sale_c";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Connection settings for the hosted record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub base_url: String,
    pub project_id: String,
    pub public_key: String,
    pub timeout: Duration,
    pub product_table: String,
    pub sale_table: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Seeded in-process catalog and empty ledger.
    Memory,
    Remote(RemoteConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosConfig {
    pub backend: Backend,
    /// Threshold for the catalog's reorder query.
    pub low_stock_threshold: u32,
}

impl PosConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let low_stock_threshold = match get("STOCKROOM_LOW_STOCK_THRESHOLD") {
            Some(raw) => parse_number("STOCKROOM_LOW_STOCK_THRESHOLD", raw)?,
            None => DEFAULT_LOW_STOCK_THRESHOLD,
        };

        let backend = match get("STOCKROOM_BACKEND").as_deref() {
            None | Some("memory") => Backend::Memory,
            Some("remote") => {
                let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

                let base_url = require("STOCKROOM_RECORDS_URL")?;
                if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                    return Err(ConfigError::Invalid {
                        key: "STOCKROOM_RECORDS_URL",
                        value: base_url,
                        reason: "expected an http(s) URL".to_string(),
                    });
                }

                let timeout_secs = match get("STOCKROOM_TIMEOUT_SECS") {
                    Some(raw) => parse_number("STOCKROOM_TIMEOUT_SECS", raw)?,
                    None => DEFAULT_TIMEOUT_SECS,
                };

                Backend::Remote(RemoteConfig {
                    base_url: base_url.trim_end_matches('/').to_string(),
                    project_id: require("STOCKROOM_PROJECT_ID")?,
                    public_key: require("STOCKROOM_PUBLIC_KEY")?,
                    timeout: Duration::from_secs(timeout_secs),
                    product_table: get("STOCKROOM_PRODUCT_TABLE")
                        .unwrap_or_else(|| DEFAULT_PRODUCT_TABLE.to_string()),
                    sale_table: get("STOCKROOM_SALE_TABLE")
                        .unwrap_or_else(|| DEFAULT_SALE_TABLE.to_string()),
                })
            }
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "STOCKROOM_BACKEND",
                    value: other.to_string(),
                    reason: "expected `memory` or `remote`".to_string(),
                });
            }
        };

        Ok(Self {
            backend,
            low_stock_threshold,
        })
    }
}

fn parse_number<T>(key: &'static str, raw: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value: raw,
    })
}
