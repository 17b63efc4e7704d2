use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Where quota ledgers are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    #[default]
    Postgres,
    Redis,
}

fn default_policy_cache_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Required when `ledger_backend` is `redis`.
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default)]
    pub ledger_backend: LedgerBackend,
    /// How long the quota policy is cached in-process.
    #[serde(default = "default_policy_cache_secs")]
    pub policy_cache_secs: u64,
    /// Set to "production" for JSON logging, anything else for human-readable.
    #[serde(default)]
    pub env: String,
    /// Sentry DSN for error tracking
    #[serde(default)]
    pub sentry_dsn: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = envy::prefixed("FLASHDECK_").from_env::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ledger_backend == LedgerBackend::Redis && self.redis_url.is_none() {
            bail!("FLASHDECK_REDIS_URL is required when FLASHDECK_LEDGER_BACKEND=redis");
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.env == "production"
    }
}
