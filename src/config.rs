use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use dotenvy::dotenv;

use crate::leave::policy::{DEFAULT_ANNUAL_DAYS, LeavePolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    MySql,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(StoreBackend::MySql),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("unknown store backend '{other}' (expected mysql or memory)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub jwt_secret: String,
    pub store_backend: StoreBackend,
    /// Required for the MySQL backend only.
    pub database_url: Option<String>,
    pub document_dir: String,
    pub log_dir: String,

    pub annual_leave_days: u32,
    pub personal_leave_deducts: bool,
    pub store_retry_attempts: u32,
    pub wizard_idle_secs: u64,
    pub balance_cache_ttl_secs: u64,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_upload_per_min: u32,

    pub api_prefix: String,
}

/// Parse an optional variable, keeping `default` only when it is unset.
fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let store_backend: StoreBackend = parsed("LEAVE_STORE", StoreBackend::MySql)?;
        let database_url = match store_backend {
            StoreBackend::MySql => Some(required("DATABASE_URL")?),
            StoreBackend::Memory => env::var("DATABASE_URL").ok(),
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            jwt_secret: required("JWT_SECRET")?,
            store_backend,
            database_url,
            document_dir: env::var("DOCUMENT_DIR").unwrap_or_else(|_| "documents".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),

            annual_leave_days: parsed("ANNUAL_LEAVE_DAYS", DEFAULT_ANNUAL_DAYS)?,
            personal_leave_deducts: parsed("PERSONAL_LEAVE_DEDUCTS", false)?,
            store_retry_attempts: parsed("STORE_RETRY_ATTEMPTS", 3)?,
            wizard_idle_secs: parsed("WIZARD_IDLE_SECS", 3600)?,
            balance_cache_ttl_secs: parsed("BALANCE_CACHE_TTL_SECS", 300)?,

            rate_protected_per_min: parsed("RATE_PROTECTED_PER_MIN", 1000)?,
            rate_upload_per_min: parsed("RATE_UPLOAD_PER_MIN", 60)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
        })
    }

    pub fn leave_policy(&self) -> LeavePolicy {
        LeavePolicy {
            annual_days: self.annual_leave_days,
            personal_deducts: self.personal_leave_deducts,
        }
    }
}

#[cfg(test)]
impl Config {
    /// In-memory configuration for handler tests.
    pub fn for_tests() -> Self {
        Self {
            server_addr: "127.0.0.1:0".into(),
            jwt_secret: crate::auth::jwt::test_tokens::SECRET.into(),
            store_backend: StoreBackend::Memory,
            database_url: None,
            document_dir: "documents".into(),
            log_dir: "logs".into(),
            annual_leave_days: DEFAULT_ANNUAL_DAYS,
            personal_leave_deducts: false,
            store_retry_attempts: 2,
            wizard_idle_secs: 3600,
            balance_cache_ttl_secs: 300,
            rate_protected_per_min: 1000,
            rate_upload_per_min: 60,
            api_prefix: "/api".into(),
        }
    }
}
