use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::leave::LeavePolicy;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,

    // Leave workflow
    pub leave_base_allowance: u32,
    pub leave_max_span_days: u32,
    pub leave_refresh_interval_secs: u64,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed_or("ACCESS_TOKEN_TTL", 900)?, // default 15 min

            rate_login_per_min: parsed_or("RATE_LOGIN_PER_MIN", 60)?,
            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),

            leave_base_allowance: parsed_or("LEAVE_BASE_ALLOWANCE", 30)?,
            leave_max_span_days: parsed_or("LEAVE_MAX_SPAN_DAYS", 30)?,
            leave_refresh_interval_secs: parsed_or("LEAVE_REFRESH_INTERVAL_SECS", 30)?,
        })
    }

    pub fn leave_policy(&self) -> LeavePolicy {
        LeavePolicy {
            base_allowance: self.leave_base_allowance,
            max_span_days: self.leave_max_span_days,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.leave_refresh_interval_secs.max(1))
    }
}
