use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::NaiveTime;

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

    // Clock-in
    pub sync_queue_dir: String,
    pub site_cache_ttl_secs: u64,
    pub late_after: Option<NaiveTime>,

    pub log_dir: String,
}

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn required(lookup: Lookup, key: &str) -> Result<String> {
    lookup(key).with_context(|| format!("{key} must be set"))
}

fn or_default<T>(lookup: Lookup, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

impl Config {
    /// Reads the process environment. `main` loads `.env` before calling this.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: Lookup) -> Result<Self> {
        let late_after = match lookup("LATE_AFTER") {
            Some(raw) if !raw.trim().is_empty() => Some(
                NaiveTime::parse_from_str(raw.trim(), "%H:%M")
                    .with_context(|| format!("LATE_AFTER must be HH:MM, got {raw}"))?,
            ),
            _ => None,
        };
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            server_addr: required(lookup, "SERVER_ADDR")?,
            database_url: required(lookup, "DATABASE_URL")?,
            jwt_secret: required(lookup, "JWT_SECRET")?,
            access_token_ttl: or_default(lookup, "ACCESS_TOKEN_TTL", 900)?, // 15 min

            rate_login_per_min: or_default(lookup, "RATE_LOGIN_PER_MIN", 60)?,
            rate_protected_per_min: or_default(lookup, "RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: text("API_PREFIX", "/api"),

            sync_queue_dir: text("SYNC_QUEUE_DIR", "data"),
            site_cache_ttl_secs: or_default(lookup, "SITE_CACHE_TTL_SECS", 300)?,
            late_after,

            log_dir: text("LOG_DIR", "logs"),
        })
    }
}
