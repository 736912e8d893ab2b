use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use dotenvy::dotenv;
use strum::{Display, EnumString};

/// What deleting an account does to a linked employee record.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum AccountDeletePolicy {
    /// Refuse with a conflict while an employee references the account.
    Restrict,
    /// Delete the employee together with its requests and workflows.
    Cascade,
}

#[derive(Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct Config {
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,
    pub reset_token_ttl: i64,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,
    pub account_delete_policy: AccountDeletePolicy,
    pub record_workflows: bool,
    pub seed_admin: Option<SeedAdmin>,
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} has invalid value {raw:?}: {e}")),
        None => Ok(default),
    }
}

fn rate(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u32) -> Result<u32> {
    let value = parse_or(lookup, key, default)?;
    if value == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(value)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let seed_admin = match (lookup("SEED_ADMIN_EMAIL"), lookup("SEED_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(SeedAdmin { email, password }),
            _ => None,
        };

        Ok(Self {
            server_addr: lookup("SERVER_ADDR").context("SERVER_ADDR must be set")?,
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            jwt_secret: lookup("JWT_SECRET").context("JWT_SECRET must be set")?,
            access_token_ttl: parse_or(&lookup, "ACCESS_TOKEN_TTL", 900)?, // default 15 min
            refresh_token_ttl: parse_or(&lookup, "REFRESH_TOKEN_TTL", 604_800)?, // default 7 days
            reset_token_ttl: parse_or(&lookup, "RESET_TOKEN_TTL", 86_400)?,

            rate_login_per_min: rate(&lookup, "RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: rate(&lookup, "RATE_REGISTER_PER_MIN", 30)?,
            rate_refresh_per_min: rate(&lookup, "RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: rate(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            account_delete_policy: parse_or(
                &lookup,
                "ACCOUNT_DELETE_POLICY",
                AccountDeletePolicy::Restrict,
            )?,
            record_workflows: parse_or(&lookup, "RECORD_WORKFLOWS", true)?,
            seed_admin,
        })
    }

    #[cfg(test)]
    pub fn test() -> Self {
        Self::from_lookup(|key| match key {
            "SERVER_ADDR" => Some("127.0.0.1:0".into()),
            "JWT_SECRET" => Some("test-secret".into()),
            _ => None,
        })
        .expect("test config is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let mut map: HashMap<String, String> = HashMap::from([
            ("SERVER_ADDR".into(), "0.0.0.0:8080".into()),
            ("JWT_SECRET".into(), "secret".into()),
        ]);
        for (k, v) in vars {
            map.insert(k.to_string(), v.to_string());
        }
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn applies_defaults() {
        let c = config(&[]).unwrap();
        assert!(c.database_url.is_none());
        assert_eq!(c.access_token_ttl, 900);
        assert_eq!(c.rate_protected_per_min, 1000);
        assert_eq!(c.api_prefix, "/api");
        assert_eq!(c.account_delete_policy, AccountDeletePolicy::Restrict);
        assert!(c.record_workflows);
        assert!(c.seed_admin.is_none());
    }

    #[test]
    fn parses_delete_policy() {
        let c = config(&[("ACCOUNT_DELETE_POLICY", "cascade")]).unwrap();
        assert_eq!(c.account_delete_policy, AccountDeletePolicy::Cascade);
        assert!(config(&[("ACCOUNT_DELETE_POLICY", "sometimes")]).is_err());
    }

    #[test]
    fn rejects_zero_rate_and_missing_secret() {
        assert!(config(&[("RATE_LOGIN_PER_MIN", "0")]).is_err());
        assert!(Config::from_lookup(|_| None).is_err());
    }
}
