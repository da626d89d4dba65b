use anyhow::{anyhow, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8088";
pub const DEFAULT_CLIENT_DIR: &str = "client/dist";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Everything the server needs from the outside world, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub admin_password_hash: String,
    pub jwt_secret: String,
    pub client_origin: String,
    pub bind_address: String,
    pub client_dir: PathBuf,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| anyhow!("{} must be set", key))
        };
        let environment = match lookup("APP_ENV").as_deref().map(str::trim) {
            None | Some("") | Some("development") => Environment::Development,
            Some("production") => Environment::Production,
            Some(other) => return Err(anyhow!("Unknown APP_ENV: {}", other)),
        };
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            admin_password_hash: required("ADMIN_PASSWORD_HASH")?,
            jwt_secret: required("JWT_SECRET")?,
            client_origin: required("CLIENT_ORIGIN")?,
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_owned()),
            client_dir: PathBuf::from(
                lookup("CLIENT_DIR").unwrap_or_else(|| DEFAULT_CLIENT_DIR.to_owned()),
            ),
            environment,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}
