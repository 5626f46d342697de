use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub gemini_api_base_url: String,
    pub ai_primary_timeout_secs: u64,
    pub ai_retry_timeout_secs: u64,
    pub question_count: usize,
    pub storage_timeout_secs: u64,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            gemini_api_key: get_env_optional("GEMINI_API_KEY"),
            gemini_model: get_env_optional("GEMINI_MODEL"),
            gemini_api_base_url: get_env_optional("GEMINI_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE_URL.to_string()),
            ai_primary_timeout_secs: get_env_parse_or("AI_PRIMARY_TIMEOUT_SECS", 60)?,
            ai_retry_timeout_secs: get_env_parse_or("AI_RETRY_TIMEOUT_SECS", 90)?,
            question_count: get_env_parse_or("QUESTION_COUNT", 5)?,
            storage_timeout_secs: get_env_parse_or("STORAGE_TIMEOUT_SECS", 15)?,
        })
    }

    pub fn primary_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_primary_timeout_secs)
    }

    pub fn retry_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_retry_timeout_secs)
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.storage_timeout_secs)
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

/// Blank values count as unset.
fn get_env_optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_optional(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
