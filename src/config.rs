use std::time::Duration;

use thiserror::Error;

const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("'{0}' environment variable not found")]
    Missing(&'static str),
    #[error("'{name}' must be a positive number of seconds, got '{value}'")]
    InvalidInterval { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub database_url: String,
    /// How often tracked embeds are re-rendered.
    pub refresh_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let refresh_interval = match lookup("REFRESH_INTERVAL_SECS") {
            None => DEFAULT_REFRESH_INTERVAL,
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidInterval {
                        name: "REFRESH_INTERVAL_SECS",
                        value,
                    })
                }
            },
        };

        Ok(Config {
            discord_token: required("DISCORD_TOKEN")?,
            database_url: required("DATABASE_URL")?,
            refresh_interval,
        })
    }
}
