//! Server configuration from environment variables.
//!
//! | Variable                      | Default        |
//! |-------------------------------|----------------|
//! | `QUIZSIFT_ADDR`               | `0.0.0.0:8080` |
//! | `QUIZSIFT_FETCH_TIMEOUT_SECS` | `30`           |
//! | `QUIZSIFT_FETCH_ATTEMPTS`     | `3`            |
//! | `QUIZSIFT_MAX_OPTIONS`        | all options    |

use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;

use quizsift_core::{CoordinatorConfig, FetchConfig, QuizError};

pub const ADDR_VAR: &str = "QUIZSIFT_ADDR";
pub const TIMEOUT_VAR: &str = "QUIZSIFT_FETCH_TIMEOUT_SECS";
pub const ATTEMPTS_VAR: &str = "QUIZSIFT_FETCH_ATTEMPTS";
pub const MAX_OPTIONS_VAR: &str = "QUIZSIFT_MAX_OPTIONS";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub fetch: FetchConfig,
    pub max_options: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { addr: SocketAddr::from(([0, 0, 0, 0], 8080)), fetch: FetchConfig::default(), max_options: None }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, QuizError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, QuizError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ADDR_VAR) {
            config.addr = parse_var(ADDR_VAR, &value)?;
        }
        if let Some(value) = lookup(TIMEOUT_VAR) {
            config.fetch.timeout = parse_var(TIMEOUT_VAR, &value)?;
        }
        if let Some(value) = lookup(ATTEMPTS_VAR) {
            let attempts: u32 = parse_var(ATTEMPTS_VAR, &value)?;
            if attempts == 0 {
                return Err(QuizError::ConfigError(format!("{} must be at least 1", ATTEMPTS_VAR)));
            }
            config.fetch.max_attempts = attempts;
        }
        if let Some(value) = lookup(MAX_OPTIONS_VAR) {
            config.max_options = Some(parse_var(MAX_OPTIONS_VAR, &value)?);
        }

        Ok(config)
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        let builder = CoordinatorConfig::builder();
        match self.max_options {
            Some(max) => builder.max_options(max).build(),
            None => builder.build(),
        }
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T, QuizError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| QuizError::ConfigError(format!("{}={:?}: {}", name, value, e)))
}
