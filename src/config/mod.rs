//! Configuration module for the roster backend and client.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Invalid value in the environment.
#[derive(Debug, thiserror::Error)]
#[error("Invalid {var} value '{value}': {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Number of users generated at startup
    pub seed_count: usize,
    /// RNG seed for reproducible user generation
    pub seed: Option<u64>,
    /// Artificial delay before every users response
    pub latency: Duration,
    /// Base URL the command-line client talks to
    pub api_url: String,
    /// Key-value file holding client preferences
    pub prefs_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let bind_addr = parse_var("ROSTER_BIND_ADDR", "127.0.0.1:8080")?;

        let log_level = env::var("ROSTER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let seed_count = parse_var("ROSTER_SEED_COUNT", "100")?;

        let seed = match env::var("ROSTER_SEED") {
            Ok(raw) => Some(parse_value("ROSTER_SEED", raw)?),
            Err(_) => None,
        };

        let latency = Duration::from_millis(parse_var("ROSTER_LATENCY_MS", "1000")?);

        let api_url =
            env::var("ROSTER_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());

        let prefs_path = env::var("ROSTER_PREFS_PATH")
            .unwrap_or_else(|_| "./data/prefs.json".to_string())
            .into();

        Ok(Self {
            bind_addr,
            log_level,
            seed_count,
            seed,
            latency,
            api_url,
            prefs_path,
        })
    }
}

fn parse_var<T>(var: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(var).unwrap_or_else(|_| default.to_string());
    parse_value(var, raw)
}

fn parse_value<T>(var: &'static str, raw: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError {
        var,
        reason: e.to_string(),
        value: raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("ROSTER_BIND_ADDR");
        env::remove_var("ROSTER_LOG_LEVEL");
        env::remove_var("ROSTER_SEED_COUNT");
        env::remove_var("ROSTER_SEED");
        env::remove_var("ROSTER_LATENCY_MS");
        env::remove_var("ROSTER_API_URL");
        env::remove_var("ROSTER_PREFS_PATH");

        let config = Config::from_env().unwrap();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.seed_count, 100);
        assert!(config.seed.is_none());
        assert_eq!(config.latency, Duration::from_millis(1000));
        assert_eq!(config.api_url, "http://127.0.0.1:8080");
        assert_eq!(config.prefs_path, PathBuf::from("./data/prefs.json"));
    }

    #[test]
    fn test_parse_value_reports_variable() {
        let err = parse_value::<u64>("ROSTER_LATENCY_MS", "soon".to_string()).unwrap_err();
        assert_eq!(err.var, "ROSTER_LATENCY_MS");
        assert!(err.to_string().contains("soon"));
    }
}
