//! Runtime configuration.
//!
//! Everything is driven by environment variables so the binary can run under
//! a process supervisor with no config file:
//!
//! - `OPENSWARM_WORKSPACE` - shared workspace root (default `./workspace`)
//! - `OPENSWARM_MODEL` - model id passed to the provider
//! - `OPENROUTER_API_KEY` - provider credential (required)
//! - `OPENSWARM_SLEEP_INTERVAL_SECS` - pause between work cycles (default 300)
//! - `OPENSWARM_HEARTBEAT_INTERVAL_SECS` - heartbeat period (default 1800)

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";
const DEFAULT_SLEEP_SECS: u64 = 300;
const DEFAULT_HEARTBEAT_SECS: u64 = 1800;

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub workspace: PathBuf,
    pub model: String,
    pub api_key: String,
    pub sleep_interval: Duration,
    pub heartbeat_interval: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let workspace = env::var("OPENSWARM_WORKSPACE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./workspace"));
        let model = env::var("OPENSWARM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let api_key =
            env::var("OPENROUTER_API_KEY").context("OPENROUTER_API_KEY is not set")?;

        let sleep_interval = positive_secs(
            env::var("OPENSWARM_SLEEP_INTERVAL_SECS").ok(),
            DEFAULT_SLEEP_SECS,
        )
        .context("OPENSWARM_SLEEP_INTERVAL_SECS")?;
        let heartbeat_interval = positive_secs(
            env::var("OPENSWARM_HEARTBEAT_INTERVAL_SECS").ok(),
            DEFAULT_HEARTBEAT_SECS,
        )
        .context("OPENSWARM_HEARTBEAT_INTERVAL_SECS")?;

        Ok(Self {
            workspace,
            model,
            api_key,
            sleep_interval,
            heartbeat_interval,
        })
    }
}

/// Parse an interval in seconds; must be a positive integer.
fn positive_secs(value: Option<String>, default: u64) -> anyhow::Result<Duration> {
    let secs = match value {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("invalid interval '{raw}'"))?,
        None => default,
    };
    anyhow::ensure!(secs > 0, "interval must be positive");
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_secs_defaults() {
        assert_eq!(
            positive_secs(None, 300).unwrap(),
            Duration::from_secs(300)
        );
    }

    #[test]
    fn test_positive_secs_parses() {
        assert_eq!(
            positive_secs(Some("42".into()), 300).unwrap(),
            Duration::from_secs(42)
        );
    }

    #[test]
    fn test_positive_secs_rejects_zero_and_garbage() {
        assert!(positive_secs(Some("0".into()), 300).is_err());
        assert!(positive_secs(Some("soon".into()), 300).is_err());
    }
}
