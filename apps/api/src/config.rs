use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Per-query research deadline.
    pub research_timeout_secs: u64,
    /// Confidence at which a phase is ready to advance.
    pub phase_advance_threshold: u8,
    /// Confidence in Solution Design at which scenario generation is suggested.
    pub scenario_trigger_threshold: u8,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            research_timeout_secs: parse_env_or("RESEARCH_TIMEOUT_SECS", 20)?,
            phase_advance_threshold: percentage_env_or("PHASE_ADVANCE_THRESHOLD", 80)?,
            scenario_trigger_threshold: percentage_env_or("SCENARIO_TRIGGER_THRESHOLD", 70)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} has invalid value '{raw}'"))
}

fn percentage_env_or(key: &str, default: u8) -> Result<u8> {
    let value: u8 = parse_env_or(key, default)?;
    check_percentage(key, value)
}

fn check_percentage(key: &str, value: u8) -> Result<u8> {
    anyhow::ensure!(value <= 100, "{key} must be between 0 and 100, got {value}");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_trims() {
        assert_eq!(parse_value::<u16>("PORT", " 3000 ").unwrap(), 3000);
    }

    #[test]
    fn test_parse_value_reports_key() {
        let err = parse_value::<u64>("RESEARCH_TIMEOUT_SECS", "soon").unwrap_err();
        assert!(err.to_string().contains("RESEARCH_TIMEOUT_SECS"));
    }

    #[test]
    fn test_percentage_bounds() {
        assert_eq!(check_percentage("X", 100).unwrap(), 100);
        assert!(check_percentage("X", 101).is_err());
    }
}
