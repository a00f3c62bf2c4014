use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    /// Apply the bundled migrations at startup.
    pub run_migrations: bool,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    /// When unset every LLM-enriched field takes its deterministic fallback.
    pub anthropic_api_key: Option<String>,
    pub hr_system_api_url: Option<String>,
    pub hr_system_api_key: Option<String>,
    pub mail_api_endpoint: Option<String>,
    pub reminder_threshold_days: i64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
            run_migrations: parse_env("RUN_MIGRATIONS", true)?,
            jwt_secret: require_env("JWT_SECRET")?,
            jwt_ttl_hours: parse_env("JWT_TTL_HOURS", 24)?,
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            hr_system_api_url: optional_env("HR_SYSTEM_API_URL"),
            hr_system_api_key: optional_env("HR_SYSTEM_API_KEY"),
            mail_api_endpoint: optional_env("MAIL_API_ENDPOINT"),
            reminder_threshold_days: parse_env("REMINDER_THRESHOLD_DAYS", 90)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Empty values count as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} has an invalid value '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_accepts_port() {
        let port: u16 = parse_value("PORT", " 9090 ").unwrap();
        assert_eq!(port, 9090);
    }

    #[test]
    fn test_parse_value_rejects_garbage() {
        let err = parse_value::<u16>("PORT", "not-a-port").unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_parse_value_accepts_flags() {
        assert!(!parse_value::<bool>("RUN_MIGRATIONS", "false").unwrap());
        assert!(parse_value::<bool>("RUN_MIGRATIONS", "yes").is_err());
    }

    #[test]
    fn test_parse_value_rejects_out_of_range_port() {
        assert!(parse_value::<u16>("PORT", "70000").is_err());
    }
}
