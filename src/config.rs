use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// How a cash edit is sent to the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CashUpdateMode {
    /// Send `new - old`; the service adds the amount to its stored balance.
    #[default]
    Delta,
    /// Send the new balance as-is.
    Absolute,
}

impl FromStr for CashUpdateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "delta" => Ok(CashUpdateMode::Delta),
            "absolute" => Ok(CashUpdateMode::Absolute),
            other => Err(format!(
                "Invalid BULLSEYE_CASH_MODE: {}. Must be 'delta' or 'absolute'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: Option<String>,
    pub session_path: PathBuf,
    pub cash_mode: CashUpdateMode,
    pub default_cash: f64,
    pub mock_changes: bool,
    pub http_timeout: Duration,
    pub bind_addr: SocketAddr,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            session_path: PathBuf::from(".bullseye/session.json"),
            cash_mode: CashUpdateMode::Delta,
            default_cash: 0.0,
            mock_changes: true,
            http_timeout: Duration::from_secs(10),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| format!("Invalid {}: {} ({})", name, raw, e)),
        _ => Ok(default),
    }
}

impl AppConfig {
    /// Reads `BULLSEYE_*` and `BIND_ADDR` from the environment (call `dotenvy::dotenv()` first).
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        let config = Self {
            api_url: std::env::var("BULLSEYE_API_URL")
                .ok()
                .filter(|u| !u.trim().is_empty()),
            session_path: parse_var("BULLSEYE_SESSION_PATH", defaults.session_path)?,
            cash_mode: parse_var("BULLSEYE_CASH_MODE", defaults.cash_mode)?,
            default_cash: parse_var("BULLSEYE_DEFAULT_CASH", defaults.default_cash)?,
            mock_changes: parse_var("BULLSEYE_MOCK_CHANGES", defaults.mock_changes)?,
            http_timeout: Duration::from_secs(parse_var(
                "BULLSEYE_HTTP_TIMEOUT_SECS",
                defaults.http_timeout.as_secs(),
            )?),
            bind_addr: parse_var("BIND_ADDR", defaults.bind_addr)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.default_cash.is_finite() || self.default_cash < 0.0 {
            return Err("BULLSEYE_DEFAULT_CASH cannot be negative".to_string());
        }
        if self.http_timeout.is_zero() {
            return Err("BULLSEYE_HTTP_TIMEOUT_SECS must be > 0".to_string());
        }
        if let Some(url) = &self.api_url {
            url::Url::parse(url).map_err(|e| format!("Invalid BULLSEYE_API_URL {}: {}", url, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cash_mode_parses_case_insensitively() {
        assert_eq!("Delta".parse::<CashUpdateMode>(), Ok(CashUpdateMode::Delta));
        assert_eq!(" ABSOLUTE ".parse::<CashUpdateMode>(), Ok(CashUpdateMode::Absolute));
        assert!("sometimes".parse::<CashUpdateMode>().is_err());
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cash_mode, CashUpdateMode::Delta);
        assert!(config.api_url.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = AppConfig {
            default_cash: -5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            api_url: Some("not a url".into()),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
