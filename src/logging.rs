use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            loki_enabled: false,
            loki_url: None,
            service_name: "bullseye-dashboard".to_string(),
            environment: "development".to_string(),
            log_level: "info,bullseye_dashboard=debug".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            loki_enabled: std::env::var("LOKI_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.loki_enabled),
            loki_url: std::env::var("LOKI_URL").ok(),
            service_name: std::env::var("SERVICE_NAME").unwrap_or(defaults.service_name),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.loki_enabled && self.loki_url.is_none() {
            return Err("LOKI_ENABLED is true but LOKI_URL is not set".to_string());
        }
        EnvFilter::try_new(&self.log_level)
            .map_err(|e| format!("Invalid RUST_LOG '{}': {}", self.log_level, e))?;
        Ok(())
    }
}

pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    #[cfg(feature = "loki")]
    {
        if config.loki_enabled {
            if let Some(loki_url) = config.loki_url.clone() {
                return init_with_loki(config, &loki_url);
            }
        }
    }

    tracing_subscriber::registry()
        .with(EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();
    tracing::info!("📊 Console logging initialized ({})", config.environment);

    Ok(())
}

#[cfg(feature = "loki")]
fn init_with_loki(config: LoggingConfig, loki_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = url::Url::parse(loki_url)?;

    let (loki_layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)?
        .label("environment", &config.environment)?
        .build_url(url)?;

    // Ships buffered events to Loki; must run on the tokio runtime.
    tokio::spawn(task);

    tracing_subscriber::registry()
        .with(EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .with(loki_layer)
        .init();

    tracing::info!("✅ Loki logging initialized at {}", loki_url);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loki_requires_url() {
        let config = LoggingConfig {
            loki_enabled: true,
            ..LoggingConfig::default()
        };
        assert!(config.validate().is_err());

        let config = LoggingConfig {
            loki_enabled: true,
            loki_url: Some("http://localhost:3100".into()),
            ..LoggingConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_filter_is_valid() {
        assert!(LoggingConfig::default().validate().is_ok());
    }
}
