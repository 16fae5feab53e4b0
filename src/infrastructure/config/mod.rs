use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Voice/video provider
    pub provider_base_url: String,
    // Object storage bucket
    pub storage_base_url: String,
    pub storage_bucket: String,
    pub storage_service_key: String,
    // Generation tuning
    pub credential_attempts: u32,
    pub conversion_poll_interval_secs: u64,
    pub conversion_poll_max_attempts: u32,
    pub lease_ttl_secs: i64,
    // URL extraction cache
    pub extraction_cache_enabled: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            database_url: env::var("DATABASE_URL")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            jwt_secret: env::var("JWT_SECRET")?,
            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "production" => Environment::Production,
                    _ => Environment::Development,
                })?,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })?,
            provider_base_url: env::var("PROVIDER_BASE_URL")?,
            storage_base_url: env::var("STORAGE_BASE_URL")?,
            storage_bucket: env::var("STORAGE_BUCKET").unwrap_or_else(|_| "podcasts".to_string()),
            storage_service_key: env::var("STORAGE_SERVICE_KEY")?,
            credential_attempts: env::var("CREDENTIAL_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()?,
            conversion_poll_interval_secs: env::var("CONVERSION_POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            conversion_poll_max_attempts: env::var("CONVERSION_POLL_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            lease_ttl_secs: env::var("LEASE_TTL_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()?,
            extraction_cache_enabled: env::var("EXTRACTION_CACHE_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .parse::<String>()
                .map(|s| s.to_lowercase() == "true")
                .unwrap_or(false),
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}
