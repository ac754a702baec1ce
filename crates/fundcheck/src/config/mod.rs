//! Environment-driven configuration for the validation service.

use std::env;
use std::fmt;
use std::time::Duration;

use crate::matchers::MatcherConfig;

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub matcher: MatcherConfig,
    pub pipeline: PipelineConfig,
    pub geocoding: GeocodingConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut matcher = MatcherConfig::default();
        if let Some(threshold) = read_f64("FUNDCHECK_FUZZY_THRESHOLD")? {
            matcher.fuzzy_threshold = threshold;
        }
        if let Some(days) = read_i64("FUNDCHECK_DATE_TOLERANCE_DAYS")? {
            matcher.date_tolerance_days = days;
        }
        if let Some(days) = read_i64("FUNDCHECK_DATE_DECAY_DAYS")? {
            matcher.date_decay_days = days;
        }
        if let Some(tolerance) = read_f64("FUNDCHECK_COST_RELATIVE_TOLERANCE")? {
            matcher.currency_relative_tolerance = tolerance;
        }
        if let Some(minor) = read_i64("FUNDCHECK_COST_ABSOLUTE_TOLERANCE_MINOR")? {
            matcher.currency_absolute_tolerance_minor = minor;
        }
        if let Some(radius) = read_f64("FUNDCHECK_GEO_RADIUS_METERS")? {
            matcher.geo_radius_meters = radius;
        }
        if let Some(radius) = read_f64("FUNDCHECK_GEO_MAX_RADIUS_METERS")? {
            matcher.geo_max_radius_meters = radius;
        }

        let document_timeout_secs = read_i64("FUNDCHECK_DOCUMENT_TIMEOUT_SECS")?
            .map(|secs| u64::try_from(secs).map_err(|_| ConfigError::InvalidNumber {
                key: "FUNDCHECK_DOCUMENT_TIMEOUT_SECS",
                value: secs.to_string(),
            }))
            .transpose()?
            .unwrap_or(30);

        let geocode_api_key = env::var("FUNDCHECK_GEOCODE_KEY").ok();
        let log_level = env::var("FUNDCHECK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            matcher,
            pipeline: PipelineConfig {
                document_timeout_secs,
            },
            geocoding: GeocodingConfig { geocode_api_key },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Settings controlling the orchestrator.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub document_timeout_secs: u64,
}

impl PipelineConfig {
    pub fn document_timeout(&self) -> Duration {
        Duration::from_secs(self.document_timeout_secs)
    }
}

/// Credentials for the external geocoding collaborator.
#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    pub geocode_api_key: Option<String>,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

fn read_f64(key: &'static str) -> Result<Option<f64>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        Err(_) => Ok(None),
    }
}

fn read_i64(key: &'static str) -> Result<Option<i64>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        Err(_) => Ok(None),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be numeric, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
