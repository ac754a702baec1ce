use crate::config::ConfigError;
use crate::pipeline::PipelineError;
use crate::schema::SchemaError;
use crate::telemetry::TelemetryError;
use std::fmt;

/// Top-level error for binaries composing the library.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Request(serde_json::Error),
    Schema(SchemaError),
    Pipeline(PipelineError),
}

impl AppError {
    /// Malformed input and insufficient data fail loudly; everything else is
    /// surfaced inside the report instead of reaching this type.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Request(_) | AppError::Schema(_) => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {err}"),
            AppError::Telemetry(err) => write!(f, "telemetry error: {err}"),
            AppError::Io(err) => write!(f, "io error: {err}"),
            AppError::Request(err) => write!(f, "malformed request: {err}"),
            AppError::Schema(err) => write!(f, "invalid application form: {err}"),
            AppError::Pipeline(err) => write!(f, "validation failed: {err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Request(err) => Some(err),
            AppError::Schema(err) => Some(err),
            AppError::Pipeline(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Request(value)
    }
}

impl From<SchemaError> for AppError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<PipelineError> for AppError {
    fn from(value: PipelineError) -> Self {
        Self::Pipeline(value)
    }
}
