//! Cross-validates a grant/funding application against its supporting
//! documents (bank statement, invoice, supporting image) and produces
//! per-field confidence scores plus assessor-facing discrepancy guidance.
//!
//! External capabilities (OCR, vision models, storage, geocoding) sit behind
//! the narrow traits in [`extract`] and [`matchers`]; the core only depends
//! on their common output shapes.

pub mod config;
pub mod error;
pub mod extract;
pub mod matchers;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod telemetry;
pub mod validators;

pub use error::AppError;
pub use pipeline::{Collaborators, DocumentSet, PipelineError, ValidationPipeline};
pub use report::{InsufficientDataError, ValidationReport};
pub use schema::{ApplicationForm, CanonicalField, SchemaError};
