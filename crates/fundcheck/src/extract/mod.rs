//! Extraction adapters: convert raw extractor payloads (tabular OCR, layout
//! OCR queries, vision model replies, geotag metadata) into the common
//! `ExtractedDocument` shape. The core never interprets raw model output
//! outside this module.

pub mod layout;
pub mod tabular;
pub mod vision;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::matchers::GeoPoint;

pub use tabular::TransactionRow;

/// The three supporting-document types a run validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    BankStatement,
    Invoice,
    Image,
}

impl DocumentKind {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentKind::BankStatement => "bank statement",
            DocumentKind::Invoice => "invoice",
            DocumentKind::Image => "image",
        }
    }

    pub const fn all() -> [DocumentKind; 3] {
        [
            DocumentKind::BankStatement,
            DocumentKind::Invoice,
            DocumentKind::Image,
        ]
    }
}

/// Opaque resolvable resource identifier (file path, storage URI).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLocation(pub String);

/// Common shape produced by every adapter.
///
/// `fields` maps document-specific names (e.g. "vendor") to raw extracted
/// text; validators translate those names to canonical fields. Output may be
/// partial; downstream treats missing fields as unmatched, never as errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub kind: DocumentKind,
    pub fields: BTreeMap<String, String>,
    /// Extraction confidence per field (e.g. OCR cell confidence), 0..=1.
    #[serde(default)]
    pub confidence: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geotag: Option<GeoPoint>,
    /// Normalized table rows; populated by the tabular adapter only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transactions: Vec<TransactionRow>,
}

impl ExtractedDocument {
    pub fn new(kind: DocumentKind) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
            confidence: BTreeMap::new(),
            geotag: None,
            transactions: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Document-level extraction failures. Non-fatal to the run: the pipeline
/// degrades the document to "failed" and continues with the rest.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("document unreadable: {0}")]
    Unreadable(String),
    #[error("extraction service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("extraction call timed out")]
    Timeout,
}

/// External extraction collaborator for one document type.
///
/// Implementations wrap an OCR/vision/LLM service; the core only depends on
/// the `ExtractedDocument` contract, so extractors are swappable.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    fn kind(&self) -> DocumentKind;

    async fn extract(&self, location: &DocumentLocation)
        -> Result<ExtractedDocument, ExtractionError>;
}

/// External file-retrieval collaborator resolving opaque locations.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn fetch(&self, location: &DocumentLocation) -> Result<Vec<u8>, ExtractionError>;
}
