//! Layout-OCR adapter: maps the query/answer pairs returned by a
//! layout-preserving OCR run onto invoice field names.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{DocumentKind, ExtractedDocument};

/// Queries issued against the invoice, paired with the field each answers.
pub const INVOICE_QUERIES: &[(&str, &str)] = &[
    ("What is the invoice date?", "date"),
    ("What is the receiver's address?", "address"),
    ("What is the receiver's business name?", "business_name"),
    ("What is the vendor's name?", "vendor"),
    ("What is the total cost?", "cost"),
    ("What is the good's description/name/model?", "model"),
];

/// One query/answer pair from the OCR service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub query: String,
    #[serde(default)]
    pub answer: Option<String>,
    /// Extraction confidence reported by the service, 0..=1.
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Fold answered queries into the common document shape. Unanswered or
/// unrecognized queries are skipped; partial output is legal.
pub fn invoice_document(answers: &[QueryAnswer]) -> ExtractedDocument {
    let mut document = ExtractedDocument::new(DocumentKind::Invoice);

    for answer in answers {
        let Some(field) = INVOICE_QUERIES
            .iter()
            .find(|(query, _)| *query == answer.query)
            .map(|(_, field)| *field)
        else {
            warn!(query = %answer.query, "unrecognized invoice query dropped");
            continue;
        };
        let Some(text) = answer.answer.as_deref().map(str::trim) else {
            continue;
        };
        if text.is_empty() {
            continue;
        }
        document.fields.insert(field.to_string(), text.to_string());
        if let Some(confidence) = answer.confidence {
            document.confidence.insert(field.to_string(), confidence);
        }
    }

    document
}
