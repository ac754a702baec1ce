//! Score aggregation: combines per-field results across all documents into
//! the overall confidence and the assessor-facing discrepancy report.

use serde::{Deserialize, Serialize};

use crate::extract::DocumentKind;
use crate::matchers::FieldMatchResult;
use crate::schema::CanonicalField;

/// Raised when no document produced a usable result; reporting a confidence
/// score over nothing would be misleading.
#[derive(Debug, thiserror::Error)]
#[error("no document produced any usable validation result")]
pub struct InsufficientDataError;

/// Final output of a validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Unweighted arithmetic mean of all field scores.
    pub overall_confidence: f64,
    #[serde(rename = "fields")]
    pub results: Vec<FieldMatchResult>,
    /// Documents whose extraction failed outright.
    pub failures: Vec<DocumentKind>,
}

impl ValidationReport {
    /// Discrepancy views for every unmatched field, with enough context for
    /// an assessor to triage without re-reading the source documents.
    pub fn discrepancies(&self) -> Vec<DiscrepancyView> {
        self.results
            .iter()
            .filter(|result| !result.matched)
            .map(DiscrepancyView::from_result)
            .collect()
    }
}

/// One unmatched field, flattened for assessor review.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscrepancyView {
    pub field: CanonicalField,
    pub document: DocumentKind,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed: Option<String>,
    pub guidance: String,
}

impl DiscrepancyView {
    fn from_result(result: &FieldMatchResult) -> Self {
        Self {
            field: result.field,
            document: result.document,
            score: result.score,
            expected: result.expected.clone(),
            observed: result.observed.clone(),
            guidance: result
                .note
                .clone()
                .unwrap_or_else(|| guidance(result.field, result.document).to_string()),
        }
    }
}

/// Assessor guidance per (field, document) pair.
pub fn guidance(field: CanonicalField, document: DocumentKind) -> &'static str {
    match (document, field) {
        (DocumentKind::Image, CanonicalField::Address) => {
            "The geotag information in the image does not seem to match the address on the application form."
        }
        (DocumentKind::Image, _) => {
            "The object in the image does not seem to match the object mentioned on the application form (or it is not fully captured)."
        }
        (DocumentKind::BankStatement, _) => {
            "We could not find the purchase evidence of this equipment on the bank statement."
        }
        (DocumentKind::Invoice, CanonicalField::BusinessName) => {
            "The business name on the invoice does not seem to match the business name on the application form."
        }
        (DocumentKind::Invoice, CanonicalField::ContractorName) => {
            "The vendor on the invoice does not seem to match the contractor on the application form."
        }
        (DocumentKind::Invoice, CanonicalField::Address) => {
            "The address on the invoice does not seem to match the address on the application form."
        }
        (DocumentKind::Invoice, CanonicalField::Model) => {
            "The equipment model on the invoice does not seem to match the equipment model on the application form."
        }
        (DocumentKind::Invoice, CanonicalField::PurchaseDate) => {
            "The date on the invoice does not seem to match the date on the application form."
        }
        (DocumentKind::Invoice, CanonicalField::Cost) => {
            "The cost on the invoice does not seem to match the cost on the application form."
        }
        (DocumentKind::Invoice, CanonicalField::ItemName) => {
            "The equipment on the invoice does not seem to match the equipment on the application form."
        }
    }
}

/// Combine all field results into the final report.
pub fn aggregate(
    results: Vec<FieldMatchResult>,
    failures: Vec<DocumentKind>,
) -> Result<ValidationReport, InsufficientDataError> {
    if results.is_empty() {
        return Err(InsufficientDataError);
    }

    let total: f64 = results.iter().map(|result| result.score).sum();
    let overall_confidence = total / results.len() as f64;

    Ok(ValidationReport {
        overall_confidence,
        results,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(score: f64, matched: bool) -> FieldMatchResult {
        FieldMatchResult::scored(
            CanonicalField::Cost,
            DocumentKind::Invoice,
            score,
            matched,
            "12500.00",
            "12400.00",
        )
    }

    #[test]
    fn overall_confidence_is_the_unweighted_mean() {
        let report = aggregate(
            vec![result(1.0, true), result(0.5, false), result(0.0, false)],
            Vec::new(),
        )
        .expect("aggregates");
        assert_eq!(report.overall_confidence, 0.5);
    }

    #[test]
    fn zero_results_raise_insufficient_data() {
        let err = aggregate(Vec::new(), vec![DocumentKind::Invoice]);
        assert!(err.is_err());
    }

    #[test]
    fn discrepancies_cover_exactly_the_unmatched_results() {
        let report = aggregate(
            vec![result(1.0, true), result(0.2, false)],
            Vec::new(),
        )
        .expect("aggregates");
        let discrepancies = report.discrepancies();
        assert_eq!(discrepancies.len(), 1);
        assert_eq!(discrepancies[0].score, 0.2);
        assert_eq!(discrepancies[0].expected.as_deref(), Some("12500.00"));
    }

    #[test]
    fn aggregated_confidence_stays_in_bounds() {
        let report = aggregate(vec![result(1.0, true); 40], Vec::new()).expect("aggregates");
        assert!(report.overall_confidence <= 1.0);
        assert!(report.overall_confidence >= 0.0);
    }

    #[test]
    fn report_serializes_with_the_documented_shape() {
        let report = aggregate(vec![result(1.0, true)], vec![DocumentKind::Image])
            .expect("aggregates");
        let json = serde_json::to_value(&report).expect("serializes");
        assert!(json.get("overallConfidence").is_some());
        assert!(json.get("fields").is_some());
        assert_eq!(json["failures"][0], "image");
    }
}
