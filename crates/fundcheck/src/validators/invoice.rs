use crate::extract::{DocumentKind, ExtractedDocument};
use crate::matchers::{FieldMatchResult, MatcherConfig};
use crate::schema::{ApplicationForm, CanonicalField};

use super::compare_field;

/// Invoice field names mapped to canonical application fields.
const FIELD_MAPPINGS: &[(&str, CanonicalField)] = &[
    ("vendor", CanonicalField::ContractorName),
    ("business_name", CanonicalField::BusinessName),
    ("address", CanonicalField::Address),
    ("date", CanonicalField::PurchaseDate),
    ("cost", CanonicalField::Cost),
    ("model", CanonicalField::Model),
];

/// Validates the invoice against the application form, one result per
/// declared field mapping.
pub struct InvoiceValidator;

impl InvoiceValidator {
    pub fn validate(
        form: &ApplicationForm,
        document: &ExtractedDocument,
        config: &MatcherConfig,
    ) -> Vec<FieldMatchResult> {
        FIELD_MAPPINGS
            .iter()
            .map(|(name, field)| match document.field(name) {
                Some(raw) => compare_field(*field, DocumentKind::Invoice, form, raw, config),
                None => FieldMatchResult::missing(*field, DocumentKind::Invoice),
            })
            .collect()
    }
}
