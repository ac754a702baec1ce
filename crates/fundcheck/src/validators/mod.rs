//! Document validators: one per supporting-document type. Each declares a
//! static mapping from document-specific field names to canonical fields and
//! runs the configured matcher for every mapped pair. Missing fields emit an
//! unmatched result, never an error; only extraction failures are hard
//! per-document failures, and those are handled by the pipeline.

mod bank_statement;
mod image;
mod invoice;

pub use bank_statement::BankStatementValidator;
pub use image::ImageValidator;
pub use invoice::InvoiceValidator;

use crate::extract::DocumentKind;
use crate::matchers::{
    date_score, fuzzy_score, money_score, FieldMatchResult, MatcherConfig, MatcherKind,
};
use crate::schema::{parse_flexible_date, parse_money, ApplicationForm, CanonicalField};

/// Compare one mapped field pair using the field's default matcher.
///
/// `raw` is the document-side text as extracted; normalization happens here
/// so matchers always see canonical values.
pub(crate) fn compare_field(
    field: CanonicalField,
    document: DocumentKind,
    form: &ApplicationForm,
    raw: &str,
    config: &MatcherConfig,
) -> FieldMatchResult {
    let expected = form.field(field).display();

    match field.default_matcher() {
        MatcherKind::Fuzzy => {
            let application = form.text(field).unwrap_or_default();
            let score = fuzzy_score(application, raw);
            FieldMatchResult::scored(
                field,
                document,
                score,
                score >= config.fuzzy_threshold,
                expected,
                raw,
            )
        }
        MatcherKind::Date => match (form.date(field), parse_flexible_date(raw)) {
            (Some(application), Some(extracted)) => {
                let score = date_score(application, extracted, config);
                FieldMatchResult::scored(field, document, score, score >= 1.0, expected, raw)
            }
            _ => unreadable(field, document, expected, raw),
        },
        MatcherKind::Currency => match (form.money(field), parse_money(raw)) {
            (Some(application), Some(extracted)) => {
                let score = money_score(application, extracted, config);
                FieldMatchResult::scored(
                    field,
                    document,
                    score,
                    score >= config.currency_threshold,
                    expected,
                    raw,
                )
            }
            _ => unreadable(field, document, expected, raw),
        },
        // Geo and categorical comparisons need extra context (geotag,
        // extraction confidence) and are driven by the image validator.
        MatcherKind::Geo | MatcherKind::Categorical => unreadable(field, document, expected, raw),
    }
}

fn unreadable(
    field: CanonicalField,
    document: DocumentKind,
    expected: String,
    raw: &str,
) -> FieldMatchResult {
    FieldMatchResult::scored(field, document, 0.0, false, expected, raw).with_note(format!(
        "{} value '{}' could not be normalized",
        field.name(),
        raw
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ApplicationForm;

    pub(crate) fn sample_form() -> ApplicationForm {
        ApplicationForm::from_entries([
            ("business_name", "Hilltop Farm Supplies"),
            ("contractor_name", "AgriTech Ltd"),
            ("address", "12 Mill Lane, Norwich"),
            ("item_name", "Tractor"),
            ("model", "Kubota M7-172"),
            ("purchase_date", "2024-01-05"),
            ("cost", "£12,500.00"),
        ])
        .expect("valid form")
    }

    #[test]
    fn cross_format_dates_match_exactly() {
        let form = sample_form();
        let result = compare_field(
            CanonicalField::PurchaseDate,
            DocumentKind::Invoice,
            &form,
            "Jan 05, 2024",
            &MatcherConfig::default(),
        );
        assert_eq!(result.score, 1.0);
        assert!(result.matched);
    }

    #[test]
    fn unreadable_values_score_zero_with_a_note() {
        let form = sample_form();
        let result = compare_field(
            CanonicalField::Cost,
            DocumentKind::Invoice,
            &form,
            "twelve grand",
            &MatcherConfig::default(),
        );
        assert_eq!(result.score, 0.0);
        assert!(!result.matched);
        assert!(result.note.as_deref().unwrap().contains("could not be normalized"));
    }
}
