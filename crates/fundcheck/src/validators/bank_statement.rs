use crate::extract::{DocumentKind, ExtractedDocument, TransactionRow};
use crate::matchers::{date_score, fuzzy_score, money_score, FieldMatchResult, MatcherConfig};
use crate::schema::{ApplicationForm, CanonicalField, FieldValue};

use super::compare_field;

/// Canonical fields a statement row is matched against.
const ROW_FIELDS: [CanonicalField; 3] = [
    CanonicalField::PurchaseDate,
    CanonicalField::Cost,
    CanonicalField::ContractorName,
];

/// Validates the bank statement by locating the transaction that best
/// matches the claimed purchase, then scoring its date, amount, and payee
/// description per field.
pub struct BankStatementValidator;

impl BankStatementValidator {
    pub fn validate(
        form: &ApplicationForm,
        document: &ExtractedDocument,
        config: &MatcherConfig,
    ) -> Vec<FieldMatchResult> {
        let Some(row) = best_row(form, &document.transactions, config) else {
            return ROW_FIELDS
                .iter()
                .map(|field| FieldMatchResult::missing(*field, DocumentKind::BankStatement))
                .collect();
        };

        ROW_FIELDS
            .iter()
            .map(|field| match row_value(row, *field) {
                Some(raw) => {
                    compare_field(*field, DocumentKind::BankStatement, form, &raw, config)
                }
                None => FieldMatchResult::missing(*field, DocumentKind::BankStatement),
            })
            .collect()
    }
}

fn row_value(row: &TransactionRow, field: CanonicalField) -> Option<String> {
    match field {
        CanonicalField::PurchaseDate => row.date.map(|d| d.format("%Y-%m-%d").to_string()),
        CanonicalField::Cost => row
            .amount_minor
            .map(|minor| FieldValue::Money(minor).display()),
        CanonicalField::ContractorName => {
            (!row.description.is_empty()).then(|| row.description.clone())
        }
        _ => None,
    }
}

/// Pick the transaction with the highest combined date/amount/description
/// score. Ties keep the earliest row so reports stay deterministic.
fn best_row<'a>(
    form: &ApplicationForm,
    transactions: &'a [TransactionRow],
    config: &MatcherConfig,
) -> Option<&'a TransactionRow> {
    let target_date = form.date(CanonicalField::PurchaseDate);
    let target_cost = form.money(CanonicalField::Cost);
    let target_payee = form.text(CanonicalField::ContractorName).unwrap_or_default();

    let mut best: Option<(&TransactionRow, f64)> = None;
    for row in transactions {
        let mut combined = 0.0;
        if let (Some(target), Some(date)) = (target_date, row.date) {
            combined += date_score(target, date, config);
        }
        if let (Some(target), Some(amount)) = (target_cost, row.amount_minor) {
            combined += money_score(target, amount, config);
        }
        if !row.description.is_empty() {
            combined += fuzzy_score(target_payee, &row.description);
        }

        if best.map_or(true, |(_, score)| combined > score) {
            best = Some((row, combined));
        }
    }

    best.map(|(row, _)| row)
}
