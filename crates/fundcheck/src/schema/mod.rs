//! Canonical application-form fields and their normalization rules.
//!
//! Every supporting document is matched against this field set, so validators
//! and matchers only ever speak in `CanonicalField` keys. Normalization is
//! deterministic and idempotent; `normalize(normalize(x)) == normalize(x)`
//! holds for every field type.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::matchers::MatcherKind;

/// The seven canonical fields an application form must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    BusinessName,
    ContractorName,
    Address,
    ItemName,
    Model,
    PurchaseDate,
    Cost,
}

impl CanonicalField {
    pub const fn name(self) -> &'static str {
        match self {
            CanonicalField::BusinessName => "business_name",
            CanonicalField::ContractorName => "contractor_name",
            CanonicalField::Address => "address",
            CanonicalField::ItemName => "item_name",
            CanonicalField::Model => "model",
            CanonicalField::PurchaseDate => "purchase_date",
            CanonicalField::Cost => "cost",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|field| field.name() == name)
    }

    pub const fn all() -> [CanonicalField; 7] {
        [
            CanonicalField::BusinessName,
            CanonicalField::ContractorName,
            CanonicalField::Address,
            CanonicalField::ItemName,
            CanonicalField::Model,
            CanonicalField::PurchaseDate,
            CanonicalField::Cost,
        ]
    }

    pub const fn spec(self) -> FieldSpec {
        match self {
            CanonicalField::BusinessName => FieldSpec {
                field: self,
                field_type: FieldType::Text,
                default_matcher: MatcherKind::Fuzzy,
            },
            CanonicalField::ContractorName => FieldSpec {
                field: self,
                field_type: FieldType::Text,
                default_matcher: MatcherKind::Fuzzy,
            },
            CanonicalField::Address => FieldSpec {
                field: self,
                field_type: FieldType::Geocoordinate,
                default_matcher: MatcherKind::Fuzzy,
            },
            CanonicalField::ItemName => FieldSpec {
                field: self,
                field_type: FieldType::Categorical,
                default_matcher: MatcherKind::Categorical,
            },
            CanonicalField::Model => FieldSpec {
                field: self,
                field_type: FieldType::Text,
                default_matcher: MatcherKind::Fuzzy,
            },
            CanonicalField::PurchaseDate => FieldSpec {
                field: self,
                field_type: FieldType::Date,
                default_matcher: MatcherKind::Date,
            },
            CanonicalField::Cost => FieldSpec {
                field: self,
                field_type: FieldType::Currency,
                default_matcher: MatcherKind::Currency,
            },
        }
    }

    /// Matcher applied when a validator does not override the choice.
    pub const fn default_matcher(self) -> MatcherKind {
        self.spec().default_matcher
    }
}

/// Value type of a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Date,
    Currency,
    Categorical,
    /// Text that can additionally be resolved to coordinates by a geocoder.
    Geocoordinate,
}

/// Per-field registration: name, value type, and default matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: CanonicalField,
    pub field_type: FieldType,
    pub default_matcher: MatcherKind,
}

/// Normalized value held by the application form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
    /// Monetary amount in minor units (pence/cents).
    Money(i64),
}

impl FieldValue {
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(text) => text.clone(),
            FieldValue::Date(date) => date.format("%Y-%m-%d").to_string(),
            FieldValue::Money(minor) => format!("{}.{:02}", minor / 100, (minor % 100).abs()),
        }
    }
}

/// Schema violations raised while loading or normalizing form fields.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("unknown application field '{0}'")]
    UnknownField(String),
    #[error("application form is missing required field '{0}'")]
    MissingField(&'static str),
    #[error("invalid value for field '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Normalize a raw string into the typed value for one canonical field.
pub fn normalize(field: CanonicalField, raw: &str) -> Result<FieldValue, SchemaError> {
    match field.spec().field_type {
        FieldType::Text | FieldType::Categorical | FieldType::Geocoordinate => {
            Ok(FieldValue::Text(normalize_text(raw)))
        }
        FieldType::Date => parse_flexible_date(raw)
            .map(FieldValue::Date)
            .ok_or_else(|| SchemaError::InvalidValue {
                field: field.name(),
                reason: format!("'{raw}' is not a recognizable date"),
            }),
        FieldType::Currency => parse_money(raw)
            .map(FieldValue::Money)
            .ok_or_else(|| SchemaError::InvalidValue {
                field: field.name(),
                reason: format!("'{raw}' is not a monetary amount"),
            }),
    }
}

/// Collapse whitespace, strip zero-width characters, and lowercase.
pub fn normalize_text(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%Y/%m/%d",
];

/// Parse a date from any of the formats seen across documents.
pub fn parse_flexible_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Parse an amount like "£1,200.50" into minor units. Bare numbers are read
/// as major units.
pub fn parse_money(value: &str) -> Option<i64> {
    let stripped: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, '£' | '$' | '€' | ','))
        .collect();
    let stripped = stripped.trim();
    if stripped.is_empty() {
        return None;
    }
    let amount: f64 = stripped.parse().ok()?;
    if !amount.is_finite() {
        return None;
    }
    Some((amount * 100.0).round() as i64)
}

/// Immutable, schema-checked application form.
///
/// Construction rejects unknown fields and requires the full canonical set,
/// so downstream components can index fields without re-validating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationForm {
    fields: BTreeMap<CanonicalField, FieldValue>,
}

impl ApplicationForm {
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut fields = BTreeMap::new();
        for (name, raw) in entries {
            let field = CanonicalField::from_name(name.as_ref())
                .ok_or_else(|| SchemaError::UnknownField(name.as_ref().to_string()))?;
            let value = normalize(field, raw.as_ref())?;
            fields.insert(field, value);
        }

        for field in CanonicalField::all() {
            if !fields.contains_key(&field) {
                return Err(SchemaError::MissingField(field.name()));
            }
        }

        Ok(Self { fields })
    }

    pub fn field(&self, field: CanonicalField) -> &FieldValue {
        // Invariant: construction guarantees every canonical field is present.
        &self.fields[&field]
    }

    pub fn text(&self, field: CanonicalField) -> Option<&str> {
        match self.field(field) {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn date(&self, field: CanonicalField) -> Option<NaiveDate> {
        match self.field(field) {
            FieldValue::Date(date) => Some(*date),
            _ => None,
        }
    }

    pub fn money(&self, field: CanonicalField) -> Option<i64> {
        match self.field(field) {
            FieldValue::Money(minor) => Some(*minor),
            _ => None,
        }
    }
}
