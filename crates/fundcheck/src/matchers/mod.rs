//! Per-field-type comparison strategies.
//!
//! Every matcher is a pure function of its two inputs plus the static
//! `MatcherConfig`, so scoring is reproducible and each strategy can be
//! exercised in isolation. Scores are always clipped to [0.0, 1.0].

mod date;
mod geo;
mod money;
mod text;

pub use date::date_score;
pub use geo::{geo_score, haversine_meters, GeoPoint, GeocodeError, Geocoder};
pub use money::money_score;
pub use text::{categorical_score, fuzzy_score};

use serde::{Deserialize, Serialize};

use crate::extract::DocumentKind;
use crate::schema::CanonicalField;

/// Identifies which comparison strategy a field uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    Fuzzy,
    Date,
    Currency,
    Geo,
    Categorical,
}

impl MatcherKind {
    pub const fn label(self) -> &'static str {
        match self {
            MatcherKind::Fuzzy => "fuzzy",
            MatcherKind::Date => "date",
            MatcherKind::Currency => "currency",
            MatcherKind::Geo => "geo",
            MatcherKind::Categorical => "categorical",
        }
    }
}

/// Static tolerances shared by all matchers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Minimum similarity for a fuzzy string match.
    pub fuzzy_threshold: f64,
    /// Calendar-day window treated as an exact date match.
    pub date_tolerance_days: i64,
    /// Days past the tolerance over which the date score decays to zero.
    pub date_decay_days: i64,
    /// Relative error band for monetary comparison.
    pub currency_relative_tolerance: f64,
    /// Absolute difference (minor units) treated as an exact amount match.
    pub currency_absolute_tolerance_minor: i64,
    /// Minimum currency score still counted as matched.
    pub currency_threshold: f64,
    /// Distance within which a geotag fully matches the geocoded address.
    pub geo_radius_meters: f64,
    /// Distance at which the geo score reaches zero.
    pub geo_max_radius_meters: f64,
    /// Minimum similarity for a categorical match.
    pub categorical_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.8,
            date_tolerance_days: 0,
            date_decay_days: 5,
            currency_relative_tolerance: 0.01,
            currency_absolute_tolerance_minor: 0,
            currency_threshold: 0.5,
            geo_radius_meters: 500.0,
            geo_max_radius_meters: 5_000.0,
            categorical_threshold: 0.8,
        }
    }
}

/// Outcome of comparing one application field against one extracted field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatchResult {
    pub field: CanonicalField,
    pub document: DocumentKind,
    pub score: f64,
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl FieldMatchResult {
    /// Build a scored result, clipping the score into [0.0, 1.0].
    pub fn scored(
        field: CanonicalField,
        document: DocumentKind,
        score: f64,
        matched: bool,
        expected: impl Into<String>,
        observed: impl Into<String>,
    ) -> Self {
        Self {
            field,
            document,
            score: clamp_score(score),
            matched,
            expected: Some(expected.into()),
            observed: Some(observed.into()),
            note: None,
        }
    }

    /// Result for a field absent from either the form or the document.
    pub fn missing(field: CanonicalField, document: DocumentKind) -> Self {
        Self {
            field,
            document,
            score: 0.0,
            matched: false,
            expected: None,
            observed: None,
            note: Some("field not found in document".to_string()),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

pub(crate) fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}
