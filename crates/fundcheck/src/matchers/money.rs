use super::{clamp_score, MatcherConfig};

/// Score two amounts in minor units.
///
/// Differences within the absolute tolerance score 1.0; otherwise the score
/// is `1 - min(1, relative_error / tolerance_band)`, so a difference at the
/// edge of the band scores 0 and anything beyond it clips to 0.
pub fn money_score(application_minor: i64, extracted_minor: i64, config: &MatcherConfig) -> f64 {
    let difference = (application_minor - extracted_minor).abs();
    if difference <= config.currency_absolute_tolerance_minor {
        return 1.0;
    }
    let reference = application_minor.abs().max(1) as f64;
    let relative_error = difference as f64 / reference;
    if config.currency_relative_tolerance <= 0.0 {
        return 0.0;
    }
    clamp_score(1.0 - (relative_error / config.currency_relative_tolerance).min(1.0))
}
