use chrono::NaiveDate;

use super::{clamp_score, MatcherConfig};

/// Score two canonical dates: 1.0 within the tolerance window, then linear
/// decay to 0 across the configured decay window.
pub fn date_score(application: NaiveDate, extracted: NaiveDate, config: &MatcherConfig) -> f64 {
    let difference = (application - extracted).num_days().abs();
    if difference <= config.date_tolerance_days {
        return 1.0;
    }
    if config.date_decay_days <= 0 {
        return 0.0;
    }
    let past_tolerance = (difference - config.date_tolerance_days) as f64;
    clamp_score(1.0 - past_tolerance / config.date_decay_days as f64)
}
