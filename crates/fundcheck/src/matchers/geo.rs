use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{clamp_score, MatcherConfig};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Resolves a postal address to coordinates. External collaborator; the CLI
/// ships an offline fixture implementation and tests use stubs.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeoPoint, GeocodeError>;
}

/// Geocoding failures degrade the geo field to score 0.0 with a note; they
/// never fail the document.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("address could not be geocoded: {0}")]
    NotFound(String),
    #[error("geocoding service unavailable: {0}")]
    Unavailable(String),
}

/// Great-circle distance between two points, in meters.
pub fn haversine_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Score a geotag against the geocoded address: 1.0 within the radius,
/// linear decay to 0 at the maximum radius.
pub fn geo_score(geotag: GeoPoint, address: GeoPoint, config: &MatcherConfig) -> f64 {
    let distance = haversine_meters(geotag, address);
    if distance <= config.geo_radius_meters {
        return 1.0;
    }
    if config.geo_max_radius_meters <= config.geo_radius_meters {
        return 0.0;
    }
    let span = config.geo_max_radius_meters - config.geo_radius_meters;
    clamp_score(1.0 - (distance - config.geo_radius_meters) / span)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NORWICH: GeoPoint = GeoPoint {
        latitude: 52.6309,
        longitude: 1.2974,
    };

    /// Offset a point north by roughly `meters`.
    fn north_of(origin: GeoPoint, meters: f64) -> GeoPoint {
        GeoPoint {
            latitude: origin.latitude + meters / 111_320.0,
            longitude: origin.longitude,
        }
    }

    #[test]
    fn haversine_matches_known_distances() {
        let point = north_of(NORWICH, 1_000.0);
        let distance = haversine_meters(NORWICH, point);
        assert!((distance - 1_000.0).abs() < 5.0, "distance was {distance}");
    }

    #[test]
    fn within_radius_scores_one() {
        let config = MatcherConfig::default();
        let geotag = north_of(NORWICH, 100.0);
        assert_eq!(geo_score(geotag, NORWICH, &config), 1.0);
    }

    #[test]
    fn distant_geotag_decays_linearly() {
        let config = MatcherConfig::default();
        let geotag = north_of(NORWICH, 4_000.0);
        let score = geo_score(geotag, NORWICH, &config);
        // 4000m sits past the midpoint of the 500m..5000m decay band.
        let midpoint = 0.5;
        assert!(score > 0.0 && score < midpoint, "score was {score}");
    }

    #[test]
    fn beyond_max_radius_scores_zero() {
        let config = MatcherConfig::default();
        let geotag = north_of(NORWICH, 8_000.0);
        assert_eq!(geo_score(geotag, NORWICH, &config), 0.0);
    }
}
