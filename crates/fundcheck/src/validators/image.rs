use std::sync::Arc;

use crate::extract::vision::OBJECT_DESCRIPTION_FIELD;
use crate::extract::{DocumentKind, ExtractedDocument};
use crate::matchers::{categorical_score, geo_score, FieldMatchResult, Geocoder, MatcherConfig};
use crate::schema::{ApplicationForm, CanonicalField};

/// Validates the supporting image: the described object against the claimed
/// item category, and the embedded geotag against the geocoded application
/// address.
pub struct ImageValidator {
    geocoder: Arc<dyn Geocoder>,
}

impl ImageValidator {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    pub async fn validate(
        &self,
        form: &ApplicationForm,
        document: &ExtractedDocument,
        config: &MatcherConfig,
    ) -> Vec<FieldMatchResult> {
        vec![
            self.validate_object(form, document, config),
            self.validate_geotag(form, document, config).await,
        ]
    }

    fn validate_object(
        &self,
        form: &ApplicationForm,
        document: &ExtractedDocument,
        config: &MatcherConfig,
    ) -> FieldMatchResult {
        let Some(description) = document.field(OBJECT_DESCRIPTION_FIELD) else {
            return FieldMatchResult::missing(CanonicalField::ItemName, DocumentKind::Image);
        };
        let expected = form.text(CanonicalField::ItemName).unwrap_or_default();

        // Extraction confidence scales the score, so a partially captured
        // object cannot fully match.
        let confidence = document
            .confidence
            .get(OBJECT_DESCRIPTION_FIELD)
            .copied()
            .unwrap_or(1.0);
        let score = categorical_score(expected, description) * confidence;
        let matched = score >= config.categorical_threshold;

        let mut result = FieldMatchResult::scored(
            CanonicalField::ItemName,
            DocumentKind::Image,
            score,
            matched,
            expected,
            description,
        );
        if !matched && confidence < 1.0 {
            result = result.with_note(
                "the object in the image does not match the application form or is not fully captured"
                    .to_string(),
            );
        }
        result
    }

    async fn validate_geotag(
        &self,
        form: &ApplicationForm,
        document: &ExtractedDocument,
        config: &MatcherConfig,
    ) -> FieldMatchResult {
        let Some(geotag) = document.geotag else {
            return FieldMatchResult::missing(CanonicalField::Address, DocumentKind::Image);
        };
        let address = form.text(CanonicalField::Address).unwrap_or_default();
        let observed = format!("{:.5},{:.5}", geotag.latitude, geotag.longitude);

        match self.geocoder.geocode(address).await {
            Ok(coordinates) => {
                let score = geo_score(geotag, coordinates, config);
                FieldMatchResult::scored(
                    CanonicalField::Address,
                    DocumentKind::Image,
                    score,
                    score >= 1.0,
                    address,
                    observed,
                )
            }
            Err(err) => FieldMatchResult::scored(
                CanonicalField::Address,
                DocumentKind::Image,
                0.0,
                false,
                address,
                observed,
            )
            .with_note(format!("geotag could not be verified: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::sample_form;
    use super::*;
    use crate::extract::vision::{image_document, VisionObservation};
    use crate::matchers::{GeoPoint, GeocodeError};
    use async_trait::async_trait;

    const ADDRESS_COORDS: GeoPoint = GeoPoint {
        latitude: 52.6309,
        longitude: 1.2974,
    };

    struct FixedGeocoder(GeoPoint);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, _address: &str) -> Result<GeoPoint, GeocodeError> {
            Ok(self.0)
        }
    }

    struct FailingGeocoder;

    #[async_trait]
    impl Geocoder for FailingGeocoder {
        async fn geocode(&self, address: &str) -> Result<GeoPoint, GeocodeError> {
            Err(GeocodeError::NotFound(address.to_string()))
        }
    }

    fn observation(description: &str, fully_captured: bool) -> VisionObservation {
        VisionObservation {
            object_description: description.to_string(),
            fully_captured,
        }
    }

    fn nearby(meters: f64) -> GeoPoint {
        GeoPoint {
            latitude: ADDRESS_COORDS.latitude + meters / 111_320.0,
            longitude: ADDRESS_COORDS.longitude,
        }
    }

    #[tokio::test]
    async fn matching_image_and_geotag_score_fully() {
        let validator = ImageValidator::new(Arc::new(FixedGeocoder(ADDRESS_COORDS)));
        let document = image_document(
            observation("a red compact tractor", true),
            Some(nearby(100.0)),
        );
        let results = validator
            .validate(&sample_form(), &document, &MatcherConfig::default())
            .await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.matched && r.score == 1.0));
    }

    #[tokio::test]
    async fn partially_captured_object_does_not_match() {
        let validator = ImageValidator::new(Arc::new(FixedGeocoder(ADDRESS_COORDS)));
        let document = image_document(observation("tractor", false), Some(nearby(50.0)));
        let results = validator
            .validate(&sample_form(), &document, &MatcherConfig::default())
            .await;

        let object = results
            .iter()
            .find(|r| r.field == CanonicalField::ItemName)
            .expect("object result");
        assert!(!object.matched);
        assert_eq!(object.score, 0.5);
    }

    #[tokio::test]
    async fn geocode_failure_degrades_to_zero_with_a_note() {
        let validator = ImageValidator::new(Arc::new(FailingGeocoder));
        let document = image_document(observation("tractor", true), Some(nearby(50.0)));
        let results = validator
            .validate(&sample_form(), &document, &MatcherConfig::default())
            .await;

        let geo = results
            .iter()
            .find(|r| r.field == CanonicalField::Address)
            .expect("geo result");
        assert_eq!(geo.score, 0.0);
        assert!(!geo.matched);
        assert!(geo
            .note
            .as_deref()
            .unwrap()
            .contains("geotag could not be verified"));
    }

    #[tokio::test]
    async fn missing_geotag_is_unmatched_without_failing() {
        let validator = ImageValidator::new(Arc::new(FixedGeocoder(ADDRESS_COORDS)));
        let document = image_document(observation("tractor", true), None);
        let results = validator
            .validate(&sample_form(), &document, &MatcherConfig::default())
            .await;

        let geo = results
            .iter()
            .find(|r| r.field == CanonicalField::Address)
            .expect("geo result");
        assert_eq!(geo.note.as_deref(), Some("field not found in document"));
    }
}
