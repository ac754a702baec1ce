//! Vision-model adapter: parses the structured reply of the image
//! description call and lifts embedded geotag metadata into the document.

use crate::matchers::GeoPoint;

use super::{DocumentKind, ExtractedDocument, ExtractionError};

/// Field name the image validator reads the described object from.
pub const OBJECT_DESCRIPTION_FIELD: &str = "object_description";

/// Confidence assigned when the model reports the object only partially
/// captured.
const PARTIAL_CAPTURE_CONFIDENCE: f64 = 0.5;

/// Parsed reply of the image description call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionObservation {
    pub object_description: String,
    pub fully_captured: bool,
}

/// Parse the model's `object: <description>, fully captured: True/False`
/// reply format.
pub fn parse_vision_response(response: &str) -> Result<VisionObservation, ExtractionError> {
    let malformed =
        || ExtractionError::Unreadable(format!("unexpected vision model response: '{response}'"));

    let rest = response.trim().strip_prefix("object:").ok_or_else(malformed)?;
    let (description, capture) = rest.rsplit_once(',').ok_or_else(malformed)?;
    let capture = capture
        .trim()
        .strip_prefix("fully captured:")
        .ok_or_else(malformed)?;

    let fully_captured = match capture.trim().to_ascii_lowercase().as_str() {
        "true" => true,
        "false" => false,
        _ => return Err(malformed()),
    };

    let object_description = description.trim().to_string();
    if object_description.is_empty() {
        return Err(malformed());
    }

    Ok(VisionObservation {
        object_description,
        fully_captured,
    })
}

/// Build the common document shape from the observation and optional geotag.
pub fn image_document(
    observation: VisionObservation,
    geotag: Option<GeoPoint>,
) -> ExtractedDocument {
    let mut document = ExtractedDocument::new(DocumentKind::Image);
    let confidence = if observation.fully_captured {
        1.0
    } else {
        PARTIAL_CAPTURE_CONFIDENCE
    };
    document.fields.insert(
        OBJECT_DESCRIPTION_FIELD.to_string(),
        observation.object_description,
    );
    document
        .confidence
        .insert(OBJECT_DESCRIPTION_FIELD.to_string(), confidence);
    document.geotag = geotag;
    document
}
