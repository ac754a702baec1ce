//! Offline collaborators for CLI runs: local-file document retrieval in
//! place of cloud storage, fixture payloads in place of live OCR/vision
//! services, and a lookup-table geocoder.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use fundcheck::extract::layout::{invoice_document, QueryAnswer};
use fundcheck::extract::tabular::{parse_csv, statement_document};
use fundcheck::extract::vision::{image_document, parse_vision_response};
use fundcheck::extract::{
    DocumentExtractor, DocumentKind, DocumentLocation, DocumentStore, ExtractedDocument,
    ExtractionError,
};
use fundcheck::matchers::{GeoPoint, GeocodeError, Geocoder};
use fundcheck::schema::normalize_text;
use fundcheck::Collaborators;

/// Resolves locations against the local filesystem.
pub(crate) struct LocalFileStore;

#[async_trait]
impl DocumentStore for LocalFileStore {
    async fn fetch(&self, location: &DocumentLocation) -> Result<Vec<u8>, ExtractionError> {
        tokio::fs::read(&location.0)
            .await
            .map_err(|err| ExtractionError::Unreadable(format!("{}: {err}", location.0)))
    }
}

fn as_text(location: &DocumentLocation, bytes: Vec<u8>) -> Result<String, ExtractionError> {
    String::from_utf8(bytes)
        .map_err(|_| ExtractionError::Unreadable(format!("{}: not valid UTF-8", location.0)))
}

/// Reads a CSV export of the extracted bank-statement table.
pub(crate) struct CsvStatementExtractor {
    store: Arc<dyn DocumentStore>,
}

#[async_trait]
impl DocumentExtractor for CsvStatementExtractor {
    fn kind(&self) -> DocumentKind {
        DocumentKind::BankStatement
    }

    async fn extract(
        &self,
        location: &DocumentLocation,
    ) -> Result<ExtractedDocument, ExtractionError> {
        let raw = as_text(location, self.store.fetch(location).await?)?;
        let transactions = parse_csv(raw.as_bytes())?;
        Ok(statement_document(transactions))
    }
}

/// Reads a JSON file of layout-OCR query answers.
pub(crate) struct InvoiceFixtureExtractor {
    store: Arc<dyn DocumentStore>,
}

#[async_trait]
impl DocumentExtractor for InvoiceFixtureExtractor {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Invoice
    }

    async fn extract(
        &self,
        location: &DocumentLocation,
    ) -> Result<ExtractedDocument, ExtractionError> {
        let raw = as_text(location, self.store.fetch(location).await?)?;
        let answers: Vec<QueryAnswer> = serde_json::from_str(&raw)
            .map_err(|err| ExtractionError::Unreadable(format!("{}: {err}", location.0)))?;
        Ok(invoice_document(&answers))
    }
}

/// Sidecar metadata for the supporting image: the vision model reply plus
/// any embedded geotag.
#[derive(Debug, Deserialize)]
struct ImageSidecar {
    response: String,
    #[serde(default)]
    geotag: Option<GeoPoint>,
}

pub(crate) struct ImageFixtureExtractor {
    store: Arc<dyn DocumentStore>,
}

#[async_trait]
impl DocumentExtractor for ImageFixtureExtractor {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Image
    }

    async fn extract(
        &self,
        location: &DocumentLocation,
    ) -> Result<ExtractedDocument, ExtractionError> {
        let raw = as_text(location, self.store.fetch(location).await?)?;
        let sidecar: ImageSidecar = serde_json::from_str(&raw)
            .map_err(|err| ExtractionError::Unreadable(format!("{}: {err}", location.0)))?;
        let observation = parse_vision_response(&sidecar.response)?;
        Ok(image_document(observation, sidecar.geotag))
    }
}

/// Offline geocoder backed by a JSON map of address -> coordinates.
/// Addresses are normalized before lookup, so formatting differences
/// between the cache and the application form do not matter.
pub(crate) struct FixtureGeocoder {
    cache: BTreeMap<String, GeoPoint>,
}

impl FixtureGeocoder {
    pub(crate) fn empty() -> Self {
        Self {
            cache: BTreeMap::new(),
        }
    }

    pub(crate) fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, GeoPoint)>,
    {
        let cache = entries
            .into_iter()
            .map(|(address, point)| (normalize_text(&address), point))
            .collect();
        Self { cache }
    }

    pub(crate) fn from_path(path: &Path) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let entries: BTreeMap<String, GeoPoint> = serde_json::from_str(&raw)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        Ok(Self::from_entries(entries))
    }
}

#[async_trait]
impl Geocoder for FixtureGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeoPoint, GeocodeError> {
        self.cache
            .get(&normalize_text(address))
            .copied()
            .ok_or_else(|| GeocodeError::NotFound(address.to_string()))
    }
}

pub(crate) fn offline_collaborators(geocache: Option<&PathBuf>) -> std::io::Result<Collaborators> {
    let geocoder = match geocache {
        Some(path) => FixtureGeocoder::from_path(path)?,
        None => FixtureGeocoder::empty(),
    };
    let store: Arc<dyn DocumentStore> = Arc::new(LocalFileStore);

    Ok(Collaborators {
        bank_statement: Arc::new(CsvStatementExtractor {
            store: Arc::clone(&store),
        }),
        invoice: Arc::new(InvoiceFixtureExtractor {
            store: Arc::clone(&store),
        }),
        image: Arc::new(ImageFixtureExtractor { store }),
        geocoder: Arc::new(geocoder),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn geocoder_normalizes_addresses_before_lookup() {
        let geocoder = FixtureGeocoder::from_entries([(
            "12 Mill Lane,  Norwich".to_string(),
            GeoPoint {
                latitude: 52.6309,
                longitude: 1.2974,
            },
        )]);

        let point = geocoder
            .geocode("12 MILL LANE, NORWICH")
            .await
            .expect("cached address resolves");
        assert_eq!(point.latitude, 52.6309);

        let err = geocoder
            .geocode("99 Nowhere Road")
            .await
            .expect_err("unknown address");
        assert!(matches!(err, GeocodeError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_files_surface_as_extraction_errors() {
        let extractor = CsvStatementExtractor {
            store: Arc::new(LocalFileStore),
        };
        let err = extractor
            .extract(&DocumentLocation("./does-not-exist.csv".to_string()))
            .await
            .expect_err("missing file");
        assert!(matches!(err, ExtractionError::Unreadable(_)));
    }
}
