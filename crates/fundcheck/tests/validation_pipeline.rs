//! End-to-end pipeline scenarios exercised through the public facade with
//! stubbed extraction and geocoding collaborators.

mod common {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use fundcheck::extract::tabular::{statement_document, TransactionRow};
    use fundcheck::extract::vision::{image_document, VisionObservation};
    use fundcheck::extract::{
        DocumentExtractor, DocumentKind, DocumentLocation, ExtractedDocument, ExtractionError,
    };
    use fundcheck::matchers::{GeoPoint, GeocodeError, Geocoder, MatcherConfig};
    use fundcheck::{ApplicationForm, Collaborators, DocumentSet, ValidationPipeline};
    use chrono::NaiveDate;

    pub const ADDRESS_COORDS: GeoPoint = GeoPoint {
        latitude: 52.6309,
        longitude: 1.2974,
    };

    pub enum Behavior {
        Succeed(ExtractedDocument),
        Fail,
        Hang,
    }

    pub struct StubExtractor {
        kind: DocumentKind,
        behavior: Behavior,
    }

    impl StubExtractor {
        pub fn new(kind: DocumentKind, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self { kind, behavior })
        }
    }

    #[async_trait]
    impl DocumentExtractor for StubExtractor {
        fn kind(&self) -> DocumentKind {
            self.kind
        }

        async fn extract(
            &self,
            _location: &DocumentLocation,
        ) -> Result<ExtractedDocument, ExtractionError> {
            match &self.behavior {
                Behavior::Succeed(document) => Ok(document.clone()),
                Behavior::Fail => Err(ExtractionError::Unreadable("stub failure".to_string())),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(ExtractionError::Timeout)
                }
            }
        }
    }

    pub struct StubGeocoder;

    #[async_trait]
    impl Geocoder for StubGeocoder {
        async fn geocode(&self, _address: &str) -> Result<GeoPoint, GeocodeError> {
            Ok(ADDRESS_COORDS)
        }
    }

    pub fn application_form() -> Arc<ApplicationForm> {
        Arc::new(
            ApplicationForm::from_entries([
                ("business_name", "Hilltop Farm Supplies"),
                ("contractor_name", "AgriTech Ltd"),
                ("address", "12 Mill Lane, Norwich"),
                ("item_name", "Tractor"),
                ("model", "Kubota M7-172"),
                ("purchase_date", "2024-01-05"),
                ("cost", "£12,500.00"),
            ])
            .expect("valid form"),
        )
    }

    pub fn consistent_statement() -> ExtractedDocument {
        statement_document(vec![
            TransactionRow {
                date: NaiveDate::from_ymd_opt(2024, 1, 2),
                amount_minor: Some(4_200),
                description: "COFFEE HOUSE".to_string(),
            },
            TransactionRow {
                date: NaiveDate::from_ymd_opt(2024, 1, 5),
                amount_minor: Some(1_250_000),
                description: "AGRITECH LTD".to_string(),
            },
        ])
    }

    pub fn consistent_invoice() -> ExtractedDocument {
        ExtractedDocument::new(DocumentKind::Invoice)
            .with_field("vendor", "AgriTech Ltd")
            .with_field("business_name", "Hilltop Farm Supplies")
            .with_field("address", "12 Mill Lane, Norwich")
            .with_field("date", "05/01/2024")
            .with_field("cost", "12,500.00")
            .with_field("model", "Kubota M7-172")
    }

    pub fn consistent_image() -> ExtractedDocument {
        image_document(
            VisionObservation {
                object_description: "a red compact tractor".to_string(),
                fully_captured: true,
            },
            Some(GeoPoint {
                latitude: ADDRESS_COORDS.latitude + 100.0 / 111_320.0,
                longitude: ADDRESS_COORDS.longitude,
            }),
        )
    }

    pub fn pipeline(
        bank: Behavior,
        invoice: Behavior,
        image: Behavior,
        document_timeout: Duration,
    ) -> ValidationPipeline {
        let collaborators = Collaborators {
            bank_statement: StubExtractor::new(DocumentKind::BankStatement, bank),
            invoice: StubExtractor::new(DocumentKind::Invoice, invoice),
            image: StubExtractor::new(DocumentKind::Image, image),
            geocoder: Arc::new(StubGeocoder),
        };
        ValidationPipeline::new(collaborators, MatcherConfig::default(), document_timeout)
    }

    pub fn locations() -> DocumentSet {
        DocumentSet {
            bank_statement: DocumentLocation("fixtures/statement.csv".to_string()),
            invoice: DocumentLocation("fixtures/invoice.json".to_string()),
            image: DocumentLocation("fixtures/site-photo.json".to_string()),
        }
    }
}

use std::time::Duration;

use common::{
    application_form, consistent_image, consistent_invoice, consistent_statement, locations,
    pipeline, Behavior,
};
use fundcheck::extract::DocumentKind;
use fundcheck::PipelineError;
use tokio_util::sync::CancellationToken;

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn consistent_documents_yield_full_confidence() {
    let pipeline = pipeline(
        Behavior::Succeed(consistent_statement()),
        Behavior::Succeed(consistent_invoice()),
        Behavior::Succeed(consistent_image()),
        TIMEOUT,
    );

    let report = pipeline
        .run(application_form(), &locations(), CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(report.results.len(), 11);
    assert!(report.failures.is_empty());
    assert_eq!(report.overall_confidence, 1.0);
    assert!(report.discrepancies().is_empty());
}

#[tokio::test]
async fn one_failed_document_still_produces_a_report() {
    let pipeline = pipeline(
        Behavior::Fail,
        Behavior::Succeed(consistent_invoice()),
        Behavior::Succeed(consistent_image()),
        TIMEOUT,
    );

    let report = pipeline
        .run(application_form(), &locations(), CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(report.failures, vec![DocumentKind::BankStatement]);
    // 6 invoice + 2 image results remain.
    assert_eq!(report.results.len(), 8);
    assert_eq!(report.overall_confidence, 1.0);
}

#[tokio::test]
async fn total_extraction_failure_aborts_the_run() {
    let pipeline = pipeline(Behavior::Fail, Behavior::Fail, Behavior::Fail, TIMEOUT);

    let err = pipeline
        .run(application_form(), &locations(), CancellationToken::new())
        .await
        .expect_err("run fails");
    assert!(matches!(err, PipelineError::InsufficientData(_)));
}

#[tokio::test]
async fn slow_extraction_times_out_without_blocking_the_run() {
    let pipeline = pipeline(
        Behavior::Succeed(consistent_statement()),
        Behavior::Hang,
        Behavior::Succeed(consistent_image()),
        Duration::from_millis(100),
    );

    let report = pipeline
        .run(application_form(), &locations(), CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(report.failures, vec![DocumentKind::Invoice]);
    assert_eq!(report.results.len(), 5);
}

#[tokio::test]
async fn cancellation_propagates_to_in_flight_extractions() {
    let pipeline = pipeline(
        Behavior::Hang,
        Behavior::Hang,
        Behavior::Hang,
        Duration::from_secs(60),
    );

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = pipeline
        .run(application_form(), &locations(), cancel)
        .await
        .expect_err("run cancelled");
    assert!(matches!(err, PipelineError::Cancelled));
}

#[tokio::test]
async fn identical_inputs_produce_identical_reports() {
    let make = || {
        pipeline(
            Behavior::Succeed(consistent_statement()),
            Behavior::Succeed(consistent_invoice()),
            Behavior::Succeed(consistent_image()),
            TIMEOUT,
        )
    };

    let first = make()
        .run(application_form(), &locations(), CancellationToken::new())
        .await
        .expect("first run");
    let second = make()
        .run(application_form(), &locations(), CancellationToken::new())
        .await
        .expect("second run");

    let first_json = serde_json::to_string(&first).expect("serialize");
    let second_json = serde_json::to_string(&second).expect("serialize");
    assert_eq!(first_json, second_json);
}

#[tokio::test]
async fn discrepancies_carry_expected_and_observed_values() {
    let mut invoice = consistent_invoice();
    invoice
        .fields
        .insert("cost".to_string(), "18,000.00".to_string());

    let pipeline = pipeline(
        Behavior::Succeed(consistent_statement()),
        Behavior::Succeed(invoice),
        Behavior::Succeed(consistent_image()),
        TIMEOUT,
    );

    let report = pipeline
        .run(application_form(), &locations(), CancellationToken::new())
        .await
        .expect("run succeeds");

    let discrepancies = report.discrepancies();
    assert_eq!(discrepancies.len(), 1);
    let cost = &discrepancies[0];
    assert_eq!(cost.expected.as_deref(), Some("12500.00"));
    assert_eq!(cost.observed.as_deref(), Some("18,000.00"));
    assert!(!cost.guidance.is_empty());
    assert!(report.overall_confidence < 1.0);
}
