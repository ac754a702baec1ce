//! Pipeline orchestrator: runs the three document validators concurrently
//! against a single read-only application form, tolerates per-document
//! failures, and aggregates the surviving results.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::extract::{DocumentExtractor, DocumentKind, DocumentLocation, ExtractionError};
use crate::matchers::{FieldMatchResult, Geocoder, MatcherConfig};
use crate::report::{aggregate, InsufficientDataError, ValidationReport};
use crate::schema::ApplicationForm;
use crate::validators::{BankStatementValidator, ImageValidator, InvoiceValidator};

/// Locations of the three supporting documents for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSet {
    pub bank_statement: DocumentLocation,
    pub invoice: DocumentLocation,
    pub image: DocumentLocation,
}

impl DocumentSet {
    fn location(&self, kind: DocumentKind) -> &DocumentLocation {
        match kind {
            DocumentKind::BankStatement => &self.bank_statement,
            DocumentKind::Invoice => &self.invoice,
            DocumentKind::Image => &self.image,
        }
    }
}

/// Externally constructed collaborators, injected so validators stay
/// independently testable and safely parallelizable.
#[derive(Clone)]
pub struct Collaborators {
    pub bank_statement: Arc<dyn DocumentExtractor>,
    pub invoice: Arc<dyn DocumentExtractor>,
    pub image: Arc<dyn DocumentExtractor>,
    pub geocoder: Arc<dyn Geocoder>,
}

impl Collaborators {
    fn extractor(&self, kind: DocumentKind) -> Arc<dyn DocumentExtractor> {
        match kind {
            DocumentKind::BankStatement => Arc::clone(&self.bank_statement),
            DocumentKind::Invoice => Arc::clone(&self.invoice),
            DocumentKind::Image => Arc::clone(&self.image),
        }
    }
}

/// Phase of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Extracting,
    Matching,
    Aggregated,
    Done,
    Failed,
}

impl RunState {
    pub const fn label(self) -> &'static str {
        match self {
            RunState::Pending => "pending",
            RunState::Extracting => "extracting",
            RunState::Matching => "matching",
            RunState::Aggregated => "aggregated",
            RunState::Done => "done",
            RunState::Failed => "failed",
        }
    }
}

/// Run-fatal pipeline errors; per-document failures are reported inside the
/// `ValidationReport` instead.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    InsufficientData(#[from] InsufficientDataError),
    #[error("validation run cancelled")]
    Cancelled,
}

enum DocumentOutcome {
    Results(Vec<FieldMatchResult>),
    Failed(ExtractionError),
}

/// Sequences extraction, matching, and aggregation for one application.
pub struct ValidationPipeline {
    collaborators: Collaborators,
    matcher: MatcherConfig,
    document_timeout: Duration,
}

impl ValidationPipeline {
    pub fn new(
        collaborators: Collaborators,
        matcher: MatcherConfig,
        document_timeout: Duration,
    ) -> Self {
        Self {
            collaborators,
            matcher,
            document_timeout,
        }
    }

    /// Validate one application against its three documents.
    ///
    /// Extraction and matching for the three documents run in parallel; the
    /// run joins on all of them before aggregation. A document failure
    /// becomes a `failures` entry unless every document fails.
    pub async fn run(
        &self,
        form: Arc<ApplicationForm>,
        documents: &DocumentSet,
        cancel: CancellationToken,
    ) -> Result<ValidationReport, PipelineError> {
        let mut state = RunState::Pending;
        transition(&mut state, RunState::Extracting);

        let handles: Vec<_> = DocumentKind::all()
            .into_iter()
            .map(|kind| {
                let extractor = self.collaborators.extractor(kind);
                let geocoder = Arc::clone(&self.collaborators.geocoder);
                let location = documents.location(kind).clone();
                let form = Arc::clone(&form);
                let matcher = self.matcher.clone();
                let document_timeout = self.document_timeout;
                let cancel = cancel.clone();

                tokio::spawn(async move {
                    let outcome = run_document(
                        kind,
                        extractor,
                        geocoder,
                        location,
                        form,
                        matcher,
                        document_timeout,
                        cancel,
                    )
                    .await;
                    (kind, outcome)
                })
            })
            .collect();

        let mut results = Vec::new();
        let mut failures = Vec::new();
        for handle in handles {
            let (kind, outcome) = match handle.await {
                Ok(joined) => joined,
                Err(err) => {
                    warn!(error = %err, "validator task aborted");
                    return Err(PipelineError::Cancelled);
                }
            };
            match outcome {
                DocumentOutcome::Results(document_results) => results.extend(document_results),
                DocumentOutcome::Failed(err) => {
                    warn!(document = kind.label(), error = %err, "document extraction failed");
                    failures.push(kind);
                }
            }
        }

        if cancel.is_cancelled() {
            transition(&mut state, RunState::Failed);
            return Err(PipelineError::Cancelled);
        }

        if failures.len() == DocumentKind::all().len() {
            transition(&mut state, RunState::Failed);
            return Err(InsufficientDataError.into());
        }

        transition(&mut state, RunState::Matching);
        let report = aggregate(results, failures)?;
        transition(&mut state, RunState::Aggregated);
        transition(&mut state, RunState::Done);
        Ok(report)
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_document(
    kind: DocumentKind,
    extractor: Arc<dyn DocumentExtractor>,
    geocoder: Arc<dyn Geocoder>,
    location: DocumentLocation,
    form: Arc<ApplicationForm>,
    matcher: MatcherConfig,
    document_timeout: Duration,
    cancel: CancellationToken,
) -> DocumentOutcome {
    let extracted = tokio::select! {
        _ = cancel.cancelled() => {
            return DocumentOutcome::Failed(ExtractionError::Timeout);
        }
        extracted = timeout(document_timeout, extractor.extract(&location)) => {
            match extracted {
                Ok(Ok(document)) => document,
                Ok(Err(err)) => return DocumentOutcome::Failed(err),
                Err(_) => return DocumentOutcome::Failed(ExtractionError::Timeout),
            }
        }
    };

    let results = match kind {
        DocumentKind::BankStatement => {
            BankStatementValidator::validate(&form, &extracted, &matcher)
        }
        DocumentKind::Invoice => InvoiceValidator::validate(&form, &extracted, &matcher),
        DocumentKind::Image => {
            ImageValidator::new(geocoder)
                .validate(&form, &extracted, &matcher)
                .await
        }
    };

    DocumentOutcome::Results(results)
}

fn transition(state: &mut RunState, next: RunState) {
    debug!(from = state.label(), to = next.label(), "run state transition");
    *state = next;
}
