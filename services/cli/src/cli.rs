use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use fundcheck::config::AppConfig;
use fundcheck::extract::DocumentLocation;
use fundcheck::{telemetry, AppError, ApplicationForm, DocumentSet, ValidationPipeline};

use crate::infra;

#[derive(Parser, Debug)]
#[command(
    name = "fundcheck",
    about = "Cross-validate a funding application against its supporting documents",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate one application and print the report as JSON
    Validate(ValidateArgs),
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Path to the validation request JSON
    #[arg(required_unless_present = "inline")]
    request: Option<PathBuf>,
    /// Inline request JSON instead of a file path
    #[arg(long, conflicts_with = "request")]
    inline: Option<String>,
    /// JSON file mapping addresses to coordinates for offline geocoding
    #[arg(long)]
    geocache: Option<PathBuf>,
}

/// Wire shape of the input request.
#[derive(Debug, Deserialize)]
struct ValidationRequest {
    application_form: BTreeMap<String, String>,
    documents: RequestDocuments,
}

#[derive(Debug, Deserialize)]
struct RequestDocuments {
    bank_statement: String,
    invoice: String,
    image: String,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(level) = cli.log_level {
        config.telemetry.log_level = level;
    }
    telemetry::init(&config.telemetry)?;

    match cli.command {
        Command::Validate(args) => validate(args, config).await,
    }
}

async fn validate(args: ValidateArgs, config: AppConfig) -> Result<(), AppError> {
    let raw_request = match (&args.request, &args.inline) {
        (_, Some(inline)) => inline.clone(),
        (Some(path), None) => std::fs::read_to_string(path)?,
        (None, None) => unreachable!("clap enforces request or --inline"),
    };
    let request: ValidationRequest = serde_json::from_str(&raw_request)?;

    let form = ApplicationForm::from_entries(request.application_form)?;
    let documents = DocumentSet {
        bank_statement: DocumentLocation(request.documents.bank_statement),
        invoice: DocumentLocation(request.documents.invoice),
        image: DocumentLocation(request.documents.image),
    };

    let collaborators = infra::offline_collaborators(args.geocache.as_ref())?;
    let pipeline = ValidationPipeline::new(
        collaborators,
        config.matcher.clone(),
        config.pipeline.document_timeout(),
    );

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    info!("starting application validation");
    let report = pipeline.run(Arc::new(form), &documents, cancel).await?;

    for discrepancy in report.discrepancies() {
        warn!(
            field = discrepancy.field.name(),
            document = discrepancy.document.label(),
            score = discrepancy.score,
            "{}",
            discrepancy.guidance
        );
    }
    info!(
        confidence = report.overall_confidence,
        failures = report.failures.len(),
        "validation complete"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
