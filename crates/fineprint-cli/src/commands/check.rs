//! Change detection command
//!
//! Fetches the live document, finds its prior capture, and prints the
//! detection outcome as JSON.

use crate::commands::{load_config, reference_or_now, runtime};
use clap::Args;
use fineprint_engine::collaborators::{DocumentFetcher, PassthroughExtractor, TextExtractor};
use fineprint_engine::detect::ChangeDetector;
use fineprint_engine::http_fetch::{build_client, HttpDocumentFetcher};
use fineprint_engine::wayback::WaybackClient;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

#[derive(Debug, Args)]
pub struct CheckArgs {
    pub url: String,

    /// Notice time as RFC 3339; defaults to now
    #[arg(long)]
    pub reference: Option<String>,

    #[arg(long, env = "FINEPRINT_CONFIG")]
    pub config: Option<PathBuf>,
}

pub fn execute(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    runtime()?.block_on(run(args))
}

async fn run(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_deref())?;
    let url = Url::parse(&args.url).map_err(|e| format!("invalid URL {:?}: {e}", args.url))?;
    let reference = reference_or_now(args.reference.as_deref())?;

    let client = build_client(&config.http)?;
    let extractor: Arc<dyn TextExtractor> = Arc::new(PassthroughExtractor);
    let fetcher = HttpDocumentFetcher::new(client.clone(), Arc::clone(&extractor));
    let archive = Arc::new(WaybackClient::new(client, &config.archive)?);
    let detector = ChangeDetector::new(archive, extractor, &config.detection)?;

    let current = fetcher.fetch_document(&url).await?;
    tracing::debug!(final_url = current.final_url.as_str(), "fetched current document");

    let result = detector.detect(&url, &current, reference).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
