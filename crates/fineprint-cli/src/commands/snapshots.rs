//! Snapshot listing command

use crate::commands::{load_config, reference_or_now, runtime};
use clap::Args;
use fineprint_core::snapshot::{
    format_timestamp, grace_period_days, select_prior_snapshot, CanonicalUrl, PriorSnapshot,
    MAX_GRACE_DAYS,
};
use fineprint_engine::collaborators::SnapshotArchive;
use fineprint_engine::http_fetch::build_client;
use fineprint_engine::wayback::WaybackClient;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct SnapshotsArgs {
    pub url: String,

    /// Notice time as RFC 3339; defaults to now
    #[arg(long)]
    pub reference: Option<String>,

    /// Overrides detection.grace_period_days
    #[arg(long)]
    pub grace_days: Option<i64>,

    #[arg(long, env = "FINEPRINT_CONFIG")]
    pub config: Option<PathBuf>,
}

pub fn execute(args: SnapshotsArgs) -> Result<(), Box<dyn std::error::Error>> {
    runtime()?.block_on(run(args))
}

async fn run(args: SnapshotsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_deref())?;
    let canonical = CanonicalUrl::parse(&args.url)?;
    let reference = reference_or_now(args.reference.as_deref())?;
    let grace_days = args.grace_days.unwrap_or(config.detection.grace_period_days);
    let grace = grace_period_days(grace_days)
        .ok_or_else(|| format!("--grace-days must be between 0 and {MAX_GRACE_DAYS}"))?;

    let archive = WaybackClient::new(build_client(&config.http)?, &config.archive)?;
    let snapshots = archive.list_snapshots(&canonical).await?;

    println!("{} captures of {}", snapshots.len(), canonical);
    for snapshot in &snapshots {
        println!(
            "  {}  {}  {}  {}",
            format_timestamp(&snapshot.timestamp),
            snapshot
                .status_code
                .map_or_else(|| "-".to_string(), |s| s.to_string()),
            snapshot.mime_type,
            snapshot.digest
        );
    }

    match select_prior_snapshot(&snapshots, reference, grace) {
        PriorSnapshot::Selected(snapshot) => {
            println!("prior: {}", format_timestamp(&snapshot.timestamp));
        }
        PriorSnapshot::NoPriorSnapshot => {
            println!("prior: none older than {grace_days} days before {reference}");
        }
    }
    Ok(())
}
