pub mod check;
pub mod diff;
pub mod snapshots;
pub mod strip;

use chrono::{DateTime, Utc};
use fineprint_engine::config::{ConfigLoader, FinePrintConfig};
use std::path::Path;

/// Load configuration, reading `path` first when given
pub fn load_config(path: Option<&Path>) -> Result<FinePrintConfig, Box<dyn std::error::Error>> {
    let loader = match path {
        Some(path) => ConfigLoader::new().with_config_path(path),
        None => ConfigLoader::new(),
    };
    Ok(loader.load()?)
}

/// Parse an RFC 3339 `--reference`, defaulting to now
pub fn reference_or_now(raw: Option<&str>) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    match raw {
        Some(raw) => Ok(DateTime::parse_from_rfc3339(raw)
            .map_err(|e| format!("invalid --reference {raw:?}: {e}"))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}
