use chrono::{DateTime, Utc};
use serde::Serialize;

/// One historical capture of a URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub mime_type: String,
    /// `None` when the archive reports a placeholder status (`-`)
    pub status_code: Option<u16>,
    pub digest: String,
    pub length: Option<u64>,
}

impl Snapshot {
    /// A capture at `timestamp` with an HTML 200 response and no digest
    pub fn captured_at(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            mime_type: "text/html".to_string(),
            status_code: Some(200),
            digest: String::new(),
            length: None,
        }
    }

    /// Whether the capture carries a real status code and may be selected
    pub fn has_status(&self) -> bool {
        self.status_code.is_some()
    }
}
