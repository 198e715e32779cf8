//! Interfaces to the services around change detection.
//!
//! Each trait is the narrowest surface the orchestrator needs. The HTTP
//! implementations live in [`crate::http_fetch`] and [`crate::wayback`];
//! tests substitute in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fineprint_core::errors::{ExError, ExErrorKind};
use fineprint_core::snapshot::{CanonicalUrl, Snapshot};
use std::fmt;
use std::io::Read;
use url::Url;

/// The current version of a policy document, already reduced to text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    pub text: String,
    /// Location after redirects
    pub final_url: Url,
}

/// Raw bytes of an archived capture
///
/// `body` still contains any markup the archive injected. It is read with
/// blocking `Read` calls from async code, so archives hand over a body that
/// is already in memory (or otherwise never waits on I/O); readers must not
/// assume any particular chunking.
pub struct SnapshotContent {
    pub body: Box<dyn Read + Send>,
    pub resolved_url: Url,
}

impl fmt::Debug for SnapshotContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotContent")
            .field("resolved_url", &self.resolved_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Fetches the live version of a document, following redirects
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch_document(&self, url: &Url) -> Result<FetchedDocument, ExError>;
}

/// Lists and retrieves archived captures
///
/// Both operations take a [`CanonicalUrl`] so the URL used for listing and
/// for fetching cannot drift apart.
#[async_trait]
pub trait SnapshotArchive: Send + Sync {
    async fn list_snapshots(&self, url: &CanonicalUrl) -> Result<Vec<Snapshot>, ExError>;

    async fn fetch_snapshot(
        &self,
        url: &CanonicalUrl,
        timestamp: DateTime<Utc>,
    ) -> Result<SnapshotContent, ExError>;
}

/// Reduces a document body to plain text
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, body: &mut dyn Read) -> Result<String, ExError>;
}

/// Decodes the body as UTF-8 (lossily) without interpreting markup
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughExtractor;

impl TextExtractor for PassthroughExtractor {
    fn extract_text(&self, body: &mut dyn Read) -> Result<String, ExError> {
        let mut bytes = Vec::new();
        body.read_to_end(&mut bytes).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("extract_text")
                .with_message(e.to_string())
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_replaces_invalid_utf8() {
        let mut body: &[u8] = b"caf\xc3\xa9 \xff";
        let text = PassthroughExtractor.extract_text(&mut body).unwrap();
        assert_eq!(text, "café \u{fffd}");
    }
}
