use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use fineprint_core::errors::{ExError, ExErrorKind};
use fineprint_core::snapshot::{format_timestamp, CanonicalUrl, Snapshot};
use fineprint_engine::collaborators::{
    DocumentFetcher, FetchedDocument, SnapshotArchive, SnapshotContent,
};
use fineprint_engine::resolve::{DirectoryDocument, PolicyDirectory, ServiceMetadata};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Mutex;
use url::Url;

/// Fixed reference instant used across scenarios
#[allow(dead_code)]
pub fn reference() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

#[allow(dead_code)]
pub fn days_before(days: i64) -> DateTime<Utc> {
    reference() - Duration::days(days)
}

#[allow(dead_code)]
pub fn url(raw: &str) -> Url {
    Url::parse(raw).unwrap()
}

#[allow(dead_code)]
pub fn document(raw_url: &str, text: &str) -> FetchedDocument {
    FetchedDocument {
        text: text.to_string(),
        final_url: url(raw_url),
    }
}

/// Serves fixed texts by URL; anything else is a fetch failure
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, String>,
    pub requested: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl FakeFetcher {
    pub fn with_page(mut self, url: &str, text: &str) -> Self {
        self.pages.insert(url.to_string(), text.to_string());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentFetcher for FakeFetcher {
    async fn fetch_document(&self, url: &Url) -> Result<FetchedDocument, ExError> {
        self.requested.lock().unwrap().push(url.to_string());
        match self.pages.get(url.as_str()) {
            Some(text) => Ok(FetchedDocument {
                text: text.clone(),
                final_url: url.clone(),
            }),
            None => Err(ExError::new(ExErrorKind::FetchFailure)
                .with_op("fetch_document")
                .with_url(url.as_str())
                .with_message("not found")),
        }
    }
}

/// In-memory archive keyed by capture timestamp
#[derive(Default)]
pub struct FakeArchive {
    snapshots: Vec<Snapshot>,
    bodies: HashMap<String, Vec<u8>>,
    listing_fails: bool,
    trickle: bool,
    pub listed: Mutex<Vec<String>>,
    pub fetched: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl FakeArchive {
    /// A listed capture with a retrievable body
    pub fn with_capture(mut self, timestamp: DateTime<Utc>, body: &str) -> Self {
        self.snapshots.push(Snapshot::captured_at(timestamp));
        self.bodies
            .insert(format_timestamp(&timestamp), body.as_bytes().to_vec());
        self
    }

    /// A listed capture whose body cannot be fetched
    pub fn with_missing_capture(mut self, timestamp: DateTime<Utc>) -> Self {
        self.snapshots.push(Snapshot::captured_at(timestamp));
        self
    }

    /// Serve capture bodies one byte per read
    pub fn with_trickled_bodies(mut self) -> Self {
        self.trickle = true;
        self
    }

    pub fn with_failing_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    pub fn listed(&self) -> Vec<String> {
        self.listed.lock().unwrap().clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl SnapshotArchive for FakeArchive {
    async fn list_snapshots(&self, url: &CanonicalUrl) -> Result<Vec<Snapshot>, ExError> {
        self.listed.lock().unwrap().push(url.to_string());
        if self.listing_fails {
            return Err(ExError::new(ExErrorKind::FetchFailure)
                .with_op("list_snapshots")
                .with_message("archive offline"));
        }
        Ok(self.snapshots.clone())
    }

    async fn fetch_snapshot(
        &self,
        url: &CanonicalUrl,
        timestamp: DateTime<Utc>,
    ) -> Result<SnapshotContent, ExError> {
        let ts = format_timestamp(&timestamp);
        self.fetched.lock().unwrap().push(format!("{ts}/{url}"));
        match self.bodies.get(&ts) {
            Some(body) => Ok(SnapshotContent {
                body: if self.trickle {
                    Box::new(OneByteReader(Cursor::new(body.clone())))
                } else {
                    Box::new(Cursor::new(body.clone()))
                },
                resolved_url: Url::parse(&format!("https://web.archive.org/web/{ts}/{url}"))
                    .unwrap(),
            }),
            None => Err(ExError::new(ExErrorKind::FetchFailure)
                .with_op("fetch_snapshot")
                .with_message("capture gone")),
        }
    }
}

/// Reader that yields at most one byte per call
pub struct OneByteReader<R>(pub R);

impl<R: Read> Read for OneByteReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let len = buf.len().min(1);
        self.0.read(&mut buf[..len])
    }
}

/// Directory with at most one service, optionally failing
#[derive(Default)]
pub struct FakeDirectory {
    pub service: Option<ServiceMetadata>,
    pub fails: bool,
}

#[async_trait]
impl PolicyDirectory for FakeDirectory {
    async fn find_service(&self, _company: &str) -> Result<Option<ServiceMetadata>, ExError> {
        if self.fails {
            return Err(ExError::new(ExErrorKind::ExternalService).with_message("directory down"));
        }
        Ok(self.service.clone())
    }
}

#[allow(dead_code)]
pub fn service(documents: &[(&str, &str)]) -> ServiceMetadata {
    ServiceMetadata {
        id: 182,
        name: "Acme".to_string(),
        rating: Some("C".to_string()),
        documents: documents
            .iter()
            .map(|(name, url)| DirectoryDocument {
                name: name.to_string(),
                url: url.to_string(),
            })
            .collect(),
    }
}
