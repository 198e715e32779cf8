//! Change detection for one policy document.
//!
//! ## Flow
//!
//! ```text
//! policy URL ──canonicalize──► list captures ──select (reference - grace)──►
//!   fetch capture ──strip archive markup──► extract text ──diff vs current──►
//!   Delta | NoPriorVersion
//! ```
//!
//! Every failure after the current document was fetched degrades to
//! [`ChangeDetectionResult::NoPriorVersion`] with a [`NoPriorReason`], so a
//! report can still be built from the current text alone.

use crate::collaborators::{FetchedDocument, SnapshotArchive, TextExtractor};
use crate::config::DetectionConfig;
use chrono::{DateTime, Duration, Utc};
use fineprint_core::diff::unified_diff;
use fineprint_core::errors::{ExError, FinePrintError};
use fineprint_core::snapshot::{
    grace_period_days, select_prior_snapshot, CanonicalUrl, PriorSnapshot, MAX_GRACE_DAYS,
};
use fineprint_core::strip::MarkupStripper;
use fineprint_core::{log_op_end, log_op_error, log_op_start};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Label of the archived side in rendered diffs
pub const PRIOR_LABEL: &str = "previous-policy";
/// Label of the live side in rendered diffs
pub const CURRENT_LABEL: &str = "current-policy";

/// Why no diff was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoPriorReason {
    /// The archive has no captures of the URL
    NoSnapshots,
    /// Every capture is inside the grace period or lacks a status
    NoneOlderThanCutoff,
    /// The policy URL could not be canonicalized or the listing failed
    ArchiveUnavailable,
    /// The selected capture could not be fetched or read
    SnapshotUnavailable,
    /// The diff could not be rendered
    DiffFailed,
    /// Prior and current text are identical
    Identical,
}

impl NoPriorReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoPriorReason::NoSnapshots => "no_snapshots",
            NoPriorReason::NoneOlderThanCutoff => "none_older_than_cutoff",
            NoPriorReason::ArchiveUnavailable => "archive_unavailable",
            NoPriorReason::SnapshotUnavailable => "snapshot_unavailable",
            NoPriorReason::DiffFailed => "diff_failed",
            NoPriorReason::Identical => "identical",
        }
    }
}

/// Terminal outcome of change detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ChangeDetectionResult {
    NoPriorVersion {
        /// Text of the live document
        current: String,
        reason: NoPriorReason,
    },
    Delta {
        unified_diff: String,
        prior_timestamp: DateTime<Utc>,
        /// Address the archive served the capture from
        prior_url: Url,
        current_url: Url,
    },
}

impl ChangeDetectionResult {
    pub fn is_delta(&self) -> bool {
        matches!(self, ChangeDetectionResult::Delta { .. })
    }
}

/// Detection settings, validated once at construction
#[derive(Debug, Clone)]
struct DetectionSettings {
    grace: Duration,
    context_lines: usize,
    begin_marker: Vec<u8>,
    end_marker: Vec<u8>,
}

/// Compares a live document against its most recent eligible capture
pub struct ChangeDetector {
    archive: Arc<dyn SnapshotArchive>,
    extractor: Arc<dyn TextExtractor>,
    settings: DetectionSettings,
}

impl ChangeDetector {
    /// # Errors
    ///
    /// - `EmptyMarker` if either strip marker is empty
    /// - `Config` if the grace period is negative or longer than
    ///   `MAX_GRACE_DAYS`
    pub fn new(
        archive: Arc<dyn SnapshotArchive>,
        extractor: Arc<dyn TextExtractor>,
        config: &DetectionConfig,
    ) -> Result<Self, FinePrintError> {
        if config.strip_begin_marker.is_empty() {
            return Err(FinePrintError::EmptyMarker { which: "begin" });
        }
        if config.strip_end_marker.is_empty() {
            return Err(FinePrintError::EmptyMarker { which: "end" });
        }
        let grace = grace_period_days(config.grace_period_days).ok_or_else(|| {
            FinePrintError::Config {
                reason: format!(
                    "detection.grace_period_days must be between 0 and {MAX_GRACE_DAYS}"
                ),
            }
        })?;

        Ok(Self {
            archive,
            extractor,
            settings: DetectionSettings {
                grace,
                context_lines: config.context_lines,
                begin_marker: config.strip_begin_marker.clone().into_bytes(),
                end_marker: config.strip_end_marker.clone().into_bytes(),
            },
        })
    }

    pub fn grace_period(&self) -> Duration {
        self.settings.grace
    }

    /// Diff `current` against the newest capture of `policy_url` taken
    /// before `reference - grace`
    ///
    /// Never fails: every failure is logged and reported as
    /// `NoPriorVersion`.
    pub async fn detect(
        &self,
        policy_url: &Url,
        current: &FetchedDocument,
        reference: DateTime<Utc>,
    ) -> ChangeDetectionResult {
        let start = Instant::now();
        log_op_start!("detect_changes", url = policy_url.as_str());

        let result = self.run(policy_url, current, reference).await;

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            ChangeDetectionResult::Delta { prior_timestamp, .. } => {
                log_op_end!(
                    "detect_changes",
                    duration_ms = duration_ms,
                    outcome = "delta",
                    prior_timestamp = %prior_timestamp
                );
            }
            ChangeDetectionResult::NoPriorVersion { reason, .. } => {
                log_op_end!(
                    "detect_changes",
                    duration_ms = duration_ms,
                    outcome = "no_prior_version",
                    reason = reason.as_str()
                );
            }
        }
        result
    }

    async fn run(
        &self,
        policy_url: &Url,
        current: &FetchedDocument,
        reference: DateTime<Utc>,
    ) -> ChangeDetectionResult {
        let no_prior = |reason| ChangeDetectionResult::NoPriorVersion {
            current: current.text.clone(),
            reason,
        };

        let canonical = match CanonicalUrl::from_url(policy_url) {
            Ok(canonical) => canonical,
            Err(err) => {
                log_op_error!("canonicalize_url", err, duration_ms = 0u64);
                return no_prior(NoPriorReason::ArchiveUnavailable);
            }
        };

        // Errors from collaborators are already logged by them.
        let snapshots = match self.archive.list_snapshots(&canonical).await {
            Ok(snapshots) => snapshots,
            Err(err) => {
                tracing::warn!(url = canonical.as_str(), error = %err, "snapshot listing failed");
                return no_prior(NoPriorReason::ArchiveUnavailable);
            }
        };
        if snapshots.is_empty() {
            return no_prior(NoPriorReason::NoSnapshots);
        }

        let prior = match select_prior_snapshot(&snapshots, reference, self.settings.grace) {
            PriorSnapshot::Selected(snapshot) => snapshot.timestamp,
            PriorSnapshot::NoPriorSnapshot => {
                tracing::info!(
                    url = canonical.as_str(),
                    listed = snapshots.len(),
                    "no capture older than the cutoff"
                );
                return no_prior(NoPriorReason::NoneOlderThanCutoff);
            }
        };

        let (prior_text, prior_url) = match self.load_snapshot(&canonical, prior).await {
            Ok(loaded) => loaded,
            Err(err) => {
                tracing::warn!(url = canonical.as_str(), error = %err, "prior capture unavailable");
                return no_prior(NoPriorReason::SnapshotUnavailable);
            }
        };

        let rendered = match unified_diff(
            PRIOR_LABEL,
            CURRENT_LABEL,
            &prior_text,
            &current.text,
            self.settings.context_lines,
        ) {
            Ok(rendered) => rendered,
            Err(err) => {
                log_op_error!("render_diff", err, duration_ms = 0u64);
                return no_prior(NoPriorReason::DiffFailed);
            }
        };
        if rendered.is_empty() {
            return no_prior(NoPriorReason::Identical);
        }

        ChangeDetectionResult::Delta {
            unified_diff: rendered,
            prior_timestamp: prior,
            prior_url,
            current_url: current.final_url.clone(),
        }
    }

    /// Fetch a capture, strip the archive's injected markup, and extract text
    async fn load_snapshot(
        &self,
        canonical: &CanonicalUrl,
        timestamp: DateTime<Utc>,
    ) -> Result<(String, Url), ExError> {
        let content = self.archive.fetch_snapshot(canonical, timestamp).await?;
        let mut stripped = MarkupStripper::new(
            content.body,
            self.settings.begin_marker.clone(),
            self.settings.end_marker.clone(),
        )?;
        let text = self.extractor.extract_text(&mut stripped)?;
        Ok((text, content.resolved_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{PassthroughExtractor, SnapshotContent};
    use async_trait::async_trait;
    use fineprint_core::snapshot::Snapshot;

    struct EmptyArchive;

    #[async_trait]
    impl SnapshotArchive for EmptyArchive {
        async fn list_snapshots(&self, _url: &CanonicalUrl) -> Result<Vec<Snapshot>, ExError> {
            Ok(Vec::new())
        }

        async fn fetch_snapshot(
            &self,
            _url: &CanonicalUrl,
            _timestamp: DateTime<Utc>,
        ) -> Result<SnapshotContent, ExError> {
            unreachable!("nothing listed")
        }
    }

    fn detector(config: &DetectionConfig) -> Result<ChangeDetector, FinePrintError> {
        ChangeDetector::new(Arc::new(EmptyArchive), Arc::new(PassthroughExtractor), config)
    }

    #[test]
    fn test_empty_markers_rejected() {
        let config = DetectionConfig {
            strip_begin_marker: String::new(),
            ..DetectionConfig::default()
        };
        assert!(matches!(
            detector(&config),
            Err(FinePrintError::EmptyMarker { which: "begin" })
        ));
    }

    #[test]
    fn test_negative_grace_rejected() {
        let config = DetectionConfig {
            grace_period_days: -1,
            ..DetectionConfig::default()
        };
        assert!(matches!(detector(&config), Err(FinePrintError::Config { .. })));
    }

    #[test]
    fn test_oversized_grace_rejected() {
        for grace_period_days in [MAX_GRACE_DAYS + 1, 100_000_000, i64::MAX / 2, i64::MAX] {
            let config = DetectionConfig {
                grace_period_days,
                ..DetectionConfig::default()
            };
            assert!(
                matches!(detector(&config), Err(FinePrintError::Config { .. })),
                "grace {grace_period_days}"
            );
        }
    }

    #[test]
    fn test_longest_grace_accepted() {
        let config = DetectionConfig {
            grace_period_days: MAX_GRACE_DAYS,
            ..DetectionConfig::default()
        };
        let detector = detector(&config).unwrap();
        assert_eq!(detector.grace_period(), Duration::days(MAX_GRACE_DAYS));
    }

    #[tokio::test]
    async fn test_empty_listing_is_no_prior_version() {
        let detector = detector(&DetectionConfig::default()).unwrap();
        let url = Url::parse("https://example.com/privacy").unwrap();
        let current = FetchedDocument {
            text: "policy\n".to_string(),
            final_url: url.clone(),
        };

        let result = detector.detect(&url, &current, Utc::now()).await;
        assert_eq!(
            result,
            ChangeDetectionResult::NoPriorVersion {
                current: "policy\n".to_string(),
                reason: NoPriorReason::NoSnapshots,
            }
        );
    }
}
