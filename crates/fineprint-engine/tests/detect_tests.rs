#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{days_before, document, reference, url, FakeArchive};
use fineprint_core::snapshot::format_timestamp;
use fineprint_core::strip::{WAYBACK_BEGIN_MARKER, WAYBACK_END_MARKER};
use fineprint_engine::collaborators::PassthroughExtractor;
use fineprint_engine::config::DetectionConfig;
use fineprint_engine::detect::{ChangeDetectionResult, ChangeDetector, NoPriorReason};
use std::sync::Arc;

const POLICY_URL: &str = "https://acme.test/privacy";
const OLD_TEXT: &str = "Section 1: we keep data for 30 days.\n";
const NEW_TEXT: &str = "Section 1: we keep data for 7 days.\n";

// ---- Helpers ----

fn detector(archive: &Arc<FakeArchive>) -> ChangeDetector {
    ChangeDetector::new(
        archive.clone(),
        Arc::new(PassthroughExtractor),
        &DetectionConfig::default(),
    )
    .unwrap()
}

async fn detect(archive: &Arc<FakeArchive>, current_text: &str) -> ChangeDetectionResult {
    detector(archive)
        .detect(&url(POLICY_URL), &document(POLICY_URL, current_text), reference())
        .await
}

fn no_prior(reason: NoPriorReason) -> ChangeDetectionResult {
    ChangeDetectionResult::NoPriorVersion {
        current: NEW_TEXT.to_string(),
        reason,
    }
}

// ---- Selection ----

#[tokio::test]
async fn test_newest_capture_older_than_grace_is_diffed() {
    let archive = Arc::new(
        FakeArchive::default()
            .with_capture(days_before(10), "Section 1: ten days ago.\n")
            .with_capture(days_before(8), OLD_TEXT)
            .with_capture(days_before(3), NEW_TEXT)
            .with_capture(days_before(1), NEW_TEXT),
    );

    let result = detect(&archive, NEW_TEXT).await;

    let (unified_diff, prior_timestamp, prior_url, current_url) = match result {
        ChangeDetectionResult::Delta {
            unified_diff,
            prior_timestamp,
            prior_url,
            current_url,
        } => (unified_diff, prior_timestamp, prior_url, current_url),
        other => panic!("expected a delta, got {other:?}"),
    };
    assert_eq!(prior_timestamp, days_before(8));
    assert_eq!(
        unified_diff,
        "--- previous-policy\n+++ current-policy\n@@ -1,1 +1,1 @@\n\
         -Section 1: we keep data for 30 days.\n\
         +Section 1: we keep data for 7 days.\n"
    );
    assert!(prior_url
        .as_str()
        .contains(&format_timestamp(&days_before(8))));
    assert_eq!(current_url.as_str(), POLICY_URL);
    assert_eq!(archive.fetched().len(), 1);
}

#[tokio::test]
async fn test_only_recent_captures_is_no_prior_version() {
    let archive = Arc::new(
        FakeArchive::default()
            .with_capture(days_before(3), OLD_TEXT)
            .with_capture(days_before(1), OLD_TEXT),
    );

    let result = detect(&archive, NEW_TEXT).await;

    assert_eq!(result, no_prior(NoPriorReason::NoneOlderThanCutoff));
    assert!(archive.fetched().is_empty());
}

#[tokio::test]
async fn test_empty_archive_is_no_prior_version() {
    let archive = Arc::new(FakeArchive::default());
    assert_eq!(
        detect(&archive, NEW_TEXT).await,
        no_prior(NoPriorReason::NoSnapshots)
    );
}

// ---- Degradation ----

#[tokio::test]
async fn test_listing_failure_degrades() {
    let archive = Arc::new(
        FakeArchive::default()
            .with_capture(days_before(10), OLD_TEXT)
            .with_failing_listing(),
    );
    assert_eq!(
        detect(&archive, NEW_TEXT).await,
        no_prior(NoPriorReason::ArchiveUnavailable)
    );
}

#[tokio::test]
async fn test_unfetchable_capture_degrades() {
    let archive = Arc::new(FakeArchive::default().with_missing_capture(days_before(10)));
    assert_eq!(
        detect(&archive, NEW_TEXT).await,
        no_prior(NoPriorReason::SnapshotUnavailable)
    );
    assert_eq!(archive.fetched().len(), 1);
}

#[tokio::test]
async fn test_identical_text_is_not_a_delta() {
    let archive = Arc::new(FakeArchive::default().with_capture(days_before(10), NEW_TEXT));
    assert_eq!(
        detect(&archive, NEW_TEXT).await,
        no_prior(NoPriorReason::Identical)
    );
}

// ---- Normalization ----

#[tokio::test]
async fn test_archive_markup_is_stripped_before_diffing() {
    let archived = format!(
        "{}{WAYBACK_BEGIN_MARKER}<div>toolbar</div>{WAYBACK_END_MARKER}",
        NEW_TEXT
    );
    let archive = Arc::new(FakeArchive::default().with_capture(days_before(10), &archived));

    assert_eq!(
        detect(&archive, NEW_TEXT).await,
        no_prior(NoPriorReason::Identical)
    );
}

#[tokio::test]
async fn test_markup_is_stripped_from_body_read_byte_by_byte() {
    let archived = format!(
        "Section 1: we keep {WAYBACK_BEGIN_MARKER}<div>toolbar</div>{WAYBACK_END_MARKER}data for 30 days.\n"
    );
    let archive = Arc::new(
        FakeArchive::default()
            .with_capture(days_before(10), &archived)
            .with_trickled_bodies(),
    );

    let ChangeDetectionResult::Delta { unified_diff, .. } = detect(&archive, NEW_TEXT).await else {
        panic!("expected a delta");
    };
    assert!(unified_diff.contains(&format!("-{}", OLD_TEXT)));
    assert!(!unified_diff.contains("toolbar"));
}

#[tokio::test]
async fn test_query_is_stripped_for_listing_and_fetching() {
    let archive = Arc::new(FakeArchive::default().with_capture(days_before(10), OLD_TEXT));
    let tracked = "https://acme.test/privacy?utm_source=newsletter";

    let result = detector(&archive)
        .detect(&url(tracked), &document(tracked, NEW_TEXT), reference())
        .await;

    assert!(result.is_delta());
    assert_eq!(archive.listed(), vec![POLICY_URL.to_string()]);
    let fetched = archive.fetched();
    assert_eq!(fetched.len(), 1);
    assert!(fetched[0].ends_with(&format!("/{POLICY_URL}")));
}

#[tokio::test]
async fn test_custom_grace_period() {
    let archive = Arc::new(FakeArchive::default().with_capture(days_before(3), OLD_TEXT));
    let config = DetectionConfig {
        grace_period_days: 2,
        ..DetectionConfig::default()
    };
    let detector =
        ChangeDetector::new(archive.clone(), Arc::new(PassthroughExtractor), &config).unwrap();

    let result = detector
        .detect(&url(POLICY_URL), &document(POLICY_URL, NEW_TEXT), reference())
        .await;

    assert!(result.is_delta());
}
