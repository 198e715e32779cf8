//! Wayback Machine CDX listing format and snapshot addressing.
//!
//! The CDX API answers `output=json` requests with an array of string rows,
//! the first of which names the columns. We request exactly five columns:
//! `timestamp, mimetype, statuscode, digest, length`.

use crate::errors::{FinePrintError, Result};
use crate::snapshot::canonical::CanonicalUrl;
use crate::snapshot::model::Snapshot;
use crate::snapshot::timestamp::{format_timestamp, parse_timestamp};
use chrono::{DateTime, Utc};
use url::Url;

const FIELDS: &str = "timestamp,mimetype,statuscode,digest,length";
const FIELD_COUNT: usize = 5;
const PLACEHOLDER: &str = "-";

/// Decode a CDX JSON listing
///
/// The header row is skipped, as is any row with fewer than five fields. An
/// empty body means the archive has no captures.
///
/// # Errors
///
/// - `MalformedTimestamp` if any row has an unparseable timestamp; the whole
///   listing is rejected rather than silently losing that row.
/// - `MalformedListing` if the body is not an array of string arrays, or a
///   status/length column is neither numeric nor `-`.
pub fn parse_cdx_listing(body: &[u8]) -> Result<Vec<Snapshot>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let rows: Vec<Vec<String>> =
        serde_json::from_slice(body).map_err(|e| FinePrintError::MalformedListing {
            reason: e.to_string(),
        })?;

    rows.into_iter()
        .skip(1)
        .filter(|row| row.len() >= FIELD_COUNT)
        .map(|row| parse_row(&row))
        .collect()
}

fn parse_row(row: &[String]) -> Result<Snapshot> {
    Ok(Snapshot {
        timestamp: parse_timestamp(&row[0])?,
        mime_type: row[1].clone(),
        status_code: parse_optional(&row[2], "statuscode")?,
        digest: row[3].clone(),
        length: parse_optional(&row[4], "length")?,
    })
}

fn parse_optional<T: std::str::FromStr>(value: &str, column: &str) -> Result<Option<T>> {
    if value == PLACEHOLDER {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| FinePrintError::MalformedListing {
            reason: format!("{column} {value:?} is not numeric"),
        })
}

/// Listing request URL for `canonical` under the archive `base`
///
/// A negative `limit` asks for the most recent `|limit|` captures.
pub fn cdx_listing_url(base: &Url, canonical: &CanonicalUrl, limit: i32) -> Url {
    let mut url = base.clone();
    url.set_path("/cdx/search/cdx");
    url.query_pairs_mut()
        .clear()
        .append_pair("url", canonical.as_str())
        .append_pair("fl", FIELDS)
        .append_pair("output", "json")
        .append_pair("fastLatest", "true")
        .append_pair("limit", &limit.to_string());
    url
}

/// Address of the capture of `canonical` taken at `timestamp`
///
/// # Errors
///
/// `InvalidUrl` if the joined path does not form a valid URL.
pub fn snapshot_url(base: &Url, canonical: &CanonicalUrl, timestamp: &DateTime<Utc>) -> Result<Url> {
    let path = format!("/web/{}/{}", format_timestamp(timestamp), canonical);
    base.join(&path).map_err(|e| FinePrintError::InvalidUrl {
        url: path,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const HEADER: &str = r#"["timestamp","mimetype","statuscode","digest","length"]"#;

    #[test]
    fn test_parses_rows_after_header() {
        let body = format!(
            r#"[{HEADER},["20240101120000","text/html","200","ABC","1234"],["20240201120000","text/html","-","DEF","-"]]"#
        );
        let snapshots = parse_cdx_listing(body.as_bytes()).unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].status_code, Some(200));
        assert_eq!(snapshots[0].length, Some(1234));
        assert_eq!(snapshots[1].status_code, None);
        assert_eq!(snapshots[1].length, None);
        assert_eq!(snapshots[1].digest, "DEF");
    }

    #[test]
    fn test_short_rows_skipped() {
        let body = format!(r#"[{HEADER},["20240101120000","text/html"]]"#);
        assert!(parse_cdx_listing(body.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_empty_body_means_no_captures() {
        assert!(parse_cdx_listing(b"").unwrap().is_empty());
        assert!(parse_cdx_listing(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_bad_timestamp_aborts_listing() {
        let body = format!(
            r#"[{HEADER},["20240101120000","text/html","200","A","1"],["2024-01-01","text/html","200","B","1"]]"#
        );
        assert!(matches!(
            parse_cdx_listing(body.as_bytes()),
            Err(FinePrintError::MalformedTimestamp { .. })
        ));
    }

    #[test]
    fn test_non_numeric_status_rejected() {
        let body = format!(r#"[{HEADER},["20240101120000","text/html","ok","A","1"]]"#);
        assert!(matches!(
            parse_cdx_listing(body.as_bytes()),
            Err(FinePrintError::MalformedListing { .. })
        ));
    }

    #[test]
    fn test_not_json_rejected() {
        assert!(matches!(
            parse_cdx_listing(b"<html>busy</html>"),
            Err(FinePrintError::MalformedListing { .. })
        ));
    }

    #[test]
    fn test_urls() {
        let base = Url::parse("https://web.archive.org").unwrap();
        let canonical = CanonicalUrl::parse("https://example.com/privacy?utm=1").unwrap();

        let listing = cdx_listing_url(&base, &canonical, -10);
        assert_eq!(listing.path(), "/cdx/search/cdx");
        let pairs: Vec<(String, String)> = listing.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("url".into(), "https://example.com/privacy".into())));
        assert!(pairs.contains(&("limit".into(), "-10".into())));
        assert!(pairs.contains(&("output".into(), "json".into())));

        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let snapshot = snapshot_url(&base, &canonical, &ts).unwrap();
        assert_eq!(
            snapshot.as_str(),
            "https://web.archive.org/web/20240102030405/https://example.com/privacy"
        );
    }
}
