//! Wayback Machine client.
//!
//! Lists captures through the CDX search API and fetches a chosen capture
//! from `/web/<timestamp>/<url>`. Credentials, when configured, are sent as
//! an S3-style `LOW access:secret` authorization header.

use crate::collaborators::{SnapshotArchive, SnapshotContent};
use crate::config::ArchiveConfig;
use crate::http_fetch::transport_error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fineprint_core::errors::{ExError, FinePrintError};
use fineprint_core::snapshot::{
    cdx_listing_url, format_timestamp, parse_cdx_listing, snapshot_url, CanonicalUrl, Snapshot,
};
use fineprint_core::{log_op_end, log_op_error, log_op_start};
use fineprint_core_types::Sensitive;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response};
use std::io::Cursor;
use std::time::Instant;
use url::Url;

#[derive(Clone)]
pub struct WaybackClient {
    client: Client,
    base_url: Url,
    listing_limit: i32,
    credentials: Option<(Sensitive<String>, Sensitive<String>)>,
}

impl WaybackClient {
    /// # Errors
    ///
    /// `Config` if `base_url` does not parse.
    pub fn new(client: Client, config: &ArchiveConfig) -> Result<Self, FinePrintError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| FinePrintError::Config {
            reason: format!("archive.base_url: {e}"),
        })?;
        let credentials = (!config.access_key.is_empty() && !config.secret_key.is_empty())
            .then(|| (config.access_key.clone(), config.secret_key.clone()));

        Ok(Self {
            client,
            base_url,
            listing_limit: config.listing_limit,
            credentials,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((access, secret)) => request.header(
                AUTHORIZATION,
                format!("LOW {}:{}", access.expose(), secret.expose()),
            ),
            None => request,
        }
    }

    async fn get_ok(&self, url: &Url) -> Result<Response, FinePrintError> {
        let response = self
            .authorized(self.client.get(url.clone()))
            .send()
            .await
            .map_err(|e| transport_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FinePrintError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl SnapshotArchive for WaybackClient {
    async fn list_snapshots(&self, url: &CanonicalUrl) -> Result<Vec<Snapshot>, ExError> {
        let start = Instant::now();
        log_op_start!("list_snapshots", canonical_url = url.as_str());

        let listing_url = cdx_listing_url(&self.base_url, url, self.listing_limit);
        let result = async {
            let response = self.get_ok(&listing_url).await?;
            let body = response
                .bytes()
                .await
                .map_err(|e| transport_error(&listing_url, &e))?;
            parse_cdx_listing(&body)
        }
        .await;

        let duration_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(snapshots) => {
                log_op_end!(
                    "list_snapshots",
                    duration_ms = duration_ms,
                    snapshot_count = snapshots.len()
                );
                Ok(snapshots)
            }
            Err(err) => {
                let ex_err = ExError::from(err)
                    .with_op("list_snapshots")
                    .with_url(url.as_str());
                log_op_error!("list_snapshots", ex_err.clone(), duration_ms = duration_ms);
                Err(ex_err)
            }
        }
    }

    /// Retrieve one capture
    ///
    /// The body is received in full before this returns: `SnapshotContent`
    /// is drained synchronously by the stripper and extractor on the
    /// caller's task, which must not block on the network. The transfer is
    /// bounded by `http.timeout_secs`; `body_bytes` on the end event records
    /// what was held in memory.
    async fn fetch_snapshot(
        &self,
        url: &CanonicalUrl,
        timestamp: DateTime<Utc>,
    ) -> Result<SnapshotContent, ExError> {
        let start = Instant::now();
        let snapshot_ts = format_timestamp(&timestamp);
        log_op_start!("fetch_snapshot", canonical_url = url.as_str(), snapshot_ts = snapshot_ts.as_str());

        let result = async {
            let target = snapshot_url(&self.base_url, url, &timestamp)?;
            let response = self.get_ok(&target).await?;
            let resolved_url = response.url().clone();
            let body = response
                .bytes()
                .await
                .map_err(|e| transport_error(&target, &e))?;
            let body_bytes = body.len();
            let content = SnapshotContent {
                body: Box::new(Cursor::new(body)),
                resolved_url,
            };
            Ok::<_, FinePrintError>((content, body_bytes))
        }
        .await;

        let duration_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok((content, body_bytes)) => {
                log_op_end!("fetch_snapshot", duration_ms = duration_ms, body_bytes = body_bytes);
                Ok(content)
            }
            Err(err) => {
                let ex_err = ExError::from(err).with_op("fetch_snapshot");
                log_op_error!("fetch_snapshot", ex_err.clone(), duration_ms = duration_ms);
                Err(ex_err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_need_both_keys() {
        let mut config = ArchiveConfig::default();
        config.access_key = Sensitive::new("access".to_string());
        let client = WaybackClient::new(Client::new(), &config).unwrap();
        assert!(client.credentials.is_none());

        config.secret_key = Sensitive::new("secret".to_string());
        let client = WaybackClient::new(Client::new(), &config).unwrap();
        assert!(client.credentials.is_some());
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let config = ArchiveConfig {
            base_url: "not a url".to_string(),
            ..ArchiveConfig::default()
        };
        assert!(matches!(
            WaybackClient::new(Client::new(), &config),
            Err(FinePrintError::Config { .. })
        ));
    }
}
