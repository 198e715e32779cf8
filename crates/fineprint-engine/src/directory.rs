//! HTTP client for a ToS;DR-style policy directory.
//!
//! A lookup is two requests: a search by company name, whose first hit is
//! taken, then the service record with its document list.

use crate::http_fetch::transport_error;
use crate::resolve::{DirectoryDocument, PolicyDirectory, ServiceMetadata};
use async_trait::async_trait;
use fineprint_core::errors::{ExError, FinePrintError};
use fineprint_core::{log_op_end, log_op_error, log_op_start};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Instant;
use url::Url;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    services: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    rating: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceRecord {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    rating: Option<String>,
    #[serde(default)]
    documents: Vec<DocumentRecord>,
}

#[derive(Debug, Deserialize)]
struct DocumentRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
}

impl From<ServiceRecord> for ServiceMetadata {
    fn from(record: ServiceRecord) -> Self {
        ServiceMetadata {
            id: record.id,
            name: record.name,
            rating: record.rating.filter(|r| !r.is_empty()),
            documents: record
                .documents
                .into_iter()
                .map(|d| DirectoryDocument {
                    name: d.name,
                    url: d.url,
                })
                .collect(),
        }
    }
}

#[derive(Clone)]
pub struct HttpPolicyDirectory {
    client: Client,
    base_url: Url,
}

impl HttpPolicyDirectory {
    /// # Errors
    ///
    /// `Config` if `base_url` does not parse.
    pub fn new(client: Client, base_url: &str) -> Result<Self, FinePrintError> {
        let base_url = Url::parse(base_url).map_err(|e| FinePrintError::Config {
            reason: format!("directory.base_url: {e}"),
        })?;
        Ok(Self { client, base_url })
    }

    fn search_url(&self, company: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path("/search/v5/");
        url.query_pairs_mut().clear().append_pair("query", company);
        url
    }

    fn service_url(&self, id: u64) -> Url {
        let mut url = self.base_url.clone();
        url.set_path("/service/v3/");
        url.query_pairs_mut()
            .clear()
            .append_pair("id", &id.to_string());
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FinePrintError> {
        let response = self
            .client
            .get(url.clone())
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
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(url, &e))?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl PolicyDirectory for HttpPolicyDirectory {
    async fn find_service(&self, company: &str) -> Result<Option<ServiceMetadata>, ExError> {
        let start = Instant::now();
        log_op_start!("find_service", company = company);

        let result = async {
            let search: SearchResponse = self.get_json(&self.search_url(company)).await?;
            let Some(hit) = search.services.first() else {
                return Ok(None);
            };
            tracing::debug!(
                company,
                hits = search.services.len(),
                service_id = hit.id,
                service = hit.name.as_str(),
                rating = hit.rating.as_deref().unwrap_or("-"),
                "directory search"
            );
            let record: ServiceRecord = self.get_json(&self.service_url(hit.id)).await?;
            Ok::<_, FinePrintError>(Some(ServiceMetadata::from(record)))
        }
        .await;

        let duration_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(found) => {
                log_op_end!("find_service", duration_ms = duration_ms, found = found.is_some());
                Ok(found)
            }
            Err(err) => {
                let ex_err = ExError::from(err).with_op("find_service");
                log_op_error!("find_service", ex_err.clone(), duration_ms = duration_ms);
                Err(ex_err)
            }
        }
    }
}
