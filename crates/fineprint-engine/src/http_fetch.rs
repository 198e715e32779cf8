//! HTTP retrieval of live policy documents.

use crate::collaborators::{DocumentFetcher, FetchedDocument, TextExtractor};
use crate::config::HttpConfig;
use async_trait::async_trait;
use fineprint_core::errors::{ExError, FinePrintError};
use fineprint_core::{log_op_end, log_op_error, log_op_start};
use reqwest::Client;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Build the shared client used by every HTTP collaborator
///
/// # Errors
///
/// `Config` if the TLS backend cannot be initialized.
pub fn build_client(config: &HttpConfig) -> Result<Client, FinePrintError> {
    Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| FinePrintError::Config {
            reason: format!("cannot build HTTP client: {e}"),
        })
}

/// Map a transport error for `url` into the fetch failure it represents
pub(crate) fn transport_error(url: &Url, err: &reqwest::Error) -> FinePrintError {
    FinePrintError::Fetch {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

/// GETs a document and runs it through a [`TextExtractor`]
#[derive(Clone)]
pub struct HttpDocumentFetcher {
    client: Client,
    extractor: Arc<dyn TextExtractor>,
}

impl HttpDocumentFetcher {
    pub fn new(client: Client, extractor: Arc<dyn TextExtractor>) -> Self {
        Self { client, extractor }
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch_document(&self, url: &Url) -> Result<FetchedDocument, ExError> {
        let start = Instant::now();
        log_op_start!("fetch_document", url = url.as_str());

        let result = async {
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
                }
                .into());
            }

            let final_url = response.url().clone();
            let body = response
                .bytes()
                .await
                .map_err(|e| transport_error(url, &e))?;
            let text = self.extractor.extract_text(&mut body.as_ref())?;
            Ok::<_, ExError>(FetchedDocument { text, final_url })
        }
        .await;

        let duration_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(document) => {
                log_op_end!("fetch_document", duration_ms = duration_ms, bytes = document.text.len());
                Ok(document)
            }
            Err(err) => {
                log_op_error!("fetch_document", err.clone(), duration_ms = duration_ms);
                Err(err)
            }
        }
    }
}
