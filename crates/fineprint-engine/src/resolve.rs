//! Choosing the policy URL for a notice.
//!
//! ## Resolution rules
//!
//! Strategies are evaluated in order and every one of them runs:
//!
//! 1. **Short-circuit**: the first strategy whose proposal is non-empty after
//!    trimming, parses as an absolute http(s) URL, and can be fetched wins.
//!    Later strategies never replace the winner.
//! 2. **Metadata merge**: any strategy may also return [`ServiceMetadata`]
//!    from a policy directory. The last non-empty metadata returned by any
//!    strategy is attached to the winner, even when a different strategy
//!    supplied the URL.
//!
//! Rule 2 is why strategies keep running after a winner is found.

use crate::collaborators::{DocumentFetcher, FetchedDocument};
use async_trait::async_trait;
use fineprint_core::errors::ExError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

/// Kind of document a notice refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    PrivacyPolicy,
    TermsOfService,
    UserAgreement,
    Other,
}

impl PolicyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyType::PrivacyPolicy => "privacy_policy",
            PolicyType::TermsOfService => "terms_of_service",
            PolicyType::UserAgreement => "user_agreement",
            PolicyType::Other => "other",
        }
    }

    /// Whether a lowercased directory document name fits this type
    fn matches(&self, name: &str) -> bool {
        match self {
            PolicyType::PrivacyPolicy => name.contains("privacy") || name.contains("data"),
            PolicyType::TermsOfService => name.contains("terms") || name.contains("service"),
            PolicyType::UserAgreement => name.contains("user") || name.contains("agreement"),
            PolicyType::Other => true,
        }
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "privacy_policy" | "privacy" => Ok(PolicyType::PrivacyPolicy),
            "terms_of_service" | "terms" => Ok(PolicyType::TermsOfService),
            "user_agreement" => Ok(PolicyType::UserAgreement),
            "other" => Ok(PolicyType::Other),
            other => Err(format!("unknown policy type `{other}`")),
        }
    }
}

/// What the upstream classifier concluded about a notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub company: String,
    pub policy_type: PolicyType,
    /// URL mentioned in the notice, if the classifier found one
    pub policy_url: Option<String>,
}

/// One document listed for a service in the policy directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryDocument {
    pub name: String,
    pub url: String,
}

/// A policy-directory entry for a company's service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    pub id: u64,
    pub name: String,
    /// Letter grade, when the directory has one
    pub rating: Option<String>,
    #[serde(default)]
    pub documents: Vec<DirectoryDocument>,
}

/// Looks companies up in a policy directory
#[async_trait]
pub trait PolicyDirectory: Send + Sync {
    /// Best matching service for `company`, if any
    async fn find_service(&self, company: &str) -> Result<Option<ServiceMetadata>, ExError>;
}

/// What a strategy offers: maybe a URL, maybe directory metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyProposal {
    pub url: Option<String>,
    pub metadata: Option<ServiceMetadata>,
}

#[async_trait]
pub trait UrlStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Propose a URL and/or metadata; failures are logged and yield nothing
    async fn propose(&self, classification: &Classification) -> StrategyProposal;
}

/// Uses the URL the classifier extracted from the notice
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassificationUrlStrategy;

#[async_trait]
impl UrlStrategy for ClassificationUrlStrategy {
    fn name(&self) -> &str {
        "classification"
    }

    async fn propose(&self, classification: &Classification) -> StrategyProposal {
        StrategyProposal {
            url: classification.policy_url.clone(),
            metadata: None,
        }
    }
}

/// Looks the company up in a [`PolicyDirectory`] and picks a document by type
pub struct DirectoryStrategy<D> {
    directory: D,
}

impl<D: PolicyDirectory> DirectoryStrategy<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl<D: PolicyDirectory> UrlStrategy for DirectoryStrategy<D> {
    fn name(&self) -> &str {
        "policy_directory"
    }

    async fn propose(&self, classification: &Classification) -> StrategyProposal {
        let company = classification.company.trim();
        if company.is_empty() {
            return StrategyProposal::default();
        }

        match self.directory.find_service(company).await {
            Ok(Some(service)) => StrategyProposal {
                url: match_document(&service.documents, classification.policy_type)
                    .map(|doc| doc.url.clone()),
                metadata: Some(service),
            },
            Ok(None) => {
                tracing::debug!(company, "no directory entry");
                StrategyProposal::default()
            }
            Err(err) => {
                tracing::warn!(company, error = %err, "policy directory lookup failed");
                StrategyProposal::default()
            }
        }
    }
}

/// First document whose lowercased name fits `policy_type`, else the first
/// document listed
pub fn match_document(
    documents: &[DirectoryDocument],
    policy_type: PolicyType,
) -> Option<&DirectoryDocument> {
    documents
        .iter()
        .find(|doc| policy_type.matches(&doc.name.to_lowercase()))
        .or_else(|| documents.first())
}

/// A winning URL with its fetched document
#[derive(Debug, Clone)]
pub struct ResolvedPolicy {
    pub url: Url,
    pub document: FetchedDocument,
    pub metadata: Option<ServiceMetadata>,
    /// Name of the strategy that supplied `url`
    pub strategy: String,
}

/// Runs the strategy list against a document fetcher
pub struct PolicyResolver {
    strategies: Vec<Box<dyn UrlStrategy>>,
    fetcher: Arc<dyn DocumentFetcher>,
}

impl PolicyResolver {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self {
            strategies: Vec::new(),
            fetcher,
        }
    }

    /// Append a strategy; order of calls is evaluation order
    pub fn with_strategy(mut self, strategy: impl UrlStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Apply the resolution rules; `None` when no strategy yields a
    /// fetchable URL
    pub async fn resolve(&self, classification: &Classification) -> Option<ResolvedPolicy> {
        let mut winner: Option<ResolvedPolicy> = None;
        let mut metadata: Option<ServiceMetadata> = None;

        for strategy in &self.strategies {
            let name = strategy.name();
            let proposal = strategy.propose(classification).await;

            if proposal.metadata.is_some() {
                metadata = proposal.metadata;
            }
            if winner.is_some() {
                continue;
            }

            let Some(raw) = proposal.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
                tracing::debug!(strategy = name, "strategy proposed no URL");
                continue;
            };
            let url = match parse_http_url(raw) {
                Some(url) => url,
                None => {
                    tracing::info!(strategy = name, url = raw, "strategy proposed an invalid URL");
                    continue;
                }
            };
            match self.fetcher.fetch_document(&url).await {
                Ok(document) => {
                    tracing::info!(strategy = name, url = url.as_str(), "policy URL resolved");
                    winner = Some(ResolvedPolicy {
                        url,
                        document,
                        metadata: None,
                        strategy: name.to_string(),
                    });
                }
                Err(err) => {
                    tracing::info!(strategy = name, url = url.as_str(), error = %err, "proposed URL could not be fetched");
                }
            }
        }

        winner.map(|mut resolved| {
            resolved.metadata = metadata;
            resolved
        })
    }
}

fn parse_http_url(raw: &str) -> Option<Url> {
    Url::parse(raw)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
}
