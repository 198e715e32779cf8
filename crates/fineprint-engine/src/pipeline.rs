//! Per-notice processing.
//!
//! One [`ChangePipeline`] is built at startup and shared by every request
//! handler. It owns the rate limiter; whoever owns the pipeline also owns the
//! limiter's sweep task (see [`ChangePipeline::spawn_sweeper`]).
//!
//! ## Steps
//!
//! 1. Admission: the sender's `user:` budget, then the shared
//!    `global:detection` budget. The first denial ends the run.
//! 2. Resolve the policy URL and fetch the current document.
//! 3. Reference time from the notice's `Date` header.
//! 4. Change detection against the archive.
//! 5. Analysis input: the diff when there is one, the current text otherwise,
//!    capped at the configured size.

use crate::collaborators::{PassthroughExtractor, TextExtractor};
use crate::config::{FinePrintConfig, LimitsConfig};
use crate::detect::{ChangeDetectionResult, ChangeDetector};
use crate::directory::HttpPolicyDirectory;
use crate::email_date::reference_time;
use crate::http_fetch::{build_client, HttpDocumentFetcher};
use crate::resolve::{
    Classification, ClassificationUrlStrategy, DirectoryStrategy, PolicyResolver, ServiceMetadata,
};
use crate::wayback::WaybackClient;
use chrono::{DateTime, Utc};
use fineprint_core::errors::FinePrintError;
use fineprint_core::ratelimit::{global_key, user_key, SlidingWindowLimiter, SweeperHandle};
use fineprint_core::truncate::{truncate_for_analysis, AnalysisInput};
use fineprint_core::{log_op_end, log_op_start};
use fineprint_core_types::{RequestContext, RequestId};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Name of the limiter budget shared by all senders
pub const GLOBAL_DETECTION: &str = "detection";

/// A classified notice, as handed over by the inbound transport
#[derive(Debug, Clone)]
pub struct InboundNotice {
    pub sender: String,
    pub subject: String,
    /// Raw `Date` header
    pub date: String,
    pub classification: Classification,
    pub context: RequestContext,
}

/// Everything downstream reporting needs about one notice
#[derive(Debug, Clone, Serialize)]
pub struct ChangeReport {
    pub request_id: RequestId,
    pub company: String,
    pub policy_url: Url,
    /// Strategy that supplied `policy_url`
    pub strategy: String,
    pub metadata: Option<ServiceMetadata>,
    pub reference_time: DateTime<Utc>,
    pub detection: ChangeDetectionResult,
    pub analysis: AnalysisInput,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// A limiter budget was exhausted; `key` names it
    Throttled { key: String },
    /// No strategy produced a fetchable policy URL
    NoPolicyDocument,
    Report(Box<ChangeReport>),
}

pub struct ChangePipeline {
    limiter: Arc<SlidingWindowLimiter>,
    resolver: PolicyResolver,
    detector: ChangeDetector,
    limits: LimitsConfig,
    max_input_bytes: usize,
}

impl ChangePipeline {
    pub fn new(
        limiter: Arc<SlidingWindowLimiter>,
        resolver: PolicyResolver,
        detector: ChangeDetector,
        limits: LimitsConfig,
        max_input_bytes: usize,
    ) -> Self {
        Self {
            limiter,
            resolver,
            detector,
            limits,
            max_input_bytes,
        }
    }

    /// Wire the HTTP collaborators described by `config`
    ///
    /// # Errors
    ///
    /// `Config` if a base URL is invalid or the HTTP client cannot be built;
    /// `EmptyMarker` if a strip marker is empty.
    pub fn from_config(
        config: &FinePrintConfig,
        limiter: Arc<SlidingWindowLimiter>,
    ) -> Result<Self, FinePrintError> {
        let client = build_client(&config.http)?;
        let extractor: Arc<dyn TextExtractor> = Arc::new(PassthroughExtractor);

        let fetcher = Arc::new(HttpDocumentFetcher::new(client.clone(), Arc::clone(&extractor)));
        let mut resolver = PolicyResolver::new(fetcher).with_strategy(ClassificationUrlStrategy);
        if config.directory.enabled {
            let directory = HttpPolicyDirectory::new(client.clone(), &config.directory.base_url)?;
            resolver = resolver.with_strategy(DirectoryStrategy::new(directory));
        }

        let archive = Arc::new(WaybackClient::new(client, &config.archive)?);
        let detector = ChangeDetector::new(archive, extractor, &config.detection)?;

        Ok(Self::new(
            limiter,
            resolver,
            detector,
            config.limits.clone(),
            config.analysis.max_input_bytes,
        ))
    }

    pub fn limiter(&self) -> &Arc<SlidingWindowLimiter> {
        &self.limiter
    }

    /// Start the limiter's background sweep at the configured interval
    pub fn spawn_sweeper(&self) -> SweeperHandle {
        self.limiter.spawn_sweeper(self.limits.sweep_interval())
    }

    pub async fn process(&self, notice: &InboundNotice) -> PipelineOutcome {
        let start = Instant::now();
        let request_id = notice.context.request_id.as_str();
        log_op_start!("process_notice", request_id = request_id);

        let outcome = self.run(notice).await;

        let outcome_name = match &outcome {
            PipelineOutcome::Throttled { .. } => "throttled",
            PipelineOutcome::NoPolicyDocument => "no_policy_document",
            PipelineOutcome::Report(_) => "report",
        };
        log_op_end!(
            "process_notice",
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = request_id,
            outcome = outcome_name
        );
        outcome
    }

    async fn run(&self, notice: &InboundNotice) -> PipelineOutcome {
        if let Some(key) = self.admit(&notice.sender) {
            tracing::info!(
                request_id = notice.context.request_id.as_str(),
                limit_key = key.as_str(),
                "notice throttled"
            );
            return PipelineOutcome::Throttled { key };
        }

        let classification = &notice.classification;
        let Some(resolved) = self.resolver.resolve(classification).await else {
            tracing::info!(
                request_id = notice.context.request_id.as_str(),
                company = classification.company.as_str(),
                policy_type = classification.policy_type.as_str(),
                "no policy document found"
            );
            return PipelineOutcome::NoPolicyDocument;
        };

        let reference = reference_time(&notice.date);
        let detection = self
            .detector
            .detect(&resolved.url, &resolved.document, reference)
            .await;

        let analysis_source = match &detection {
            ChangeDetectionResult::Delta { unified_diff, .. } => unified_diff.as_str(),
            ChangeDetectionResult::NoPriorVersion { current, .. } => current.as_str(),
        };
        let analysis = truncate_for_analysis(analysis_source, self.max_input_bytes);
        if analysis.truncated {
            tracing::info!(
                request_id = notice.context.request_id.as_str(),
                original_len = analysis.original_len,
                kept = analysis.text.len(),
                "analysis input truncated"
            );
        }

        PipelineOutcome::Report(Box::new(ChangeReport {
            request_id: notice.context.request_id.clone(),
            company: classification.company.clone(),
            policy_url: resolved.url,
            strategy: resolved.strategy,
            metadata: resolved.metadata,
            reference_time: reference,
            detection,
            analysis,
        }))
    }

    /// The key of the first exhausted budget, if any
    ///
    /// A sender denied by its own budget does not consume global budget.
    fn admit(&self, sender: &str) -> Option<String> {
        let user = user_key(sender);
        let budget = self.limits.per_user;
        if !self.limiter.is_allowed(&user, budget.limit, budget.window()) {
            return Some(user);
        }

        let global = global_key(GLOBAL_DETECTION);
        let budget = self.limits.global;
        if !self.limiter.is_allowed(&global, budget.limit, budget.window()) {
            return Some(global);
        }
        None
    }
}
