//! fineprint engine - change detection wired to live collaborators
//!
//! `fineprint-core` holds the pure algorithms. This crate puts them behind
//! the services a deployment talks to and sequences a notice through them:
//!
//! - [`collaborators`]: the narrow traits for document fetching, the
//!   snapshot archive, and text extraction
//! - [`http_fetch`], [`wayback`], [`directory`]: reqwest implementations
//! - [`resolve`]: ordered URL strategies with the metadata side channel
//! - [`detect`]: prior-capture selection, stripping, and diffing
//! - [`pipeline`]: admission control and the end-to-end run per notice
//! - [`config`]: layered configuration

pub mod collaborators;
pub mod config;
pub mod detect;
pub mod directory;
pub mod email_date;
pub mod http_fetch;
pub mod pipeline;
pub mod resolve;
pub mod wayback;

pub use collaborators::{
    DocumentFetcher, FetchedDocument, PassthroughExtractor, SnapshotArchive, SnapshotContent,
    TextExtractor,
};
pub use config::{ConfigLoader, FinePrintConfig};
pub use detect::{ChangeDetectionResult, ChangeDetector, NoPriorReason};
pub use pipeline::{ChangePipeline, ChangeReport, InboundNotice, PipelineOutcome};
pub use resolve::{Classification, PolicyResolver, PolicyType, ServiceMetadata};
