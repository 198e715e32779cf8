//! fineprint core - change detection for legal-policy documents
//!
//! This crate holds the parts of the pipeline with real algorithmic content:
//! - Myers shortest-edit-script diffing and unified-diff rendering ([`diff`])
//! - Streaming removal of injected archive markup ([`strip`])
//! - Prior-snapshot selection relative to a cutoff ([`snapshot`])
//! - Keyed sliding-window admission control ([`ratelimit`])
//! - Size-bounded analysis input ([`truncate`])
//!
//! Everything here is free of network I/O; collaborators live in
//! `fineprint-engine`.

pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod ratelimit;
pub mod snapshot;
pub mod strip;
pub mod truncate;

// Re-export commonly used types
pub use diff::{compute_edits, diff_strings, to_unified, unified_diff, Edit};
pub use errors::{ExError, ExErrorKind, FinePrintError, Result};
pub use ratelimit::{SlidingWindowLimiter, SweeperHandle};
pub use snapshot::{select_prior_snapshot, CanonicalUrl, PriorSnapshot, Snapshot};
pub use strip::MarkupStripper;
pub use truncate::{truncate_for_analysis, AnalysisInput};
