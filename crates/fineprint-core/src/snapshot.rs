//! Archived captures of a policy URL and prior-version selection.
//!
//! ## Pipeline
//!
//! 1. Normalize the document URL once into a [`CanonicalUrl`]
//! 2. List captures for it ([`parse_cdx_listing`] decodes the archive reply)
//! 3. [`select_prior_snapshot`] picks the newest capture older than the
//!    reference time minus the grace period
//! 4. Fetch that capture by [`snapshot_url`]

pub mod canonical;
pub mod listing;
pub mod model;
pub mod select;
pub mod timestamp;

pub use canonical::CanonicalUrl;
pub use listing::{cdx_listing_url, parse_cdx_listing, snapshot_url};
pub use model::Snapshot;
pub use select::{
    default_grace_period, grace_period_days, select_prior_snapshot, PriorSnapshot,
    DEFAULT_GRACE_DAYS, MAX_GRACE_DAYS,
};
pub use timestamp::{format_timestamp, parse_timestamp};
