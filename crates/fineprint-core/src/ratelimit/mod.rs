//! Keyed sliding-window admission control.
//!
//! One [`SlidingWindowLimiter`] is created at startup and shared (behind an
//! `Arc`) by everything that serves inbound notices. Each key carries its
//! own `(limit, window)` pair supplied on every call, so per-user and global
//! budgets live side by side in one limiter:
//!
//! ```
//! use std::time::Duration;
//! use fineprint_core::ratelimit::{global_key, user_key, SlidingWindowLimiter};
//!
//! let limiter = SlidingWindowLimiter::new();
//! let hour = Duration::from_secs(3600);
//! assert!(limiter.is_allowed(&user_key("Jo.Doe+news@gmail.com"), 5, hour));
//! assert!(limiter.is_allowed(&global_key("detection"), 1000, hour));
//! assert_eq!(limiter.current_count("user:jodoe@gmail.com", hour), 1);
//! ```
//!
//! Correctness never depends on the background sweep; it only bounds
//! memory by dropping buckets that have emptied out.

pub mod clock;
pub mod email;
pub mod limiter;
pub mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use email::{global_key, normalize_email, user_key};
pub use limiter::SlidingWindowLimiter;
pub use sweeper::{SweeperHandle, DEFAULT_SWEEP_INTERVAL};
