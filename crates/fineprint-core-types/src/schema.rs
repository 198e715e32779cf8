//! Field keys and event names of structured log events
//!
//! The logging macros and call sites spell these keys as tracing field
//! identifiers; readers of captured events (the test capture layer and log
//! assertions) look them up through these constants.

// Emitted on every operation event
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Correlation and subject keys
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_URL: &str = "url";
pub const FIELD_LIMIT_KEY: &str = "limit_key";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
