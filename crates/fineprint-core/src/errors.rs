use fineprint_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using FinePrintError
pub type Result<T> = std::result::Result<T, FinePrintError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Stable classification of every failure the pipeline can surface. Each
/// kind maps to a stable code used in logs and in test assertions.
///
/// "No prior snapshot" is deliberately absent: it is a selection outcome,
/// not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// Caller broke a contract (edits inconsistent with text, empty marker)
    InvalidInput,
    /// A unified diff could not be parsed or did not apply
    MalformedPatch,

    // Archive listing
    /// A listed capture carried an unparseable timestamp
    MalformedTimestamp,
    /// The listing body was not the expected shape
    MalformedListing,

    // Collaborators
    /// A document or snapshot fetch failed
    FetchFailure,
    /// A URL could not be parsed or is not http(s)
    InvalidUrl,
    /// An upstream service answered with something unusable
    ExternalService,

    // Startup
    InvalidConfig,

    // Integration/IO
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::MalformedPatch => "ERR_MALFORMED_PATCH",
            ExErrorKind::MalformedTimestamp => "ERR_MALFORMED_TIMESTAMP",
            ExErrorKind::MalformedListing => "ERR_MALFORMED_LISTING",
            ExErrorKind::FetchFailure => "ERR_FETCH_FAILURE",
            ExErrorKind::InvalidUrl => "ERR_INVALID_URL",
            ExErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a kind for programmatic handling plus optional context (the
/// operation, the URL or limiter key involved, correlation ids).
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    url: Option<String>,
    key: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            url: None,
            key: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add the URL being fetched or listed
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Add a limiter or lookup key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(url) = &self.url {
            write!(f, " (url: {})", url)?;
        }
        if let Some(key) = &self.key {
            write!(f, " (key: {})", key)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        if let Some(source) = &self.source {
            write!(f, " caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Concrete failures raised by the core components and collaborators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FinePrintError {
    // ===== Contract violations =====
    /// Edit script does not replay onto the supplied texts
    #[error("Edit script is inconsistent with the input text: {reason}")]
    InconsistentEdits { reason: String },

    /// A strip marker must contain at least one byte
    #[error("Strip marker `{which}` must not be empty")]
    EmptyMarker { which: &'static str },

    /// A unified diff could not be applied
    #[error("Malformed unified diff at line {line}: {reason}")]
    MalformedPatch { line: usize, reason: String },

    // ===== Archive listing =====
    /// A capture timestamp is not a 14-digit UTC date-time
    #[error("Malformed snapshot timestamp {value:?}: {reason}")]
    MalformedTimestamp { value: String, reason: String },

    /// The listing is not in the expected row format
    #[error("Malformed snapshot listing: {reason}")]
    MalformedListing { reason: String },

    // ===== Collaborators =====
    #[error("Invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Request to {url} failed with status {status}")]
    UnexpectedStatus { url: String, status: u16 },

    // ===== Integration =====
    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl From<FinePrintError> for ExError {
    fn from(err: FinePrintError) -> Self {
        let message = err.to_string();
        match err {
            FinePrintError::InconsistentEdits { .. } => ExError::new(ExErrorKind::InvalidInput)
                .with_op("to_unified")
                .with_message(message),

            FinePrintError::EmptyMarker { .. } => ExError::new(ExErrorKind::InvalidInput)
                .with_op("markup_stripper")
                .with_message(message),

            FinePrintError::MalformedPatch { .. } => {
                ExError::new(ExErrorKind::MalformedPatch).with_message(message)
            }

            FinePrintError::MalformedTimestamp { .. } => {
                ExError::new(ExErrorKind::MalformedTimestamp)
                    .with_op("list_snapshots")
                    .with_message(message)
            }

            FinePrintError::MalformedListing { .. } => ExError::new(ExErrorKind::MalformedListing)
                .with_op("list_snapshots")
                .with_message(message),

            FinePrintError::InvalidUrl { url, .. } => ExError::new(ExErrorKind::InvalidUrl)
                .with_url(url)
                .with_message(message),

            FinePrintError::Fetch { url, .. } => ExError::new(ExErrorKind::FetchFailure)
                .with_url(url)
                .with_message(message),

            FinePrintError::UnexpectedStatus { url, .. } => {
                ExError::new(ExErrorKind::FetchFailure)
                    .with_url(url)
                    .with_message(message)
            }

            FinePrintError::Io { .. } => ExError::new(ExErrorKind::Io).with_message(message),

            FinePrintError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            FinePrintError::Config { .. } => {
                ExError::new(ExErrorKind::InvalidConfig).with_message(message)
            }
        }
    }
}

impl From<std::io::Error> for FinePrintError {
    fn from(err: std::io::Error) -> Self {
        FinePrintError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FinePrintError {
    fn from(err: serde_json::Error) -> Self {
        FinePrintError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_are_unique() {
        let kinds = [
            ExErrorKind::InvalidInput,
            ExErrorKind::MalformedPatch,
            ExErrorKind::MalformedTimestamp,
            ExErrorKind::MalformedListing,
            ExErrorKind::FetchFailure,
            ExErrorKind::InvalidUrl,
            ExErrorKind::ExternalService,
            ExErrorKind::InvalidConfig,
            ExErrorKind::Io,
            ExErrorKind::Serialization,
            ExErrorKind::Internal,
        ];
        let mut codes: Vec<_> = kinds.iter().map(|k| k.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_display_includes_context() {
        let err = ExError::new(ExErrorKind::FetchFailure)
            .with_op("fetch_document")
            .with_url("https://example.com/terms")
            .with_message("connection reset");
        let rendered = err.to_string();
        assert!(rendered.starts_with("[ERR_FETCH_FAILURE]"));
        assert!(rendered.contains("fetch_document"));
        assert!(rendered.contains("https://example.com/terms"));
        assert!(rendered.contains("connection reset"));
    }

    #[test]
    fn test_source_chain_is_exposed() {
        use std::error::Error as _;

        let inner = ExError::new(ExErrorKind::Io).with_message("broken pipe");
        let outer = ExError::new(ExErrorKind::FetchFailure).with_source(inner);
        assert!(outer.source().is_some());
        assert_eq!(
            outer.source_error().map(|e| e.kind()),
            Some(ExErrorKind::Io)
        );
    }
}
