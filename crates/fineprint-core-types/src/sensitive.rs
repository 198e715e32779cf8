//! Redaction wrapper for credentials
//!
//! Archive keys and API tokens are loaded from configuration into
//! `Sensitive<String>` so that dumping the config at debug level never
//! leaks them.

use serde::{Deserialize, Deserializer};
use std::fmt;

/// Wrapper whose Debug and Display output is always redacted
///
/// ```
/// use fineprint_core_types::Sensitive;
///
/// let key = Sensitive::new("archive-secret".to_string());
/// assert_eq!(format!("{:?}", key), "***REDACTED***");
/// assert_eq!(key.expose(), "archive-secret");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Access the wrapped value. Only call this at the point of use
    /// (building an auth header), never to log it.
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl Sensitive<String> {
    /// True when no credential was configured
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***REDACTED***")
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***REDACTED***")
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sensitive<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Sensitive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_are_redacted() {
        let secret = Sensitive::new("api-key-12345".to_string());
        assert_eq!(format!("{:?}", secret), "***REDACTED***");
        assert_eq!(format!("{}", secret), "***REDACTED***");
    }

    #[test]
    fn test_redacted_inside_struct_debug() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct ArchiveCredentials {
            access_key: String,
            secret_key: Sensitive<String>,
        }

        let creds = ArchiveCredentials {
            access_key: "public-id".to_string(),
            secret_key: Sensitive::new("hunter2".to_string()),
        };
        let debug_str = format!("{:?}", creds);
        assert!(debug_str.contains("public-id"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_deserializes_transparently() {
        let secret: Sensitive<String> = serde_json::from_str("\"s3cr3t\"").unwrap();
        assert_eq!(secret.expose(), "s3cr3t");
        assert!(!secret.is_empty());
    }

    #[test]
    fn test_default_is_empty() {
        let secret: Sensitive<String> = Sensitive::default();
        assert!(secret.is_empty());
    }
}
