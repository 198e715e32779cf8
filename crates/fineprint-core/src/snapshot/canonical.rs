use crate::errors::{FinePrintError, Result};
use serde::Serialize;
use std::fmt;
use url::Url;

/// An absolute http(s) URL with its query string removed
///
/// Archives key captures on the URL without volatile tracking parameters.
/// Listing and fetching both take a `CanonicalUrl`, so the normalization is
/// applied exactly once and cannot differ between the two.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CanonicalUrl(Url);

impl CanonicalUrl {
    /// Parse and canonicalize a raw URL
    ///
    /// # Errors
    ///
    /// `InvalidUrl` if `raw` is not an absolute URL or its scheme is not
    /// http or https.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim()).map_err(|e| FinePrintError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_url(&url)
    }

    /// # Errors
    ///
    /// `InvalidUrl` for schemes other than http and https.
    pub fn from_url(url: &Url) -> Result<Self> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FinePrintError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme `{}`", url.scheme()),
            });
        }
        let mut canonical = url.clone();
        canonical.set_query(None);
        Ok(Self(canonical))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}
