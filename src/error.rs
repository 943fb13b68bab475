//! Error types for the portal engine.

use thiserror::Error;

/// Errors surfaced by portal operations.
///
/// Scrape misses (an expected table or row absent from a page the portal
/// legitimately renders without it) are not errors; those resolve to empty
/// collections at the scraper level.
#[derive(Debug, Error, Clone)]
pub enum AmsError {
    /// Network/HTTP request failed (unreachable host, timeout, etc.)
    #[error("Network error: {message}")]
    Network { message: String },

    /// Server answered with a non-success HTTP status
    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// A page that must carry the view-state/event-validation tokens did not.
    /// The server changed shape or returned an error page instead of the form.
    #[error("Required hidden field `{field}` missing from {page}")]
    MissingViewState { field: String, page: String },

    /// The authenticated session is gone; the caller must re-run the login
    /// flow with a fresh challenge answer. Distinct from plain failures so
    /// callers can route to re-authentication instead of treating it as fatal.
    #[error("Session expired, log in again")]
    SessionExpired,

    /// URL construction for a configured endpoint failed
    #[error("URL error: {message}")]
    UrlError { message: String },
}

impl AmsError {
    /// Returns true if this error means the caller must re-authenticate.
    pub fn needs_reauth(&self) -> bool {
        matches!(self, AmsError::SessionExpired)
    }

    /// Returns true if this error is potentially transient.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AmsError::Network { .. } | AmsError::UnexpectedStatus { .. }
        )
    }
}

impl From<reqwest::Error> for AmsError {
    fn from(err: reqwest::Error) -> Self {
        AmsError::Network {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for AmsError {
    fn from(err: url::ParseError) -> Self {
        AmsError::UrlError {
            message: err.to_string(),
        }
    }
}
