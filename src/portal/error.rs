//! Error types for portal operations.
//!
//! Every public query returns `Result<T, PortalError>`. Markup problems on a
//! single element never reach this type; they are skipped by the extractor.

use thiserror::Error;

use crate::extract::ExtractError;

/// Errors surfaced by [`PortalClient`](super::PortalClient).
#[derive(Debug, Error)]
pub enum PortalError {
    /// Login failed, or a request still answered 401/403 after re-login.
    #[error("[AUTH] portal authentication failed: {reason}")]
    Authentication {
        /// What went wrong.
        reason: String,
    },

    /// A lookup by id found no match.
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Entity kind, e.g. `location` or `vessel`.
        entity: &'static str,
        /// The id that was looked up.
        id: String,
    },

    /// A response body could not be parsed at all.
    #[error("unparsable {context} response: {source}")]
    UpstreamParse {
        /// Which response was being read.
        context: &'static str,
        /// The extractor failure.
        #[source]
        source: ExtractError,
    },

    /// Network-level failure (DNS, connect, TLS, body read).
    #[error("network error requesting {url}: {source}")]
    Transport {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The request exceeded the configured timeout.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-success status that is not recovered by re-login or retry.
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The configured base URL or an endpoint join is invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The offending URL string.
        url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {reason}")]
    ClientBuild {
        /// Builder failure description.
        reason: String,
    },
}

impl PortalError {
    /// Creates an authentication error.
    pub fn authentication(reason: impl Into<String>) -> Self {
        Self::Authentication {
            reason: reason.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Wraps an extractor failure with the response it came from.
    pub fn upstream_parse(context: &'static str, source: ExtractError) -> Self {
        Self::UpstreamParse { context, source }
    }

    /// Maps a reqwest error, separating timeouts from other network failures.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Transport { url, source }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Returns true for [`PortalError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for [`PortalError::Authentication`].
    #[must_use]
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let error = PortalError::not_found("location", "42");
        assert_eq!(error.to_string(), "location '42' not found");
        assert!(error.is_not_found());
        assert!(!error.is_authentication());
    }

    #[test]
    fn test_authentication_display_has_prefix() {
        let error = PortalError::authentication("login response missing redirect");
        let msg = error.to_string();
        assert!(msg.starts_with("[AUTH]"), "Expected [AUTH] prefix in: {msg}");
        assert!(msg.contains("missing redirect"), "Expected reason in: {msg}");
        assert!(error.is_authentication());
    }

    #[test]
    fn test_http_status_display() {
        let error = PortalError::http_status("https://portal.test/ajax/boats.php", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(msg.contains("/ajax/boats.php"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_upstream_parse_keeps_source() {
        let error = PortalError::upstream_parse(
            "fleet listing",
            ExtractError::MissingPayload {
                parent: "response",
                element: "html",
            },
        );
        let msg = error.to_string();
        assert!(msg.contains("fleet listing"), "Expected context in: {msg}");
        assert!(std::error::Error::source(&error).is_some());
    }
}
