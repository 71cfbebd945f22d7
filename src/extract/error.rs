//! Error types for the markup extractor.
//!
//! Per-element problems (an element without an id, a row without a date) are
//! never errors: they are skipped and counted. Only a body that cannot be read
//! at all surfaces here.

use thiserror::Error;

/// Errors that make a whole response body unusable.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The XML envelope could not be tokenized.
    #[error("malformed XML envelope at byte {position}: {reason}")]
    Envelope {
        /// Reader position where parsing stopped.
        position: u64,
        /// Description from the XML reader.
        reason: String,
    },

    /// The envelope parsed but has no payload element.
    #[error("XML envelope has no <{parent}><{element}> payload")]
    MissingPayload {
        /// Expected parent element name.
        parent: &'static str,
        /// Expected payload element name.
        element: &'static str,
    },

    /// The escaped payload text contains an invalid entity.
    #[error("invalid escape in envelope payload: {reason}")]
    Escape {
        /// Description from the unescaper.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_payload_display_names_path() {
        let error = ExtractError::MissingPayload {
            parent: "response",
            element: "html",
        };
        assert_eq!(
            error.to_string(),
            "XML envelope has no <response><html> payload"
        );
    }

    #[test]
    fn test_envelope_display_includes_position() {
        let error = ExtractError::Envelope {
            position: 42,
            reason: "unexpected EOF".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("42"), "Expected position in: {msg}");
        assert!(msg.contains("unexpected EOF"), "Expected reason in: {msg}");
    }
}
