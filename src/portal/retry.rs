//! Re-login and retry decisions for failed portal requests.
//!
//! A failed request is classified into a [`FailureType`]:
//! - [`FailureType::NeedsAuth`] - the session expired; log in again and re-issue
//! - [`FailureType::Transient`] - network hiccup or overloaded upstream; back off and retry
//! - [`FailureType::Permanent`] - retrying would not help
//!
//! The portal answers an expired session with 401, 403 or, on some legacy
//! pages, a bare 500; all three are treated as `NeedsAuth`. Both budgets are
//! bounded so a portal that keeps failing cannot loop a caller forever.
//!
//! # Example
//!
//! ```
//! use tack_core::portal::{FailureType, RetryDecision, RetryPolicy, classify_status};
//!
//! let policy = RetryPolicy::default();
//! let failure = classify_status(403).unwrap();
//! assert_eq!(failure, FailureType::NeedsAuth);
//! assert!(matches!(policy.should_retry(failure, 0, 0), RetryDecision::Relogin { .. }));
//! assert!(matches!(policy.should_retry(failure, 1, 0), RetryDecision::DoNotRetry { .. }));
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument};

use super::PortalError;

/// Default number of re-login attempts per request.
pub const DEFAULT_MAX_RELOGINS: u32 = 1;

/// Default number of backoff retries per request for transient failures.
pub const DEFAULT_MAX_TRANSIENT_RETRIES: u32 = 2;

const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(8);
const DEFAULT_BACKOFF_MULTIPLIER: f32 = 2.0;
const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    Transient,
    /// Failure that will not succeed regardless of retries.
    Permanent,
    /// The session is no longer authenticated.
    NeedsAuth,
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Log in again, then re-issue the request.
    Relogin {
        /// 1-indexed re-login attempt about to be made.
        attempt: u32,
    },
    /// Wait, then re-issue the request.
    Retry {
        delay: Duration,
        /// 1-indexed retry about to be made.
        attempt: u32,
    },
    /// Give up and surface the error.
    DoNotRetry { reason: String },
}

/// Bounds for re-login and transient retries.
///
/// # Default Values
///
/// - `max_relogins`: 1
/// - `max_transient_retries`: 2
/// - `base_delay`: 500ms, doubling, capped at 8s, plus up to 250ms jitter
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_relogins: u32,
    max_transient_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f32,
    max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_relogins: DEFAULT_MAX_RELOGINS,
            max_transient_retries: DEFAULT_MAX_TRANSIENT_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(
        max_relogins: u32,
        max_transient_retries: u32,
        base_delay: Duration,
        max_delay: Duration,
    ) -> Self {
        Self {
            max_relogins,
            max_transient_retries,
            base_delay,
            max_delay,
            ..Self::default()
        }
    }

    /// Same budgets as the default policy but without any waiting.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Overrides the re-login budget.
    #[must_use]
    pub fn with_max_relogins(mut self, max_relogins: u32) -> Self {
        self.max_relogins = max_relogins;
        self
    }

    /// Overrides the transient retry budget.
    #[must_use]
    pub fn with_max_transient_retries(mut self, retries: u32) -> Self {
        self.max_transient_retries = retries;
        self
    }

    #[must_use]
    pub fn max_relogins(&self) -> u32 {
        self.max_relogins
    }

    #[must_use]
    pub fn max_transient_retries(&self) -> u32 {
        self.max_transient_retries
    }

    /// Decides the next step after a failure.
    ///
    /// `relogins` and `retries` are the counts already spent on this request.
    #[instrument(skip(self), fields(max_relogins = self.max_relogins))]
    pub fn should_retry(&self, failure: FailureType, relogins: u32, retries: u32) -> RetryDecision {
        match failure {
            FailureType::Permanent => RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            },
            FailureType::NeedsAuth if relogins >= self.max_relogins => {
                debug!(relogins, "re-login budget exhausted");
                RetryDecision::DoNotRetry {
                    reason: format!("still unauthenticated after {relogins} re-login(s)"),
                }
            }
            FailureType::NeedsAuth => RetryDecision::Relogin {
                attempt: relogins + 1,
            },
            FailureType::Transient if retries >= self.max_transient_retries => {
                debug!(retries, "transient retry budget exhausted");
                RetryDecision::DoNotRetry {
                    reason: format!("max retries ({}) exhausted", self.max_transient_retries),
                }
            }
            FailureType::Transient => {
                let attempt = retries + 1;
                let delay = self.calculate_delay(attempt);
                debug!(attempt, delay_ms = delay.as_millis(), "will retry");
                RetryDecision::Retry { delay, attempt }
            }
        }
    }

    /// `min(base_delay * multiplier^(attempt-1), max_delay) + jitter`
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        let exponent = f64::from(attempt.saturating_sub(1));
        let delay_ms = base_ms * f64::from(self.backoff_multiplier).powf(exponent);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let capped = Duration::from_millis(capped_ms as u64);
        capped + self.calculate_jitter()
    }

    fn calculate_jitter(&self) -> Duration {
        let max_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}

/// Classifies a response status; `None` for success.
///
/// | Status | Type |
/// |--------|------|
/// | 2xx, 3xx | success |
/// | 401, 403, 500 | NeedsAuth |
/// | 408, 429, 502, 503, 504 | Transient |
/// | anything else | Permanent |
#[must_use]
#[allow(clippy::match_same_arms)]
pub fn classify_status(status: u16) -> Option<FailureType> {
    match status {
        200..=399 => None,
        401 | 403 => Some(FailureType::NeedsAuth),
        500 => Some(FailureType::NeedsAuth), // legacy pages 500 on a dead session
        408 | 429 => Some(FailureType::Transient),
        502..=504 => Some(FailureType::Transient),
        _ => Some(FailureType::Permanent),
    }
}

/// Classifies a transport-level error.
#[must_use]
pub fn classify_error(error: &PortalError) -> FailureType {
    match error {
        PortalError::Timeout { .. } => FailureType::Transient,
        PortalError::Transport { source, .. } if source.is_connect() || source.is_request() => {
            FailureType::Transient
        }
        PortalError::HttpStatus { status, .. } => {
            classify_status(*status).unwrap_or(FailureType::Permanent)
        }
        PortalError::Authentication { .. } => FailureType::NeedsAuth,
        _ => FailureType::Permanent,
    }
}
