//! Portal login state and single-flight login.
//!
//! The portal session lives in the transport's cookie jar; this module only
//! tracks whether it is believed valid and makes sure concurrent callers
//! share one login request instead of racing several.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::PortalError;
use super::endpoints::Endpoint;
use super::transport::{PortalRequest, Transport, read_body};

/// Member credentials for the portal login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(alias = "redirect_url", alias = "redirectUrl")]
    redirect: Option<String>,
}

type LoginFuture = Shared<BoxFuture<'static, Result<String, Arc<PortalError>>>>;

struct PendingLogin {
    generation: u64,
    future: LoginFuture,
}

#[derive(Default)]
struct SessionState {
    logged_in: bool,
    login_redirect: Option<String>,
    pending: Option<PendingLogin>,
    generation: u64,
}

/// Login state for one portal client.
pub struct Session {
    credentials: Mutex<Credentials>,
    state: Mutex<SessionState>,
    login_requests: AtomicUsize,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("Session")
            .field("logged_in", &state.logged_in)
            .field("login_pending", &state.pending.is_some())
            .field("login_requests", &self.login_count())
            .finish_non_exhaustive()
    }
}

impl Session {
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Mutex::new(credentials),
            state: Mutex::new(SessionState::default()),
            login_requests: AtomicUsize::new(0),
        }
    }

    /// Ensures the session is logged in.
    ///
    /// Returns immediately when already logged in. When a login is already in
    /// flight, waits for that one; otherwise starts it. Every waiter sees the
    /// same outcome.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Authentication`] when the login request fails or
    /// its response carries no redirect.
    #[instrument(skip_all)]
    pub async fn login(&self, transport: &Transport) -> Result<(), PortalError> {
        let (generation, future) = {
            let mut state = self.lock_state();
            if state.logged_in {
                return Ok(());
            }
            let joined = state
                .pending
                .as_ref()
                .map(|pending| (pending.generation, pending.future.clone()));
            match joined {
                Some((generation, future)) => {
                    debug!(generation, "joining in-flight login");
                    (generation, future)
                }
                None => {
                    state.generation += 1;
                    let generation = state.generation;
                    let future = self.start_login(transport.clone());
                    state.pending = Some(PendingLogin {
                        generation,
                        future: future.clone(),
                    });
                    (generation, future)
                }
            }
        };

        let outcome = future.await;

        {
            let mut state = self.lock_state();
            let current = state
                .pending
                .as_ref()
                .is_some_and(|pending| pending.generation == generation);
            if current {
                state.pending = None;
                if let Ok(redirect) = &outcome {
                    state.logged_in = true;
                    state.login_redirect = Some(redirect.clone());
                }
            }
        }

        match outcome {
            Ok(_) => Ok(()),
            Err(error) => {
                warn!(error = %error, "portal login failed");
                Err(as_authentication(&error))
            }
        }
    }

    /// Forgets the session; the next call logs in again. A login still in
    /// flight can no longer mark the session as logged in.
    pub fn invalidate(&self) {
        reset(&mut self.lock_state());
    }

    /// Invalidates only if no login has started since `generation` was read,
    /// so concurrent auth failures collapse into one re-login.
    pub(crate) fn invalidate_generation(&self, generation: u64) -> bool {
        let mut state = self.lock_state();
        if state.generation != generation {
            return false;
        }
        reset(&mut state);
        true
    }

    pub(crate) fn generation(&self) -> u64 {
        self.lock_state().generation
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.lock_state().logged_in
    }

    /// Post-login landing path returned by the portal.
    #[must_use]
    pub fn login_redirect(&self) -> Option<String> {
        self.lock_state().login_redirect.clone()
    }

    pub fn set_logged_in(&self, logged_in: bool) {
        if logged_in {
            self.lock_state().logged_in = true;
        } else {
            self.invalidate();
        }
    }

    /// Number of login requests started so far.
    #[must_use]
    pub fn login_count(&self) -> usize {
        self.login_requests.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn username(&self) -> String {
        self.lock_credentials().username().to_string()
    }

    /// Replaces the username; takes effect on the next login.
    pub fn set_username(&self, username: impl Into<String>) {
        self.lock_credentials().set_username(username);
    }

    /// Replaces the password; takes effect on the next login.
    pub fn set_password(&self, password: impl Into<String>) {
        self.lock_credentials().set_password(password);
    }

    fn start_login(&self, transport: Transport) -> LoginFuture {
        let credentials = self.lock_credentials().clone();
        self.login_requests.fetch_add(1, Ordering::SeqCst);
        async move { perform_login(&transport, &credentials).await.map_err(Arc::new) }
            .boxed()
            .shared()
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_credentials(&self) -> MutexGuard<'_, Credentials> {
        self.credentials.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn perform_login(
    transport: &Transport,
    credentials: &Credentials,
) -> Result<String, PortalError> {
    info!(username = %credentials.username(), "logging in to portal");
    let request = PortalRequest::post_json(
        Endpoint::Login,
        serde_json::json!({
            "email": credentials.username(),
            "password": credentials.password(),
            "remember_user": true,
        }),
    );

    let response = transport.execute(&request).await?;
    let status = response.status();
    let body = read_body(response).await?;
    if !status.is_success() {
        return Err(PortalError::authentication(format!(
            "login returned HTTP {}",
            status.as_u16()
        )));
    }

    let parsed: LoginResponse = serde_json::from_str(&body).map_err(|error| {
        PortalError::authentication(format!("unreadable login response: {error}"))
    })?;
    parsed
        .redirect
        .map(|redirect| redirect.trim().to_string())
        .filter(|redirect| !redirect.is_empty())
        .ok_or_else(|| PortalError::authentication("login response missing redirect"))
}

fn reset(state: &mut SessionState) {
    state.logged_in = false;
    state.login_redirect = None;
    state.pending = None;
    state.generation += 1;
}

fn as_authentication(error: &PortalError) -> PortalError {
    match error {
        PortalError::Authentication { reason } => PortalError::authentication(reason.clone()),
        other => PortalError::authentication(other.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials::new("member@example.com", "hunter2");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("member@example.com"));
        assert!(!debug.contains("hunter2"), "password leaked: {debug}");
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_credentials_setters() {
        let mut credentials = Credentials::new("a", "b");
        credentials.set_username("c");
        credentials.set_password("d");
        assert_eq!(credentials.username(), "c");
        assert_eq!(credentials.password(), "d");
    }

    #[test]
    fn test_login_response_accepts_redirect_aliases() {
        for body in [
            r#"{"redirect":"/members/"}"#,
            r#"{"redirect_url":"/members/"}"#,
            r#"{"redirectUrl":"/members/"}"#,
        ] {
            let parsed: LoginResponse = serde_json::from_str(body).unwrap();
            assert_eq!(parsed.redirect.as_deref(), Some("/members/"), "{body}");
        }
        let parsed: LoginResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(parsed.redirect.is_none());
    }

    #[test]
    fn test_set_logged_in_and_invalidate() {
        let session = Session::new(Credentials::new("a", "b"));
        assert!(!session.is_logged_in());
        session.set_logged_in(true);
        assert!(session.is_logged_in());
        session.invalidate();
        assert!(!session.is_logged_in());
        assert!(session.login_redirect().is_none());
        assert_eq!(session.login_count(), 0);
    }

    #[test]
    fn test_invalidate_generation_skips_stale_callers() {
        let session = Session::new(Credentials::new("a", "b"));
        session.set_logged_in(true);
        let seen = session.generation();

        assert!(session.invalidate_generation(seen));
        session.set_logged_in(true);
        assert!(!session.invalidate_generation(seen));
        assert!(session.is_logged_in());
    }

    #[test]
    fn test_as_authentication_flattens_reason() {
        let inner = PortalError::authentication("login returned HTTP 401");
        assert_eq!(
            as_authentication(&inner).to_string(),
            "[AUTH] portal authentication failed: login returned HTTP 401"
        );
        let other = PortalError::Timeout {
            url: "https://portal.test/rest-api/login/".to_string(),
        };
        let mapped = as_authentication(&other);
        assert!(mapped.is_authentication());
        assert!(mapped.to_string().contains("timeout"));
    }

    #[test]
    fn test_debug_does_not_expose_credentials() {
        let session = Session::new(Credentials::new("member@example.com", "hunter2"));
        let debug = format!("{session:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("logged_in"));
    }
}
