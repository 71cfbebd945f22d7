//! HTTP transport shared by every portal call.
//!
//! One [`Transport`] owns one `reqwest::Client` and the cookie jar that holds
//! the portal session. Requests are described by [`PortalRequest`] values so
//! the client can re-issue the exact same call after a re-login.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{CONTENT_TYPE, HeaderValue, ORIGIN, REFERER};
use reqwest::{Client, ClientBuilder, Method, Proxy, Response};
use tracing::{debug, trace, warn};
use url::Url;

use crate::user_agent::{self, BROWSER_USER_AGENT};

use super::endpoints::Endpoint;
use super::PortalError;

pub(crate) const CONNECT_TIMEOUT_SECS: u64 = 10;
pub(crate) const READ_TIMEOUT_SECS: u64 = 30;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Connect and whole-request timeouts for the portal client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub read: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read: Duration::from_secs(READ_TIMEOUT_SECS),
        }
    }
}

/// How a request is presented to the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Top-level page navigation.
    Page,
    /// AJAX action posted from a page.
    Action,
    /// JSON REST call.
    Api,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    None,
    Form(Vec<(String, String)>),
    Json(serde_json::Value),
}

/// Re-buildable description of one portal call.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalRequest {
    pub method: Method,
    pub endpoint: Endpoint,
    pub body: RequestBody,
    pub kind: RequestKind,
}

impl PortalRequest {
    /// GET of an HTML page.
    #[must_use]
    pub fn page(endpoint: Endpoint) -> Self {
        Self {
            method: Method::GET,
            endpoint,
            body: RequestBody::None,
            kind: RequestKind::Page,
        }
    }

    /// Urlencoded AJAX POST.
    #[must_use]
    pub fn post_form<K, V>(endpoint: Endpoint, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            method: Method::POST,
            endpoint,
            body: RequestBody::Form(
                fields
                    .into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            ),
            kind: RequestKind::Action,
        }
    }

    /// JSON POST to a REST endpoint.
    #[must_use]
    pub fn post_json(endpoint: Endpoint, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            endpoint,
            body: RequestBody::Json(body),
            kind: RequestKind::Api,
        }
    }
}

/// Cookie-carrying HTTP client bound to one portal origin.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    base_url: Url,
    jar: Arc<Jar>,
}

impl Transport {
    /// Builds the client for `base_url`.
    ///
    /// A path prefix in `base_url` (`https://host/portal`) is kept; endpoint
    /// paths are resolved below it.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::InvalidUrl`] for an unusable base URL and
    /// [`PortalError::ClientBuild`] when reqwest cannot build the client.
    pub fn new(base_url: &str, timeouts: Timeouts) -> Result<Self, PortalError> {
        let mut base_url = Url::parse(base_url).map_err(|_| PortalError::invalid_url(base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(PortalError::invalid_url(base_url.as_str()));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let jar = Arc::new(Jar::default());
        let client = build_client(Arc::clone(&jar), timeouts)?;
        Ok(Self {
            client,
            base_url,
            jar,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The cookie jar holding the portal session.
    #[must_use]
    pub fn jar(&self) -> &Arc<Jar> {
        &self.jar
    }

    /// Absolute URL of `endpoint` on this portal.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::InvalidUrl`] when the join fails.
    pub fn url_for(&self, endpoint: Endpoint) -> Result<Url, PortalError> {
        // Relative join so a base path prefix survives.
        self.base_url
            .join(endpoint.path().trim_start_matches('/'))
            .map_err(|_| PortalError::invalid_url(format!("{}{}", self.base_url, endpoint.path())))
    }

    /// Sends `request` once. The response is returned whatever its status;
    /// classification is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Timeout`] or [`PortalError::Transport`] when no
    /// response arrives.
    pub async fn execute(&self, request: &PortalRequest) -> Result<Response, PortalError> {
        let url = self.url_for(request.endpoint)?;
        trace!(method = %request.method, url = %url, "portal request");

        let mut builder = self.client.request(request.method.clone(), url.clone());
        builder = match request.kind {
            RequestKind::Page => builder.headers(user_agent::page_headers()),
            RequestKind::Action | RequestKind::Api => {
                let referer = self.url_for(request.endpoint.referer())?;
                builder
                    .header(ORIGIN, self.origin())
                    .header(REFERER, referer.as_str())
                    .header("X-Requested-With", "XMLHttpRequest")
            }
        };
        builder = match &request.body {
            RequestBody::None => builder,
            RequestBody::Form(fields) => builder
                .header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
                .body(encode_form(fields)),
            RequestBody::Json(value) => builder.json(value),
        };

        let response = builder
            .send()
            .await
            .map_err(|error| PortalError::from_reqwest(url.as_str(), error))?;
        debug!(url = %url, status = response.status().as_u16(), "portal response");
        Ok(response)
    }

    fn origin(&self) -> String {
        self.base_url.origin().ascii_serialization()
    }
}

/// Reads a response body as text.
///
/// # Errors
///
/// Returns [`PortalError::Timeout`] or [`PortalError::Transport`] when the
/// body cannot be read.
pub(crate) async fn read_body(response: Response) -> Result<String, PortalError> {
    let url = response.url().to_string();
    response
        .text()
        .await
        .map_err(|error| PortalError::from_reqwest(url, error))
}

fn encode_form(fields: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields.iter().map(|(key, value)| (key.as_str(), value.as_str())))
        .finish()
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn build_client(jar: Arc<Jar>, timeouts: Timeouts) -> Result<Client, PortalError> {
    match try_build_client(Arc::clone(&jar), timeouts, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some sandboxed environments panic when reading system proxy
            // settings; retry with env proxies only.
            warn!("portal client hit system proxy panic; using env-proxy fallback builder");
            try_build_client(jar, timeouts, true).map_err(|failure| match failure {
                BuildClientFailure::Panic => PortalError::ClientBuild {
                    reason: "HTTP client construction panicked".to_string(),
                },
                BuildClientFailure::Build(error) => PortalError::ClientBuild {
                    reason: error.to_string(),
                },
            })
        }
        Err(BuildClientFailure::Build(error)) => Err(PortalError::ClientBuild {
            reason: error.to_string(),
        }),
    }
}

fn try_build_client(
    jar: Arc<Jar>,
    timeouts: Timeouts,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(jar, timeouts);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(jar: Arc<Jar>, timeouts: Timeouts) -> ClientBuilder {
    Client::builder()
        .connect_timeout(timeouts.connect)
        .timeout(timeouts.read)
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(user_agent::default_headers())
        .cookie_provider(jar)
        .gzip(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    let names: &[&str] = match scheme {
        "https" => &["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"],
        "http" => &["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"],
        _ => return None,
    };
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_joins_endpoint_path() {
        let transport = Transport::new("https://portal.test", Timeouts::default()).unwrap();
        assert_eq!(
            transport.url_for(Endpoint::Login).unwrap().as_str(),
            "https://portal.test/rest-api/login/"
        );
        assert_eq!(transport.origin(), "https://portal.test");
    }

    #[test]
    fn test_url_for_keeps_base_path_prefix() {
        let transport = Transport::new("https://portal.test/portal", Timeouts::default()).unwrap();
        assert_eq!(
            transport.url_for(Endpoint::FleetListing).unwrap().as_str(),
            "https://portal.test/portal/ajax/boats.php"
        );
        assert_eq!(
            transport.url_for(Endpoint::Home).unwrap().as_str(),
            "https://portal.test/portal/"
        );
        assert_eq!(transport.origin(), "https://portal.test");

        let transport = Transport::new("https://portal.test/portal/", Timeouts::default()).unwrap();
        assert_eq!(
            transport.url_for(Endpoint::Login).unwrap().as_str(),
            "https://portal.test/portal/rest-api/login/"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let error = Transport::new("not a url", Timeouts::default()).unwrap_err();
        assert!(matches!(error, PortalError::InvalidUrl { .. }));

        let error = Transport::new("mailto:someone@example.com", Timeouts::default()).unwrap_err();
        assert!(matches!(error, PortalError::InvalidUrl { .. }));
    }

    #[test]
    fn test_encode_form_escapes_values() {
        let body = encode_form(&[
            ("location_id".to_string(), "12".to_string()),
            ("date".to_string(), "2023-07-08".to_string()),
            ("note".to_string(), "a&b c".to_string()),
        ]);
        assert_eq!(body, "location_id=12&date=2023-07-08&note=a%26b+c");
    }

    #[test]
    fn test_post_form_is_an_action() {
        let request = PortalRequest::post_form(Endpoint::FleetListing, [("location_id", "1")]);
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.kind, RequestKind::Action);
        assert_eq!(
            request.body,
            RequestBody::Form(vec![("location_id".to_string(), "1".to_string())])
        );
        assert_eq!(PortalRequest::page(Endpoint::Home).kind, RequestKind::Page);
    }
}
