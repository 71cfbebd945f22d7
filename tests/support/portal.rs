use std::path::PathBuf;

use serde_json::json;
use tack_core::{Credentials, PortalClient, PortalConfig, RetryPolicy};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USERNAME: &str = "member@example.com";
pub const PASSWORD: &str = "hunter2";

pub const LOGIN_PATH: &str = "/rest-api/login/";
pub const HOME_PATH: &str = "/";
pub const AVAILABILITY_PAGE_PATH: &str = "/reservations/availability.php";
pub const CHECK_AVAILABILITY_PATH: &str = "/ajax/check_availability.php";
pub const CLASSIFICATIONS_PATH: &str = "/ajax/classifications.php";
pub const FLEET_LISTING_PATH: &str = "/ajax/boats.php";
pub const MEMBER_RESERVATIONS_PATH: &str = "/reservations/my_reservations.php";

pub fn config_for(server: &MockServer) -> PortalConfig {
    PortalConfig::new(Credentials::new(USERNAME, PASSWORD))
        .with_base_url(server.uri())
        .with_retry(RetryPolicy::immediate())
}

pub fn client_for(server: &MockServer) -> PortalClient {
    PortalClient::new(config_for(server)).expect("client should build")
}

pub fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|error| panic!("fixture {} unreadable: {error}", path.display()))
}

/// Successful JSON login that also sets a session cookie.
pub fn login_ok() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("set-cookie", "PHPSESSID=session-123; Path=/")
        .set_body_json(json!({ "success": true, "redirect": "/members/dashboard/" }))
}

pub async fn mount_login(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(login_ok())
        .expect(expected_calls)
        .mount(server)
        .await;
}

pub async fn mount_locations_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(AVAILABILITY_PAGE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(fixture("locations.html")))
        .mount(server)
        .await;
}

pub fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body.into())
}
