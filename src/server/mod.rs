//! JSON facade over the portal query API.
//!
//! One route per query, plus a minimal page that fetches a route and renders
//! the raw JSON:
//!
//! | Route | Query |
//! |-------|-------|
//! | `GET /api/locations` | `locations()` |
//! | `GET /api/locations/:id` | `location(id)` |
//! | `GET /api/locations/:id/classifications` | `classifications(id)` |
//! | `GET /api/locations/:id/all?date=&date_end=` | `all(id, opts)` |
//! | `GET /api/locations/:id/vessels?date=` | `vessels(id, opts)` |
//! | `GET /api/locations/:id/vessels/:vessel_id?date=` | `vessel(id, vessel_id, opts)` |
//! | `GET /api/locations/:id/vessels/:vessel_id/available?date=` | `available(...)` |
//! | `GET /api/reservations` | `reservations()` |

mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::Method;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::model::{Availability, Classification, Location, QueryOptions, Reservation, Vessel};
use crate::portal::PortalApi;

pub use error::ApiError;

/// Default listen address for `tack serve`.
pub const DEFAULT_BIND: &str = "127.0.0.1:4000";

const INDEX_HTML: &str = include_str!("index.html");

type SharedApi = Arc<dyn PortalApi>;
type ApiResult<T> = Result<Json<T>, ApiError>;

/// Date scope accepted by the date-based routes.
#[derive(Debug, Default, Deserialize)]
pub struct DateParams {
    pub date: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    /// Portal code (`6`) or name (`fishing-cruising`), as on the CLI.
    #[serde(default, deserialize_with = "classification_from_str")]
    pub classification: Option<Classification>,
}

fn classification_from_str<'de, D>(deserializer: D) -> Result<Option<Classification>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| raw.parse().map_err(serde::de::Error::custom))
        .transpose()
}

impl From<DateParams> for QueryOptions {
    fn from(params: DateParams) -> Self {
        Self {
            date: params.date,
            classification: params.classification,
            date_end: params.date_end,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub location_id: String,
    pub vessel_id: String,
    pub date: NaiveDate,
    pub available: Availability,
    pub has_availability: bool,
}

/// Builds the facade router around `api`.
pub fn router(api: SharedApi) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/locations", get(locations))
        .route("/api/locations/:id", get(location))
        .route("/api/locations/:id/classifications", get(classifications))
        .route("/api/locations/:id/all", get(all))
        .route("/api/locations/:id/vessels", get(vessels))
        .route("/api/locations/:id/vessels/:vessel_id", get(vessel))
        .route("/api/locations/:id/vessels/:vessel_id/available", get(available))
        .route("/api/reservations", get(reservations))
        .layer(cors)
        .with_state(api)
}

/// Serves the facade on `addr` until Ctrl-C.
///
/// # Errors
///
/// Returns an I/O error when the address cannot be bound.
pub async fn serve(api: SharedApi, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "serving JSON facade");
    axum::serve(listener, router(api))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn locations(State(api): State<SharedApi>) -> ApiResult<Vec<Location>> {
    Ok(Json(api.locations().await?))
}

async fn location(State(api): State<SharedApi>, Path(id): Path<String>) -> ApiResult<Location> {
    Ok(Json(api.location(&id).await?))
}

async fn classifications(
    State(api): State<SharedApi>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Classification>> {
    Ok(Json(api.classifications(&id).await?))
}

async fn all(
    State(api): State<SharedApi>,
    Path(id): Path<String>,
    Query(params): Query<DateParams>,
) -> ApiResult<Vec<Reservation>> {
    Ok(Json(api.all(&id, params.into()).await?))
}

async fn vessels(
    State(api): State<SharedApi>,
    Path(id): Path<String>,
    Query(params): Query<DateParams>,
) -> ApiResult<Vec<Vessel>> {
    Ok(Json(api.vessels(&id, params.into()).await?))
}

async fn vessel(
    State(api): State<SharedApi>,
    Path((id, vessel_id)): Path<(String, String)>,
    Query(params): Query<DateParams>,
) -> ApiResult<Vessel> {
    Ok(Json(api.vessel(&id, &vessel_id, params.into()).await?))
}

async fn available(
    State(api): State<SharedApi>,
    Path((id, vessel_id)): Path<(String, String)>,
    Query(params): Query<DateParams>,
) -> ApiResult<AvailabilityResponse> {
    let opts = QueryOptions::from(params);
    let date = opts.date_or_today();
    let opts = QueryOptions {
        date: Some(date),
        ..opts
    };
    let available = api.available(&id, &vessel_id, opts).await?;
    Ok(Json(AvailabilityResponse {
        location_id: id,
        vessel_id,
        date,
        available,
        has_availability: available.has_availability(),
    }))
}

async fn reservations(State(api): State<SharedApi>) -> ApiResult<Vec<Reservation>> {
    Ok(Json(api.reservations().await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::portal::PortalError;

    struct FakePortal;

    fn tampa() -> Location {
        Location::new("1", "Tampa", "Davis Island", Some("Marjorie Park".to_string()))
    }

    #[async_trait]
    impl PortalApi for FakePortal {
        async fn locations(&self) -> Result<Vec<Location>, PortalError> {
            Ok(vec![tampa()])
        }

        async fn location(&self, location_id: &str) -> Result<Location, PortalError> {
            if location_id == "1" {
                Ok(tampa())
            } else {
                Err(PortalError::not_found("location", location_id))
            }
        }

        async fn classifications(
            &self,
            _location_id: &str,
        ) -> Result<Vec<Classification>, PortalError> {
            Err(PortalError::authentication("bad password"))
        }

        async fn available(
            &self,
            _location_id: &str,
            _vessel_id: &str,
            opts: QueryOptions,
        ) -> Result<Availability, PortalError> {
            assert!(opts.date.is_some());
            Ok(Availability::Pm)
        }

        async fn all(
            &self,
            _location_id: &str,
            opts: QueryOptions,
        ) -> Result<Vec<Reservation>, PortalError> {
            let date = opts.date.unwrap();
            Ok(vec![Reservation::new(
                date,
                tampa(),
                Vessel::placeholder("345"),
                Availability::Full,
            )])
        }

        async fn vessels(
            &self,
            _location_id: &str,
            _opts: QueryOptions,
        ) -> Result<Vec<Vessel>, PortalError> {
            Ok(Vec::new())
        }

        async fn vessel(
            &self,
            _location_id: &str,
            vessel_id: &str,
            _opts: QueryOptions,
        ) -> Result<Vessel, PortalError> {
            Err(PortalError::not_found("vessel", vessel_id))
        }

        async fn reservations(&self) -> Result<Vec<Reservation>, PortalError> {
            Err(PortalError::Timeout {
                url: "https://portal.test/reservations/my_reservations.php".to_string(),
            })
        }
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = router(Arc::new(FakePortal));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_locations_route() {
        let (status, body) = get_json("/api/locations").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], "1");
        assert_eq!(body[0]["details"], "Marjorie Park");
    }

    #[tokio::test]
    async fn test_unknown_location_is_404() {
        let (status, body) = get_json("/api/locations/9").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "location '9' not found");
    }

    #[tokio::test]
    async fn test_auth_failure_is_502() {
        let (status, body) = get_json("/api/locations/1/classifications").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().starts_with("[AUTH]"));
    }

    #[tokio::test]
    async fn test_timeout_is_504() {
        let (status, _) = get_json("/api/reservations").await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_all_passes_date_through() {
        let (status, body) = get_json("/api/locations/1/all?date=2023-07-08").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["date"], "2023-07-08");
        assert_eq!(body[0]["available"], "FULL");
        assert_eq!(body[0]["id"], "reservation:1:345");
        assert_eq!(body[0]["has_availability"], true);
    }

    #[tokio::test]
    async fn test_classification_accepts_code_and_name() {
        for query in ["6", "FISHING_CRUISING", "fishing-cruising"] {
            let (status, _) =
                get_json(&format!("/api/locations/1/all?date=2023-07-08&classification={query}"))
                    .await;
            assert_eq!(status, StatusCode::OK, "classification={query}");
        }
    }

    #[tokio::test]
    async fn test_unknown_classification_is_400() {
        let app = router(Arc::new(FakePortal));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/locations/1/all?classification=sailing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_available_route() {
        let (status, body) =
            get_json("/api/locations/1/vessels/345/available?date=2023-07-08").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["available"], "PM");
        assert_eq!(body["has_availability"], true);
    }

    #[tokio::test]
    async fn test_missing_vessel_is_404() {
        let (status, _) = get_json("/api/locations/1/vessels/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_index_page_is_html() {
        let app = router(Arc::new(FakePortal));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("/api/locations"));
    }
}
