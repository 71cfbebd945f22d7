//! The public query API over the portal.

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::extract::{
    VesselEntry, extract_classifications, extract_locations, extract_member_reservations,
    extract_slots, extract_vessel_entries, html_payload,
};
use crate::model::{Availability, Classification, Location, QueryOptions, Reservation, Vessel};

use super::builder::{
    build_vessels, incomplete_vessel_entries, member_reservation, recognized_classifications,
    vessel_or_placeholder,
};
use super::endpoints::{DEFAULT_BASE_URL, Endpoint};
use super::retry::{FailureType, RetryDecision, RetryPolicy, classify_error, classify_status};
use super::session::{Credentials, Session};
use super::transport::{PortalRequest, Timeouts, Transport, read_body};
use super::PortalError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Settings for a [`PortalClient`].
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub base_url: String,
    pub credentials: Credentials,
    pub timeouts: Timeouts,
    pub retry: RetryPolicy,
}

impl PortalConfig {
    /// Production portal with default timeouts and retry budget.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials,
            timeouts: Timeouts::default(),
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Logged-in client for the reservation portal.
///
/// Every query first ensures the session is logged in; concurrent queries on
/// a logged-out client share one login request. Requests answered with an
/// auth failure are re-issued after a re-login, at most
/// [`RetryPolicy::max_relogins`] times.
#[derive(Debug)]
pub struct PortalClient {
    transport: Transport,
    session: Session,
    retry: RetryPolicy,
}

impl PortalClient {
    /// Builds a client without any network traffic.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::InvalidUrl`] or [`PortalError::ClientBuild`].
    pub fn new(config: PortalConfig) -> Result<Self, PortalError> {
        let transport = Transport::new(&config.base_url, config.timeouts)?;
        Ok(Self {
            transport,
            session: Session::new(config.credentials),
            retry: config.retry,
        })
    }

    /// Builds a client and pings the portal once to seed cookies.
    ///
    /// A failed ping is logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Same as [`PortalClient::new`].
    pub async fn connect(config: PortalConfig) -> Result<Self, PortalError> {
        let client = Self::new(config)?;
        client.ping().await;
        Ok(client)
    }

    /// Best-effort GET of the home page. Returns whether it succeeded.
    ///
    /// When the session was logged in and the ping fails, the session is
    /// reset so the next query logs in again.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> bool {
        let outcome = match self.transport.execute(&PortalRequest::page(Endpoint::Home)).await {
            Ok(response) if response.status().is_success() => read_body(response).await.map(|_| ()),
            Ok(response) => Err(PortalError::http_status(
                response.url().as_str(),
                response.status().as_u16(),
            )),
            Err(error) => Err(error),
        };

        match outcome {
            Ok(()) => {
                debug!("portal ping ok");
                true
            }
            Err(error) => {
                warn!(error = %error, "portal ping failed");
                if self.session.is_logged_in() {
                    self.session.invalidate();
                }
                false
            }
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Locations on the availability page, in page order.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] on login or transport failure.
    #[instrument(skip(self))]
    pub async fn locations(&self) -> Result<Vec<Location>, PortalError> {
        let body = self.send(&PortalRequest::page(Endpoint::AvailabilityPage)).await?;
        let extracted = extract_locations(&body);
        log_skipped("location", extracted.skipped);
        Ok(extracted.items.into_iter().map(Location::from).collect())
    }

    /// One location by id.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::NotFound`] when the id is not listed.
    #[instrument(skip(self))]
    pub async fn location(&self, location_id: &str) -> Result<Location, PortalError> {
        self.locations()
            .await?
            .into_iter()
            .find(|location| location.id == location_id)
            .ok_or_else(|| PortalError::not_found("location", location_id))
    }

    /// Recognized classifications offered at a location.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] on login, transport or envelope failure.
    #[instrument(skip(self))]
    pub async fn classifications(
        &self,
        location_id: &str,
    ) -> Result<Vec<Classification>, PortalError> {
        let request =
            PortalRequest::post_form(Endpoint::Classifications, [("location_id", location_id)]);
        let body = self.send(&request).await?;
        let html =
            html_payload(&body).map_err(|error| PortalError::upstream_parse("classifications", error))?;

        let extracted = extract_classifications(&html);
        log_skipped("classification", extracted.skipped);
        Ok(recognized_classifications(&extracted.items))
    }

    /// Slot availability of one vessel on `opts.date` (today when unset).
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] on login, transport or envelope failure.
    #[instrument(skip(self, opts), fields(date = %opts.date_or_today()))]
    pub async fn available(
        &self,
        location_id: &str,
        vessel_id: &str,
        opts: QueryOptions,
    ) -> Result<Availability, PortalError> {
        let date = opts.date_or_today().format(DATE_FORMAT).to_string();
        let request = PortalRequest::post_form(
            Endpoint::CheckAvailability,
            [
                ("location_id", location_id),
                ("boat_id", vessel_id),
                ("date", date.as_str()),
                ("classification", opts.classification_or_default().code()),
            ],
        );
        let body = self.send(&request).await?;
        let html = html_payload(&body)
            .map_err(|error| PortalError::upstream_parse("availability check", error))?;

        let available = extract_slots(&html).availability();
        debug!(available = %available, "availability checked");
        Ok(available)
    }

    /// Every listed vessel at a location with its availability.
    ///
    /// Each listing entry is checked on its own date. Entries without an id
    /// or date are skipped; a vessel missing from the listing index becomes a
    /// placeholder, as does a location the portal no longer lists.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] on login, transport or envelope failure.
    #[instrument(skip(self, opts))]
    pub async fn all(
        &self,
        location_id: &str,
        opts: QueryOptions,
    ) -> Result<Vec<Reservation>, PortalError> {
        let entries = self.fleet_listing(location_id, opts).await?;
        let vessels = build_vessels(&entries);

        let location = match self.location(location_id).await {
            Ok(location) => location,
            Err(error) if error.is_not_found() => {
                warn!(location_id, "location not listed; using placeholder");
                Location::placeholder(location_id)
            }
            Err(error) => return Err(error),
        };

        let mut reservations = Vec::with_capacity(entries.len());
        let mut skipped = 0;
        for entry in &entries {
            let (Some(vessel_id), Some(date)) = (entry.id.as_deref(), entry.date) else {
                skipped += 1;
                continue;
            };
            let available = self
                .available(location_id, vessel_id, QueryOptions {
                    date: Some(date),
                    ..opts
                })
                .await?;
            reservations.push(Reservation::new(
                date,
                location.clone(),
                vessel_or_placeholder(&vessels, vessel_id),
                available,
            ));
        }

        log_skipped("listing entry", skipped);
        info!(count = reservations.len(), "listed reservations");
        Ok(reservations)
    }

    /// Distinct vessels in the fleet listing of a location.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] on login, transport or envelope failure.
    #[instrument(skip(self, opts))]
    pub async fn vessels(
        &self,
        location_id: &str,
        opts: QueryOptions,
    ) -> Result<Vec<Vessel>, PortalError> {
        let entries = self.fleet_listing(location_id, opts).await?;
        let vessels = build_vessels(&entries);
        log_skipped("vessel", incomplete_vessel_entries(&entries));
        Ok(vessels)
    }

    /// One vessel by id from the fleet listing.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::NotFound`] when the listing has no such vessel.
    #[instrument(skip(self, opts))]
    pub async fn vessel(
        &self,
        location_id: &str,
        vessel_id: &str,
        opts: QueryOptions,
    ) -> Result<Vessel, PortalError> {
        self.vessels(location_id, opts)
            .await?
            .into_iter()
            .find(|vessel| vessel.id == vessel_id)
            .ok_or_else(|| PortalError::not_found("vessel", vessel_id))
    }

    /// The member's own bookings.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] on login or transport failure.
    #[instrument(skip(self))]
    pub async fn reservations(&self) -> Result<Vec<Reservation>, PortalError> {
        let body = self.send(&PortalRequest::page(Endpoint::MemberReservations)).await?;
        let extracted = extract_member_reservations(&body);
        log_skipped("member reservation", extracted.skipped);
        Ok(extracted.items.into_iter().map(member_reservation).collect())
    }

    async fn fleet_listing(
        &self,
        location_id: &str,
        opts: QueryOptions,
    ) -> Result<Vec<VesselEntry>, PortalError> {
        let date = opts.date_or_today().format(DATE_FORMAT).to_string();
        let mut fields = vec![
            ("location_id", location_id.to_string()),
            ("date", date),
            ("classification", opts.classification_or_default().code().to_string()),
        ];
        if let Some(date_end) = opts.date_end {
            fields.push(("date_end", date_end.format(DATE_FORMAT).to_string()));
        }

        let body = self
            .send(&PortalRequest::post_form(Endpoint::FleetListing, fields))
            .await?;
        let html =
            html_payload(&body).map_err(|error| PortalError::upstream_parse("fleet listing", error))?;
        Ok(extract_vessel_entries(&html))
    }

    /// Logs in if needed, sends `request` and returns the body of a success
    /// response, re-logging in and retrying per the retry policy.
    async fn send(&self, request: &PortalRequest) -> Result<String, PortalError> {
        let mut relogins = 0;
        let mut retries = 0;

        loop {
            self.session.login(&self.transport).await?;
            let generation = self.session.generation();

            let (failure, error) = match self.transport.execute(request).await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    match classify_status(status) {
                        None => return read_body(response).await,
                        Some(failure) => {
                            (failure, PortalError::http_status(response.url().as_str(), status))
                        }
                    }
                }
                Err(error) => (classify_error(&error), error),
            };

            match self.retry.should_retry(failure, relogins, retries) {
                RetryDecision::Relogin { attempt } => {
                    warn!(error = %error, attempt, "portal rejected session; logging in again");
                    self.session.invalidate_generation(generation);
                    relogins = attempt;
                }
                RetryDecision::Retry { delay, attempt } => {
                    warn!(error = %error, attempt, delay_ms = delay.as_millis(), "retrying portal request");
                    tokio::time::sleep(delay).await;
                    retries = attempt;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(reason = %reason, "giving up on portal request");
                    return Err(exhausted(failure, error, relogins));
                }
            }
        }
    }
}

/// Final error once retries are spent. A request still answered 401/403
/// after re-login is an authentication failure.
fn exhausted(failure: FailureType, error: PortalError, relogins: u32) -> PortalError {
    match (failure, &error) {
        (FailureType::NeedsAuth, PortalError::HttpStatus { status: 401 | 403, url }) => {
            PortalError::authentication(format!(
                "{url} still rejected after {relogins} re-login(s)"
            ))
        }
        _ => error,
    }
}

fn log_skipped(kind: &'static str, skipped: usize) {
    if skipped > 0 {
        warn!(kind, skipped, "skipped incomplete {kind} elements");
    }
}

/// Query surface of [`PortalClient`], object-safe for the HTTP facade.
#[async_trait]
pub trait PortalApi: Send + Sync {
    async fn locations(&self) -> Result<Vec<Location>, PortalError>;
    async fn location(&self, location_id: &str) -> Result<Location, PortalError>;
    async fn classifications(&self, location_id: &str)
    -> Result<Vec<Classification>, PortalError>;
    async fn available(
        &self,
        location_id: &str,
        vessel_id: &str,
        opts: QueryOptions,
    ) -> Result<Availability, PortalError>;
    async fn all(&self, location_id: &str, opts: QueryOptions)
    -> Result<Vec<Reservation>, PortalError>;
    async fn vessels(&self, location_id: &str, opts: QueryOptions)
    -> Result<Vec<Vessel>, PortalError>;
    async fn vessel(
        &self,
        location_id: &str,
        vessel_id: &str,
        opts: QueryOptions,
    ) -> Result<Vessel, PortalError>;
    async fn reservations(&self) -> Result<Vec<Reservation>, PortalError>;
}

#[async_trait]
impl PortalApi for PortalClient {
    async fn locations(&self) -> Result<Vec<Location>, PortalError> {
        PortalClient::locations(self).await
    }

    async fn location(&self, location_id: &str) -> Result<Location, PortalError> {
        PortalClient::location(self, location_id).await
    }

    async fn classifications(
        &self,
        location_id: &str,
    ) -> Result<Vec<Classification>, PortalError> {
        PortalClient::classifications(self, location_id).await
    }

    async fn available(
        &self,
        location_id: &str,
        vessel_id: &str,
        opts: QueryOptions,
    ) -> Result<Availability, PortalError> {
        PortalClient::available(self, location_id, vessel_id, opts).await
    }

    async fn all(
        &self,
        location_id: &str,
        opts: QueryOptions,
    ) -> Result<Vec<Reservation>, PortalError> {
        PortalClient::all(self, location_id, opts).await
    }

    async fn vessels(
        &self,
        location_id: &str,
        opts: QueryOptions,
    ) -> Result<Vec<Vessel>, PortalError> {
        PortalClient::vessels(self, location_id, opts).await
    }

    async fn vessel(
        &self,
        location_id: &str,
        vessel_id: &str,
        opts: QueryOptions,
    ) -> Result<Vessel, PortalError> {
        PortalClient::vessel(self, location_id, vessel_id, opts).await
    }

    async fn reservations(&self) -> Result<Vec<Reservation>, PortalError> {
        PortalClient::reservations(self).await
    }
}
