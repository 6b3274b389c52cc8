//!  Delulu Flight Booker
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # Booking Orchestrator
//!
//! The search → check → book flow against the booking API.
//!
//! Every step returns `Result<_, BookingError>` and the flow stops at the
//! first error. Only the check step repeats requests, and only while the API
//! answers "not checked yet".

use std::sync::Arc;

use delulu_poll_policies::{PollError, PollStep, Sleeper, TokioSleeper};

use crate::api_responses::{BookingResult, CheckReply, CheckState, CheckStatus, Offer, SearchResults};
use crate::booking_config::BookerConfig;
use crate::booking_errors::{BookingError, Result};
use crate::flights_criteria::{BookingRequest, Passenger, SearchCriteria, build_url, check_query};
use crate::transport::{HttpTransport, Transport};

/// Everything gathered by a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub offer: Offer,
    pub check: CheckStatus,
    pub result: BookingResult,
}

pub struct BookingOrchestrator<T: Transport> {
    transport: T,
    config: BookerConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl BookingOrchestrator<HttpTransport> {
    pub fn new(config: BookerConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.http_timeout)?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: Transport> BookingOrchestrator<T> {
    pub fn with_transport(transport: T, config: BookerConfig) -> Self {
        Self {
            transport,
            config,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &BookerConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run a search and decode every result, in API order.
    pub async fn search_offers(
        &self,
        criteria: &SearchCriteria,
        result_limit: u32,
    ) -> Result<SearchResults> {
        let query = criteria.search_query(result_limit, &self.config.partner);
        let url = build_url(&self.config.search_endpoint, &query);
        tracing::debug!("Search URL: {}", url);

        let body = self.transport.get(&url).await?;
        tracing::debug!("Search response: {}", body);

        let results = SearchResults::from_json(&body, criteria.currency())?;
        tracing::info!(
            "Search returned {} offers (API reports {:?} results)",
            results.offers.len(),
            results.total_results
        );
        Ok(results)
    }

    /// Find the best offer for `criteria`.
    ///
    /// Fails with [`BookingError::ResponseShape`] when the first result has
    /// no booking token.
    pub async fn search_flight(
        &self,
        criteria: &SearchCriteria,
        result_limit: u32,
    ) -> Result<Offer> {
        let offer = self
            .search_offers(criteria, result_limit)
            .await?
            .into_first()
            .ok_or(BookingError::ResponseShape {
                endpoint: "search",
                field: "data[0].booking_token",
            })?;

        tracing::info!("booking_token = {}", offer.token);
        tracing::info!("Searched price = {} {}", offer.price, offer.currency);
        if let Some(d) = &offer.fly_duration {
            tracing::info!("Searched fly_duration = {}", d);
        }
        if offer.currency != criteria.currency() {
            tracing::warn!(
                "Search answered in {} but {} was requested",
                offer.currency,
                criteria.currency()
            );
        }
        Ok(offer)
    }

    /// Poll the check endpoint until the offer is confirmed.
    ///
    /// Stops at once when the API flags the flight invalid or a request
    /// fails. Gives up with [`BookingError::RetryExhausted`] after the
    /// configured number of attempts.
    pub async fn check_flight(&self, token: &str, currency: &str, bags: u8) -> Result<CheckStatus> {
        let query = check_query(
            token,
            currency,
            bags,
            &self.config.affiliate,
            self.config.api_version,
        );
        let url = build_url(&self.config.check_endpoint, &query);
        let url = url.as_str();
        let policy = &self.config.check_policy;
        let max_attempts = policy.max_attempts();

        let outcome = policy
            .poll_until(self.sleeper.as_ref(), |attempt| {
                self.check_once(url, attempt, max_attempts)
            })
            .await;

        let (reply, attempts) = match outcome {
            Ok(confirmed) => confirmed,
            Err(PollError::Exhausted { attempts }) => {
                return Err(BookingError::RetryExhausted { attempts });
            }
            Err(PollError::Aborted { error, .. }) => return Err(error),
        };

        match (&reply.price, &reply.currency) {
            (Some(price), Some(cur)) => tracing::info!("Checked price = {} {}", price, cur),
            _ => tracing::warn!("conversion amount/currency was not found in the check response"),
        }

        Ok(CheckStatus {
            checked: true,
            invalid: false,
            price: reply.price,
            currency: reply.currency,
            attempts,
        })
    }

    async fn check_once(
        &self,
        url: &str,
        attempt: u32,
        max_attempts: u32,
    ) -> Result<PollStep<(CheckReply, u32)>> {
        tracing::debug!("Check URL (attempt {}/{}): {}", attempt, max_attempts, url);
        let body = self.transport.get(url).await?;
        tracing::debug!("Check response: {}", body);

        let reply = CheckReply::from_json(&body)?;
        match reply.state() {
            CheckState::Confirmed => {
                tracing::info!(
                    "Successful check response: flights_checked = true, flights_invalid = false"
                );
                Ok(PollStep::Ready((reply, attempt)))
            }
            CheckState::Invalid => Err(BookingError::FlightInvalid { attempts: attempt }),
            CheckState::Pending => {
                tracing::info!(
                    "Unsuccessful check response: flights_checked = {:?}, flights_invalid = {:?}. Attempts left: {}",
                    reply.checked,
                    reply.invalid,
                    max_attempts - attempt
                );
                Ok(PollStep::Pending)
            }
        }
    }

    /// Submit the booking once. No retry, no rollback.
    pub async fn book_flight(
        &self,
        token: &str,
        currency: &str,
        passenger: &Passenger,
        bags: u8,
    ) -> Result<BookingResult> {
        let request = BookingRequest::new(token, currency, passenger, bags);
        let payload = serde_json::to_string(&request)?;
        tracing::debug!("Booking payload: {}", payload);

        let body = self
            .transport
            .post_json(&self.config.book_endpoint, &payload)
            .await?;
        tracing::debug!("Booking response: {}", body);

        let result = BookingResult::from_json(&body)?;
        tracing::info!("Booking status is confirmed. PNR: {}", result.pnr);
        Ok(result)
    }

    /// Search, check and book with the criteria's currency throughout.
    pub async fn run(&self, criteria: &SearchCriteria, passenger: &Passenger) -> Result<Booking> {
        tracing::info!("Searching flight...");
        let offer = self.search_flight(criteria, 1).await?;

        tracing::info!("Checking flight...");
        let check = self
            .check_flight(&offer.token, criteria.currency(), criteria.bags())
            .await?;

        match (check.price, check.currency.as_deref()) {
            (Some(checked), Some(cur)) if cur == offer.currency => {
                self.config
                    .price_policy
                    .enforce(offer.price, checked, cur)?;
            }
            (Some(_), Some(cur)) => tracing::info!(
                "Checked price is in {} but search was in {}, not comparing",
                cur,
                offer.currency
            ),
            _ => {}
        }

        tracing::info!("Booking flight...");
        let result = self
            .book_flight(&offer.token, criteria.currency(), passenger, criteria.bags())
            .await?;

        Ok(Booking {
            offer,
            check,
            result,
        })
    }
}
