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

//! # API Responses
//!
//! Side-effect free decoding of the search, check and book payloads.
//!
//! The remote JSON is loosely typed, so every field is decoded as optional
//! and this module alone decides which ones are required (missing means a
//! [`BookingError`]) and which are best effort (missing means a warning).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::booking_errors::{BookingError, Result};
use crate::flights_criteria::SortBy;

static DURATION_H_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*h").unwrap());
static DURATION_M_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*m").unwrap());

fn decode<T: DeserializeOwned>(endpoint: &'static str, body: &str) -> Result<T> {
    let value: Value = serde_json::from_str(body)?;
    serde_json::from_value(value)
        .map_err(|e| BookingError::Transport(format!("unexpected {} payload: {}", endpoint, e)))
}

/// `deserialize_with` for best-effort fields: a value of the wrong JSON type
/// decodes as `None` instead of failing the whole payload.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            tracing::warn!("ignoring best-effort field: {}", e);
            Ok(None)
        }
    }
}

/// Like [`lenient`] but also reads amounts sent as strings (`"105.00"`).
fn lenient_amount<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(amount) if amount.is_finite() => Ok(Some(amount)),
            _ => {
                tracing::warn!("ignoring amount that is not a number: {:?}", s);
                Ok(None)
            }
        },
        Some(other) => {
            tracing::warn!("ignoring amount that is not a number: {}", other);
            Ok(None)
        }
    }
}

/// Parse `fly_duration` strings such as `"5h"`, `"2h 35m"` or `"45m"` into minutes.
///
/// Returns `None` when nothing matches or the total does not fit in a `u32`.
pub fn parse_fly_duration(s: &str) -> Option<u32> {
    let field = |re: &Regex| {
        re.captures(s)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().parse::<u32>().ok())
    };

    match (field(&DURATION_H_RE), field(&DURATION_M_RE)) {
        (None, None) => None,
        (h, m) => h
            .unwrap_or(Some(0))?
            .checked_mul(60)?
            .checked_add(m.unwrap_or(Some(0))?),
    }
}

// =============================================================================
// Search
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawSearchResponse {
    #[serde(default)]
    data: Vec<RawFlight>,
    #[serde(default, deserialize_with = "lenient")]
    currency: Option<String>,
    #[serde(rename = "_results", default, deserialize_with = "lenient")]
    results: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawFlight {
    booking_token: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    price: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    fly_duration: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    duration: Option<RawDuration>,
}

#[derive(Debug, Deserialize)]
struct RawDuration {
    #[serde(default, deserialize_with = "lenient")]
    total: Option<u64>,
}

/// A priced itinerary returned by search. Valid until the API expires the token.
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub token: String,
    pub price: f64,
    pub currency: String,
    pub fly_duration: Option<String>,
    pub duration_minutes: Option<u32>,
    pub total_duration_secs: Option<u64>,
}

impl Offer {
    /// Ordering key for [`SortBy::Duration`]: total seconds when the API
    /// reports them, otherwise the parsed `fly_duration`.
    pub fn duration_key(&self) -> Option<u64> {
        self.total_duration_secs
            .or_else(|| self.duration_minutes.map(|m| m as u64 * 60))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    pub offers: Vec<Offer>,
    pub currency: Option<String>,
    pub total_results: Option<u64>,
}

impl SearchResults {
    /// Decode a search payload.
    ///
    /// The first result must carry a booking token. Later results without
    /// one are skipped. `requested_currency` stands in when the payload has
    /// no top-level `currency`.
    pub fn from_json(body: &str, requested_currency: &str) -> Result<Self> {
        let raw: RawSearchResponse = decode("search", body)?;

        let first_has_token = raw
            .data
            .first()
            .and_then(|f| f.booking_token.as_deref())
            .is_some_and(|t| !t.is_empty());
        if !first_has_token {
            return Err(BookingError::ResponseShape {
                endpoint: "search",
                field: "data[0].booking_token",
            });
        }

        let currency = match &raw.currency {
            Some(c) => c.clone(),
            None => {
                tracing::warn!(
                    "currency not found in search response, assuming {}",
                    requested_currency
                );
                requested_currency.to_string()
            }
        };

        let mut offers = Vec::with_capacity(raw.data.len());
        for (idx, flight) in raw.data.into_iter().enumerate() {
            let token = match flight.booking_token {
                Some(t) if !t.is_empty() => t,
                _ => {
                    tracing::warn!("search result #{} has no booking_token, skipping", idx);
                    continue;
                }
            };
            if flight.price.is_none() {
                tracing::warn!("price not found in search result #{}", idx);
            }
            if flight.fly_duration.is_none() {
                tracing::debug!("fly_duration not found in search result #{}", idx);
            }
            let duration_minutes = flight.fly_duration.as_deref().and_then(parse_fly_duration);
            offers.push(Offer {
                token,
                price: flight.price.unwrap_or(0.0),
                currency: currency.clone(),
                fly_duration: flight.fly_duration,
                duration_minutes,
                total_duration_secs: flight.duration.and_then(|d| d.total),
            });
        }

        Ok(Self {
            offers,
            currency: raw.currency,
            total_results: raw.results,
        })
    }

    pub fn into_first(self) -> Option<Offer> {
        self.offers.into_iter().next()
    }
}

/// True when offers are in non-decreasing order of the sort key.
/// Offers without a duration are ignored when checking duration order.
pub fn offers_are_ordered(offers: &[Offer], sort_by: SortBy) -> bool {
    match sort_by {
        SortBy::Price => offers.windows(2).all(|w| w[0].price <= w[1].price),
        SortBy::Duration => {
            let keys: Vec<u64> = offers.iter().filter_map(Offer::duration_key).collect();
            keys.windows(2).all(|w| w[0] <= w[1])
        }
    }
}

// =============================================================================
// Check
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawCheckResponse {
    flights_checked: Option<bool>,
    flights_invalid: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    conversion: Option<RawConversion>,
}

#[derive(Debug, Deserialize)]
struct RawConversion {
    #[serde(default, deserialize_with = "lenient")]
    currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    amount: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Confirmed,
    Invalid,
    Pending,
}

/// One decoded answer of the check endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReply {
    pub checked: Option<bool>,
    pub invalid: Option<bool>,
    pub price: Option<f64>,
    pub currency: Option<String>,
}

impl CheckReply {
    pub fn from_json(body: &str) -> Result<Self> {
        let raw: RawCheckResponse = decode("check", body)?;

        if raw.flights_checked.is_none() {
            tracing::warn!("flights_checked was not found in the check response");
        }
        if raw.flights_invalid.is_none() {
            tracing::warn!("flights_invalid was not found in the check response");
        }

        let (price, currency) = match raw.conversion {
            Some(c) => (c.amount, c.currency),
            None => (None, None),
        };

        Ok(Self {
            checked: raw.flights_checked,
            invalid: raw.flights_invalid,
            price,
            currency,
        })
    }

    pub fn state(&self) -> CheckState {
        match (self.checked, self.invalid) {
            (_, Some(true)) => CheckState::Invalid,
            (Some(true), Some(false)) => CheckState::Confirmed,
            _ => CheckState::Pending,
        }
    }
}

/// Final state of a successful check
#[derive(Debug, Clone, PartialEq)]
pub struct CheckStatus {
    pub checked: bool,
    pub invalid: bool,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub attempts: u32,
}

// =============================================================================
// Book
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawBookResponse {
    status: Option<String>,
    pnr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingStatus {
    Confirmed,
    Other(String),
}

impl BookingStatus {
    fn from_raw(status: &str) -> Self {
        if status == "confirmed" {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Other(status.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingResult {
    pub status: BookingStatus,
    pub pnr: String,
}

impl BookingResult {
    /// Decode a book payload. Anything but a confirmed status with a PNR is
    /// a rejection.
    pub fn from_json(body: &str) -> Result<Self> {
        let raw: RawBookResponse = decode("book", body)?;

        let status = match raw.status.as_deref() {
            Some(s) => BookingStatus::from_raw(s),
            None => {
                return Err(BookingError::BookingRejected {
                    status: None,
                    reason: "response doesn't contain confirmation status".to_string(),
                });
            }
        };

        if let BookingStatus::Other(s) = &status {
            return Err(BookingError::BookingRejected {
                status: Some(s.clone()),
                reason: "booking status is not confirmed".to_string(),
            });
        }

        match raw.pnr {
            Some(pnr) if !pnr.is_empty() => Ok(Self { status, pnr }),
            _ => Err(BookingError::BookingRejected {
                status: raw.status,
                reason: "response doesn't contain PNR code".to_string(),
            }),
        }
    }
}
