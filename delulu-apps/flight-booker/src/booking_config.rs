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

//! # Booker Configuration
//!
//! Endpoints, fixed API tags and policies. Defaults match the public Kiwi
//! (Skypicker) API.

use std::time::Duration;

use delulu_poll_policies::PollPolicy;

use crate::booking_errors::{BookingError, Result};

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.skypicker.com/flights";
pub const DEFAULT_CHECK_ENDPOINT: &str =
    "https://booking-api.skypicker.com/api/v0.1/check_flights";
pub const DEFAULT_BOOK_ENDPOINT: &str = "http://128.199.48.38:8080/booking";

/// What to do when the checked price differs from the searched one.
///
/// Prices are only compared when both are in the same currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceChangePolicy {
    /// Book at whatever price the check returned
    #[default]
    Ignore,
    RejectIncrease,
    RejectAnyChange,
}

impl PriceChangePolicy {
    /// Returns an error if booking at `checked` violates the policy.
    pub fn enforce(&self, searched: f64, checked: f64, currency: &str) -> Result<()> {
        let violated = match self {
            PriceChangePolicy::Ignore => false,
            PriceChangePolicy::RejectIncrease => checked > searched,
            PriceChangePolicy::RejectAnyChange => (checked - searched).abs() > f64::EPSILON,
        };
        if violated {
            return Err(BookingError::PriceChanged {
                searched,
                checked,
                currency: currency.to_string(),
            });
        }
        Ok(())
    }
}

impl std::str::FromStr for PriceChangePolicy {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ignore" => Ok(PriceChangePolicy::Ignore),
            "reject-increase" | "increase" => Ok(PriceChangePolicy::RejectIncrease),
            "reject-any-change" | "any" => Ok(PriceChangePolicy::RejectAnyChange),
            _ => Err(BookingError::Validation(format!(
                "invalid price policy: {}. Use: ignore, reject-increase, reject-any-change",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookerConfig {
    pub search_endpoint: String,
    pub check_endpoint: String,
    pub book_endpoint: String,
    /// `partner` query value of the search endpoint
    pub partner: String,
    /// `affily` query value of the check endpoint
    pub affiliate: String,
    /// `v` query value of the check endpoint
    pub api_version: u32,
    pub check_policy: PollPolicy,
    pub http_timeout: Duration,
    pub price_policy: PriceChangePolicy,
}

impl Default for BookerConfig {
    fn default() -> Self {
        Self {
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            check_endpoint: DEFAULT_CHECK_ENDPOINT.to_string(),
            book_endpoint: DEFAULT_BOOK_ENDPOINT.to_string(),
            partner: "picky".to_string(),
            affiliate: "picky_us".to_string(),
            api_version: 2,
            check_policy: PollPolicy::fixed(30, Duration::from_secs(10)),
            http_timeout: Duration::from_secs(30),
            price_policy: PriceChangePolicy::Ignore,
        }
    }
}

impl BookerConfig {
    pub fn with_endpoints(
        mut self,
        search: impl Into<String>,
        check: impl Into<String>,
        book: impl Into<String>,
    ) -> Self {
        self.search_endpoint = search.into();
        self.check_endpoint = check.into();
        self.book_endpoint = book.into();
        self
    }

    pub fn with_check_policy(mut self, policy: PollPolicy) -> Self {
        self.check_policy = policy;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_price_policy(mut self, policy: PriceChangePolicy) -> Self {
        self.price_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BookerConfig::default();
        assert_eq!(config.check_policy.max_attempts(), 30);
        assert_eq!(config.check_policy.delay(), Duration::from_secs(10));
        assert_eq!(config.api_version, 2);
        assert_eq!(config.price_policy, PriceChangePolicy::Ignore);
    }

    #[test]
    fn test_price_policy() {
        assert!(PriceChangePolicy::Ignore.enforce(100.0, 150.0, "EUR").is_ok());
        assert!(PriceChangePolicy::RejectIncrease.enforce(100.0, 90.0, "EUR").is_ok());
        assert!(PriceChangePolicy::RejectIncrease.enforce(100.0, 105.0, "EUR").is_err());
        assert!(PriceChangePolicy::RejectAnyChange.enforce(100.0, 100.0, "EUR").is_ok());
        assert!(PriceChangePolicy::RejectAnyChange.enforce(100.0, 90.0, "EUR").is_err());
    }

    #[test]
    fn test_price_policy_parse() {
        assert_eq!(
            "reject-increase".parse::<PriceChangePolicy>().unwrap(),
            PriceChangePolicy::RejectIncrease
        );
        assert!("sometimes".parse::<PriceChangePolicy>().is_err());
    }
}
