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

//! # Booking Errors
//!
//! Every failure of the search → check → book flow. Each operation returns
//! the first one it hits and the caller aborts the run.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BookingError {
    /// Bad operator input, rejected before any request is sent
    #[error("invalid input: {0}")]
    Validation(String),

    /// Network failure, HTTP error status or a body that is not JSON
    #[error("transport error: {0}")]
    Transport(String),

    /// JSON decoded but a required field is missing or empty
    #[error("{endpoint} response is missing `{field}`")]
    ResponseShape {
        endpoint: &'static str,
        field: &'static str,
    },

    #[error("flight is not bookable anymore (flights_invalid after {attempts} attempts)")]
    FlightInvalid { attempts: u32 },

    #[error("flight still unchecked after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    #[error("booking rejected (status: {status:?}): {reason}")]
    BookingRejected {
        status: Option<String>,
        reason: String,
    },

    #[error("price changed from {searched} to {checked} {currency}")]
    PriceChanged {
        searched: f64,
        checked: f64,
        currency: String,
    },
}

impl From<wreq::Error> for BookingError {
    fn from(e: wreq::Error) -> Self {
        BookingError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for BookingError {
    fn from(e: serde_json::Error) -> Self {
        BookingError::Transport(format!("invalid JSON received: {}", e))
    }
}

pub type Result<T, E = BookingError> = std::result::Result<T, E>;
