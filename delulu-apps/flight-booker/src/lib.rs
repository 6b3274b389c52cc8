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

// Library for delulu-flight-booker
// Search, check and book flights through the Kiwi booking API

mod api_responses;
mod booking_config;
mod booking_errors;
mod booking_orchestrator;
mod flights_criteria;
mod transport;

pub use api_responses::{
    BookingResult, BookingStatus, CheckReply, CheckState, CheckStatus, Offer, SearchResults,
    offers_are_ordered, parse_fly_duration,
};
pub use booking_config::{
    BookerConfig, DEFAULT_BOOK_ENDPOINT, DEFAULT_CHECK_ENDPOINT, DEFAULT_SEARCH_ENDPOINT,
    PriceChangePolicy,
};
pub use booking_errors::{BookingError, Result};
pub use booking_orchestrator::{Booking, BookingOrchestrator};
pub use flights_criteria::{
    API_DATE_FORMAT, BookingRequest, MAX_BAGS, Passenger, SearchCriteria, SearchCriteriaBuilder,
    SortBy, TripType, build_url, check_query,
};
pub use transport::{HttpTransport, Transport};

// Re-export the polling seams so callers can tune or fake the check loop
pub use delulu_poll_policies::{PollPolicy, RecordingSleeper, Sleeper, TokioSleeper};
