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

//! Live integration tests against the public search and check endpoints.
//!
//! These make actual HTTP requests. Nothing is ever booked: the check loop
//! runs with a short budget and the booking endpoint is never called.
//!
//! Run with: cargo test --test t_booking_integration_live -- --include-ignored

use anyhow::Result;
use chrono::{Months, NaiveDate};
use delulu_flight_booker::{
    BookerConfig, BookingError, BookingOrchestrator, PollPolicy, SearchCriteria, SortBy,
    offers_are_ordered,
};
use std::time::Duration;

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn next_month() -> NaiveDate {
    today() + Months::new(1)
}

fn is_transient(e: &BookingError) -> bool {
    matches!(e, BookingError::Transport(_))
}

#[tokio::test]
#[ignore]
async fn test_real_search_is_sorted() -> Result<()> {
    let orchestrator = BookingOrchestrator::new(BookerConfig::default())?;

    for sort_by in [SortBy::Price, SortBy::Duration] {
        let criteria = SearchCriteria::builder("PRG", "LHR", next_month())
            .sort_by(sort_by)
            .currency("EUR")
            .build()?;

        match orchestrator.search_offers(&criteria, 20).await {
            Ok(results) => {
                println!("{:?}: {} offers", sort_by, results.offers.len());
                assert!(
                    offers_are_ordered(&results.offers, sort_by),
                    "results not ordered by {:?}",
                    sort_by
                );
            }
            Err(e) if is_transient(&e) => {
                println!("⚠ Transient network error: {}", e);
                return Ok(());
            }
            Err(e) => anyhow::bail!("Unexpected error: {}", e),
        }
    }
    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_real_search_then_check() -> Result<()> {
    let config = BookerConfig::default()
        .with_check_policy(PollPolicy::fixed(3, Duration::from_secs(5)));
    let orchestrator = BookingOrchestrator::new(config)?;

    let criteria = SearchCriteria::builder("BCN", "DUB", next_month())
        .return_nights(Some(5))
        .currency("EUR")
        .build()?;

    let offer = match orchestrator.search_flight(&criteria, 1).await {
        Ok(offer) => offer,
        Err(e) if is_transient(&e) => {
            println!("⚠ Transient network error: {}", e);
            return Ok(());
        }
        Err(e) => anyhow::bail!("Unexpected error: {}", e),
    };
    println!("Offer: {} {} ({:?})", offer.price, offer.currency, offer.fly_duration);

    match orchestrator
        .check_flight(&offer.token, criteria.currency(), criteria.bags())
        .await
    {
        Ok(status) => println!("✓ Checked after {} attempts: {:?}", status.attempts, status.price),
        Err(BookingError::RetryExhausted { attempts }) => {
            println!("⚠ Still unchecked after {} attempts", attempts)
        }
        Err(BookingError::FlightInvalid { .. }) => println!("⚠ Offer expired before check"),
        Err(e) if is_transient(&e) => println!("⚠ Transient network error: {}", e),
        Err(e) => anyhow::bail!("Unexpected error: {}", e),
    }
    Ok(())
}
