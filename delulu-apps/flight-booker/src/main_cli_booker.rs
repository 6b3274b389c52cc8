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

//! CLI that searches, checks and books a single flight.
//!
//! Prints the PNR on success. On any failure prints `0` and exits non-zero;
//! details go to stderr only with `--verbose` or `--debug`.

use anyhow::{Context, Result, bail, ensure};
use chrono::NaiveDate;
use clap::Parser;
use delulu_flight_booker::{
    BookerConfig, BookingOrchestrator, MAX_BAGS, Passenger, PollPolicy, PriceChangePolicy,
    SearchCriteria, SortBy,
};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Printed instead of a PNR when anything goes wrong
const ERROR_SENTINEL: &str = "0";

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "delulu-book-flight")]
#[command(author, version, about = "Finds and books a flight", long_about = None)]
struct CliArgs {
    /// Departure date (YYYY-MM-DD)
    #[arg(long)]
    date: String,

    /// IATA code of the departure airport
    #[arg(long = "from")]
    from_iata: String,

    /// IATA code of the arrival airport
    #[arg(long = "to")]
    to_iata: String,

    /// Number of checked bags
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    bags: i64,

    /// One-way flight (default)
    #[arg(long, conflicts_with = "return_nights")]
    one_way: bool,

    /// Return flight after this many nights
    #[arg(long = "return", value_name = "NIGHTS", allow_negative_numbers = true)]
    return_nights: Option<i64>,

    /// Choose the cheapest flight (default)
    #[arg(long, conflicts_with = "fastest")]
    cheapest: bool,

    /// Choose the fastest flight
    #[arg(long)]
    fastest: bool,

    /// Currency used for search, check and booking
    #[arg(long, default_value = "CZK")]
    currency: String,

    /// What to do if the checked price differs: ignore, reject-increase, reject-any-change
    #[arg(long, default_value = "ignore")]
    price_policy: String,

    /// How many times to ask the API whether the flight is checked
    #[arg(long, default_value = "30")]
    check_attempts: u32,

    /// Seconds to wait between check attempts
    #[arg(long, default_value = "10")]
    check_wait_secs: u64,

    /// Passenger identity document number
    #[arg(long, default_value = "001")]
    document_id: String,

    #[arg(long, default_value = "Kryton")]
    first_name: String,

    #[arg(long, default_value = "2X4C")]
    last_name: String,

    /// Passenger birthday (YYYY-MM-DD)
    #[arg(long, default_value = "2980-04-06")]
    birthday: String,

    #[arg(long, default_value = "Mr")]
    title: String,

    #[arg(long, default_value = "kryton@reddwarf.space")]
    email: String,

    /// Print progress to stderr
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Print request and response payloads to stderr
    #[arg(long, default_value = "false")]
    debug: bool,
}

/// Configure logging based on verbosity level. Silent unless asked.
fn setup_logging(verbose: bool, debug: bool) {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        return;
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.to_string().into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Parse date string to NaiveDate
fn parse_date(s: &str, what: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .context(format!("Invalid {} date: {}. Use YYYY-MM-DD", what, s))
}

fn parse_bags(bags: i64) -> Result<u8> {
    ensure!(bags >= 0, "Invalid bags count {} (antimatter on board is not allowed)", bags);
    ensure!(
        bags <= MAX_BAGS as i64,
        "Invalid bags count {} (maximum is {} per passenger)",
        bags,
        MAX_BAGS
    );
    Ok(bags as u8)
}

fn parse_return_nights(nights: Option<i64>) -> Result<Option<u32>> {
    match nights {
        None => Ok(None),
        Some(n) if n < 0 => {
            bail!("Invalid nights count {} (time travel into the past is not allowed)", n)
        }
        Some(n) => Ok(Some(u32::try_from(n).context("Nights count is too large")?)),
    }
}

fn passenger_from_args(args: &CliArgs) -> Result<Passenger> {
    Ok(Passenger {
        document_id: args.document_id.clone(),
        last_name: args.last_name.clone(),
        first_name: args.first_name.clone(),
        birthday: parse_date(&args.birthday, "birthday")?,
        title: args.title.clone(),
        email: args.email.clone(),
    })
}

async fn book(args: &CliArgs) -> Result<String> {
    let sort_by = if args.fastest {
        SortBy::Duration
    } else {
        SortBy::Price
    };

    let criteria = SearchCriteria::builder(
        &args.from_iata,
        &args.to_iata,
        parse_date(&args.date, "departure")?,
    )
    .bags(parse_bags(args.bags)?)
    .return_nights(parse_return_nights(args.return_nights)?)
    .sort_by(sort_by)
    .currency(&args.currency)
    .build()
    .context("Failed to build search criteria")?;

    let passenger = passenger_from_args(args)?;
    let price_policy: PriceChangePolicy = args.price_policy.parse()?;

    let config = BookerConfig::default()
        .with_check_policy(PollPolicy::fixed(
            args.check_attempts,
            Duration::from_secs(args.check_wait_secs),
        ))
        .with_price_policy(price_policy);

    tracing::info!("Parsed request: {:?}", criteria);

    let orchestrator = BookingOrchestrator::new(config).context("Failed to build HTTP client")?;
    let booking = orchestrator.run(&criteria, &passenger).await?;

    tracing::info!(
        "Booked {} -> {} for {} {} after {} check attempts",
        criteria.from_airport(),
        criteria.to_airport(),
        booking.check.price.unwrap_or(booking.offer.price),
        booking
            .check
            .currency
            .as_deref()
            .unwrap_or(&booking.offer.currency),
        booking.check.attempts
    );

    Ok(booking.result.pnr)
}

/// The single stdout line: the PNR, or the sentinel on failure
fn output_line(outcome: &Result<String>) -> &str {
    match outcome {
        Ok(pnr) => pnr,
        Err(_) => ERROR_SENTINEL,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    setup_logging(args.verbose, args.debug);

    tracing::debug!("Args: {:?}", args);

    let outcome = book(&args).await;
    if let Err(e) = &outcome {
        tracing::error!("{:#}", e);
    }
    println!("{}", output_line(&outcome));

    if outcome.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
