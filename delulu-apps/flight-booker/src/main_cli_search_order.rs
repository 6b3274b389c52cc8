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

//! CLI that fetches many offers for a route and checks that the API
//! returned them cheapest-first (or fastest-first with `--fastest`).

use anyhow::{Context, Result, ensure};
use chrono::NaiveDate;
use clap::Parser;
use delulu_flight_booker::{
    BookerConfig, BookingOrchestrator, MAX_BAGS, Offer, SearchCriteria, SortBy, offers_are_ordered,
};
use std::process::ExitCode;

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "delulu-search-order")]
#[command(author, version, about = "Checks the ordering of flight search results", long_about = None)]
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
    #[arg(long, default_value = "0")]
    bags: u8,

    /// Return flight after this many nights
    #[arg(long = "return", value_name = "NIGHTS")]
    return_nights: Option<u32>,

    /// Sort by duration instead of price
    #[arg(long)]
    fastest: bool,

    #[arg(long, default_value = "CZK")]
    currency: String,

    /// Number of search results to fetch
    #[arg(long, default_value = "50")]
    limit: u32,

    /// Verbose output
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

/// Configure logging based on verbosity level
fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Format duration in hours/minutes.
fn fmt_duration(offer: &Offer) -> String {
    match offer.duration_key() {
        Some(secs) => {
            let minutes = secs / 60;
            format!("{}h {:02}m", minutes / 60, minutes % 60)
        }
        None => "??".to_string(),
    }
}

async fn check_order(args: &CliArgs) -> Result<bool> {
    ensure!(
        args.bags <= MAX_BAGS,
        "Invalid bags count {} (maximum is {} per passenger)",
        args.bags,
        MAX_BAGS
    );
    let sort_by = if args.fastest {
        SortBy::Duration
    } else {
        SortBy::Price
    };
    let depart_date = NaiveDate::parse_from_str(&args.date, "%Y-%m-%d")
        .context(format!("Invalid date format: {}. Use YYYY-MM-DD", args.date))?;

    let criteria = SearchCriteria::builder(&args.from_iata, &args.to_iata, depart_date)
        .bags(args.bags)
        .return_nights(args.return_nights)
        .sort_by(sort_by)
        .currency(&args.currency)
        .build()
        .context("Failed to build search criteria")?;

    let orchestrator = BookingOrchestrator::new(BookerConfig::default())?;
    let results = orchestrator
        .search_offers(&criteria, args.limit)
        .await
        .context("Search failed")?;

    println!(
        "Found {} results ({} returned):\n",
        results
            .total_results
            .map_or("?".to_string(), |n| n.to_string()),
        results.offers.len()
    );
    for (i, offer) in results.offers.iter().enumerate() {
        println!(
            "  {:>3}  {:>10.2} {}  {:>8}",
            i + 1,
            offer.price,
            offer.currency,
            fmt_duration(offer)
        );
    }

    let ordered = offers_are_ordered(&results.offers, sort_by);
    let key = match sort_by {
        SortBy::Price => "CHEAPEST",
        SortBy::Duration => "FASTEST",
    };
    if ordered {
        println!("\nOK: {} flights searched and results are ordered", key);
    } else {
        println!("\nERROR: {} flights searched BUT results are NOT ordered!", key);
    }
    Ok(ordered)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    setup_logging(args.verbose);

    match check_order(&args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
