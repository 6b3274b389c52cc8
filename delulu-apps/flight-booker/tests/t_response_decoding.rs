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

//! Decoding of recorded booking API payloads.
//!
//! Each case pins which fields are required and which are best effort, so a
//! change in the remote schema shows up here first.
//!
//! Run with:
//!     cargo test --test t_response_decoding

use delulu_flight_booker::{
    BookingError, BookingResult, CheckReply, CheckState, SearchResults, SortBy, offers_are_ordered,
};

/// A trimmed search payload with three results sorted by price.
const SEARCH_THREE_RESULTS: &str = r#"{
    "search_id": "3b6d5d0e",
    "currency": "CZK",
    "_results": 212,
    "data": [
        {"booking_token": "tok-1", "price": 1524, "fly_duration": "2h 05m", "duration": {"total": 7500}},
        {"booking_token": "tok-2", "price": 1610.5, "fly_duration": "1h 50m", "duration": {"total": 6600}},
        {"booking_token": "tok-3", "price": 2210, "fly_duration": "6h 40m", "duration": {"total": 24000}}
    ]
}"#;

struct CheckCase {
    body: &'static str,
    state: CheckState,
    description: &'static str,
}

const CHECK_CASES: &[CheckCase] = &[
    CheckCase {
        body: r#"{"flights_checked": true, "flights_invalid": false}"#,
        state: CheckState::Confirmed,
        description: "checked and valid",
    },
    CheckCase {
        body: r#"{"flights_checked": false, "flights_invalid": false, "conversion": {"amount": 0}}"#,
        state: CheckState::Pending,
        description: "not checked yet",
    },
    CheckCase {
        body: r#"{"flights_checked": false, "flights_invalid": true}"#,
        state: CheckState::Invalid,
        description: "invalid before check",
    },
    CheckCase {
        body: r#"{"flights_checked": true, "flights_invalid": true}"#,
        state: CheckState::Invalid,
        description: "invalid wins over checked",
    },
    CheckCase {
        body: r#"{"flights_invalid": false}"#,
        state: CheckState::Pending,
        description: "checked flag missing",
    },
];

#[test]
fn test_search_payload() {
    let results = SearchResults::from_json(SEARCH_THREE_RESULTS, "EUR").expect("decode search");

    assert_eq!(results.total_results, Some(212));
    assert_eq!(results.currency.as_deref(), Some("CZK"));
    assert_eq!(results.offers.len(), 3);

    let first = &results.offers[0];
    assert_eq!(first.token, "tok-1");
    assert_eq!(first.price, 1524.0);
    assert_eq!(first.currency, "CZK");
    assert_eq!(first.duration_minutes, Some(125));
    assert_eq!(first.total_duration_secs, Some(7500));

    assert!(offers_are_ordered(&results.offers, SortBy::Price));
    assert!(!offers_are_ordered(&results.offers, SortBy::Duration));
}

#[test]
fn test_search_skips_later_results_without_token() {
    let body = r#"{"currency":"EUR","data":[
        {"booking_token":"a","price":1},
        {"price":2},
        {"booking_token":"c","price":3}
    ]}"#;
    let results = SearchResults::from_json(body, "EUR").unwrap();
    let tokens: Vec<_> = results.offers.iter().map(|o| o.token.as_str()).collect();
    assert_eq!(tokens, vec!["a", "c"]);
}

#[test]
fn test_search_wrong_types_fail() {
    let err = SearchResults::from_json(r#"{"data": "nope"}"#, "EUR").unwrap_err();
    assert!(matches!(err, BookingError::Transport(_)), "{:?}", err);
}

#[test]
fn test_check_cases() {
    for case in CHECK_CASES {
        println!("Check case: {}", case.description);
        let reply = CheckReply::from_json(case.body).expect("decode check");
        assert_eq!(reply.state(), case.state, "{}", case.description);
    }
}

#[test]
fn test_check_conversion_is_best_effort() {
    let reply = CheckReply::from_json(
        r#"{"flights_checked":true,"flights_invalid":false,"conversion":{"currency":"EUR"}}"#,
    )
    .unwrap();
    assert_eq!(reply.state(), CheckState::Confirmed);
    assert_eq!(reply.currency.as_deref(), Some("EUR"));
    assert_eq!(reply.price, None);
}

#[test]
fn test_book_payloads() {
    let ok = BookingResult::from_json(r#"{"status":"confirmed","pnr":"XYZ123","price":105}"#)
        .expect("confirmed booking");
    assert_eq!(ok.pnr, "XYZ123");

    let err = BookingResult::from_json(r#"{"status":"confirmed","pnr":""}"#).unwrap_err();
    assert!(matches!(err, BookingError::BookingRejected { .. }));

    let err = BookingResult::from_json("Internal Server Error").unwrap_err();
    assert!(matches!(err, BookingError::Transport(_)));
}
