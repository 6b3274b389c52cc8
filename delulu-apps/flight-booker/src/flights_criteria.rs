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

//! # Flights Criteria
//!
//! Side-effect free request building for the search, check and book
//! endpoints. Nothing in here touches the network.

use chrono::{Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::booking_errors::{BookingError, Result};

/// Maximum checked bags per passenger accepted by the booking API
pub const MAX_BAGS: u8 = 4;

/// Date layout the search endpoint expects
pub const API_DATE_FORMAT: &str = "%d/%m/%Y";

static IATA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]{3}$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Price,
    Duration,
}

impl SortBy {
    pub fn as_query(&self) -> &'static str {
        match self {
            SortBy::Price => "price",
            SortBy::Duration => "duration",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripType {
    OneWay,
    Round,
}

impl TripType {
    pub fn as_query(&self) -> &'static str {
        match self {
            TripType::OneWay => "oneway",
            TripType::Round => "round",
        }
    }
}

/// What to look for. Only [`SearchCriteriaBuilder::build`] makes one, so
/// every instance holds validated, uppercased codes.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    from_airport: String,
    to_airport: String,
    depart_date: NaiveDate,
    return_nights: Option<u32>,
    bags: u8,
    sort_by: SortBy,
    currency: String,
}

impl SearchCriteria {
    pub fn builder(
        from_airport: impl Into<String>,
        to_airport: impl Into<String>,
        depart_date: NaiveDate,
    ) -> SearchCriteriaBuilder {
        SearchCriteriaBuilder {
            from_airport: from_airport.into(),
            to_airport: to_airport.into(),
            depart_date,
            return_nights: None,
            bags: 0,
            sort_by: SortBy::Price,
            currency: "EUR".to_string(),
        }
    }

    pub fn from_airport(&self) -> &str {
        &self.from_airport
    }

    pub fn to_airport(&self) -> &str {
        &self.to_airport
    }

    pub fn depart_date(&self) -> NaiveDate {
        self.depart_date
    }

    /// Nights before the return flight, `None` for a one-way trip
    pub fn return_nights(&self) -> Option<u32> {
        self.return_nights
    }

    pub fn bags(&self) -> u8 {
        self.bags
    }

    pub fn sort_by(&self) -> SortBy {
        self.sort_by
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn trip_type(&self) -> TripType {
        match self.return_nights {
            Some(_) => TripType::Round,
            None => TripType::OneWay,
        }
    }

    pub fn return_date(&self) -> Option<NaiveDate> {
        self.return_nights
            .and_then(|n| self.depart_date.checked_add_days(Days::new(n as u64)))
    }

    /// Query parameters for the search endpoint, in a stable order.
    pub fn search_query(&self, limit: u32, partner: &str) -> Vec<(&'static str, String)> {
        let depart = self.depart_date.format(API_DATE_FORMAT).to_string();

        let mut query = vec![
            ("flyFrom", self.from_airport.clone()),
            ("to", self.to_airport.clone()),
            ("dateFrom", depart.clone()),
            ("dateTo", depart),
        ];

        if let Some(ret) = self.return_date() {
            let ret = ret.format(API_DATE_FORMAT).to_string();
            query.push(("returnFrom", ret.clone()));
            query.push(("returnTo", ret));
        }

        query.extend([
            ("typeFlight", self.trip_type().as_query().to_string()),
            ("sort", self.sort_by.as_query().to_string()),
            ("asc", "1".to_string()),
            ("limit", limit.max(1).to_string()),
            ("curr", self.currency.clone()),
            ("partner", partner.to_string()),
        ]);
        query
    }
}

#[derive(Clone, Debug)]
pub struct SearchCriteriaBuilder {
    from_airport: String,
    to_airport: String,
    depart_date: NaiveDate,
    return_nights: Option<u32>,
    bags: u8,
    sort_by: SortBy,
    currency: String,
}

impl SearchCriteriaBuilder {
    pub fn return_nights(mut self, nights: Option<u32>) -> Self {
        self.return_nights = nights;
        self
    }

    pub fn bags(mut self, bags: u8) -> Self {
        self.bags = bags;
        self
    }

    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn build(self) -> Result<SearchCriteria> {
        let from_airport = validate_iata(&self.from_airport, "origin")?;
        let to_airport = validate_iata(&self.to_airport, "destination")?;

        if self.bags > MAX_BAGS {
            return Err(BookingError::Validation(format!(
                "invalid bags count {} (maximum is {} per passenger)",
                self.bags, MAX_BAGS
            )));
        }

        let currency = self.currency.trim().to_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(BookingError::Validation(format!(
                "invalid currency code: {:?}",
                self.currency
            )));
        }

        let criteria = SearchCriteria {
            from_airport,
            to_airport,
            depart_date: self.depart_date,
            return_nights: self.return_nights,
            bags: self.bags,
            sort_by: self.sort_by,
            currency,
        };

        if criteria.return_nights.is_some() && criteria.return_date().is_none() {
            return Err(BookingError::Validation(
                "return date is out of range".to_string(),
            ));
        }

        Ok(criteria)
    }
}

fn validate_iata(code: &str, which: &str) -> Result<String> {
    let code = code.trim();
    if !IATA_RE.is_match(code) {
        return Err(BookingError::Validation(format!(
            "invalid IATA code for {}: {:?}",
            which, code
        )));
    }
    Ok(code.to_uppercase())
}

/// Query parameters for the check endpoint. Always a single passenger.
pub fn check_query(
    token: &str,
    currency: &str,
    bags: u8,
    affiliate: &str,
    api_version: u32,
) -> Vec<(&'static str, String)> {
    vec![
        ("booking_token", token.to_string()),
        ("bnum", bags.to_string()),
        ("currency", currency.to_string()),
        ("pnum", "1".to_string()),
        ("affily", affiliate.to_string()),
        ("v", api_version.to_string()),
    ]
}

/// Append percent-encoded query parameters to an endpoint URL.
pub fn build_url(endpoint: &str, query: &[(&str, String)]) -> String {
    if query.is_empty() {
        return endpoint.to_string();
    }
    let encoded = query
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    let sep = if endpoint.contains('?') { '&' } else { '?' };
    format!("{}{}{}", endpoint, sep, encoded)
}

/// The traveller. Used only when booking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Passenger {
    #[serde(rename = "documentID")]
    pub document_id: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(with = "birthday_format")]
    pub birthday: NaiveDate,
    pub title: String,
    pub email: String,
}

mod birthday_format {
    use chrono::NaiveDate;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format("%Y-%m-%d").to_string())
    }
}

/// JSON body of the book endpoint
#[derive(Debug, Serialize)]
pub struct BookingRequest<'a> {
    pub currency: &'a str,
    pub passengers: [&'a Passenger; 1],
    pub booking_token: &'a str,
    pub bags: u8,
}

impl<'a> BookingRequest<'a> {
    pub fn new(token: &'a str, currency: &'a str, passenger: &'a Passenger, bags: u8) -> Self {
        Self {
            currency,
            passengers: [passenger],
            booking_token: token,
            bags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn lookup<'a>(query: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_one_way_query() {
        let criteria = SearchCriteria::builder("prg", "lhr", date(2024, 6, 1))
            .currency("czk")
            .build()
            .unwrap();

        assert_eq!(criteria.from_airport(), "PRG");
        assert_eq!(criteria.currency(), "CZK");

        let query = criteria.search_query(1, "picky");
        assert_eq!(lookup(&query, "dateFrom"), Some("01/06/2024"));
        assert_eq!(lookup(&query, "dateTo"), Some("01/06/2024"));
        assert_eq!(lookup(&query, "typeFlight"), Some("oneway"));
        assert_eq!(lookup(&query, "sort"), Some("price"));
        assert_eq!(lookup(&query, "asc"), Some("1"));
        assert_eq!(lookup(&query, "limit"), Some("1"));
        assert_eq!(lookup(&query, "partner"), Some("picky"));
        assert!(lookup(&query, "returnFrom").is_none());
    }

    #[test]
    fn test_round_trip_dates() {
        let criteria = SearchCriteria::builder("BCN", "DUB", date(2024, 6, 1))
            .return_nights(Some(7))
            .sort_by(SortBy::Duration)
            .build()
            .unwrap();

        assert_eq!(criteria.return_date(), Some(date(2024, 6, 8)));
        let query = criteria.search_query(5, "picky");
        assert_eq!(lookup(&query, "returnFrom"), Some("08/06/2024"));
        assert_eq!(lookup(&query, "returnTo"), Some("08/06/2024"));
        assert_eq!(lookup(&query, "typeFlight"), Some("round"));
        assert_eq!(lookup(&query, "sort"), Some("duration"));
    }

    #[test]
    fn test_zero_nights_is_same_day_return() {
        let criteria = SearchCriteria::builder("BCN", "DUB", date(2024, 12, 31))
            .return_nights(Some(0))
            .build()
            .unwrap();
        assert_eq!(criteria.trip_type(), TripType::Round);
        assert_eq!(criteria.return_date(), Some(date(2024, 12, 31)));
    }

    #[test]
    fn test_validation() {
        let d = date(2024, 6, 1);
        assert!(SearchCriteria::builder("PR", "LHR", d).build().is_err());
        assert!(SearchCriteria::builder("PRG", "LH1", d).build().is_err());
        assert!(SearchCriteria::builder("PRG", "LHR", d).bags(5).build().is_err());
        assert!(SearchCriteria::builder("PRG", "LHR", d).bags(4).build().is_ok());
        assert!(
            SearchCriteria::builder("PRG", "LHR", d)
                .currency("EURO")
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_build_url_encodes_values() {
        let url = build_url(
            "https://api.example.com/flights",
            &[("dateFrom", "01/06/2024".to_string()), ("to", "LHR".to_string())],
        );
        assert_eq!(
            url,
            "https://api.example.com/flights?dateFrom=01%2F06%2F2024&to=LHR"
        );
    }

    #[test]
    fn test_booking_request_json() {
        let passenger = Passenger {
            document_id: "001".into(),
            last_name: "2X4C".into(),
            first_name: "Kryton".into(),
            birthday: date(2980, 4, 6),
            title: "Mr".into(),
            email: "kryton@reddwarf.space".into(),
        };
        let body = serde_json::to_value(BookingRequest::new("tok", "CZK", &passenger, 2)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "currency": "CZK",
                "passengers": [{
                    "documentID": "001",
                    "lastName": "2X4C",
                    "firstName": "Kryton",
                    "birthday": "2980-04-06",
                    "title": "Mr",
                    "email": "kryton@reddwarf.space"
                }],
                "booking_token": "tok",
                "bags": 2
            })
        );
    }
}
