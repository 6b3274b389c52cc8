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

//! # HTTP Transport
//!
//! Effectful (network) request/response exchanges. Requests are sent once;
//! nothing in here retries.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use wreq::redirect::Policy;
use wreq_util::Emulation;

use crate::booking_errors::{BookingError, Result};

#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` (query string included) and return the response body.
    async fn get(&self, url: &str) -> Result<String>;

    /// POST a JSON `body` to `url` and return the response body.
    ///
    /// Error statuses carrying a JSON object body are returned as-is.
    async fn post_json(&self, url: &str, body: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Arc<wreq::Client>,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = wreq::Client::builder()
            .emulation(Emulation::Safari18_5)
            .redirect(Policy::default())
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    async fn read_body(response: wreq::Response, json_errors: bool) -> Result<String> {
        let status = response.status();
        tracing::debug!(
            "HTTP Status: {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        );

        let body = response.text().await?;
        tracing::trace!("Response body: {} bytes", body.len());

        accept_body(status.as_u16(), body, json_errors)
    }
}

/// Decide what a response means before any payload decoding.
///
/// A non-2xx status is a transport error, unless `json_errors` is set and the
/// body is a JSON object: the booking endpoint reports rejections that way
/// and the caller decodes them into a proper status.
fn accept_body(status: u16, body: String, json_errors: bool) -> Result<String> {
    if (200..300).contains(&status) {
        return Ok(body);
    }

    let is_json_object = serde_json::from_str::<serde_json::Value>(&body)
        .is_ok_and(|v| v.is_object());
    if json_errors && is_json_object {
        tracing::warn!("HTTP {} with a JSON body, decoding it anyway", status);
        return Ok(body);
    }

    let body_preview = body.chars().take(500).collect::<String>();
    Err(BookingError::Transport(format!(
        "HTTP error {}: {}",
        status, body_preview
    )))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String> {
        let http_start = std::time::Instant::now();
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header("Content-Type", "application/json")
            .send()
            .await?;
        tracing::trace!("GET completed in {:?}", http_start.elapsed());
        Self::read_body(response, false).await
    }

    async fn post_json(&self, url: &str, body: &str) -> Result<String> {
        let http_start = std::time::Instant::now();
        tracing::debug!("POST {} ({} bytes)", url, body.len());
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await?;
        tracing::trace!("POST completed in {:?}", http_start.elapsed());
        Self::read_body(response, true).await
    }
}
