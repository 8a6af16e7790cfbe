/*
 *  pricefeed.rs
 *
 *  LcdTicker - prices on a 1602
 *  (c) 2020-26 Stuart Hunter
 *
 *  Ticker price source over HTTP/JSON
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use reqwest::{Client, Error as ReqwestError, header};
use serde_json::{Error as SerdeJsonError, Value};
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

/// Custom error type for price fetches.
#[derive(Debug)]
pub enum FeedError {
    /// Error from the HTTP client (reqwest).
    HttpRequestError(ReqwestError),
    /// Error deserializing the JSON response.
    DeserializationError(SerdeJsonError),
    /// Nothing at the configured JSON pointer.
    MissingPrice(String),
    /// The price is there but is not a finite number.
    InvalidPrice(String),
}

impl Display for FeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::HttpRequestError(e) => write!(f, "HTTP request error: {}", e),
            FeedError::DeserializationError(e) => write!(f, "JSON deserialization error: {}", e),
            FeedError::MissingPrice(pointer) => write!(f, "Ticker response has no price at '{}'", pointer),
            FeedError::InvalidPrice(raw) => write!(f, "Ticker price is not a number: {}", raw),
        }
    }
}

impl std::error::Error for FeedError {}

impl From<ReqwestError> for FeedError {
    fn from(err: ReqwestError) -> Self {
        FeedError::HttpRequestError(err)
    }
}

impl From<SerdeJsonError> for FeedError {
    fn from(err: SerdeJsonError) -> Self {
        FeedError::DeserializationError(err)
    }
}

/// Anything that can quote a trade pair.
#[allow(async_fn_in_trait)]
pub trait PriceSource {
    async fn fetch(&mut self, pair: &str) -> Result<f64, FeedError>;
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// URL with a `{pair}` placeholder
    pub api_url: String,
    /// JSON pointer to the price in the response
    pub price_pointer: String,
    pub user_agent: Option<String>,
}

/// HTTP ticker client
#[derive(Debug)]
pub struct TickerClient {
    config: FeedConfig,
    client: Client,
}

impl TickerClient {
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        // Define a constant for the User-Agent version
        const VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

        // CDN fronted APIs answer 5xx to requests without a User-Agent
        let agent = match config.user_agent.as_deref() {
            Some(agent) => header::HeaderValue::from_str(agent)
                .unwrap_or_else(|_| header::HeaderValue::from_static(VERSION)),
            None => header::HeaderValue::from_static(VERSION),
        };

        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, agent);
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        headers.insert(header::CONNECTION, header::HeaderValue::from_static("close"));

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(TickerClient { config, client })
    }

    pub fn url_for(&self, pair: &str) -> String {
        self.config.api_url.replace("{pair}", pair)
    }
}

impl PriceSource for TickerClient {
    async fn fetch(&mut self, pair: &str) -> Result<f64, FeedError> {
        let url = self.url_for(pair);
        let response = self.client.get(&url).send().await?;

        // Check for HTTP status code
        response.error_for_status_ref()?;

        let body = response.text().await?;
        parse_price(&body, &self.config.price_pointer)
    }
}

/// Pull the price out of a ticker response. Accepts a JSON number or a numeric string.
pub fn parse_price(body: &str, pointer: &str) -> Result<f64, FeedError> {
    let json: Value = serde_json::from_str(body)?;
    let raw = json
        .pointer(pointer)
        .ok_or_else(|| FeedError::MissingPrice(pointer.to_string()))?;

    let price = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match price {
        Some(p) if p.is_finite() => Ok(p),
        _ => Err(FeedError::InvalidPrice(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_string_price() {
        let body = r#"{"ticker":{"base":"BTC","target":"USD","price":"61234.50000000","volume":""},"success":true}"#;
        assert_eq!(parse_price(body, "/ticker/price").unwrap(), 61234.5);
    }

    #[test]
    fn test_parse_number_price() {
        let body = r#"{"data":{"amount":42.25}}"#;
        assert_eq!(parse_price(body, "/data/amount").unwrap(), 42.25);
    }

    #[test]
    fn test_parse_failures() {
        assert!(matches!(
            parse_price(r#"{"success":false,"error":"Pair not found"}"#, "/ticker/price"),
            Err(FeedError::MissingPrice(_))
        ));
        assert!(matches!(
            parse_price(r#"{"ticker":{"price":"n/a"}}"#, "/ticker/price"),
            Err(FeedError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_price(r#"{"ticker":{"price":"NaN"}}"#, "/ticker/price"),
            Err(FeedError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_price("<html>502 Bad Gateway</html>", "/ticker/price"),
            Err(FeedError::DeserializationError(_))
        ));
    }

    #[test]
    fn test_url_template() {
        let client = TickerClient::new(FeedConfig {
            api_url: "https://example.invalid/api/ticker/{pair}".into(),
            price_pointer: "/ticker/price".into(),
            user_agent: Some("lcd.py".into()),
        })
        .unwrap();
        assert_eq!(client.url_for("BTC-USD"), "https://example.invalid/api/ticker/BTC-USD");
    }
}
