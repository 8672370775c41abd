//! Yahoo Finance quote provider.
//!
//! Asks the v8 chart API for a one-day range at daily interval and takes the
//! last non-null close. Yahoo has no official API and is subject to
//! unannounced format changes; anything unexpected maps to `ResponseFormat`.

use super::provider::{QuoteError, QuoteProvider};
use crate::uri::encode_path;
use log::debug;
use serde::Deserialize;
use std::time::Duration;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Yahoo Finance quote provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Result<Self, QuoteError> {
        Self::with_options(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Provider against a custom host (mirror, proxy or local stub).
    pub fn with_options(base_url: &str, timeout: Duration) -> Result<Self, QuoteError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| QuoteError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the chart API URL for the latest daily bar of a symbol.
    fn chart_url(&self, symbol: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}?range=1d&interval=1d",
            self.base_url,
            encode_path(symbol, false)
        )
    }

    /// Pull the latest close out of a chart response.
    fn parse_latest_close(symbol: &str, resp: ChartResponse) -> Result<f64, QuoteError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => QuoteError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => QuoteError::ResponseFormat(format!("{}: {}", err.code, err.description)),
            None => QuoteError::ResponseFormat("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| QuoteError::ResponseFormat("result array is empty".into()))?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| QuoteError::ResponseFormat("no quote data".into()))?;

        quote
            .close
            .into_iter()
            .rev()
            .flatten()
            .find(|c| c.is_finite())
            .ok_or_else(|| QuoteError::NoData {
                symbol: symbol.to_string(),
            })
    }
}

impl QuoteProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn latest_close(&self, symbol: &str) -> Result<f64, QuoteError> {
        let url = self.chart_url(symbol);
        debug!("GET {url}");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| QuoteError::Network(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| QuoteError::Network(e.to_string()))?;
        let parsed = serde_json::from_str::<ChartResponse>(&body);

        if !status.is_success() {
            // Yahoo answers unknown tickers with 404 and a chart error body
            if let Ok(ChartResponse {
                chart:
                    ChartResult {
                        error: Some(err), ..
                    },
            }) = &parsed
            {
                if err.code == "Not Found" {
                    return Err(QuoteError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    });
                }
            }
            return Err(QuoteError::Http {
                status: status.as_u16(),
                symbol: symbol.to_string(),
            });
        }

        let chart = parsed.map_err(|e| {
            QuoteError::ResponseFormat(format!("failed to parse response for {symbol}: {e}"))
        })?;
        Self::parse_latest_close(symbol, chart)
    }
}
