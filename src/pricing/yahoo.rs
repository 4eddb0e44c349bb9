//! Yahoo Finance HTTP client
//!
//! Two endpoints: the v7 quote endpoint for batch lookups and the v8
//! chart endpoint as the per-symbol fallback. Both return the quote
//! currency so the caller can cross-convert USD prices.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

/// A fetched quote, in the currency the exchange reports.
#[derive(Debug, Clone)]
pub struct Quote {
    pub symbol: String,
    pub price: Decimal,
    pub currency: String,
}

fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent("Mozilla/5.0 (compatible; CarteiraBot/1.0)")
        .build()
        .context("Failed to build HTTP client")
}

// ---- v7 batch quote endpoint ----

#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(rename = "quoteResponse")]
    quote_response: BatchBody,
}

#[derive(Debug, Deserialize)]
struct BatchBody {
    result: Option<Vec<BatchQuote>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct BatchQuote {
    symbol: String,
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

/// Fetch several symbols in one request. Symbols the API does not know
/// are simply missing from the result; only transport/API failures error.
pub async fn fetch_quotes_batch(symbols: &[String]) -> Result<Vec<Quote>> {
    if symbols.is_empty() {
        return Ok(Vec::new());
    }

    let url = format!(
        "https://query1.finance.yahoo.com/v7/finance/quote?symbols={}",
        symbols.join(",")
    );
    debug!("Batch quote request for {} symbols", symbols.len());

    let response = http_client()?
        .get(&url)
        .send()
        .await
        .context("Failed to send batch quote request")?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Quote endpoint returned error status: {}",
            response.status()
        ));
    }

    let data: BatchResponse = response
        .json()
        .await
        .context("Failed to parse batch quote response")?;

    if let Some(error) = data.quote_response.error {
        return Err(anyhow!(
            "Quote API error: {} - {}",
            error.code,
            error.description
        ));
    }

    let quotes = data
        .quote_response
        .result
        .unwrap_or_default()
        .into_iter()
        .filter_map(|q| {
            let price = Decimal::from_f64_retain(q.regular_market_price?)?;
            Some(Quote {
                symbol: q.symbol,
                price,
                currency: q.currency.unwrap_or_else(|| "BRL".to_string()),
            })
        })
        .collect();

    Ok(quotes)
}

// ---- v8 chart endpoint (single symbol) ----

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    currency: Option<String>,
    symbol: String,
}

/// Fetch one symbol's current price from the chart endpoint.
pub async fn fetch_quote(symbol: &str) -> Result<Quote> {
    let url = format!(
        "https://query1.finance.yahoo.com/v8/finance/chart/{}",
        symbol
    );
    debug!("Chart quote request for {}", symbol);

    let response = http_client()?
        .get(&url)
        .send()
        .await
        .context("Failed to send chart request")?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Chart endpoint returned error status: {}",
            response.status()
        ));
    }

    let data: ChartResponse = response
        .json()
        .await
        .context("Failed to parse chart response")?;

    if let Some(error) = data.chart.error {
        return Err(anyhow!(
            "Chart API error: {} - {}",
            error.code,
            error.description
        ));
    }

    let result = data
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| anyhow!("No data returned for {}", symbol))?;

    let price = result
        .meta
        .regular_market_price
        .ok_or_else(|| anyhow!("No price available for {}", symbol))?;

    Ok(Quote {
        symbol: result.meta.symbol,
        price: Decimal::from_f64_retain(price).ok_or_else(|| anyhow!("Invalid price value"))?,
        currency: result.meta.currency.unwrap_or_else(|| "BRL".to_string()),
    })
}
