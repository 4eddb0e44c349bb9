//! Pricing module - live quote resolution with graceful degradation
//!
//! Resolution order per asset: the batch quote endpoint first, then a
//! per-symbol chart lookup (retrying with the B3 ".SA" suffix), then
//! USD->BRL cross conversion for quotes reported in dollars. Assets that
//! resolve nowhere are absent from the result - a miss is a degraded
//! valuation downstream, never a failure here.

pub mod yahoo;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub use yahoo::Quote;

/// Yahoo pair symbol for the USD/BRL exchange rate.
const USD_BRL_SYMBOL: &str = "BRL=X";

/// Global singleton fetcher so the cache is shared across all calls
/// within a process.
static GLOBAL_FETCHER: Lazy<QuoteFetcher> = Lazy::new(QuoteFetcher::new);

#[derive(Debug, Clone)]
struct CacheEntry {
    quote: Quote,
    timestamp: chrono::DateTime<chrono::Utc>,
}

/// Quote fetcher with caching (24hr TTL)
pub struct QuoteFetcher {
    cache: Arc<Mutex<HashMap<String, CacheEntry>>>,
    cache_ttl_hours: i64,
}

impl Default for QuoteFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteFetcher {
    pub fn new() -> Self {
        Self {
            cache: Arc::new(Mutex::new(HashMap::new())),
            cache_ttl_hours: 24,
        }
    }

    fn cached(&self, asset: &str) -> Option<Quote> {
        let cache = self.cache.lock().unwrap();
        cache.get(asset).and_then(|entry| {
            let age = Utc::now().signed_duration_since(entry.timestamp);
            (age < Duration::hours(self.cache_ttl_hours)).then(|| entry.quote.clone())
        })
    }

    fn store(&self, asset: &str, quote: Quote) {
        let mut cache = self.cache.lock().unwrap();
        cache.insert(
            asset.to_string(),
            CacheEntry {
                quote,
                timestamp: Utc::now(),
            },
        );
    }

    /// Resolve quotes for a set of assets. Misses are absent entries.
    pub async fn fetch_quotes(&self, assets: &[String]) -> HashMap<String, Quote> {
        let mut resolved: HashMap<String, Quote> = HashMap::new();

        let mut pending: Vec<String> = Vec::new();
        for asset in assets {
            match self.cached(asset) {
                Some(quote) => {
                    debug!("Using cached quote for {}", asset);
                    resolved.insert(asset.clone(), quote);
                }
                None => pending.push(asset.clone()),
            }
        }

        // Batch first: one round trip covers most of the portfolio.
        if !pending.is_empty() {
            match yahoo::fetch_quotes_batch(&pending).await {
                Ok(quotes) => {
                    for quote in quotes {
                        self.store(&quote.symbol, quote.clone());
                        resolved.insert(quote.symbol.clone(), quote);
                    }
                }
                Err(e) => warn!("Batch quote request failed: {}", e),
            }
        }

        // Per-symbol fallback, retrying with the B3 suffix.
        for asset in &pending {
            if resolved.contains_key(asset) {
                continue;
            }
            match fetch_single_with_suffix(asset).await {
                Some(quote) => {
                    self.store(asset, quote.clone());
                    resolved.insert(asset.clone(), quote);
                }
                None => warn!("No quote found for {} (will value at cost)", asset),
            }
        }

        resolved
    }

    /// Current USD/BRL exchange rate.
    pub async fn fetch_usd_brl(&self) -> Result<Decimal> {
        if let Some(quote) = self.cached(USD_BRL_SYMBOL) {
            return Ok(quote.price);
        }

        let quote = yahoo::fetch_quote(USD_BRL_SYMBOL)
            .await
            .context("USD/BRL rate fetch failed")?;
        self.store(USD_BRL_SYMBOL, quote.clone());
        Ok(quote.price)
    }
}

async fn fetch_single_with_suffix(asset: &str) -> Option<Quote> {
    match yahoo::fetch_quote(asset).await {
        Ok(quote) => return Some(quote),
        Err(e) => debug!("Quote lookup for {} failed: {}", asset, e),
    }

    if !asset.contains('.') && !asset.contains('=') {
        let b3_symbol = format!("{}.SA", asset);
        match yahoo::fetch_quote(&b3_symbol).await {
            Ok(quote) => return Some(quote),
            Err(e) => debug!("Quote lookup for {} failed: {}", b3_symbol, e),
        }
    }

    None
}

/// Resolve BRL prices for a set of assets using the global shared
/// fetcher. USD quotes are cross-converted; assets without a quote (or
/// without a rate to convert with) are absent from the map.
pub async fn fetch_prices_brl(assets: &[String]) -> HashMap<String, Decimal> {
    let quotes = GLOBAL_FETCHER.fetch_quotes(assets).await;

    let needs_conversion = quotes.values().any(|q| q.currency == "USD");
    let usd_brl = if needs_conversion {
        match GLOBAL_FETCHER.fetch_usd_brl().await {
            Ok(rate) => Some(rate),
            Err(e) => {
                warn!("USD/BRL rate unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    let mut prices = HashMap::new();
    for (asset, quote) in quotes {
        match quote.currency.as_str() {
            "USD" => {
                if let Some(rate) = usd_brl {
                    prices.insert(asset, quote.price * rate);
                }
            }
            _ => {
                prices.insert(asset, quote.price);
            }
        }
    }
    prices
}

/// Fetch the USD/BRL rate via the global fetcher.
pub async fn fetch_usd_brl() -> Result<Decimal> {
    GLOBAL_FETCHER.fetch_usd_brl().await
}

/// Fetch raw quotes (price + currency) via the global fetcher.
pub async fn fetch_quotes(assets: &[String]) -> HashMap<String, Quote> {
    GLOBAL_FETCHER.fetch_quotes(assets).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quote(symbol: &str, price: Decimal, currency: &str) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            price,
            currency: currency.to_string(),
        }
    }

    #[test]
    fn test_cache_stores_and_returns_fresh_entries() {
        let fetcher = QuoteFetcher::new();
        assert!(fetcher.cached("PETR4").is_none());

        fetcher.store("PETR4", quote("PETR4.SA", dec!(38.10), "BRL"));
        let cached = fetcher.cached("PETR4").unwrap();
        assert_eq!(cached.price, dec!(38.10));
    }

    #[test]
    fn test_expired_entries_are_ignored() {
        let fetcher = QuoteFetcher::new();
        {
            let mut cache = fetcher.cache.lock().unwrap();
            cache.insert(
                "PETR4".to_string(),
                CacheEntry {
                    quote: quote("PETR4.SA", dec!(38.10), "BRL"),
                    timestamp: Utc::now() - Duration::hours(25),
                },
            );
        }
        assert!(fetcher.cached("PETR4").is_none());
    }

    #[test]
    fn test_global_fetcher_is_singleton() {
        let cache1 = GLOBAL_FETCHER.cache.clone();
        let cache2 = GLOBAL_FETCHER.cache.clone();
        assert!(Arc::ptr_eq(&cache1, &cache2));
    }

    #[tokio::test]
    async fn test_cached_quotes_resolve_offline() {
        // Everything pre-cached: fetch_quotes must not need the network
        let fetcher = QuoteFetcher::new();
        fetcher.store("AAA", quote("AAA", dec!(10), "BRL"));
        fetcher.store("BBB", quote("BBB", dec!(20), "BRL"));

        let quotes = fetcher
            .fetch_quotes(&["AAA".to_string(), "BBB".to_string()])
            .await;
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes["AAA"].price, dec!(10));
    }
}
