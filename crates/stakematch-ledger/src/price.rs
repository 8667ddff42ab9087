//! Oracle price cache.
//!
//! An explicitly-owned cache object with a last-refresh timestamp and TTL,
//! injected into whatever component needs USD conversion. Fail-soft: a
//! fetch failure serves the previous value, and zero only when no price
//! has ever been fetched — callers treat zero as "price unavailable".

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use stakematch_types::{Result, constants};

/// Source of the native-token USD price (an HTTP oracle in production).
pub trait PriceSource: Send + Sync {
    fn fetch_usd_price(&self) -> impl Future<Output = Result<Decimal>> + Send;
}

/// Cached USD price with TTL.
#[derive(Debug)]
pub struct PriceCache {
    cached: Decimal,
    last_fetched: Option<DateTime<Utc>>,
    ttl: Duration,
}

impl PriceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(constants::PRICE_TTL_SECS))
    }

    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            cached: Decimal::ZERO,
            last_fetched: None,
            ttl,
        }
    }

    /// Current price, refreshing through `source` when stale.
    pub async fn get<S: PriceSource>(&mut self, source: &S) -> Decimal {
        if let Some(at) = self.last_fetched {
            if Utc::now() - at < self.ttl && !self.cached.is_zero() {
                return self.cached;
            }
        }

        match source.fetch_usd_price().await {
            Ok(price) if !price.is_zero() => {
                self.cached = price;
                self.last_fetched = Some(Utc::now());
                price
            }
            Ok(_) | Err(_) => {
                tracing::warn!(cached = %self.cached, "Price fetch failed; serving last known value");
                self.cached
            }
        }
    }

    /// Last fetched value without refreshing. Zero means never fetched.
    #[must_use]
    pub fn last_known(&self) -> Decimal {
        self.cached
    }
}

impl Default for PriceCache {
    fn default() -> Self {
        Self::new()
    }
}
