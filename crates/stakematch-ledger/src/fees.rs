//! Fee/Config Accessor — TTL-cached read of the ledger fee account.
//!
//! Decode strictness matters here: a fetched account that is missing an
//! expected field is a fatal configuration error. The built-in fallback
//! rate is used only when *no* config has ever been fetched successfully
//! and the current fetch fails at the transport level.

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use stakematch_types::{FeeConfig, Result, StakematchError, constants};

use crate::client::LedgerClient;

struct CachedFees {
    config: FeeConfig,
    fetched_at: DateTime<Utc>,
}

/// Caches the decoded [`FeeConfig`] with a last-refresh timestamp and TTL.
///
/// Injected into the engine; never ambient state.
pub struct FeeAccessor {
    cached: RwLock<Option<CachedFees>>,
    ttl: Duration,
}

impl FeeAccessor {
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(constants::FEE_CONFIG_TTL_SECS))
    }

    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            cached: RwLock::new(None),
            ttl,
        }
    }

    /// Current fee config, re-reading the ledger when the cache is stale.
    ///
    /// - Fresh cache: served without a ledger call.
    /// - Stale or empty cache: the ledger account is fetched and decoded.
    /// - Fetched account missing a field: fatal `ConfigFieldMissing`.
    /// - Transport failure with a previously-fetched value: the stale
    ///   value is served.
    /// - Transport failure with nothing ever fetched: the fallback rate.
    pub async fn current<L: LedgerClient>(&self, ledger: &L) -> Result<FeeConfig> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            if Utc::now() - cached.fetched_at < self.ttl {
                return Ok(cached.config);
            }
        }

        match ledger.get_fee_config().await {
            Ok(raw) => {
                let config = raw.decode()?;
                *self.cached.write().await = Some(CachedFees {
                    config,
                    fetched_at: Utc::now(),
                });
                Ok(config)
            }
            Err(err @ StakematchError::ConfigFieldMissing { .. }) => Err(err),
            Err(err) => {
                if let Some(cached) = self.cached.read().await.as_ref() {
                    tracing::warn!(error = %err, "Fee config fetch failed; serving stale value");
                    return Ok(cached.config);
                }
                tracing::warn!(
                    error = %err,
                    fallback_bps = constants::FALLBACK_FEE_BPS,
                    "Fee config never fetched; using fallback rate"
                );
                Ok(FeeConfig {
                    casual_fee_bps: constants::FALLBACK_FEE_BPS,
                    betting_fee_bps: constants::FALLBACK_FEE_BPS,
                })
            }
        }
    }
}

impl Default for FeeAccessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::atomic::{AtomicU32, Ordering};

    use stakematch_types::{MatchId, TxSignature, WalletAddress};

    use crate::client::{RawFeeConfig, SettleRequest};
    use crate::transaction::ParsedTransaction;

    /// Fee-only stub: financial operations are unreachable in these tests.
    struct FeeStub {
        response: std::result::Result<RawFeeConfig, ()>,
        fetches: AtomicU32,
    }

    impl FeeStub {
        fn ok(raw: RawFeeConfig) -> Self {
            Self {
                response: Ok(raw),
                fetches: AtomicU32::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                response: Err(()),
                fetches: AtomicU32::new(0),
            }
        }
    }

    impl LedgerClient for FeeStub {
        fn get_finalized_transaction(
            &self,
            _signature: &TxSignature,
        ) -> impl Future<Output = Result<Option<ParsedTransaction>>> + Send {
            async { unreachable!("not used in fee tests") }
        }

        fn settle(
            &self,
            _request: &SettleRequest,
        ) -> impl Future<Output = Result<TxSignature>> + Send {
            async { unreachable!("not used in fee tests") }
        }

        fn refund(
            &self,
            _match_id: MatchId,
            _player: &WalletAddress,
            _lamports: u64,
        ) -> impl Future<Output = Result<TxSignature>> + Send {
            async { unreachable!("not used in fee tests") }
        }

        fn airdrop_transfer(
            &self,
            _recipient: &WalletAddress,
            _lamports: u64,
        ) -> impl Future<Output = Result<TxSignature>> + Send {
            async { unreachable!("not used in fee tests") }
        }

        fn get_fee_config(&self) -> impl Future<Output = Result<RawFeeConfig>> + Send {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let response = self.response;
            async move {
                response.map_err(|()| StakematchError::LedgerUnavailable {
                    reason: "rpc down".into(),
                })
            }
        }
    }

    fn complete() -> RawFeeConfig {
        RawFeeConfig {
            casual_fee_bps: Some(2_000),
            betting_fee_bps: Some(1_000),
        }
    }

    #[tokio::test]
    async fn fetches_and_caches() {
        let stub = FeeStub::ok(complete());
        let accessor = FeeAccessor::new();

        let cfg = accessor.current(&stub).await.unwrap();
        assert_eq!(cfg.casual_fee_bps, 2_000);
        let _ = accessor.current(&stub).await.unwrap();
        assert_eq!(stub.fetches.load(Ordering::SeqCst), 1, "second read served from cache");
    }

    #[tokio::test]
    async fn expired_ttl_refetches() {
        let stub = FeeStub::ok(complete());
        let accessor = FeeAccessor::with_ttl(Duration::seconds(-1));

        let _ = accessor.current(&stub).await.unwrap();
        let _ = accessor.current(&stub).await.unwrap();
        assert_eq!(stub.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn missing_field_is_fatal_not_defaulted() {
        let stub = FeeStub::ok(RawFeeConfig {
            casual_fee_bps: None,
            betting_fee_bps: Some(1_000),
        });
        let accessor = FeeAccessor::new();

        let err = accessor.current(&stub).await.unwrap_err();
        assert!(matches!(err, StakematchError::ConfigFieldMissing { .. }));
    }

    #[tokio::test]
    async fn transport_failure_without_history_uses_fallback() {
        let stub = FeeStub::failing();
        let accessor = FeeAccessor::new();

        let cfg = accessor.current(&stub).await.unwrap();
        assert_eq!(cfg.casual_fee_bps, constants::FALLBACK_FEE_BPS);
        assert_eq!(cfg.betting_fee_bps, constants::FALLBACK_FEE_BPS);
    }

    #[tokio::test]
    async fn transport_failure_serves_stale_value() {
        let accessor = FeeAccessor::with_ttl(Duration::seconds(-1));

        let good = FeeStub::ok(complete());
        let cfg = accessor.current(&good).await.unwrap();
        assert_eq!(cfg.casual_fee_bps, 2_000);

        // TTL already expired; next read hits a failing ledger.
        let bad = FeeStub::failing();
        let cfg = accessor.current(&bad).await.unwrap();
        assert_eq!(cfg.casual_fee_bps, 2_000, "stale value served, not fallback");
    }
}
