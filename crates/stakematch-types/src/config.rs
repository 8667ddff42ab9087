//! Configuration types for the StakeMatch coordinator.
//!
//! [`FeeConfig`] is the strongly-typed decode of the ledger-hosted fee
//! account — decoded once at the boundary so a missing field surfaces as a
//! configuration error instead of a runtime surprise deep in settlement.

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{MatchMode, WalletAddress, constants};

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Static configuration for the lifecycle engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The ledger-side treasury account all entry-fee deposits must land at.
    pub treasury: WalletAddress,
    /// USD stake applied when a casual registration omits a bet amount.
    pub default_bet_usd: Decimal,
    /// Flat network cost subtracted from refunds (floored at zero).
    pub network_fee_lamports: u64,
    /// Age beyond which an IN_PROGRESS match is eligible for the
    /// staleness sweep.
    pub stale_after_secs: i64,
}

impl EngineConfig {
    #[must_use]
    pub fn new(treasury: WalletAddress) -> Self {
        Self {
            treasury,
            default_bet_usd: Decimal::new(constants::DEFAULT_BET_USD_CENTS, 2),
            network_fee_lamports: constants::NETWORK_FEE_LAMPORTS,
            stale_after_secs: constants::MATCH_TIMEOUT_SECS,
        }
    }

    #[must_use]
    pub fn stale_after(&self) -> Duration {
        Duration::seconds(self.stale_after_secs)
    }
}

// ---------------------------------------------------------------------------
// FeeConfig
// ---------------------------------------------------------------------------

/// Fee basis points read from the ledger-hosted config account.
///
/// Basis points are out of 10,000 ([`constants::BPS_DENOMINATOR`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    pub casual_fee_bps: u16,
    pub betting_fee_bps: u16,
}

impl FeeConfig {
    /// Select the applicable fee for a match mode. PvE matches are charged
    /// at the casual rate.
    #[must_use]
    pub fn fee_bps(&self, mode: MatchMode) -> u16 {
        match mode {
            MatchMode::Betting => self.betting_fee_bps,
            MatchMode::Casual | MatchMode::Pve => self.casual_fee_bps,
        }
    }

    /// USD match fee for a USD stake: `stake * bps / 10_000`.
    #[must_use]
    pub fn match_fee(&self, stake: Decimal, mode: MatchMode) -> Decimal {
        stake * Decimal::from(self.fee_bps(mode)) / Decimal::from(constants::BPS_DENOMINATOR)
    }

    /// Lamport fee withheld from a settlement pot of `total_lamports`.
    ///
    /// Widened to u128 for the multiply; the quotient always fits back in
    /// u64 because bps <= 10_000.
    #[must_use]
    pub fn settlement_fee_lamports(&self, total_lamports: u64, mode: MatchMode) -> u64 {
        let fee = u128::from(total_lamports) * u128::from(self.fee_bps(mode))
            / u128::from(constants::BPS_DENOMINATOR);
        u64::try_from(fee).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> FeeConfig {
        FeeConfig {
            casual_fee_bps: 2_000,
            betting_fee_bps: 1_000,
        }
    }

    #[test]
    fn fee_bps_selection_by_mode() {
        let c = cfg();
        assert_eq!(c.fee_bps(MatchMode::Casual), 2_000);
        assert_eq!(c.fee_bps(MatchMode::Betting), 1_000);
        assert_eq!(c.fee_bps(MatchMode::Pve), 2_000);
    }

    #[test]
    fn usd_match_fee_half_dollar_at_twenty_percent() {
        // stake = 0.50 USD, casual fee bps = 2000 -> fee = 0.10 USD
        let c = cfg();
        let fee = c.match_fee(Decimal::new(50, 2), MatchMode::Casual);
        assert_eq!(fee, Decimal::new(10, 2));
    }

    #[test]
    fn settlement_fee_lamports_exact() {
        let c = cfg();
        // 10_000_000 lamports at 2000 bps -> 2_000_000
        assert_eq!(
            c.settlement_fee_lamports(10_000_000, MatchMode::Casual),
            2_000_000
        );
        // betting rate: 1000 bps -> 1_000_000
        assert_eq!(
            c.settlement_fee_lamports(10_000_000, MatchMode::Betting),
            1_000_000
        );
    }

    #[test]
    fn settlement_fee_no_overflow_at_max() {
        let c = cfg();
        let fee = c.settlement_fee_lamports(u64::MAX, MatchMode::Casual);
        assert!(fee <= u64::MAX / 4);
    }

    #[test]
    fn engine_config_defaults() {
        let e = EngineConfig::new(WalletAddress::new("treasury"));
        assert_eq!(e.default_bet_usd, Decimal::new(50, 2));
        assert_eq!(e.network_fee_lamports, 5_000);
        assert_eq!(e.stale_after(), Duration::minutes(15));
    }

    #[test]
    fn fee_config_serde_roundtrip() {
        let c = cfg();
        let json = serde_json::to_string(&c).unwrap();
        let back: FeeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, back);
    }
}
