//! The [`LedgerClient`] trait — the three financial operations plus the
//! two reads the coordinator needs.
//!
//! Every financial operation is atomic on the ledger: it either fully
//! applies or fully fails. From the caller's perspective delivery is
//! at-least-once, which is why the lifecycle engine claims a match as
//! SETTLING *before* calling [`LedgerClient::settle`] — a crash mid-call
//! leaves the match visibly stuck rather than silently double-payable.

use std::future::Future;

use serde::{Deserialize, Serialize};

use stakematch_types::{
    FeeConfig, MatchId, MatchMode, Result, StakematchError, TxSignature, WalletAddress,
};

use crate::transaction::ParsedTransaction;

/// Inputs to the ledger's settle instruction: pay the winner
/// `total - fee` from the treasury, retain `fee`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleRequest {
    pub match_id: MatchId,
    pub total_lamports: u64,
    pub fee_lamports: u64,
    pub mode: MatchMode,
    pub winner: WalletAddress,
}

impl SettleRequest {
    /// Lamports the winner nets: `total - fee`, floored at zero.
    #[must_use]
    pub fn winner_payout(&self) -> u64 {
        self.total_lamports.saturating_sub(self.fee_lamports)
    }
}

/// Dynamic decode of the ledger fee-config account. Fields are optional
/// because the account layout is owned by the ledger program and may
/// drift; [`RawFeeConfig::decode`] is where drift becomes a hard error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFeeConfig {
    pub casual_fee_bps: Option<u16>,
    pub betting_fee_bps: Option<u16>,
}

impl RawFeeConfig {
    /// Decode into the strongly-typed [`FeeConfig`].
    ///
    /// # Errors
    /// [`StakematchError::ConfigFieldMissing`] if the account exists but
    /// lacks an expected field. Never silently defaults.
    pub fn decode(self) -> Result<FeeConfig> {
        let casual_fee_bps = self
            .casual_fee_bps
            .ok_or(StakematchError::ConfigFieldMissing { field: "casual_fee_bps" })?;
        let betting_fee_bps = self
            .betting_fee_bps
            .ok_or(StakematchError::ConfigFieldMissing { field: "betting_fee_bps" })?;
        Ok(FeeConfig {
            casual_fee_bps,
            betting_fee_bps,
        })
    }
}

/// Client for the external ledger program.
///
/// Returned futures are `Send` so engine operations can run on a
/// multi-threaded runtime.
pub trait LedgerClient: Send + Sync {
    /// Fetch a transaction at finalized commitment. `Ok(None)` means no
    /// such transaction has finalized.
    fn get_finalized_transaction(
        &self,
        signature: &TxSignature,
    ) -> impl Future<Output = Result<Option<ParsedTransaction>>> + Send;

    /// Settle a match: pay the winner, retain the fee.
    fn settle(&self, request: &SettleRequest) -> impl Future<Output = Result<TxSignature>> + Send;

    /// Refund a deposit to a player from the treasury.
    fn refund(
        &self,
        match_id: MatchId,
        player: &WalletAddress,
        lamports: u64,
    ) -> impl Future<Output = Result<TxSignature>> + Send;

    /// Transfer lamports from the treasury to an arbitrary recipient
    /// (airdrop batch primitive).
    fn airdrop_transfer(
        &self,
        recipient: &WalletAddress,
        lamports: u64,
    ) -> impl Future<Output = Result<TxSignature>> + Send;

    /// Read the fee-config account.
    fn get_fee_config(&self) -> impl Future<Output = Result<RawFeeConfig>> + Send;
}
