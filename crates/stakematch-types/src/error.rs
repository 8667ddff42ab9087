//! Error types for the StakeMatch coordinator.
//!
//! All errors use the `SM_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Validation errors (rejected before any state mutation)
//! - 2xx: Deposit errors (rejected after compensating cleanup)
//! - 3xx: Lifecycle / concurrency outcomes
//! - 4xx: External ledger failures (rollback performed, retryable)
//! - 5xx: Configuration errors
//! - 9xx: Internal / invariant violations

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{MatchId, MatchStatus, TxSignature, WalletAddress};

/// Central error enum for all StakeMatch operations.
#[derive(Debug, Error)]
pub enum StakematchError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// A required request field was missing or empty.
    #[error("SM_ERR_100: Missing required field: {field}")]
    MissingField { field: &'static str },

    /// The submitted game mode is not one of the supported modes.
    #[error("SM_ERR_101: Invalid game mode: {value}")]
    InvalidMode { value: String },

    /// Wagered registration with a missing, zero, or negative stake.
    #[error("SM_ERR_102: Invalid bet amount: {stake}")]
    InvalidStake { stake: Decimal },

    // =================================================================
    // Deposit Errors (2xx)
    // =================================================================
    /// The deposit signature was already consumed by an earlier registration.
    #[error("SM_ERR_200: Deposit transaction already processed: {0}")]
    DuplicateDeposit(TxSignature),

    /// No finalized transaction exists for the claimed deposit signature.
    #[error("SM_ERR_201: Fee deposit not found: {0}")]
    DepositNotFound(TxSignature),

    /// The deposit transaction exists but failed or is not yet finalized.
    #[error("SM_ERR_202: Fee deposit not finalized: {0}")]
    DepositNotFinalized(TxSignature),

    /// The deposit transaction contains no recognizable native transfer.
    #[error("SM_ERR_203: No transfer found in deposit transaction: {0}")]
    NoTransferFound(TxSignature),

    /// A transfer exists but none lands at the expected treasury address.
    #[error("SM_ERR_204: Deposit destination mismatch: expected {expected}")]
    WrongDestination { expected: WalletAddress },

    /// A transfer reaches the treasury but not from the claimed player.
    #[error("SM_ERR_205: Deposit sender mismatch: expected {expected}")]
    WrongSender { expected: WalletAddress },

    // =================================================================
    // Lifecycle / Concurrency (3xx)
    // =================================================================
    /// No match exists with the given identifier.
    #[error("SM_ERR_300: Match not found: {0}")]
    MatchNotFound(MatchId),

    /// The caller is neither playerA nor playerB of the match.
    #[error("SM_ERR_301: Wallet {address} is not a participant in match {match_id}")]
    NotParticipant {
        match_id: MatchId,
        address: WalletAddress,
    },

    /// Another caller already claimed settlement for this match.
    /// A correctly-resolved race, not a fault.
    #[error("SM_ERR_302: Match already claimed for settlement: {0}")]
    AlreadyClaimed(MatchId),

    /// Abort requested while the match is not WAITING.
    #[error("SM_ERR_303: Match {match_id} cannot be aborted in status {status}")]
    NotAbortable {
        match_id: MatchId,
        status: MatchStatus,
    },

    /// The declared winner is not one of the two participants.
    #[error("SM_ERR_304: Winner {winner} is not a participant in match {match_id}")]
    WinnerNotParticipant {
        match_id: MatchId,
        winner: WalletAddress,
    },

    // =================================================================
    // External Ledger Failures (4xx) — rollback performed, retryable
    // =================================================================
    /// The ledger settle call failed; the match was rolled back to
    /// IN_PROGRESS and settlement may be retried.
    #[error("SM_ERR_400: Settlement failed for match {match_id}: {reason}")]
    SettleFailed { match_id: MatchId, reason: String },

    /// The ledger refund call failed; the match was rolled back to WAITING
    /// and the abort may be retried.
    #[error("SM_ERR_401: Refund failed for match {match_id}: {reason}")]
    RefundFailed { match_id: MatchId, reason: String },

    /// The ledger could not be reached or returned a transport-level error.
    #[error("SM_ERR_402: Ledger unavailable: {reason}")]
    LedgerUnavailable { reason: String },

    // =================================================================
    // Configuration (5xx)
    // =================================================================
    /// The ledger fee-config account exists but is missing an expected
    /// field. Fatal: never silently defaulted.
    #[error("SM_ERR_500: Fee config account is missing expected field: {field}")]
    ConfigFieldMissing { field: &'static str },

    // =================================================================
    // Internal / Invariant Violations (9xx)
    // =================================================================
    /// Unrecoverable internal error (e.g. a claimed match vanished).
    #[error("SM_ERR_900: Internal error: {0}")]
    Internal(String),
}

impl StakematchError {
    /// Whether the caller should retry after this failure.
    ///
    /// True only for external-call failures where the compensating rollback
    /// has already restored the pre-claim state.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SettleFailed { .. } | Self::RefundFailed { .. } | Self::LedgerUnavailable { .. }
        )
    }

    /// Whether this error indicates a bug or external contract breach
    /// rather than a transient or caller-correctable condition.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConfigFieldMissing { .. } | Self::Internal(_))
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, StakematchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = StakematchError::MatchNotFound(MatchId::new());
        let msg = format!("{err}");
        assert!(msg.starts_with("SM_ERR_300"), "Got: {msg}");
    }

    #[test]
    fn duplicate_deposit_display() {
        let err = StakematchError::DuplicateDeposit(TxSignature::new("sig-abc"));
        let msg = format!("{err}");
        assert!(msg.contains("SM_ERR_200"));
        assert!(msg.contains("sig-abc"));
    }

    #[test]
    fn retryable_classification() {
        let settle = StakematchError::SettleFailed {
            match_id: MatchId::new(),
            reason: "rpc timeout".into(),
        };
        assert!(settle.is_retryable());
        assert!(!settle.is_fatal());

        let claimed = StakematchError::AlreadyClaimed(MatchId::new());
        assert!(!claimed.is_retryable());

        let dup = StakematchError::DuplicateDeposit(TxSignature::new("x"));
        assert!(!dup.is_retryable());
    }

    #[test]
    fn fatal_classification() {
        let cfg = StakematchError::ConfigFieldMissing { field: "casual_fee_bps" };
        assert!(cfg.is_fatal());
        assert!(!cfg.is_retryable());

        let internal = StakematchError::Internal("claimed match vanished".into());
        assert!(internal.is_fatal());
    }

    #[test]
    fn all_errors_have_sm_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(StakematchError::MissingField { field: "walletAddress" }),
            Box::new(StakematchError::InvalidMode { value: "Ranked".into() }),
            Box::new(StakematchError::DepositNotFound(TxSignature::new("s"))),
            Box::new(StakematchError::AlreadyClaimed(MatchId::new())),
            Box::new(StakematchError::Internal("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("SM_ERR_"),
                "Error missing SM_ERR_ prefix: {msg}"
            );
        }
    }
}
