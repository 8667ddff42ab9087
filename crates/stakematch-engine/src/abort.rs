//! Abort: refund an unmatched WAITING match.
//!
//! Only playerA may abort (a WAITING match has no other participant).
//! The ABORTED claim is taken before the refund call; on refund failure
//! the match rolls back to WAITING so the player may retry or an
//! opponent may still join.

use stakematch_ledger::{LedgerClient, find_transfer_from_to};
use stakematch_types::{
    MatchId, MatchStatus, Result, StakematchError, TxSignature, WalletAddress,
};

use crate::MatchEngine;

/// What a successful abort returns.
#[derive(Debug, Clone)]
pub struct AbortOutcome {
    pub match_id: MatchId,
    /// Lamports returned: the deposit minus the network transfer fee,
    /// floored at zero.
    pub refunded_lamports: u64,
    pub refund_sig: TxSignature,
}

impl<L: LedgerClient> MatchEngine<L> {
    /// Abort a WAITING match and refund playerA's deposit.
    ///
    /// The refund amount is re-derived from the original deposit
    /// transaction on the ledger, not from the stored record — the ledger
    /// is the source of truth for what was actually paid.
    pub async fn abort_match(
        &self,
        match_id: MatchId,
        caller: &WalletAddress,
    ) -> Result<AbortOutcome> {
        let record = self
            .store()
            .get(match_id)
            .await
            .ok_or(StakematchError::MatchNotFound(match_id))?;

        if record.status != MatchStatus::Waiting {
            return Err(StakematchError::NotAbortable {
                match_id,
                status: record.status,
            });
        }
        if record.player_a.address != *caller {
            return Err(StakematchError::NotParticipant {
                match_id,
                address: caller.clone(),
            });
        }

        // Claim: WAITING -> ABORTED. Zero rows means the status moved
        // under us (a join or a concurrent abort won).
        if !self.store().claim_abort(match_id).await {
            let status = self
                .store()
                .get(match_id)
                .await
                .map_or(MatchStatus::Aborted, |m| m.status);
            return Err(StakematchError::NotAbortable { match_id, status });
        }

        match self.refund_claimed(match_id, &record.player_a.deposit_sig, caller).await {
            Ok(outcome) => {
                tracing::info!(
                    match_id = %match_id,
                    player = %caller,
                    refunded = outcome.refunded_lamports,
                    "Match aborted and refunded"
                );
                Ok(outcome)
            }
            Err(err) => {
                if !self.store().unclaim_abort(match_id).await {
                    tracing::error!(match_id = %match_id, "Abort rollback found no ABORTED row");
                }
                tracing::warn!(match_id = %match_id, error = %err, "Refund failed; match back to WAITING");
                Err(err)
            }
        }
    }

    /// Re-derive the deposited amount from the ledger and execute the
    /// refund. Run while holding the ABORTED claim.
    async fn refund_claimed(
        &self,
        match_id: MatchId,
        deposit_sig: &TxSignature,
        player: &WalletAddress,
    ) -> Result<AbortOutcome> {
        let failed = |reason: String| StakematchError::RefundFailed { match_id, reason };

        let tx = self
            .ledger()
            .get_finalized_transaction(deposit_sig)
            .await
            .map_err(|err| failed(err.to_string()))?
            .ok_or_else(|| failed(format!("deposit transaction {} not found", deposit_sig.short())))?;
        let transfer = find_transfer_from_to(&tx, player, &self.config().treasury)
            .ok_or_else(|| failed("no matching transfer in deposit transaction".to_string()))?;

        let refunded_lamports = transfer
            .lamports
            .saturating_sub(self.config().network_fee_lamports);
        let refund_sig = self
            .ledger()
            .refund(match_id, player, refunded_lamports)
            .await
            .map_err(|err| failed(err.to_string()))?;

        Ok(AbortOutcome {
            match_id,
            refunded_lamports,
            refund_sig,
        })
    }
}
