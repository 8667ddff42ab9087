//! Completion — the idempotency-critical path.
//!
//! The SETTLING claim (a status-guarded update in the store) is the sole
//! mechanism keeping two concurrent completion calls from both paying
//! out: a client-reported completion racing the timeout sweep resolves to
//! exactly one settlement. The ledger call runs only after the claim is
//! durably recorded and outside any store transaction, so a crash
//! mid-call leaves the match visibly stuck in SETTLING rather than
//! silently double-payable.

use stakematch_ledger::{LedgerClient, SettleRequest};
use stakematch_types::{MatchId, Result, StakematchError, TxSignature, WalletAddress};

use crate::MatchEngine;

/// What a successful settlement returns.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    pub match_id: MatchId,
    pub winner: WalletAddress,
    /// Signature of the ledger settle transaction.
    pub settle_sig: TxSignature,
    pub total_lamports: u64,
    pub fee_lamports: u64,
    /// Lamports the winner netted: `total - fee`.
    pub winner_payout: u64,
}

impl<L: LedgerClient> MatchEngine<L> {
    /// Complete a match and settle it on the ledger.
    ///
    /// 1. Claim: CAS IN_PROGRESS → SETTLING; zero rows means another
    ///    caller holds (or held) the claim — `AlreadyClaimed`.
    /// 2. Re-load; a vanished row after a successful claim is an
    ///    invariant breach.
    /// 3. Validate the winner is a participant, before any ledger call.
    /// 4. Compute the wagered total and the mode-selected fee.
    /// 5. Ledger settle, outside any store transaction.
    /// 6. On success: FINISHED + winner + point increments, one store
    ///    transaction.
    /// 7. On ledger failure: CAS back to IN_PROGRESS and surface a
    ///    retryable error; no points, no winner.
    pub async fn complete_match(
        &self,
        match_id: MatchId,
        winner: &WalletAddress,
    ) -> Result<SettlementOutcome> {
        if !self.store().claim_settling(match_id).await {
            return match self.store().get(match_id).await {
                None => Err(StakematchError::MatchNotFound(match_id)),
                Some(_) => Err(StakematchError::AlreadyClaimed(match_id)),
            };
        }

        // Steps 2-4: everything before the ledger call. Failures here
        // release the claim so a later completion can succeed.
        let request = match self.build_settle_request(match_id, winner).await {
            Ok(request) => request,
            Err(err) => {
                self.rollback_claim(match_id, &err).await;
                return Err(err);
            }
        };

        let settle_sig = match self.ledger().settle(&request).await {
            Ok(sig) => sig,
            Err(err) => {
                let err = StakematchError::SettleFailed {
                    match_id,
                    reason: err.to_string(),
                };
                self.rollback_claim(match_id, &err).await;
                return Err(err);
            }
        };

        // Payment went out: the claim is no longer rolled back. A finish
        // failure leaves the match in SETTLING for operator recovery
        // instead of re-exposing it to a second payout.
        let record = self.store().finish(match_id, winner).await.map_err(|err| {
            tracing::error!(
                match_id = %match_id,
                settle_sig = settle_sig.short(),
                error = %err,
                "Settled on ledger but could not finalize; match left SETTLING"
            );
            err
        })?;

        let outcome = SettlementOutcome {
            match_id,
            winner: winner.clone(),
            settle_sig,
            total_lamports: request.total_lamports,
            fee_lamports: request.fee_lamports,
            winner_payout: request.winner_payout(),
        };
        tracing::info!(
            match_id = %match_id,
            winner = %winner,
            mode = %record.mode,
            payout = outcome.winner_payout,
            fee = outcome.fee_lamports,
            "Match settled"
        );
        Ok(outcome)
    }

    /// Steps 2-4: re-load under the claim, validate the winner, compute
    /// amounts. No ledger mutation happens here.
    async fn build_settle_request(
        &self,
        match_id: MatchId,
        winner: &WalletAddress,
    ) -> Result<SettleRequest> {
        let record = self.store().get(match_id).await.ok_or_else(|| {
            StakematchError::Internal(format!("claimed match {match_id} vanished"))
        })?;

        if !record.is_participant(winner) {
            return Err(StakematchError::WinnerNotParticipant {
                match_id,
                winner: winner.clone(),
            });
        }

        let total_lamports = record.total_deposit_lamports();
        let fee_config = self.fees().current(self.ledger()).await?;
        let fee_lamports = fee_config.settlement_fee_lamports(total_lamports, record.mode);

        Ok(SettleRequest {
            match_id,
            total_lamports,
            fee_lamports,
            mode: record.mode,
            winner: winner.clone(),
        })
    }

    async fn rollback_claim(&self, match_id: MatchId, err: &StakematchError) {
        if !self.store().unclaim_settling(match_id).await {
            tracing::error!(match_id = %match_id, "Settlement rollback found no SETTLING row");
        }
        tracing::warn!(match_id = %match_id, error = %err, "Settlement failed; claim rolled back");
    }
}
