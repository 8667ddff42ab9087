//! Batch airdrop executor.
//!
//! Iterates recipients sequentially with a short pause between ledger
//! submissions, isolating per-recipient failures: one rejected transfer
//! never stops the batch. Input parsing and report files live with the
//! operational tooling, not here.

use std::time::Duration;

use stakematch_ledger::LedgerClient;
use stakematch_types::{TxSignature, WalletAddress, constants};

use crate::MatchEngine;

/// One planned transfer of an airdrop batch.
#[derive(Debug, Clone)]
pub struct AirdropRecipient {
    pub address: WalletAddress,
    pub lamports: u64,
}

/// Per-batch result summary.
#[derive(Debug, Default)]
pub struct AirdropSummary {
    pub sent: usize,
    pub failed: usize,
    pub total_lamports_sent: u64,
    pub signatures: Vec<TxSignature>,
}

impl<L: LedgerClient> MatchEngine<L> {
    /// Execute an airdrop batch from the treasury.
    pub async fn run_airdrop(&self, recipients: &[AirdropRecipient]) -> AirdropSummary {
        let mut summary = AirdropSummary::default();
        for (index, recipient) in recipients.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(Duration::from_millis(constants::AIRDROP_TRANSFER_PAUSE_MS))
                    .await;
            }
            match self
                .ledger()
                .airdrop_transfer(&recipient.address, recipient.lamports)
                .await
            {
                Ok(sig) => {
                    tracing::info!(
                        recipient = %recipient.address,
                        lamports = recipient.lamports,
                        sig = sig.short(),
                        "Airdrop transfer sent"
                    );
                    summary.sent += 1;
                    summary.total_lamports_sent += recipient.lamports;
                    summary.signatures.push(sig);
                }
                Err(err) => {
                    tracing::warn!(
                        recipient = %recipient.address,
                        lamports = recipient.lamports,
                        error = %err,
                        "Airdrop transfer failed; continuing batch"
                    );
                    summary.failed += 1;
                }
            }
        }
        tracing::info!(
            sent = summary.sent,
            failed = summary.failed,
            total_lamports = summary.total_lamports_sent,
            "Airdrop batch done"
        );
        summary
    }
}
