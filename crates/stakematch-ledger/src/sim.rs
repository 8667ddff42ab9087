//! In-process simulated ledger for tests, behind the `test-helpers`
//! feature.
//!
//! Behaves like the real program from the coordinator's point of view:
//! deposits are finalized transfer transactions keyed by signature, the
//! treasury holds pooled lamports, and settle/refund/airdrop debit it
//! atomically. Per-operation failure injection exercises the engine's
//! rollback paths. Submission signatures are deterministic: a sha256
//! digest over the operation and a monotonic counter, signed by the
//! authority key.

use std::collections::HashMap;
use std::sync::Mutex;

use sha2::{Digest, Sha256};

use stakematch_types::{MatchId, Result, StakematchError, TxSignature, WalletAddress};

use crate::authority::SettlementAuthority;
use crate::client::{LedgerClient, RawFeeConfig, SettleRequest};
use crate::transaction::{ParsedInstruction, ParsedTransaction, transfer_transaction};

/// An outbound payment the sim executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payout {
    pub kind: PayoutKind,
    pub recipient: WalletAddress,
    pub lamports: u64,
    pub signature: TxSignature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayoutKind {
    Settle,
    Refund,
    Airdrop,
}

struct SimState {
    transactions: HashMap<TxSignature, ParsedTransaction>,
    fee_account: Option<RawFeeConfig>,
    treasury_lamports: u64,
    payouts: Vec<Payout>,
    fail_next_settle: bool,
    fail_next_refund: bool,
    fail_next_airdrop: bool,
    submissions: u64,
}

/// Simulated ledger. Interior mutex keeps every financial operation
/// atomic, matching the real program's all-or-nothing instructions.
pub struct SimLedger {
    treasury: WalletAddress,
    authority: SettlementAuthority,
    state: Mutex<SimState>,
}

impl SimLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            treasury: WalletAddress::new("sim-treasury-pda"),
            authority: SettlementAuthority::from_seed([42u8; 32]),
            state: Mutex::new(SimState {
                transactions: HashMap::new(),
                fee_account: Some(RawFeeConfig {
                    casual_fee_bps: Some(2_000),
                    betting_fee_bps: Some(2_000),
                }),
                treasury_lamports: 0,
                payouts: Vec::new(),
                fail_next_settle: false,
                fail_next_refund: false,
                fail_next_airdrop: false,
                submissions: 0,
            }),
        }
    }

    /// The treasury address deposits must land at.
    #[must_use]
    pub fn treasury(&self) -> WalletAddress {
        self.treasury.clone()
    }

    /// Record a finalized deposit from `from` to the treasury; credits the
    /// treasury and returns the deposit's signature.
    pub fn deposit(&self, from: &WalletAddress, lamports: u64) -> TxSignature {
        let mut state = self.state.lock().expect("sim ledger poisoned");
        let sig = self.next_signature(&mut state, "deposit");
        let tx = transfer_transaction(sig.clone(), from.as_str(), self.treasury.as_str(), lamports);
        state.transactions.insert(sig.clone(), tx);
        state.treasury_lamports += lamports;
        sig
    }

    /// Like [`SimLedger::deposit`] but with the transfer nested inside an
    /// inner instruction list behind an opaque program invoke.
    pub fn deposit_nested(&self, from: &WalletAddress, lamports: u64) -> TxSignature {
        let mut state = self.state.lock().expect("sim ledger poisoned");
        let sig = self.next_signature(&mut state, "deposit");
        let inner = transfer_transaction(sig.clone(), from.as_str(), self.treasury.as_str(), lamports);
        let tx = ParsedTransaction {
            signature: sig.clone(),
            success: true,
            instructions: vec![ParsedInstruction {
                program: "wager-program".to_string(),
                parsed: serde_json::json!({ "type": "payEntry" }),
            }],
            inner_instructions: vec![inner.instructions],
        };
        state.transactions.insert(sig.clone(), tx);
        state.treasury_lamports += lamports;
        sig
    }

    /// Insert an arbitrary transaction fixture (e.g. a failed one).
    pub fn insert_transaction(&self, tx: ParsedTransaction) {
        let mut state = self.state.lock().expect("sim ledger poisoned");
        state.transactions.insert(tx.signature.clone(), tx);
    }

    /// Replace the fee account. `None` simulates a missing account
    /// (transport-style failure on read).
    pub fn set_fee_account(&self, account: Option<RawFeeConfig>) {
        self.state.lock().expect("sim ledger poisoned").fee_account = account;
    }

    pub fn fail_next_settle(&self) {
        self.state.lock().expect("sim ledger poisoned").fail_next_settle = true;
    }

    pub fn fail_next_refund(&self) {
        self.state.lock().expect("sim ledger poisoned").fail_next_refund = true;
    }

    pub fn fail_next_airdrop(&self) {
        self.state.lock().expect("sim ledger poisoned").fail_next_airdrop = true;
    }

    /// Every payment executed so far, in order.
    #[must_use]
    pub fn payouts(&self) -> Vec<Payout> {
        self.state.lock().expect("sim ledger poisoned").payouts.clone()
    }

    #[must_use]
    pub fn treasury_lamports(&self) -> u64 {
        self.state.lock().expect("sim ledger poisoned").treasury_lamports
    }

    fn next_signature(&self, state: &mut SimState, op: &str) -> TxSignature {
        state.submissions += 1;
        let mut hasher = Sha256::new();
        hasher.update(b"stakematch:sim:v1:");
        hasher.update(op.as_bytes());
        hasher.update(state.submissions.to_le_bytes());
        let digest = hasher.finalize();
        let sig = self.authority.sign(&digest);
        TxSignature::new(hex::encode(sig.to_bytes()))
    }

    fn pay(
        &self,
        op: &str,
        kind: PayoutKind,
        recipient: &WalletAddress,
        lamports: u64,
    ) -> Result<TxSignature> {
        let mut state = self.state.lock().expect("sim ledger poisoned");
        if state.treasury_lamports < lamports {
            return Err(StakematchError::LedgerUnavailable {
                reason: format!(
                    "insufficient treasury funds: need {lamports}, have {}",
                    state.treasury_lamports
                ),
            });
        }
        state.treasury_lamports -= lamports;
        let signature = self.next_signature(&mut state, op);
        state.payouts.push(Payout {
            kind,
            recipient: recipient.clone(),
            lamports,
            signature: signature.clone(),
        });
        Ok(signature)
    }
}

impl Default for SimLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerClient for SimLedger {
    async fn get_finalized_transaction(
        &self,
        signature: &TxSignature,
    ) -> Result<Option<ParsedTransaction>> {
        let state = self.state.lock().expect("sim ledger poisoned");
        Ok(state.transactions.get(signature).cloned())
    }

    async fn settle(&self, request: &SettleRequest) -> Result<TxSignature> {
        {
            let mut state = self.state.lock().expect("sim ledger poisoned");
            if state.fail_next_settle {
                state.fail_next_settle = false;
                return Err(StakematchError::LedgerUnavailable {
                    reason: "injected settle failure".into(),
                });
            }
        }
        // Fee lamports stay in the treasury; only the payout leaves.
        self.pay(
            "settle",
            PayoutKind::Settle,
            &request.winner,
            request.winner_payout(),
        )
    }

    async fn refund(
        &self,
        _match_id: MatchId,
        player: &WalletAddress,
        lamports: u64,
    ) -> Result<TxSignature> {
        {
            let mut state = self.state.lock().expect("sim ledger poisoned");
            if state.fail_next_refund {
                state.fail_next_refund = false;
                return Err(StakematchError::LedgerUnavailable {
                    reason: "injected refund failure".into(),
                });
            }
        }
        self.pay("refund", PayoutKind::Refund, player, lamports)
    }

    async fn airdrop_transfer(&self, recipient: &WalletAddress, lamports: u64) -> Result<TxSignature> {
        {
            let mut state = self.state.lock().expect("sim ledger poisoned");
            if state.fail_next_airdrop {
                state.fail_next_airdrop = false;
                return Err(StakematchError::LedgerUnavailable {
                    reason: "injected airdrop failure".into(),
                });
            }
        }
        self.pay("airdrop", PayoutKind::Airdrop, recipient, lamports)
    }

    async fn get_fee_config(&self) -> Result<RawFeeConfig> {
        let state = self.state.lock().expect("sim ledger poisoned");
        state
            .fee_account
            .ok_or(StakematchError::LedgerUnavailable {
                reason: "fee config account not found".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakematch_types::MatchMode;

    use crate::verifier::{find_any_transfer, find_transfer_from_to};

    #[tokio::test]
    async fn deposit_is_retrievable_and_verifiable() {
        let sim = SimLedger::new();
        let alice = WalletAddress::new("alice");
        let sig = sim.deposit(&alice, 5_000_000);

        let tx = sim.get_finalized_transaction(&sig).await.unwrap().unwrap();
        assert!(tx.success);
        let transfer = find_transfer_from_to(&tx, &alice, &sim.treasury()).unwrap();
        assert_eq!(transfer.lamports, 5_000_000);
        assert_eq!(sim.treasury_lamports(), 5_000_000);
    }

    #[tokio::test]
    async fn nested_deposit_found_in_inner_instructions() {
        let sim = SimLedger::new();
        let alice = WalletAddress::new("alice");
        let sig = sim.deposit_nested(&alice, 1_000);

        let tx = sim.get_finalized_transaction(&sig).await.unwrap().unwrap();
        assert!(tx.instructions[0].program != "system");
        assert_eq!(find_any_transfer(&tx).unwrap().lamports, 1_000);
    }

    #[tokio::test]
    async fn unknown_signature_is_none() {
        let sim = SimLedger::new();
        let got = sim
            .get_finalized_transaction(&TxSignature::new("missing"))
            .await
            .unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn settle_debits_treasury_and_records_payout() {
        let sim = SimLedger::new();
        sim.deposit(&WalletAddress::new("a"), 5_000_000);
        sim.deposit(&WalletAddress::new("b"), 5_000_000);

        let req = SettleRequest {
            match_id: MatchId::new(),
            total_lamports: 10_000_000,
            fee_lamports: 2_000_000,
            mode: MatchMode::Casual,
            winner: WalletAddress::new("a"),
        };
        let sig = sim.settle(&req).await.unwrap();

        let payouts = sim.payouts();
        assert_eq!(payouts.len(), 1);
        assert_eq!(payouts[0].kind, PayoutKind::Settle);
        assert_eq!(payouts[0].lamports, 8_000_000);
        assert_eq!(payouts[0].signature, sig);
        // Fee stays pooled.
        assert_eq!(sim.treasury_lamports(), 2_000_000);
    }

    #[tokio::test]
    async fn injected_settle_failure_fires_once() {
        let sim = SimLedger::new();
        sim.deposit(&WalletAddress::new("a"), 10_000_000);
        sim.fail_next_settle();

        let req = SettleRequest {
            match_id: MatchId::new(),
            total_lamports: 1_000,
            fee_lamports: 0,
            mode: MatchMode::Casual,
            winner: WalletAddress::new("a"),
        };
        assert!(sim.settle(&req).await.is_err());
        assert!(sim.settle(&req).await.is_ok(), "flag consumed by first call");
    }

    #[tokio::test]
    async fn refund_fails_on_insufficient_treasury() {
        let sim = SimLedger::new();
        let err = sim
            .refund(MatchId::new(), &WalletAddress::new("a"), 1_000)
            .await
            .unwrap_err();
        assert!(matches!(err, StakematchError::LedgerUnavailable { .. }));
    }

    #[tokio::test]
    async fn submission_signatures_are_unique() {
        let sim = SimLedger::new();
        let a = sim.deposit(&WalletAddress::new("a"), 1);
        let b = sim.deposit(&WalletAddress::new("a"), 1);
        assert_ne!(a, b);
    }
}
