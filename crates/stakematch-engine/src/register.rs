//! Registration: deposit verification plus matchmaking.
//!
//! The deposit signature is consumed *before* the deposit is verified —
//! an optimistic insert whose uniqueness conflict is the replay guard.
//! Every failure after that insert compensates by releasing the signature
//! so a corrected retry can reuse it.
//!
//! PvE registration is the simplified single-player path: the deposit is
//! verified the same way, but no matchmaking runs and the match is
//! created already FINISHED with the completion point awarded.

use rust_decimal::Decimal;

use stakematch_ledger::{
    LedgerClient, SysTransfer, find_any_transfer, find_transfer_from_to, find_transfer_to,
};
use stakematch_store::MatchTicket;
use stakematch_types::{
    MatchId, MatchMode, MatchStatus, PlayerEntry, PlayerSlot, Result, StakematchError,
    TxSignature, WalletAddress, constants,
};

use crate::MatchEngine;
use crate::saga::Saga;

/// Inputs to a PvP registration.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub address: WalletAddress,
    /// Signature of the ledger transaction that paid the entry fee.
    pub deposit_sig: TxSignature,
    pub game: String,
    pub mode: MatchMode,
    pub region: String,
    /// USD stake. Required and positive for BETTING; defaulted for CASUAL.
    pub bet_amount: Option<Decimal>,
}

/// What a successful registration returns to the caller.
#[derive(Debug, Clone)]
pub struct RegisterOutcome {
    pub match_id: MatchId,
    /// Which player slot the registration filled.
    pub slot: PlayerSlot,
    pub status: MatchStatus,
    pub bet_amount: Decimal,
    pub match_fee: Decimal,
}

/// What a successful PvE registration returns.
#[derive(Debug, Clone)]
pub struct PveOutcome {
    pub match_id: MatchId,
    pub points_awarded: u64,
}

impl<L: LedgerClient> MatchEngine<L> {
    /// Register a player for a PvP match.
    ///
    /// Verifies the deposit against the ledger, then either attaches the
    /// player to the oldest open match with equal parameters or creates a
    /// new WAITING one. The deposit signature is released again on every
    /// failure past its consumption.
    pub async fn register_player(&self, request: RegisterRequest) -> Result<RegisterOutcome> {
        validate_pvp(&request)?;
        let stake = self.resolve_stake(&request)?;

        // Optimistic insert; a conflict is DuplicateDeposit with no
        // side effects. Everything after this point compensates.
        self.store().consume_deposit_sig(&request.deposit_sig).await?;

        let mut saga = Saga::new();
        {
            let sig = request.deposit_sig.clone();
            saga.push(async move { self.store().release_deposit_sig(&sig).await });
        }

        match self.verify_and_place(&request, stake).await {
            Ok(outcome) => {
                saga.commit();
                tracing::info!(
                    match_id = %outcome.match_id,
                    player = %request.address,
                    slot = outcome.slot.player_number(),
                    status = %outcome.status,
                    "Player registered"
                );
                Ok(outcome)
            }
            Err(err) => {
                tracing::warn!(
                    player = %request.address,
                    sig = request.deposit_sig.short(),
                    error = %err,
                    "Registration failed; compensating"
                );
                saga.unwind().await;
                Err(err)
            }
        }
    }

    /// Register a PvE (single-player) session.
    ///
    /// Verifies the deposit and immediately records a terminal FINISHED
    /// match with the completion point awarded. There is no opponent, so
    /// no settlement claim race applies — and, matching the production
    /// behavior, no deposit-signature uniqueness insert is performed.
    pub async fn register_player_pve(
        &self,
        address: WalletAddress,
        deposit_sig: TxSignature,
        game: String,
    ) -> Result<PveOutcome> {
        if address.as_str().is_empty() {
            return Err(StakematchError::MissingField { field: "walletAddress" });
        }
        if deposit_sig.as_str().is_empty() {
            return Err(StakematchError::MissingField { field: "txSignature" });
        }
        if game.is_empty() {
            return Err(StakematchError::MissingField { field: "game" });
        }

        let transfer = self.verified_deposit(&address, &deposit_sig).await?;
        self.store().get_or_create_wallet(&address).await;

        let entry = PlayerEntry::new(address.clone(), deposit_sig, transfer.lamports);
        let record = self.store().insert_finished_pve(entry, game).await;
        tracing::info!(match_id = %record.match_id, player = %address, "PvE match recorded");
        Ok(PveOutcome {
            match_id: record.match_id,
            points_awarded: constants::POINTS_PVE,
        })
    }

    /// The fallible tail of registration, run under the saga.
    async fn verify_and_place(
        &self,
        request: &RegisterRequest,
        stake: Decimal,
    ) -> Result<RegisterOutcome> {
        let transfer = self
            .verified_deposit(&request.address, &request.deposit_sig)
            .await?;
        self.store().get_or_create_wallet(&request.address).await;

        let fee_config = self.fees().current(self.ledger()).await?;
        let match_fee = fee_config.match_fee(stake, request.mode);

        let ticket = MatchTicket {
            player: PlayerEntry::new(
                request.address.clone(),
                request.deposit_sig.clone(),
                transfer.lamports,
            ),
            game: request.game.clone(),
            mode: request.mode,
            region: request.region.clone(),
            bet_amount: stake,
            match_fee,
        };
        let (record, slot) = self.store().find_or_join(ticket).await?;
        Ok(RegisterOutcome {
            match_id: record.match_id,
            slot,
            status: record.status,
            bet_amount: record.bet_amount,
            match_fee: record.match_fee,
        })
    }

    /// Fetch and verify the deposit transaction: finalized, contains a
    /// native transfer, lands at the treasury, sent by the claimed player.
    /// Returns the matched transfer (amount in lamports).
    pub(crate) async fn verified_deposit(
        &self,
        player: &WalletAddress,
        sig: &TxSignature,
    ) -> Result<SysTransfer> {
        let tx = self
            .ledger()
            .get_finalized_transaction(sig)
            .await?
            .ok_or_else(|| StakematchError::DepositNotFound(sig.clone()))?;
        if !tx.success {
            return Err(StakematchError::DepositNotFinalized(sig.clone()));
        }
        if find_any_transfer(&tx).is_none() {
            return Err(StakematchError::NoTransferFound(sig.clone()));
        }
        let treasury = &self.config().treasury;
        if find_transfer_to(&tx, treasury).is_none() {
            return Err(StakematchError::WrongDestination {
                expected: treasury.clone(),
            });
        }
        find_transfer_from_to(&tx, player, treasury).ok_or_else(|| StakematchError::WrongSender {
            expected: player.clone(),
        })
    }

    fn resolve_stake(&self, request: &RegisterRequest) -> Result<Decimal> {
        match request.bet_amount {
            Some(stake) if stake > Decimal::ZERO => Ok(stake),
            Some(stake) => Err(StakematchError::InvalidStake { stake }),
            None if request.mode.requires_stake() => {
                Err(StakematchError::InvalidStake { stake: Decimal::ZERO })
            }
            None => Ok(self.config().default_bet_usd),
        }
    }
}

fn validate_pvp(request: &RegisterRequest) -> Result<()> {
    if request.address.as_str().is_empty() {
        return Err(StakematchError::MissingField { field: "walletAddress" });
    }
    if request.deposit_sig.as_str().is_empty() {
        return Err(StakematchError::MissingField { field: "txSignature" });
    }
    if request.game.is_empty() {
        return Err(StakematchError::MissingField { field: "game" });
    }
    if request.region.is_empty() {
        return Err(StakematchError::MissingField { field: "region" });
    }
    if request.mode == MatchMode::Pve {
        // PvE has its own path; routed here it is a mode misuse.
        return Err(StakematchError::InvalidMode {
            value: request.mode.to_string(),
        });
    }
    Ok(())
}
