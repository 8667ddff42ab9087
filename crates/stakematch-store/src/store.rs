//! The in-memory match repository.
//!
//! A single mutex serializes each public operation, standing in for the
//! relational store's transaction boundary: `find_or_join` is the
//! matchmaking serialization point (at most one playerB ever attaches to
//! a WAITING match), the consumed-signature set is the deposit
//! idempotency guard, and every status claim is a conditional update that
//! either moves the row or reports zero rows affected.
//!
//! No `.await` ever happens while the mutex is held.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use stakematch_types::{
    MatchId, MatchMode, MatchRecord, MatchStatus, PlayerEntry, PlayerSlot, Result,
    StakematchError, TxSignature, Wallet, WalletAddress, constants,
};

/// What a registration brings to matchmaking: the player's verified
/// deposit plus the match parameters an open match must equal.
#[derive(Debug, Clone)]
pub struct MatchTicket {
    pub player: PlayerEntry,
    pub game: String,
    pub mode: MatchMode,
    pub region: String,
    pub bet_amount: Decimal,
    pub match_fee: Decimal,
}

#[derive(Default)]
struct Inner {
    wallets: HashMap<WalletAddress, Wallet>,
    matches: HashMap<MatchId, MatchRecord>,
    consumed_sigs: HashSet<TxSignature>,
}

/// The match repository. See the crate docs for the transaction model.
#[derive(Default)]
pub struct MatchStore {
    inner: Mutex<Inner>,
}

impl MatchStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("match store poisoned")
    }

    // -----------------------------------------------------------------
    // Deposit signatures (EntryFeeTransaction)
    // -----------------------------------------------------------------

    /// Optimistically consume a deposit signature. A uniqueness conflict
    /// means the deposit was already spent on an earlier registration.
    ///
    /// # Errors
    /// [`StakematchError::DuplicateDeposit`] on conflict; no side effects.
    pub async fn consume_deposit_sig(&self, sig: &TxSignature) -> Result<()> {
        let mut inner = self.lock();
        if !inner.consumed_sigs.insert(sig.clone()) {
            return Err(StakematchError::DuplicateDeposit(sig.clone()));
        }
        Ok(())
    }

    /// Compensating delete: free the signature again after a later
    /// registration step failed, so a corrected retry can reuse it.
    pub async fn release_deposit_sig(&self, sig: &TxSignature) {
        let mut inner = self.lock();
        if !inner.consumed_sigs.remove(sig) {
            tracing::warn!(sig = sig.short(), "Released deposit signature was not consumed");
        }
    }

    /// Whether a signature has been consumed (test/operator visibility).
    pub async fn deposit_sig_consumed(&self, sig: &TxSignature) -> bool {
        self.lock().consumed_sigs.contains(sig)
    }

    // -----------------------------------------------------------------
    // Wallets
    // -----------------------------------------------------------------

    pub async fn get_or_create_wallet(&self, address: &WalletAddress) -> Wallet {
        let mut inner = self.lock();
        inner
            .wallets
            .entry(address.clone())
            .or_insert_with(|| Wallet::new(address.clone()))
            .clone()
    }

    pub async fn wallet(&self, address: &WalletAddress) -> Option<Wallet> {
        self.lock().wallets.get(address).cloned()
    }

    /// Increment a wallet's points, creating the wallet if needed.
    pub async fn add_points(&self, address: &WalletAddress, points: u64) {
        let mut inner = self.lock();
        inner
            .wallets
            .entry(address.clone())
            .or_insert_with(|| Wallet::new(address.clone()))
            .points += points;
    }

    // -----------------------------------------------------------------
    // Matchmaking
    // -----------------------------------------------------------------

    /// Find the oldest open match this ticket can join, or create a new
    /// WAITING one. One transaction: concurrent registrations racing for
    /// the same open match cannot both attach as playerB.
    pub async fn find_or_join(&self, ticket: MatchTicket) -> Result<(MatchRecord, PlayerSlot)> {
        let mut inner = self.lock();

        let open_id = inner
            .matches
            .values()
            .filter(|m| {
                m.status == MatchStatus::Waiting
                    && m.player_b.is_none()
                    && m.game == ticket.game
                    && m.mode == ticket.mode
                    && m.region == ticket.region
                    && m.bet_amount == ticket.bet_amount
                    && m.player_a.address != ticket.player.address
            })
            .min_by_key(|m| (m.created_at, m.match_id))
            .map(|m| m.match_id);

        if let Some(id) = open_id {
            let m = inner
                .matches
                .get_mut(&id)
                .ok_or_else(|| StakematchError::Internal("open match vanished mid-transaction".into()))?;
            m.player_b = Some(ticket.player);
            m.status = MatchStatus::InProgress;
            m.started_at = Some(Utc::now());
            return Ok((m.clone(), PlayerSlot::B));
        }

        let record = MatchRecord::open(
            ticket.game,
            ticket.mode,
            ticket.region,
            ticket.bet_amount,
            ticket.match_fee,
            ticket.player,
        );
        inner.matches.insert(record.match_id, record.clone());
        Ok((record, PlayerSlot::A))
    }

    /// Insert a terminal PvE match and award the completion point, as one
    /// transaction.
    pub async fn insert_finished_pve(&self, player: PlayerEntry, game: String) -> MatchRecord {
        let mut inner = self.lock();
        let address = player.address.clone();
        let now = Utc::now();

        let mut record = MatchRecord::open(
            game,
            MatchMode::Pve,
            String::new(),
            Decimal::ZERO,
            Decimal::ZERO,
            player,
        );
        record.status = MatchStatus::Finished;
        record.ended_at = Some(now);

        inner
            .wallets
            .entry(address.clone())
            .or_insert_with(|| Wallet::new(address))
            .points += constants::POINTS_PVE;
        inner.matches.insert(record.match_id, record.clone());
        record
    }

    // -----------------------------------------------------------------
    // Status-guarded transitions (conditional updates)
    // -----------------------------------------------------------------

    /// Conditional update: apply `mutate` only where the current status
    /// equals `expect`. Returns false when zero rows matched.
    fn cas(
        inner: &mut Inner,
        id: MatchId,
        expect: MatchStatus,
        mutate: impl FnOnce(&mut MatchRecord),
    ) -> bool {
        match inner.matches.get_mut(&id) {
            Some(m) if m.status == expect => {
                mutate(m);
                true
            }
            _ => false,
        }
    }

    /// Claim settlement: IN_PROGRESS → SETTLING. Returns false when zero
    /// rows matched — another caller already claimed, or the match was
    /// never in progress.
    pub async fn claim_settling(&self, id: MatchId) -> bool {
        Self::cas(&mut self.lock(), id, MatchStatus::InProgress, |m| {
            m.status = MatchStatus::Settling;
        })
    }

    /// Roll a failed settlement claim back: SETTLING → IN_PROGRESS.
    pub async fn unclaim_settling(&self, id: MatchId) -> bool {
        Self::cas(&mut self.lock(), id, MatchStatus::Settling, |m| {
            m.status = MatchStatus::InProgress;
        })
    }

    /// Claim abort: WAITING → ABORTED, stamping `ended_at`.
    pub async fn claim_abort(&self, id: MatchId) -> bool {
        Self::cas(&mut self.lock(), id, MatchStatus::Waiting, |m| {
            m.status = MatchStatus::Aborted;
            m.ended_at = Some(Utc::now());
        })
    }

    /// Roll a failed refund back: ABORTED → WAITING, clearing `ended_at`
    /// so the match may be retried or still joined.
    pub async fn unclaim_abort(&self, id: MatchId) -> bool {
        Self::cas(&mut self.lock(), id, MatchStatus::Aborted, |m| {
            m.status = MatchStatus::Waiting;
            m.ended_at = None;
        })
    }

    /// Finalize a settled match: SETTLING → FINISHED with winner,
    /// `ended_at`, and both point increments, as one transaction.
    ///
    /// A match with no counterpart (degenerate single-participant) skips
    /// the loser increment — logged, not fatal.
    ///
    /// # Errors
    /// - [`StakematchError::MatchNotFound`] if the id is unknown
    /// - [`StakematchError::Internal`] if the match is not SETTLING or
    ///   the winner's wallet is missing (both invariant breaches)
    pub async fn finish(&self, id: MatchId, winner: &WalletAddress) -> Result<MatchRecord> {
        let mut inner = self.lock();

        let m = inner
            .matches
            .get(&id)
            .ok_or(StakematchError::MatchNotFound(id))?;
        if m.status != MatchStatus::Settling {
            return Err(StakematchError::Internal(format!(
                "finish called on match {id} in status {}",
                m.status
            )));
        }
        if !inner.wallets.contains_key(winner) {
            return Err(StakematchError::Internal(format!(
                "winner wallet {winner} missing for match {id}"
            )));
        }

        let loser = inner
            .matches
            .get(&id)
            .and_then(|m| m.counterpart_of(winner))
            .map(|p| p.address.clone());

        let m = inner
            .matches
            .get_mut(&id)
            .ok_or(StakematchError::MatchNotFound(id))?;
        m.status = MatchStatus::Finished;
        m.winner = Some(winner.clone());
        m.ended_at = Some(Utc::now());
        let record = m.clone();

        if let Some(w) = inner.wallets.get_mut(winner) {
            w.points += constants::POINTS_WIN;
        }
        match loser {
            Some(addr) => match inner.wallets.get_mut(&addr) {
                Some(w) => w.points += constants::POINTS_LOSS,
                None => {
                    tracing::warn!(match_id = %id, loser = %addr, "Loser wallet missing; skipping increment");
                }
            },
            None => {
                tracing::warn!(match_id = %id, "Match has no counterpart; skipping loser increment");
            }
        }

        Ok(record)
    }

    // -----------------------------------------------------------------
    // Reads and join tracking
    // -----------------------------------------------------------------

    pub async fn get(&self, id: MatchId) -> Option<MatchRecord> {
        self.lock().matches.get(&id).cloned()
    }

    /// Record a participant's realtime-session join timestamp.
    /// Side-effect only; status is untouched.
    pub async fn record_join(
        &self,
        id: MatchId,
        address: &WalletAddress,
        at: DateTime<Utc>,
    ) -> Result<PlayerSlot> {
        let mut inner = self.lock();
        let m = inner
            .matches
            .get_mut(&id)
            .ok_or(StakematchError::MatchNotFound(id))?;
        match m.slot_of(address) {
            Some(PlayerSlot::A) => {
                m.player_a.joined_at = Some(at);
                Ok(PlayerSlot::A)
            }
            Some(PlayerSlot::B) => {
                if let Some(b) = m.player_b.as_mut() {
                    b.joined_at = Some(at);
                }
                Ok(PlayerSlot::B)
            }
            None => Err(StakematchError::NotParticipant {
                match_id: id,
                address: address.clone(),
            }),
        }
    }

    /// IN_PROGRESS matches whose session started before `cutoff`.
    pub async fn stale_in_progress(&self, cutoff: DateTime<Utc>) -> Vec<MatchRecord> {
        let inner = self.lock();
        let mut stale: Vec<MatchRecord> = inner
            .matches
            .values()
            .filter(|m| {
                m.status == MatchStatus::InProgress
                    && m.started_at.is_some_and(|t| t < cutoff)
            })
            .cloned()
            .collect();
        stale.sort_by_key(|m| (m.started_at, m.match_id));
        stale
    }
}
