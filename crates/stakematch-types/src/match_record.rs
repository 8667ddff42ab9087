//! The match entity and its lifecycle state machine.
//!
//! A match moves through:
//!
//! ```text
//! (register, no open match)  ──► WAITING ──(second register)──► IN_PROGRESS
//!       WAITING ──(abort by playerA)──► ABORTED   (rolled back on refund failure)
//!       IN_PROGRESS ──(settlement claim)──► SETTLING
//!       SETTLING ──(ledger settle ok)──► FINISHED
//!       SETTLING ──(ledger settle failed)──► IN_PROGRESS
//! ```
//!
//! `FINISHED` is terminal; `ABORTED` is terminal once the refund succeeds.
//! The SETTLING claim is the sole mechanism preventing two concurrent
//! completion calls from both paying out.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{MatchId, StakematchError, TxSignature, WalletAddress};

// ---------------------------------------------------------------------------
// MatchStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    /// Created by the first registration; waiting for an opponent.
    Waiting,
    /// Both players registered; the realtime session may run.
    InProgress,
    /// Settlement claimed; a ledger settle call is (or was) in flight.
    Settling,
    /// Settled and paid out. Terminal.
    Finished,
    /// Aborted by playerA and refunded. Terminal once the refund succeeds.
    Aborted,
}

impl MatchStatus {
    /// Whether the status admits no further transitions in normal operation.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Aborted)
    }

    /// The state-machine transition table. Rollback edges
    /// (SETTLING → IN_PROGRESS, ABORTED → WAITING) are included: an
    /// aborted-but-not-yet-refunded match is transient and reversible.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Waiting, Self::InProgress)
                | (Self::Waiting, Self::Aborted)
                | (Self::InProgress, Self::Settling)
                | (Self::Settling, Self::Finished)
                | (Self::Settling, Self::InProgress)
                | (Self::Aborted, Self::Waiting)
        )
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Waiting => "WAITING",
            Self::InProgress => "IN_PROGRESS",
            Self::Settling => "SETTLING",
            Self::Finished => "FINISHED",
            Self::Aborted => "ABORTED",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// MatchMode
// ---------------------------------------------------------------------------

/// Classification of a match: free-to-enter casual, wagered, or
/// single-player PvE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchMode {
    Casual,
    Betting,
    Pve,
}

impl MatchMode {
    /// Wagered modes require an explicit positive stake at registration.
    #[must_use]
    pub fn requires_stake(self) -> bool {
        matches!(self, Self::Betting)
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Casual => "CASUAL",
            Self::Betting => "BETTING",
            Self::Pve => "PVE",
        };
        write!(f, "{s}")
    }
}

impl FromStr for MatchMode {
    type Err = StakematchError;

    /// Parses the mode strings clients submit ("Casual" / "Betting"),
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CASUAL" => Ok(Self::Casual),
            "BETTING" => Ok(Self::Betting),
            "PVE" => Ok(Self::Pve),
            _ => Err(StakematchError::InvalidMode { value: s.to_string() }),
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerSlot
// ---------------------------------------------------------------------------

/// Which of the two player slots a registration filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerSlot {
    A,
    B,
}

impl PlayerSlot {
    /// Slot number as reported to clients (playerA = 1, playerB = 2).
    #[must_use]
    pub fn player_number(self) -> u8 {
        match self {
            Self::A => 1,
            Self::B => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerEntry
// ---------------------------------------------------------------------------

/// One participant's registration: wallet, deposit proof, and the
/// join-acknowledgment timestamp set when their game client confirms
/// entering the realtime session (distinct from ledger registration).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub address: WalletAddress,
    /// Signature of the ledger transaction that paid the entry fee.
    pub deposit_sig: TxSignature,
    /// Amount the deposit transferred, in the ledger's smallest unit.
    pub deposit_lamports: u64,
    pub joined_at: Option<DateTime<Utc>>,
}

impl PlayerEntry {
    #[must_use]
    pub fn new(address: WalletAddress, deposit_sig: TxSignature, deposit_lamports: u64) -> Self {
        Self {
            address,
            deposit_sig,
            deposit_lamports,
            joined_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// MatchRecord
// ---------------------------------------------------------------------------

/// The central match entity.
///
/// Invariants:
/// - `player_b` is non-null iff status ∈ {IN_PROGRESS, SETTLING, FINISHED}
///   (PvE matches excepted: they are created FINISHED with no opponent)
/// - `winner` is non-null iff status is FINISHED
/// - `bet_amount` / `match_fee` are immutable after creation
/// - `match_id` never changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: MatchId,
    pub game: String,
    pub mode: MatchMode,
    pub region: String,
    /// USD-denominated stake, fixed at creation.
    pub bet_amount: Decimal,
    /// USD-denominated fee, fixed at creation.
    pub match_fee: Decimal,
    pub status: MatchStatus,
    pub player_a: PlayerEntry,
    pub player_b: Option<PlayerEntry>,
    pub winner: Option<WalletAddress>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl MatchRecord {
    /// Create a fresh WAITING match with `player_a` registered.
    #[must_use]
    pub fn open(
        game: impl Into<String>,
        mode: MatchMode,
        region: impl Into<String>,
        bet_amount: Decimal,
        match_fee: Decimal,
        player_a: PlayerEntry,
    ) -> Self {
        Self {
            match_id: MatchId::new(),
            game: game.into(),
            mode,
            region: region.into(),
            bet_amount,
            match_fee,
            status: MatchStatus::Waiting,
            player_a,
            player_b: None,
            winner: None,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
        }
    }

    /// The slot held by `address`, if it is a participant.
    #[must_use]
    pub fn slot_of(&self, address: &WalletAddress) -> Option<PlayerSlot> {
        if self.player_a.address == *address {
            return Some(PlayerSlot::A);
        }
        if self.player_b.as_ref().is_some_and(|b| b.address == *address) {
            return Some(PlayerSlot::B);
        }
        None
    }

    #[must_use]
    pub fn is_participant(&self, address: &WalletAddress) -> bool {
        self.slot_of(address).is_some()
    }

    /// The other participant's entry, given one participant's address.
    #[must_use]
    pub fn counterpart_of(&self, address: &WalletAddress) -> Option<&PlayerEntry> {
        match self.slot_of(address)? {
            PlayerSlot::A => self.player_b.as_ref(),
            PlayerSlot::B => Some(&self.player_a),
        }
    }

    /// Total wagered lamports: the sum of both deposits.
    #[must_use]
    pub fn total_deposit_lamports(&self) -> u64 {
        self.player_a.deposit_lamports
            + self.player_b.as_ref().map_or(0, |b| b.deposit_lamports)
    }

    /// Check the structural invariants tying `player_b` / `winner` to
    /// `status`. PvE matches are created FINISHED with no opponent.
    #[must_use]
    pub fn invariants_hold(&self) -> bool {
        let b_required = matches!(
            self.status,
            MatchStatus::InProgress | MatchStatus::Settling | MatchStatus::Finished
        ) && self.mode != MatchMode::Pve;
        if b_required && self.player_b.is_none() {
            return false;
        }
        if !matches!(
            self.status,
            MatchStatus::InProgress | MatchStatus::Settling | MatchStatus::Finished
        ) && self.player_b.is_some()
        {
            return false;
        }
        match self.status {
            MatchStatus::Finished => self.winner.is_some() || self.mode == MatchMode::Pve,
            _ => self.winner.is_none(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
