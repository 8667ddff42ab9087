//! # stakematch-engine
//!
//! **Match Lifecycle Engine**: the state machine driving a match from
//! registration through settlement or abort.
//!
//! ## Architecture
//!
//! 1. **register**: PvP registration (deposit verification, matchmaking)
//!    and the simplified PvE path
//! 2. **join**: realtime-session join acknowledgment
//! 3. **settle**: the idempotency-critical completion path — claim,
//!    validate, settle on the ledger, finalize or roll back
//! 4. **abort**: refund of an unmatched WAITING match
//! 5. **sweep**: timeout resolution of stale IN_PROGRESS matches
//! 6. **airdrop**: batch treasury transfers with per-recipient isolation
//! 7. **saga**: compensation stack for side effects outside the store's
//!    transaction boundary
//!
//! The engine holds no locks and caches no match state across operations:
//! all mutual exclusion is expressed as status-guarded updates inside the
//! [`MatchStore`], and every ledger call happens after the corresponding
//! claim is durably recorded.

use std::sync::Arc;

use stakematch_ledger::{FeeAccessor, LedgerClient};
use stakematch_store::MatchStore;
use stakematch_types::EngineConfig;

pub mod abort;
pub mod airdrop;
pub mod join;
pub mod register;
mod saga;
pub mod settle;
pub mod sweep;

pub use abort::AbortOutcome;
pub use airdrop::{AirdropRecipient, AirdropSummary};
pub use register::{PveOutcome, RegisterOutcome, RegisterRequest};
pub use settle::SettlementOutcome;
pub use sweep::SweepReport;

/// The lifecycle engine. Generic over the ledger client so tests can run
/// against the simulated ledger.
///
/// Cheap to share: operations take `&self` and the engine owns only
/// handles and configuration.
pub struct MatchEngine<L> {
    store: Arc<MatchStore>,
    ledger: Arc<L>,
    fees: FeeAccessor,
    config: EngineConfig,
}

impl<L: LedgerClient> MatchEngine<L> {
    #[must_use]
    pub fn new(store: Arc<MatchStore>, ledger: Arc<L>, config: EngineConfig) -> Self {
        Self {
            store,
            ledger,
            fees: FeeAccessor::new(),
            config,
        }
    }

    /// Replace the default fee accessor (custom TTL in tests).
    #[must_use]
    pub fn with_fee_accessor(mut self, fees: FeeAccessor) -> Self {
        self.fees = fees;
        self
    }

    #[must_use]
    pub fn store(&self) -> &MatchStore {
        &self.store
    }

    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn fees(&self) -> &FeeAccessor {
        &self.fees
    }
}
