//! Join acknowledgment: a participant's game client confirms it entered
//! the realtime session. Side-effect only — the match status never moves.

use chrono::Utc;

use stakematch_ledger::LedgerClient;
use stakematch_types::{MatchId, PlayerSlot, Result, WalletAddress};

use crate::MatchEngine;

impl<L: LedgerClient> MatchEngine<L> {
    /// Record that `address` joined the realtime session of `match_id`.
    ///
    /// # Errors
    /// - [`MatchNotFound`](stakematch_types::StakematchError::MatchNotFound)
    ///   for an unknown id
    /// - [`NotParticipant`](stakematch_types::StakematchError::NotParticipant)
    ///   when the caller holds neither player slot
    pub async fn join_match(&self, match_id: MatchId, address: &WalletAddress) -> Result<PlayerSlot> {
        let slot = self.store().record_join(match_id, address, Utc::now()).await?;
        tracing::info!(
            match_id = %match_id,
            player = %address,
            slot = slot.player_number(),
            "Join acknowledged"
        );
        Ok(slot)
    }
}
