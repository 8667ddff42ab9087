//! Staleness sweep: timeout resolution of abandoned matches.
//!
//! IN_PROGRESS matches older than the configured timeout are resolved
//! through the same idempotent `complete_match` a client would call —
//! the sweep has no privileged settlement path, so a sweep racing a
//! client-reported completion loses cleanly with `AlreadyClaimed`.

use chrono::Utc;

use stakematch_ledger::LedgerClient;
use stakematch_types::{MatchId, MatchRecord, StakematchError, WalletAddress};

use crate::MatchEngine;

/// Outcome counts of one sweep pass.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub resolved: Vec<MatchId>,
    /// Matches another caller settled first. Not failures.
    pub already_claimed: Vec<MatchId>,
    pub failed: Vec<(MatchId, StakematchError)>,
}

impl SweepReport {
    #[must_use]
    pub fn scanned(&self) -> usize {
        self.resolved.len() + self.already_claimed.len() + self.failed.len()
    }
}

/// Winner policy for a timed-out match: the participant who joined the
/// session wins if exactly playerA joined; in every other case (both
/// joined, neither joined, or only playerB joined) playerB wins.
///
/// The asymmetric fallback favoring the second-registered participant is
/// long-standing policy, not a derived invariant.
#[must_use]
pub fn pick_winner(record: &MatchRecord) -> WalletAddress {
    let Some(player_b) = record.player_b.as_ref() else {
        return record.player_a.address.clone();
    };
    let a_joined = record.player_a.joined_at.is_some();
    let b_joined = player_b.joined_at.is_some();
    if a_joined && !b_joined {
        record.player_a.address.clone()
    } else {
        player_b.address.clone()
    }
}

impl<L: LedgerClient> MatchEngine<L> {
    /// One sweep pass: resolve every IN_PROGRESS match older than the
    /// configured timeout. Per-match failures are isolated; the pass
    /// always runs to completion.
    pub async fn sweep_stale(&self) -> SweepReport {
        let cutoff = Utc::now() - self.config().stale_after();
        let stale = self.store().stale_in_progress(cutoff).await;
        if !stale.is_empty() {
            tracing::info!(count = stale.len(), "Resolving stale matches");
        }

        let mut report = SweepReport::default();
        for record in stale {
            let winner = pick_winner(&record);
            match self.complete_match(record.match_id, &winner).await {
                Ok(_) => report.resolved.push(record.match_id),
                Err(StakematchError::AlreadyClaimed(id)) => {
                    tracing::info!(match_id = %id, "Stale match already claimed elsewhere");
                    report.already_claimed.push(id);
                }
                Err(err) => {
                    tracing::warn!(match_id = %record.match_id, error = %err, "Stale match resolution failed");
                    report.failed.push((record.match_id, err));
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use stakematch_types::{MatchMode, MatchStatus, PlayerEntry, TxSignature};

    fn in_progress(a_joined: bool, b_joined: bool) -> MatchRecord {
        let mut a = PlayerEntry::new("alice".into(), TxSignature::new("sig-a"), 1_000);
        let mut b = PlayerEntry::new("bob".into(), TxSignature::new("sig-b"), 1_000);
        if a_joined {
            a.joined_at = Some(Utc::now());
        }
        if b_joined {
            b.joined_at = Some(Utc::now());
        }
        let mut m = MatchRecord::open(
            "chess",
            MatchMode::Casual,
            "eu",
            Decimal::new(50, 2),
            Decimal::new(10, 2),
            a,
        );
        m.player_b = Some(b);
        m.status = MatchStatus::InProgress;
        m
    }

    #[test]
    fn only_a_joined_wins_a() {
        let m = in_progress(true, false);
        assert_eq!(pick_winner(&m), "alice".into());
    }

    #[test]
    fn fallback_favors_player_b() {
        assert_eq!(pick_winner(&in_progress(false, false)), "bob".into());
        assert_eq!(pick_winner(&in_progress(true, true)), "bob".into());
        assert_eq!(pick_winner(&in_progress(false, true)), "bob".into());
    }

    #[test]
    fn missing_player_b_falls_back_to_a() {
        let mut m = in_progress(false, false);
        m.player_b = None;
        assert_eq!(pick_winner(&m), "alice".into());
    }
}
