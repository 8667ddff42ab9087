//! Concurrency properties: the settlement claim and the matchmaking
//! serialization point under racing callers on a multi-threaded runtime.

use std::sync::Arc;

use rust_decimal::Decimal;

use stakematch_engine::{MatchEngine, RegisterRequest};
use stakematch_ledger::SimLedger;
use stakematch_store::MatchStore;
use stakematch_types::{
    EngineConfig, MatchMode, PlayerSlot, StakematchError, TxSignature, WalletAddress,
};

const STAKE_LAMPORTS: u64 = 5_000_000;

fn engine() -> Arc<MatchEngine<SimLedger>> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let sim = Arc::new(SimLedger::new());
    let config = EngineConfig::new(sim.treasury());
    Arc::new(MatchEngine::new(Arc::new(MatchStore::new()), sim, config))
}

fn casual_request(address: &str, deposit_sig: TxSignature) -> RegisterRequest {
    RegisterRequest {
        address: address.into(),
        deposit_sig,
        game: "chess".to_string(),
        mode: MatchMode::Casual,
        region: "eu".to_string(),
        bet_amount: Some(Decimal::new(50, 2)),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_completions_settle_exactly_once() {
    let engine = engine();

    let sig = engine.ledger().deposit(&"alice".into(), STAKE_LAMPORTS);
    let first = engine
        .register_player(casual_request("alice", sig))
        .await
        .unwrap();
    let sig = engine.ledger().deposit(&"bob".into(), STAKE_LAMPORTS);
    engine
        .register_player(casual_request("bob", sig))
        .await
        .unwrap();
    let match_id = first.match_id;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine.complete_match(match_id, &"alice".into()).await
        }));
    }

    let mut settled = 0;
    let mut already_claimed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(outcome) => {
                settled += 1;
                assert_eq!(outcome.winner_payout, 8_000_000);
            }
            Err(StakematchError::AlreadyClaimed(id)) => {
                already_claimed += 1;
                assert_eq!(id, match_id);
            }
            Err(other) => panic!("unexpected completion error: {other}"),
        }
    }
    assert_eq!(settled, 1, "exactly one caller wins the claim");
    assert_eq!(already_claimed, 7);

    // One payout, one set of point increments.
    assert_eq!(engine.ledger().payouts().len(), 1);
    assert_eq!(engine.store().wallet(&"alice".into()).await.unwrap().points, 2);
    assert_eq!(engine.store().wallet(&"bob".into()).await.unwrap().points, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_attach_at_most_one_player_b() {
    let engine = engine();

    let sig = engine.ledger().deposit(&"opener".into(), STAKE_LAMPORTS);
    let opened = engine
        .register_player(casual_request("opener", sig))
        .await
        .unwrap();
    let open_id = opened.match_id;

    let mut handles = Vec::new();
    for i in 0..6 {
        let engine = Arc::clone(&engine);
        let address = format!("racer-{i}");
        handles.push(tokio::spawn(async move {
            let sig = engine.ledger().deposit(&address.as_str().into(), STAKE_LAMPORTS);
            engine
                .register_player(casual_request(&address, sig))
                .await
                .unwrap()
        }));
    }

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    let attached_to_open = outcomes
        .iter()
        .filter(|o| o.match_id == open_id)
        .count();
    assert_eq!(attached_to_open, 1, "exactly one racer won the open match");

    // No match ever gained a second playerB: per match at most one B slot.
    for outcome in &outcomes {
        let b_count = outcomes
            .iter()
            .filter(|o| o.match_id == outcome.match_id && o.slot == PlayerSlot::B)
            .count();
        assert!(b_count <= 1, "match {} has {} playerB attachments", outcome.match_id, b_count);
    }

    // Losers paired among themselves or are still waiting.
    let record = engine.store().get(open_id).await.unwrap();
    assert_eq!(record.player_a.address, WalletAddress::new("opener"));
    assert!(record.player_b.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_replays_of_one_signature_register_once() {
    let engine = engine();
    let sig = engine.ledger().deposit(&"alice".into(), STAKE_LAMPORTS);

    let mut handles = Vec::new();
    for _ in 0..2 {
        let engine = Arc::clone(&engine);
        let sig = sig.clone();
        handles.push(tokio::spawn(async move {
            engine.register_player(casual_request("alice", sig)).await
        }));
    }

    let mut ok = 0;
    let mut duplicate = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(StakematchError::DuplicateDeposit(_)) => duplicate += 1,
            Err(other) => panic!("unexpected registration error: {other}"),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(duplicate, 1);
    assert!(engine.store().deposit_sig_consumed(&sig).await);
}
