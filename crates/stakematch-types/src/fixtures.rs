//! Test fixtures, available behind the `test-helpers` feature.

use rand::Rng;
use rust_decimal::Decimal;

use crate::{MatchMode, MatchRecord, PlayerEntry, TxSignature, WalletAddress};

/// A random base58-looking wallet address for tests.
#[must_use]
pub fn random_address() -> WalletAddress {
    const ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let s: String = (0..44)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    WalletAddress::new(s)
}

/// A random transaction signature for tests.
#[must_use]
pub fn random_signature() -> TxSignature {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.r#gen();
    TxSignature::new(
        bytes
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<String>(),
    )
}

/// A dummy participant entry with a fresh address and signature.
#[must_use]
pub fn dummy_entry(deposit_lamports: u64) -> PlayerEntry {
    PlayerEntry::new(random_address(), random_signature(), deposit_lamports)
}

/// A WAITING casual match at the default 0.50 USD stake.
#[must_use]
pub fn dummy_waiting_match(game: &str, region: &str) -> MatchRecord {
    MatchRecord::open(
        game,
        MatchMode::Casual,
        region,
        Decimal::new(50, 2),
        Decimal::new(10, 2),
        dummy_entry(5_000_000),
    )
}
