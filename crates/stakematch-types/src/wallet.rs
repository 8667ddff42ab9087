//! Participant wallets and their accumulated points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::WalletAddress;

/// A participant, identified by ledger address.
///
/// Created lazily on first registration, never deleted. `points` is a
/// monotonically incremented score; an external season-reset process may
/// zero it, but within this coordinator it only grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub address: WalletAddress,
    pub points: u64,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    #[must_use]
    pub fn new(address: WalletAddress) -> Self {
        Self {
            address,
            points: 0,
            created_at: Utc::now(),
        }
    }
}
