//! # stakematch-ledger
//!
//! **Ledger boundary**: everything that reads from or writes to the
//! external, authoritative ledger program.
//!
//! ## Architecture
//!
//! 1. **transaction**: the parsed-transaction wire model (top-level and
//!    inner instruction lists, dynamic JSON payloads)
//! 2. **verifier**: the Deposit Verifier — scans a finalized transaction
//!    for a native transfer with the expected endpoints
//! 3. **client**: the [`LedgerClient`] trait — settle, refund, airdrop
//!    transfer, finalized-transaction read, fee-config read
//! 4. **fees**: the Fee Accessor — strongly-typed decode of the ledger
//!    fee account, with a TTL cache
//! 5. **price**: injected oracle price cache
//! 6. **authority**: the ed25519 settlement authority identity
//!
//! The ledger's instructions are invoked as opaque, atomic operations:
//! at-least-once from the caller's perspective, exactly-once effect per
//! correctly-constructed call.

pub mod authority;
pub mod client;
pub mod fees;
pub mod price;
#[cfg(any(test, feature = "test-helpers"))]
pub mod sim;
pub mod transaction;
pub mod verifier;

pub use authority::SettlementAuthority;
pub use client::{LedgerClient, RawFeeConfig, SettleRequest};
pub use fees::FeeAccessor;
pub use price::{PriceCache, PriceSource};
#[cfg(any(test, feature = "test-helpers"))]
pub use sim::SimLedger;
pub use transaction::{ParsedInstruction, ParsedTransaction};
pub use verifier::{SysTransfer, find_any_transfer, find_transfer_from_to, find_transfer_to};
