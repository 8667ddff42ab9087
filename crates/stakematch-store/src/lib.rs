//! # stakematch-store
//!
//! **Match Repository**: the single owner of persisted match, wallet, and
//! consumed-deposit-signature state.
//!
//! Every public operation executes as one storage-level transaction, and
//! the claim operations (`claim_settling`, `claim_abort` and their
//! rollbacks) are conditional updates — compare-and-swap on status —
//! never read-then-write. Callers hold no locks of their own: all mutual
//! exclusion lives here.

pub mod store;

pub use store::{MatchStore, MatchTicket};
