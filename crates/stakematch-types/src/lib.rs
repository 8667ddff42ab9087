//! # stakematch-types
//!
//! Shared types, errors, and configuration for the **StakeMatch**
//! wagered-match coordinator.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`MatchId`], [`WalletAddress`], [`TxSignature`]
//! - **Match model**: [`MatchRecord`], [`MatchStatus`], [`MatchMode`], [`PlayerSlot`], [`PlayerEntry`]
//! - **Wallet model**: [`Wallet`]
//! - **Configuration**: [`EngineConfig`], [`FeeConfig`]
//! - **Errors**: [`StakematchError`] with `SM_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod error;
#[cfg(feature = "test-helpers")]
pub mod fixtures;
pub mod ids;
pub mod match_record;
pub mod wallet;

// Re-export all primary types at crate root for ergonomic imports:
//   use stakematch_types::{MatchRecord, MatchStatus, StakematchError, ...};

pub use config::*;
pub use error::*;
pub use ids::*;
pub use match_record::*;
pub use wallet::*;

// Constants are accessed via `stakematch_types::constants::FOO`
// (not re-exported to avoid name collisions).
