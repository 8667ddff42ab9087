//! System-wide constants for the StakeMatch coordinator.

/// Lamports per SOL (the ledger's smallest unit per whole unit).
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Basis-point denominator: fee fraction = bps / 10_000.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Flat network cost of a ledger transfer, subtracted from refunds.
pub const NETWORK_FEE_LAMPORTS: u64 = 5_000;

/// Fee basis points used only when no fee config has ever been fetched.
pub const FALLBACK_FEE_BPS: u16 = 2_000;

/// Default USD stake for casual registrations that omit a bet amount
/// (whole value in cents; see `EngineConfig::default_bet_usd`).
pub const DEFAULT_BET_USD_CENTS: i64 = 50;

/// Matches IN_PROGRESS longer than this are swept by auto-resolution.
pub const MATCH_TIMEOUT_SECS: i64 = 15 * 60;

/// How long a fetched fee config stays fresh before re-reading the ledger.
pub const FEE_CONFIG_TTL_SECS: i64 = 60;

/// How long a fetched oracle price stays fresh.
pub const PRICE_TTL_SECS: i64 = 30;

/// Points awarded to the winner of a settled match.
pub const POINTS_WIN: u64 = 2;

/// Points awarded to the loser of a settled match.
pub const POINTS_LOSS: u64 = 1;

/// Points awarded for completing a PvE match.
pub const POINTS_PVE: u64 = 1;

/// Pause between transfers in a batch airdrop, to stay under RPC rate limits.
pub const AIRDROP_TRANSFER_PAUSE_MS: u64 = 500;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Coordinator name.
pub const COORDINATOR_NAME: &str = "StakeMatch";
