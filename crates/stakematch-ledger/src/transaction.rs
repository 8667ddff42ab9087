//! Parsed-transaction wire model.
//!
//! The ledger RPC returns transactions with a top-level instruction list
//! plus zero or more "inner" instruction lists emitted by program
//! invocations. A deposit's transfer may sit in either place, so consumers
//! iterate [`ParsedTransaction::all_instructions`] — top-level first, then
//! inner lists in order.
//!
//! Instruction payloads stay as dynamic JSON at this boundary; everything
//! past the verifier is strongly typed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use stakematch_types::TxSignature;

/// A single parsed instruction: the owning program name and its decoded
/// payload as the RPC returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedInstruction {
    /// Program name as reported by the RPC parser (e.g. `"system"`).
    pub program: String,
    /// Decoded payload, typically `{ "type": ..., "info": { ... } }`.
    pub parsed: Value,
}

/// A finalized ledger transaction record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub signature: TxSignature,
    /// False when the transaction executed but failed on-ledger.
    pub success: bool,
    /// Top-level instructions.
    pub instructions: Vec<ParsedInstruction>,
    /// Inner instruction lists, one per invoking top-level instruction.
    pub inner_instructions: Vec<Vec<ParsedInstruction>>,
}

impl ParsedTransaction {
    /// All instructions in discovery order: top-level, then each inner
    /// list in sequence.
    pub fn all_instructions(&self) -> impl Iterator<Item = &ParsedInstruction> {
        self.instructions
            .iter()
            .chain(self.inner_instructions.iter().flatten())
    }
}

/// Build a minimal successful transaction containing one top-level system
/// transfer. Used by tests and the simulated ledger.
#[must_use]
pub fn transfer_transaction(
    signature: TxSignature,
    from: &str,
    to: &str,
    lamports: u64,
) -> ParsedTransaction {
    ParsedTransaction {
        signature,
        success: true,
        instructions: vec![ParsedInstruction {
            program: "system".to_string(),
            parsed: serde_json::json!({
                "type": "transfer",
                "info": {
                    "source": from,
                    "destination": to,
                    "lamports": lamports,
                }
            }),
        }],
        inner_instructions: Vec::new(),
    }
}
