//! Deposit Verifier — recognizes native transfers inside a finalized
//! transaction.
//!
//! A fee deposit's transfer may appear as a top-level instruction or
//! nested inside a program-invoked inner instruction; both are searched,
//! first match wins. Discovery order does not affect correctness because
//! registration additionally validates exact sender and destination.
//!
//! Fail-closed: a missing or non-numeric amount field means "no transfer
//! found", never a crash. Numeric strings are accepted — the RPC encodes
//! large u64 values as strings.

use serde_json::Value;

use stakematch_types::WalletAddress;

use crate::transaction::{ParsedInstruction, ParsedTransaction};

/// A recognized native transfer: endpoints plus the amount in the
/// ledger's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysTransfer {
    pub from: WalletAddress,
    pub to: WalletAddress,
    pub lamports: u64,
}

fn lamports_of(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str()?.parse::<u64>().ok())
}

fn extract_transfer(ix: &ParsedInstruction) -> Option<SysTransfer> {
    if ix.program != "system" {
        return None;
    }
    if ix.parsed.get("type")?.as_str()? != "transfer" {
        return None;
    }
    let info = ix.parsed.get("info")?;
    let from = info.get("source")?.as_str()?;
    let to = info.get("destination")?.as_str()?;
    let lamports = lamports_of(info.get("lamports")?)?;
    Some(SysTransfer {
        from: WalletAddress::new(from),
        to: WalletAddress::new(to),
        lamports,
    })
}

/// First native transfer anywhere in the transaction, if any.
#[must_use]
pub fn find_any_transfer(tx: &ParsedTransaction) -> Option<SysTransfer> {
    tx.all_instructions().find_map(extract_transfer)
}

/// First native transfer landing at `dest`.
#[must_use]
pub fn find_transfer_to(tx: &ParsedTransaction, dest: &WalletAddress) -> Option<SysTransfer> {
    tx.all_instructions()
        .filter_map(extract_transfer)
        .find(|t| t.to == *dest)
}

/// First native transfer with both endpoints matching.
#[must_use]
pub fn find_transfer_from_to(
    tx: &ParsedTransaction,
    from: &WalletAddress,
    to: &WalletAddress,
) -> Option<SysTransfer> {
    tx.all_instructions()
        .filter_map(extract_transfer)
        .find(|t| t.from == *from && t.to == *to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stakematch_types::TxSignature;

    fn transfer_ix(from: &str, to: &str, lamports: Value) -> ParsedInstruction {
        ParsedInstruction {
            program: "system".to_string(),
            parsed: json!({
                "type": "transfer",
                "info": { "source": from, "destination": to, "lamports": lamports }
            }),
        }
    }

    fn opaque_ix() -> ParsedInstruction {
        ParsedInstruction {
            program: "stake-program".to_string(),
            parsed: json!({ "type": "invoke" }),
        }
    }

    fn tx(top: Vec<ParsedInstruction>, inner: Vec<Vec<ParsedInstruction>>) -> ParsedTransaction {
        ParsedTransaction {
            signature: TxSignature::new("sig"),
            success: true,
            instructions: top,
            inner_instructions: inner,
        }
    }

    #[test]
    fn finds_top_level_transfer() {
        let t = tx(vec![transfer_ix("alice", "treasury", json!(5_000_000))], vec![]);
        let found = find_any_transfer(&t).unwrap();
        assert_eq!(found.from, WalletAddress::new("alice"));
        assert_eq!(found.to, WalletAddress::new("treasury"));
        assert_eq!(found.lamports, 5_000_000);
    }

    #[test]
    fn finds_inner_transfer_behind_program_invoke() {
        let t = tx(
            vec![opaque_ix()],
            vec![vec![transfer_ix("alice", "treasury", json!(7_500))]],
        );
        let found = find_any_transfer(&t).unwrap();
        assert_eq!(found.lamports, 7_500);
    }

    #[test]
    fn first_match_wins_top_level_before_inner() {
        let t = tx(
            vec![transfer_ix("a", "x", json!(1))],
            vec![vec![transfer_ix("b", "y", json!(2))]],
        );
        assert_eq!(find_any_transfer(&t).unwrap().lamports, 1);
    }

    #[test]
    fn string_encoded_lamports_accepted() {
        let t = tx(vec![transfer_ix("alice", "treasury", json!("9007199254740993"))], vec![]);
        assert_eq!(find_any_transfer(&t).unwrap().lamports, 9_007_199_254_740_993);
    }

    #[test]
    fn non_numeric_lamports_is_no_transfer() {
        let t = tx(vec![transfer_ix("alice", "treasury", json!("not-a-number"))], vec![]);
        assert!(find_any_transfer(&t).is_none());

        let t = tx(vec![transfer_ix("alice", "treasury", json!(null))], vec![]);
        assert!(find_any_transfer(&t).is_none());
    }

    #[test]
    fn non_system_program_ignored() {
        let mut ix = transfer_ix("alice", "treasury", json!(100));
        ix.program = "token".to_string();
        let t = tx(vec![ix], vec![]);
        assert!(find_any_transfer(&t).is_none());
    }

    #[test]
    fn non_transfer_type_ignored() {
        let ix = ParsedInstruction {
            program: "system".to_string(),
            parsed: json!({ "type": "createAccount", "info": { "lamports": 100 } }),
        };
        let t = tx(vec![ix], vec![]);
        assert!(find_any_transfer(&t).is_none());
    }

    #[test]
    fn destination_filter() {
        let t = tx(
            vec![
                transfer_ix("alice", "somewhere-else", json!(1)),
                transfer_ix("alice", "treasury", json!(2)),
            ],
            vec![],
        );
        let found = find_transfer_to(&t, &WalletAddress::new("treasury")).unwrap();
        assert_eq!(found.lamports, 2);
        assert!(find_transfer_to(&t, &WalletAddress::new("vault")).is_none());
    }

    #[test]
    fn from_to_filter() {
        let t = tx(
            vec![
                transfer_ix("mallory", "treasury", json!(1)),
                transfer_ix("alice", "treasury", json!(2)),
            ],
            vec![],
        );
        let found = find_transfer_from_to(
            &t,
            &WalletAddress::new("alice"),
            &WalletAddress::new("treasury"),
        )
        .unwrap();
        assert_eq!(found.lamports, 2);

        assert!(
            find_transfer_from_to(
                &t,
                &WalletAddress::new("bob"),
                &WalletAddress::new("treasury"),
            )
            .is_none()
        );
    }

    #[test]
    fn empty_transaction_has_no_transfer() {
        let t = tx(vec![], vec![]);
        assert!(find_any_transfer(&t).is_none());
    }
}
