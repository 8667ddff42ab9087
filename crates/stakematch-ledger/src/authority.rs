//! The settlement authority identity.
//!
//! Settle, refund, and airdrop instructions must be signed by the
//! configured authority keypair. The key is loaded from a 32-byte seed
//! (sourced from the deployment's keypair file, never generated at
//! runtime).

use ed25519_dalek::{Signature, Signer, SigningKey};

use stakematch_types::WalletAddress;

/// Ed25519 keypair authorized to invoke the ledger's admin instructions.
pub struct SettlementAuthority {
    signing: SigningKey,
}

impl SettlementAuthority {
    #[must_use]
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing: SigningKey::from_bytes(&seed),
        }
    }

    /// The authority's ledger address (hex of the verifying key).
    #[must_use]
    pub fn address(&self) -> WalletAddress {
        WalletAddress::new(hex::encode(self.signing.verifying_key().as_bytes()))
    }

    /// Sign an instruction payload digest.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing.sign(message)
    }

    #[must_use]
    pub fn verifying_key_bytes(&self) -> [u8; 32] {
        self.signing.verifying_key().to_bytes()
    }
}

impl std::fmt::Debug for SettlementAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("SettlementAuthority")
            .field("address", &self.address())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::Verifier;

    #[test]
    fn same_seed_same_address() {
        let a = SettlementAuthority::from_seed([7u8; 32]);
        let b = SettlementAuthority::from_seed([7u8; 32]);
        assert_eq!(a.address(), b.address());

        let c = SettlementAuthority::from_seed([8u8; 32]);
        assert_ne!(a.address(), c.address());
    }

    #[test]
    fn signatures_verify() {
        let auth = SettlementAuthority::from_seed([1u8; 32]);
        let msg = b"settle:match:42";
        let sig = auth.sign(msg);

        let vk = ed25519_dalek::VerifyingKey::from_bytes(&auth.verifying_key_bytes()).unwrap();
        assert!(vk.verify(msg, &sig).is_ok());
        assert!(vk.verify(b"settle:match:43", &sig).is_err());
    }

    #[test]
    fn debug_hides_key_material() {
        let auth = SettlementAuthority::from_seed([9u8; 32]);
        let out = format!("{auth:?}");
        assert!(out.contains("address"));
        assert!(!out.contains("signing"));
    }
}
